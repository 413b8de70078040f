//! calcrpc Operation Results
//!
//! [`OperationResult`] is a tagged variant with one wire encoding per variant:
//!
//! | variant    | wire text                  | cache JSON            |
//! |------------|----------------------------|-----------------------|
//! | `Scalar`   | `5`, `2.5`                 | number                |
//! | `Integer`  | decimal digits             | string of digits      |
//! | `Booleans` | `[false,true]`             | array                 |
//! | `Strings`  | `["a","b"]`                | array                 |
//! | `Error`    | `Error: <reason>`          | string                |
//!
//! Engine failures travel inline with successful results: a server never
//! fails a connection because of bad input, it replies with an `Error` value.

use std::str::FromStr;

use num_bigint::BigUint;
use serde_json::Value;
use thiserror::Error;

use super::command::Shape;

/// Prefix marking an inline error on the wire.
pub const ERROR_PREFIX: &str = "Error:";

/// Failures produced while evaluating a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("the operation requires at least one number")]
    MissingOperands,

    #[error("division by zero is not allowed")]
    DivisionByZero,

    #[error("factorial is not defined for negative numbers")]
    InvalidFactorialInput,

    #[error("unknown command '{0}'")]
    UnknownOperation(String),

    #[error("could not parse arguments: {0}")]
    ParseError(String),
}

/// The value produced by executing a command.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult {
    Scalar(f64),
    Integer(BigUint),
    Booleans(Vec<bool>),
    Strings(Vec<String>),
    /// Human readable reason, without the `Error:` prefix
    Error(String),
}

impl OperationResult {
    pub fn is_error(&self) -> bool {
        matches!(self, OperationResult::Error(_))
    }

    /// Encodes the result as the text sent back to a client.
    pub fn encode_wire(&self) -> String {
        match self {
            OperationResult::Scalar(value) => value.to_string(),
            OperationResult::Integer(value) => value.to_string(),
            OperationResult::Booleans(values) => {
                serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
            }
            OperationResult::Strings(values) => {
                serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
            }
            OperationResult::Error(reason) => format!("{} {}", ERROR_PREFIX, reason),
        }
    }

    /// Decodes a reply for an opcode of the given shape.
    ///
    /// Text carrying the error prefix, or text that does not fit the
    /// expected shape, becomes an `Error` value holding the raw text.
    pub fn decode_wire(shape: Shape, text: &str) -> Self {
        let text = text.trim();
        if let Some(reason) = text.strip_prefix(ERROR_PREFIX) {
            return OperationResult::Error(reason.trim().to_string());
        }

        let decoded = match shape {
            Shape::Scalar => text
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(OperationResult::Scalar),
            Shape::Integer => BigUint::from_str(text).ok().map(OperationResult::Integer),
            Shape::Booleans => serde_json::from_str::<Vec<bool>>(text)
                .ok()
                .map(OperationResult::Booleans),
            Shape::Strings => serde_json::from_str::<Vec<String>>(text)
                .ok()
                .map(OperationResult::Strings),
        };

        decoded.unwrap_or_else(|| OperationResult::Error(text.to_string()))
    }

    /// Converts the result into its JSON form inside a cache file.
    pub fn to_cache_value(&self) -> Value {
        match self {
            OperationResult::Scalar(value) => serde_json::Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(value.to_string())),
            OperationResult::Integer(value) => Value::String(value.to_string()),
            OperationResult::Booleans(values) => {
                Value::Array(values.iter().copied().map(Value::Bool).collect())
            }
            OperationResult::Strings(values) => {
                Value::Array(values.iter().cloned().map(Value::String).collect())
            }
            OperationResult::Error(_) => Value::String(self.encode_wire()),
        }
    }

    /// Reads a cached JSON value back for an opcode of the given shape.
    pub fn from_cache_value(shape: Shape, value: &Value) -> Self {
        match value {
            Value::String(text) => Self::decode_wire(shape, text),
            other => Self::decode_wire(shape, &other.to_string()),
        }
    }
}

impl From<EngineError> for OperationResult {
    fn from(err: EngineError) -> Self {
        OperationResult::Error(err.to_string())
    }
}

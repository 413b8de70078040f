//! calcrpc Commands
//!
//! A command is a whitespace-delimited request line: the first token is the
//! operation identifier, the remaining tokens are positional arguments.
//!
//! The trimmed request line doubles as the cache key on every tier, so two
//! requests that differ only in argument formatting (`"sum 2 3"` vs
//! `"sum 2.0 3"`) are cached separately.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{CalcrpcError, Result};

/// The closed set of operations understood by calcrpc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpCode {
    /// Sum of all arguments
    Sum,
    /// Left-to-right subtraction
    Sub,
    /// Product of all arguments
    Prod,
    /// Left-to-right division
    Div,
    /// Arbitrary precision factorial
    Fat,
    /// Per-argument primality test
    Prim,
    /// Headlines from an external news page
    News,
}

/// Shape of the value an opcode produces, which fixes its wire encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A floating point number sent as bare text
    Scalar,
    /// An arbitrary precision integer sent as decimal digits
    Integer,
    /// A JSON array of booleans
    Booleans,
    /// A JSON array of strings
    Strings,
}

impl OpCode {
    /// Every opcode, in declaration order.
    pub const ALL: [OpCode; 7] = [
        OpCode::Sum,
        OpCode::Sub,
        OpCode::Prod,
        OpCode::Div,
        OpCode::Fat,
        OpCode::Prim,
        OpCode::News,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OpCode::Sum => "sum",
            OpCode::Sub => "sub",
            OpCode::Prod => "prod",
            OpCode::Div => "div",
            OpCode::Fat => "fat",
            OpCode::Prim => "prim",
            OpCode::News => "news",
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            OpCode::Sum | OpCode::Sub | OpCode::Prod | OpCode::Div => Shape::Scalar,
            OpCode::Fat => Shape::Integer,
            OpCode::Prim => Shape::Booleans,
            OpCode::News => Shape::Strings,
        }
    }

    /// Whether results of this opcode may be stored on any cache tier.
    ///
    /// Primality checks are always recomputed: their argument sets are rarely
    /// repeated, so caching them does not pay off.
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, OpCode::Prim)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpCode {
    type Err = CalcrpcError;

    fn from_str(s: &str) -> Result<Self> {
        OpCode::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| CalcrpcError::UnknownOperation(s.to_string()))
    }
}

/// A parsed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    op: OpCode,
    args: Vec<String>,
    raw: String,
}

impl Command {
    /// Parses a request line.
    ///
    /// Leading and trailing whitespace is dropped; inner whitespace is kept
    /// verbatim in the cache key.
    ///
    /// # Errors
    ///
    /// Returns `UnknownOperation` if the line is empty or its first token is
    /// not a known opcode.
    pub fn parse(line: &str) -> Result<Self> {
        let raw = line.trim();
        let mut tokens = raw.split_whitespace();
        let op = tokens
            .next()
            .ok_or_else(|| CalcrpcError::UnknownOperation(String::new()))?
            .parse::<OpCode>()?;

        Ok(Self {
            op,
            args: tokens.map(str::to_string).collect(),
            raw: raw.to_string(),
        })
    }

    /// Builds a command from an opcode and its arguments, joined by single spaces.
    pub fn new<I, T>(op: OpCode, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: fmt::Display,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.to_string()).collect();
        let raw = if args.is_empty() {
            op.as_str().to_string()
        } else {
            format!("{} {}", op, args.join(" "))
        };

        Self { op, args, raw }
    }

    pub fn op(&self) -> OpCode {
        self.op
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The exact command string used as the key on every cache tier.
    pub fn cache_key(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

use calcrpc_common::{EngineError, OpCode, OperationResult};

/// Parses every argument as a finite number.
pub fn parse_operands(args: &[String]) -> Result<Vec<f64>, EngineError> {
    args.iter()
        .map(|arg| {
            arg.parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| EngineError::ParseError(format!("'{}' is not a number", arg)))
        })
        .collect()
}

pub fn sum(values: &[f64]) -> Result<f64, EngineError> {
    if values.is_empty() {
        return Err(EngineError::MissingOperands);
    }
    Ok(values.iter().sum())
}

pub fn prod(values: &[f64]) -> Result<f64, EngineError> {
    if values.is_empty() {
        return Err(EngineError::MissingOperands);
    }
    Ok(values.iter().product())
}

/// Left fold: `v0 - v1 - v2 ...`
pub fn sub(values: &[f64]) -> Result<f64, EngineError> {
    let (first, rest) = values.split_first().ok_or(EngineError::MissingOperands)?;
    Ok(rest.iter().fold(*first, |acc, value| acc - value))
}

/// Left fold: `v0 / v1 / v2 ...`, failing at the first zero divisor.
pub fn div(values: &[f64]) -> Result<f64, EngineError> {
    let (first, rest) = values.split_first().ok_or(EngineError::MissingOperands)?;
    rest.iter().try_fold(*first, |acc, divisor| {
        if *divisor == 0.0 {
            Err(EngineError::DivisionByZero)
        } else {
            Ok(acc / divisor)
        }
    })
}

/// Evaluates one of the four arithmetic opcodes.
pub fn evaluate(op: OpCode, args: &[String]) -> OperationResult {
    let outcome = parse_operands(args).and_then(|values| match op {
        OpCode::Sum => sum(&values),
        OpCode::Sub => sub(&values),
        OpCode::Prod => prod(&values),
        OpCode::Div => div(&values),
        other => Err(EngineError::UnknownOperation(other.to_string())),
    });

    match outcome {
        Ok(value) if value.is_finite() => OperationResult::Scalar(value),
        Ok(_) => EngineError::ParseError("result is out of range".to_string()).into(),
        Err(e) => e.into(),
    }
}

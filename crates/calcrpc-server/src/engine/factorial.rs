use calcrpc_common::EngineError;
use num_bigint::BigUint;
use num_traits::One;

/// Reads the single argument of `fat`.
///
/// Exactly one integer is accepted. A negative integer is
/// `InvalidFactorialInput`; anything else that is not a non-negative
/// integer is a parse error.
pub fn parse_argument(args: &[String]) -> Result<u64, EngineError> {
    let [arg] = args else {
        return Err(EngineError::ParseError(format!(
            "fat takes exactly one argument, got {}",
            args.len()
        )));
    };

    match arg.parse::<i128>() {
        Ok(n) if n < 0 => Err(EngineError::InvalidFactorialInput),
        Ok(n) => u64::try_from(n)
            .map_err(|_| EngineError::ParseError(format!("'{}' is too large", arg))),
        Err(_) => Err(EngineError::ParseError(format!("'{}' is not an integer", arg))),
    }
}

/// Exact `n!`.
pub fn factorial(n: u64) -> BigUint {
    (2..=n).fold(BigUint::one(), |acc, k| acc * k)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_small_values() {
        assert_eq!(factorial(0), BigUint::from(1u32));
        assert_eq!(factorial(1), BigUint::from(1u32));
        assert_eq!(factorial(5), BigUint::from(120u32));
        assert_eq!(factorial(20), BigUint::from(2_432_902_008_176_640_000u64));
    }

    #[test]
    fn test_thousand_has_2568_digits() {
        let digits = factorial(1000).to_string();
        assert_eq!(digits.len(), 2568);
        assert!(digits.starts_with("402387260077"));
        assert!(digits.ends_with(&"0".repeat(249)));
    }

    #[test]
    fn test_parse_argument() {
        assert_eq!(parse_argument(&args(&["10"])), Ok(10));
        assert_eq!(
            parse_argument(&args(&["-3"])),
            Err(EngineError::InvalidFactorialInput)
        );
        assert!(matches!(
            parse_argument(&args(&["2.5"])),
            Err(EngineError::ParseError(_))
        ));
        assert!(matches!(
            parse_argument(&args(&[])),
            Err(EngineError::ParseError(_))
        ));
        assert!(matches!(
            parse_argument(&args(&["3", "4"])),
            Err(EngineError::ParseError(_))
        ));
    }
}

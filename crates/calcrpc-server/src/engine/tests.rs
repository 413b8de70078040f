//! Tests driving the engine through parsed commands.

use super::*;
use num_bigint::BigUint;

async fn run(line: &str) -> OperationResult {
    let command = Command::parse(line).unwrap();
    OperationEngine::new().execute(&command).await
}

#[tokio::test]
async fn test_arithmetic_commands() {
    assert_eq!(run("sum 2 3").await, OperationResult::Scalar(5.0));
    assert_eq!(run("sub 10 3 2").await, OperationResult::Scalar(5.0));
    assert_eq!(run("prod 1.5 4").await, OperationResult::Scalar(6.0));
    assert_eq!(run("div 100 5 2").await, OperationResult::Scalar(10.0));
}

#[tokio::test]
async fn test_arithmetic_without_operands() {
    assert_eq!(
        run("sum").await,
        OperationResult::from(EngineError::MissingOperands)
    );
}

#[tokio::test]
async fn test_division_by_zero_is_inline_error() {
    let result = run("div 10 2 0 5").await;
    assert_eq!(result, OperationResult::from(EngineError::DivisionByZero));
    assert!(result.encode_wire().starts_with("Error:"));
}

#[tokio::test]
async fn test_factorial_commands() {
    assert_eq!(run("fat 0").await, OperationResult::Integer(BigUint::from(1u32)));
    assert_eq!(
        run("fat -1").await,
        OperationResult::from(EngineError::InvalidFactorialInput)
    );

    match run("fat 1000").await {
        OperationResult::Integer(value) => assert_eq!(value.to_string().len(), 2568),
        other => panic!("Expected Integer, got {:?}", other),
    }
}

#[tokio::test]
async fn test_prime_command_keeps_order() {
    assert_eq!(
        run("prim 4 17 1 2").await,
        OperationResult::Booleans(vec![false, true, false, true])
    );
    assert_eq!(
        run("prim").await,
        OperationResult::from(EngineError::MissingOperands)
    );
}

#[tokio::test]
async fn test_news_is_not_computed_here() {
    assert!(run("news").await.is_error());
}

#[tokio::test]
async fn test_same_command_same_result() {
    let engine = OperationEngine::with_workers(2);
    let command = Command::parse("prim 97 98 99").unwrap();

    let first = engine.execute(&command).await;
    let second = engine.execute(&command).await;
    assert_eq!(first, second);
    assert_eq!(engine.prime_workers(), 2);
}

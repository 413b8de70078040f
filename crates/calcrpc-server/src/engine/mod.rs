//! Operation Engine
//!
//! Pure computation behind the `arithmetic` and `number_theory` roles.
//! Identical commands always produce identical results, which is what makes
//! caching them safe.
//!
//! Factorials run on the blocking thread pool; primality checks are spread
//! over a [`PrimePool`] that lives as long as the engine.

pub mod arithmetic;
pub mod factorial;
pub mod primes;

#[cfg(test)]
mod tests;

use calcrpc_common::{Command, EngineError, OpCode, OperationResult};

pub use primes::{PrimePool, DEFAULT_WORKERS};

/// Evaluates arithmetic and number theory commands.
#[derive(Debug, Clone, Default)]
pub struct OperationEngine {
    primes: PrimePool,
}

impl OperationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine whose prime pool has `workers` workers.
    pub fn with_workers(workers: usize) -> Self {
        Self {
            primes: PrimePool::new(workers),
        }
    }

    pub fn prime_workers(&self) -> usize {
        self.primes.workers()
    }

    /// Executes a command.
    ///
    /// Never fails: every problem with the command is reported as an
    /// [`OperationResult::Error`].
    pub async fn execute(&self, command: &Command) -> OperationResult {
        let op = command.op();
        let args = command.args();

        match op {
            OpCode::Sum | OpCode::Sub | OpCode::Prod | OpCode::Div => {
                arithmetic::evaluate(op, args)
            }
            OpCode::Fat => {
                let n = match factorial::parse_argument(args) {
                    Ok(n) => n,
                    Err(e) => return e.into(),
                };
                match tokio::task::spawn_blocking(move || factorial::factorial(n)).await {
                    Ok(value) => OperationResult::Integer(value),
                    Err(e) => {
                        tracing::error!("Factorial task for {} failed: {}", n, e);
                        EngineError::ParseError(format!("factorial of {} failed", n)).into()
                    }
                }
            }
            OpCode::Prim => {
                let values = match primes::parse_arguments(args) {
                    Ok(values) => values,
                    Err(e) => return e.into(),
                };
                match self.primes.check_all(values).await {
                    Ok(flags) => OperationResult::Booleans(flags),
                    Err(e) => e.into(),
                }
            }
            OpCode::News => EngineError::UnknownOperation(op.to_string()).into(),
        }
    }
}

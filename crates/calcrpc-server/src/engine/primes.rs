use std::sync::Arc;

use calcrpc_common::EngineError;
use futures::future::join_all;
use tokio::sync::Semaphore;

/// Number of primality checks allowed to run at once.
pub const DEFAULT_WORKERS: usize = 4;

/// Trial division up to the integer square root. Values below 2 are never prime.
pub fn is_prime(n: i64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }

    // n <= i64::MAX, so d * d cannot overflow u64 before exceeding n
    let n = n as u64;
    let mut d: u64 = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Parses the arguments of `prim`.
pub fn parse_arguments(args: &[String]) -> Result<Vec<i64>, EngineError> {
    if args.is_empty() {
        return Err(EngineError::MissingOperands);
    }

    args.iter()
        .map(|arg| {
            arg.parse::<i64>()
                .map_err(|_| EngineError::ParseError(format!("'{}' is not an integer", arg)))
        })
        .collect()
}

/// Bounded pool for primality checks.
///
/// Lives as long as the engine that owns it. Each check runs on the blocking
/// thread pool once it holds one of the pool's permits, so at most `workers`
/// checks are computing at any time. Results come back in input order
/// whatever order the checks finish in.
#[derive(Debug, Clone)]
pub struct PrimePool {
    permits: Arc<Semaphore>,
    workers: usize,
}

impl PrimePool {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Checks every value and waits for all of them.
    pub async fn check_all(&self, values: Vec<i64>) -> Result<Vec<bool>, EngineError> {
        let checks = values.into_iter().map(|value| {
            let permits = self.permits.clone();
            async move {
                let _permit = permits.acquire_owned().await.map_err(|e| {
                    EngineError::ParseError(format!("prime pool unavailable: {}", e))
                })?;

                tokio::task::spawn_blocking(move || is_prime(value))
                    .await
                    .map_err(|e| EngineError::ParseError(format!("prime check failed: {}", e)))
            }
        });

        join_all(checks).await.into_iter().collect()
    }
}

impl Default for PrimePool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

use std::sync::Arc;

use calcrpc_cache::{Admission, CacheStore};
use calcrpc_common::config::Config;
use calcrpc_common::transport::TcpServer;
use calcrpc_common::{Command, EngineError, OperationResult, Result, ServerRole};
use tokio::sync::Mutex;

use crate::engine::OperationEngine;
use crate::handler::CommandHandler;
use crate::news::HeadlineScraper;

/// calcrpc operation server.
///
/// Serves the opcodes of one [`ServerRole`]. Every request goes through the
/// same path:
///
/// 1. Parse the line; unknown opcodes and opcodes of another role get an
///    inline error.
/// 2. Look the exact command string up in the local cache.
/// 3. On a miss, run the handler and try to admit the result (skipped for
///    opcodes that are never cached).
/// 4. Reply with the wire encoding of the result.
///
/// Connections are handled concurrently; the cache sits behind one mutex so
/// a lookup and an admit each see a consistent store.
pub struct OperationServer {
    role: ServerRole,
    handler: Arc<dyn CommandHandler>,
    cache: Mutex<CacheStore>,
}

impl OperationServer {
    pub fn new(role: ServerRole, handler: Arc<dyn CommandHandler>, cache: CacheStore) -> Self {
        Self {
            role,
            handler,
            cache: Mutex::new(cache),
        }
    }

    /// Builds the server for `role` from the static configuration.
    ///
    /// The cache is loaded from `<cache.directory>/<role>_cache.json`.
    pub fn for_role(role: ServerRole, config: &Config) -> Result<Self> {
        let handler: Arc<dyn CommandHandler> = match role {
            ServerRole::Arithmetic | ServerRole::NumberTheory => Arc::new(OperationEngine::new()),
            ServerRole::News => Arc::new(HeadlineScraper::from_config(&config.news)?),
        };

        let path = config.cache.server_cache_path(role);
        tracing::info!("Using cache file {} for role {}", path.display(), role);
        let cache = CacheStore::load(path, config.cache.max_size_bytes);

        Ok(Self::new(role, handler, cache))
    }

    pub fn role(&self) -> ServerRole {
        self.role
    }

    /// Handles one request line and returns the reply text.
    pub async fn handle_request(&self, line: &str) -> String {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(_) => {
                let op = line.split_whitespace().next().unwrap_or_default();
                tracing::debug!("Rejecting unknown operation '{}'", op);
                return OperationResult::from(EngineError::UnknownOperation(op.to_string()))
                    .encode_wire();
            }
        };

        if !self.role.serves(command.op()) {
            tracing::debug!("Role {} does not serve '{}'", self.role, command.op());
            return OperationResult::from(EngineError::UnknownOperation(
                command.op().to_string(),
            ))
            .encode_wire();
        }

        self.resolve(&command).await.encode_wire()
    }

    async fn resolve(&self, command: &Command) -> OperationResult {
        let op = command.op();
        let key = command.cache_key();

        if op.is_cacheable() {
            let cache = self.cache.lock().await;
            if let Some(value) = cache.get(key) {
                tracing::debug!("Cache hit for '{}'", key);
                return OperationResult::from_cache_value(op.shape(), value);
            }
            tracing::debug!("Cache miss for '{}'", key);
        }

        let result = self.handler.handle(command).await;

        if op.is_cacheable() {
            let mut cache = self.cache.lock().await;
            match cache.put(key, result.to_cache_value()) {
                Ok(Admission::AdmittedAfterEviction { evicted }) => {
                    tracing::debug!("Cached '{}' after evicting '{}'", key, evicted);
                }
                Ok(admission) => tracing::trace!("Cache admission for '{}': {:?}", key, admission),
                Err(e) => tracing::error!("Failed to persist cache entry '{}': {}", key, e),
            }
        }

        result
    }

    /// Binds `bind_addr` and serves connections until the listener fails.
    pub async fn run(self: Arc<Self>, bind_addr: &str) -> Result<()> {
        let server = TcpServer::new(bind_addr).await?;
        tracing::info!(
            "{} server listening on {}",
            self.role,
            server.local_addr()?
        );
        self.serve(server).await
    }

    /// Serves connections on an already bound listener.
    pub async fn serve(self: Arc<Self>, server: TcpServer) -> Result<()> {
        server
            .run_with_handler(move |line| {
                let this = self.clone();
                async move { this.handle_request(&line).await }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Engine wrapper counting how often the handler actually runs
    struct CountingHandler {
        engine: OperationEngine,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CommandHandler for CountingHandler {
        async fn handle(&self, command: &Command) -> OperationResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.engine.execute(command).await
        }
    }

    fn server_with(
        role: ServerRole,
        dir: &tempfile::TempDir,
        max_bytes: usize,
    ) -> (OperationServer, Arc<CountingHandler>) {
        let handler = Arc::new(CountingHandler {
            engine: OperationEngine::new(),
            calls: AtomicUsize::new(0),
        });
        let cache = CacheStore::load(dir.path().join(role.cache_file_name()), max_bytes);
        let server = OperationServer::new(role, handler.clone(), cache);
        (server, handler)
    }

    #[tokio::test]
    async fn test_second_request_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let (server, handler) = server_with(ServerRole::Arithmetic, &dir, 4096);

        assert_eq!(server.handle_request("sum 2 3").await, "5");
        assert_eq!(server.handle_request("sum 2 3").await, "5");
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_key_is_exact_command_text() {
        let dir = tempfile::tempdir().unwrap();
        let (server, handler) = server_with(ServerRole::Arithmetic, &dir, 4096);

        server.handle_request("sum 2 3").await;
        server.handle_request("sum 2.0 3").await;
        assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_prime_results_are_never_cached() {
        let dir = tempfile::tempdir().unwrap();
        let (server, handler) = server_with(ServerRole::NumberTheory, &dir, 4096);

        assert_eq!(
            server.handle_request("prim 4 17 1 2").await,
            "[false,true,false,true]"
        );
        server.handle_request("prim 4 17 1 2").await;
        assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
        assert!(!dir.path().join("number_theory_cache.json").exists());
    }

    #[tokio::test]
    async fn test_factorial_survives_a_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let (server, handler) = server_with(ServerRole::NumberTheory, &dir, 4096);

        assert_eq!(server.handle_request("fat 25").await, "15511210043330985984000000");
        assert_eq!(server.handle_request("fat 25").await, "15511210043330985984000000");
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_persists_across_restarts() {
        let dir = tempfile::tempdir().unwrap();
        {
            let (server, _) = server_with(ServerRole::Arithmetic, &dir, 4096);
            server.handle_request("div 9 2").await;
        }

        let (server, handler) = server_with(ServerRole::Arithmetic, &dir, 4096);
        assert_eq!(server.handle_request("div 9 2").await, "4.5");
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oversized_result_is_still_returned() {
        let dir = tempfile::tempdir().unwrap();
        let (server, _) = server_with(ServerRole::NumberTheory, &dir, 64);

        let reply = server.handle_request("fat 200").await;
        assert_eq!(reply.len(), 375);
        assert!(!dir.path().join("number_theory_cache.json").exists());
    }

    #[tokio::test]
    async fn test_unknown_and_foreign_opcodes() {
        let dir = tempfile::tempdir().unwrap();
        let (server, handler) = server_with(ServerRole::Arithmetic, &dir, 4096);

        assert_eq!(
            server.handle_request("pow 2 3").await,
            "Error: unknown command 'pow'"
        );
        assert_eq!(
            server.handle_request("fat 5").await,
            "Error: unknown command 'fat'"
        );
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_engine_errors_are_cached_inline() {
        let dir = tempfile::tempdir().unwrap();
        let (server, handler) = server_with(ServerRole::Arithmetic, &dir, 4096);

        let first = server.handle_request("div 1 0").await;
        let second = server.handle_request("div 1 0").await;
        assert_eq!(first, "Error: division by zero is not allowed");
        assert_eq!(first, second);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }
}

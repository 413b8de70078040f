use std::path::{Path, PathBuf};
use std::time::Duration;

use calcrpc_cache::CacheStore;
use calcrpc_common::config::Config;
use calcrpc_common::transport::{TcpTransport, UdpTransport};
use calcrpc_common::{CalcrpcError, Command, Liveness, OpCode, OperationResult, Resolution, Result};
use tokio::sync::Mutex;

use crate::memory::MemoryTier;

/// calcrpc client.
///
/// Every call is independent: one registry query, one liveness probe and
/// one connection to the resolved server, with the caches consulted around
/// them. Opcodes that are never cached (`prim`) bypass both tiers even when
/// caching is requested.
pub struct RpcClient {
    registry_addr: String,
    discovery: UdpTransport,
    transport: TcpTransport,
    probe_timeout: Duration,
    memory: Mutex<MemoryTier>,
    disk_path: PathBuf,
    disk_max_bytes: usize,
    write_through: bool,
}

impl RpcClient {
    /// Creates a client for the registry at `registry_addr` with default
    /// timeouts and a disk tier at `client_cache.json`.
    pub fn new(registry_addr: impl Into<String>) -> Self {
        Self {
            registry_addr: registry_addr.into(),
            ..Self::from_config(&Config::default())
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let client = &config.client;

        Self {
            registry_addr: config.registry.addr(),
            discovery: UdpTransport::new()
                .with_timeout(Duration::from_millis(client.discovery_timeout_ms)),
            transport: TcpTransport::new()
                .with_request_timeout(Duration::from_millis(client.request_timeout_ms)),
            probe_timeout: Duration::from_millis(client.probe_timeout_ms),
            memory: Mutex::new(MemoryTier::new(config.cache.ttl())),
            disk_path: client.disk_cache_file.clone(),
            disk_max_bytes: config.cache.max_size_bytes,
            write_through: client.write_through,
        }
    }

    /// Replaces the memory tier with an empty one using `ttl`.
    pub fn with_memory_ttl(mut self, ttl: Duration) -> Self {
        self.memory = Mutex::new(MemoryTier::new(ttl));
        self
    }

    pub fn with_disk_cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.disk_path = path.into();
        self
    }

    pub fn with_write_through(mut self, enabled: bool) -> Self {
        self.write_through = enabled;
        self
    }

    pub fn registry_addr(&self) -> &str {
        &self.registry_addr
    }

    pub fn disk_cache_path(&self) -> &Path {
        &self.disk_path
    }

    /// Executes a command string.
    ///
    /// Engine errors (division by zero, bad arguments, ...) are successful
    /// calls returning [`OperationResult::Error`].
    ///
    /// # Errors
    ///
    /// - `UnknownOperation` if the opcode is not part of the protocol
    /// - `UnsupportedOperation` if the registry knows no server for it
    /// - `ServerUnreachable` if neither the server nor an allowed cache tier
    ///   can answer, including when the registry reply cannot be used
    pub async fn call(&self, command: &str, use_cache: bool) -> Result<OperationResult> {
        let command = Command::parse(command)?;
        self.call_command(&command, use_cache).await
    }

    /// Executes an already parsed command.
    pub async fn call_command(&self, command: &Command, use_cache: bool) -> Result<OperationResult> {
        let op = command.op();
        let key = command.cache_key();
        let use_cache = use_cache && op.is_cacheable();

        if use_cache {
            if let Some(result) = self.memory.lock().await.get(key) {
                tracing::debug!("Memory hit for '{}'", key);
                return Ok(result);
            }
        }

        let addr = match self.discovery.resolve(&self.registry_addr, op.as_str()).await {
            Ok(Resolution::Resolved(addr)) => addr,
            Ok(Resolution::Unsupported(reason)) => {
                return Err(CalcrpcError::UnsupportedOperation(format!("{}: {}", op, reason)));
            }
            Ok(Resolution::NoResponse) => {
                tracing::warn!("Registry {} did not answer for '{}'", self.registry_addr, op);
                return self.disk_fallback(command, use_cache, &self.registry_addr);
            }
            Err(e) => {
                tracing::warn!("Discovery of '{}' via {} failed: {}", op, self.registry_addr, e);
                return self.disk_fallback(command, use_cache, &self.registry_addr);
            }
        };
        tracing::debug!("'{}' is served by {}", op, addr);

        if let Liveness::Unreachable(reason) = TcpTransport::probe(&addr, self.probe_timeout).await {
            tracing::warn!("Server {} is unreachable: {}", addr, reason);
            return self.disk_fallback(command, use_cache, &addr);
        }

        let reply = match self.transport.send_command(&addr, key).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Request to {} failed after a successful probe: {}", addr, e);
                return self.disk_fallback(command, use_cache, &addr);
            }
        };
        let result = OperationResult::decode_wire(op.shape(), &reply);

        if use_cache {
            self.memory.lock().await.insert(key, result.clone());
            if self.write_through {
                self.write_to_disk(key, &result);
            }
        }

        Ok(result)
    }

    /// Looks the command up in the disk tier, loaded fresh from its file.
    fn disk_fallback(&self, command: &Command, use_cache: bool, target: &str) -> Result<OperationResult> {
        if use_cache {
            let store = CacheStore::load(&self.disk_path, self.disk_max_bytes);
            if let Some(value) = store.get(command.cache_key()) {
                tracing::info!("Serving '{}' from the disk cache", command.cache_key());
                return Ok(OperationResult::from_cache_value(command.op().shape(), value));
            }
        }

        Err(CalcrpcError::ServerUnreachable(target.to_string()))
    }

    fn write_to_disk(&self, key: &str, result: &OperationResult) {
        let mut store = CacheStore::load(&self.disk_path, self.disk_max_bytes);
        match store.put(key, result.to_cache_value()) {
            Ok(admission) if !admission.is_admitted() => {
                tracing::debug!("Disk tier declined '{}': {:?}", key, admission);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Failed to write '{}' to the disk cache: {}", key, e),
        }
    }

    pub async fn sum(&self, values: &[f64]) -> Result<OperationResult> {
        self.call_op(OpCode::Sum, values).await
    }

    pub async fn sub(&self, values: &[f64]) -> Result<OperationResult> {
        self.call_op(OpCode::Sub, values).await
    }

    pub async fn prod(&self, values: &[f64]) -> Result<OperationResult> {
        self.call_op(OpCode::Prod, values).await
    }

    pub async fn div(&self, values: &[f64]) -> Result<OperationResult> {
        self.call_op(OpCode::Div, values).await
    }

    pub async fn fat(&self, n: u64) -> Result<OperationResult> {
        self.call_op(OpCode::Fat, [n]).await
    }

    pub async fn prim(&self, values: &[i64]) -> Result<OperationResult> {
        self.call_op(OpCode::Prim, values).await
    }

    pub async fn news(&self) -> Result<OperationResult> {
        self.call_op(OpCode::News, std::iter::empty::<String>()).await
    }

    async fn call_op<I, T>(&self, op: OpCode, args: I) -> Result<OperationResult>
    where
        I: IntoIterator<Item = T>,
        T: std::fmt::Display,
    {
        let command = Command::new(op, args);
        self.call_command(&command, op.is_cacheable()).await
    }
}

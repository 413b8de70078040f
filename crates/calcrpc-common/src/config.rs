//! Static Configuration
//!
//! A single JSON document loaded once at process start. Every field has a
//! default, so a partial file (or no file at all) is valid:
//!
//! ```json
//! {
//!   "registry": { "host": "127.0.0.1", "port": 6000 },
//!   "cache": { "max_size_bytes": 4096, "expiration_minutes": 10 }
//! }
//! ```
//!
//! The path is taken from the `--config` flag, then the `CALCRPC_CONFIG`
//! environment variable, then `calcrpc.json` in the working directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol::error::{CalcrpcError, Result};
use crate::protocol::ServerRole;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "CALCRPC_CONFIG";

/// Configuration file used when neither flag nor environment variable is set.
pub const DEFAULT_CONFIG_PATH: &str = "calcrpc.json";

/// A host and port pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `host:port`, suitable for connecting or binding.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Addresses of the operation servers, one per role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEndpoints {
    pub arithmetic: Endpoint,
    pub number_theory: Endpoint,
    pub news: Endpoint,
}

impl Default for ServerEndpoints {
    fn default() -> Self {
        Self {
            arithmetic: Endpoint::new("127.0.0.1", 7001),
            number_theory: Endpoint::new("127.0.0.1", 7002),
            news: Endpoint::new("127.0.0.1", 7003),
        }
    }
}

/// Limits shared by every cache tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum serialized size of a cache file, in bytes
    pub max_size_bytes: usize,
    /// Time-to-live of the client memory tier, in minutes
    pub expiration_minutes: u64,
    /// Directory holding the server-side cache files
    pub directory: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 4096,
            expiration_minutes: 10,
            directory: PathBuf::from("."),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.expiration_minutes.saturating_mul(60))
    }

    pub fn server_cache_path(&self, role: ServerRole) -> PathBuf {
        self.directory.join(role.cache_file_name())
    }
}

/// Client-side timeouts and disk tier settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub probe_timeout_ms: u64,
    pub discovery_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub disk_cache_file: PathBuf,
    /// Admit successful responses into the disk tier as well as memory
    pub write_through: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 2000,
            discovery_timeout_ms: 2000,
            request_timeout_ms: 30_000,
            disk_cache_file: PathBuf::from("client_cache.json"),
            write_through: true,
        }
    }
}

/// Settings for the headline fetcher behind the `news` role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub url: String,
    pub limit: usize,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            url: "https://www.uol.com.br".to_string(),
            limit: 5,
        }
    }
}

/// Complete static configuration of a calcrpc deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub registry: Endpoint,
    pub servers: ServerEndpoints,
    pub cache: CacheConfig,
    pub client: ClientConfig,
    pub news: NewsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry: Endpoint::new("127.0.0.1", 6000),
            servers: ServerEndpoints::default(),
            cache: CacheConfig::default(),
            client: ClientConfig::default(),
            news: NewsConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CalcrpcError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&text).map_err(|e| {
            CalcrpcError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Loads configuration from a JSON file, using defaults if it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Picks the configuration path: explicit flag, then environment, then default.
    pub fn resolve_path(flag: Option<&str>) -> PathBuf {
        flag.map(PathBuf::from)
            .or_else(|| std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn endpoint(&self, role: ServerRole) -> &Endpoint {
        match role {
            ServerRole::Arithmetic => &self.servers.arithmetic,
            ServerRole::NumberTheory => &self.servers.number_theory,
            ServerRole::News => &self.servers.news,
        }
    }
}

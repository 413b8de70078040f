//! calcrpc Client
//!
//! [`RpcClient`] resolves each command through the registry, checks that the
//! resolved server is alive and then sends the command. Results are kept in
//! two tiers:
//!
//! - a process-local memory tier whose entries expire after a TTL
//! - a disk tier, read fresh on every fallback, used when the server (or
//!   the registry) cannot be reached
//!
//! ```no_run
//! use calcrpc_client::RpcClient;
//! use calcrpc_common::config::Config;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RpcClient::from_config(&Config::default());
//! let result = client.call("sub 10 3 2", true).await?;
//! println!("{}", result.encode_wire());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod memory;

pub use client::RpcClient;
pub use memory::MemoryTier;

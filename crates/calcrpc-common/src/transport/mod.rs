//! calcrpc Transport Layer
//!
//! This module provides the TCP and UDP transports used between clients,
//! the registry and operation servers.
//!
//! # Architecture
//!
//! - **Operation traffic**: TCP, one connection per request. The client sends
//!   the command line terminated by `\n` and half-closes; the server replies
//!   with the encoded result and closes. The server answers after the first
//!   read, so peers that send a bare command and keep the connection open
//!   are served too.
//! - **Discovery traffic**: UDP, one datagram each way.
//!
//! # Components
//!
//! - **[`TcpTransport`]**: Client side of operation traffic, plus liveness probes
//! - **[`TcpServer`]**: Accept loop for operation servers
//! - **[`UdpTransport`]**: Client side of discovery traffic
//! - **[`UdpServer`]**: Receive loop for the registry
//!
//! # Message Size Limits
//!
//! Replies are capped at 100 MB, request lines at 1 MB, datagrams at 64 KB.
//!
//! # Example
//!
//! ```no_run
//! use calcrpc_common::transport::TcpTransport;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = TcpTransport::new();
//! let reply = transport.send_command("127.0.0.1:7001", "sum 2 3").await?;
//! assert_eq!(reply, "5");
//! # Ok(())
//! # }
//! ```

pub mod tcp;
pub mod tcp_server;
pub mod udp;

pub use tcp::TcpTransport;
pub use tcp_server::TcpServer;
pub use udp::{UdpServer, UdpTransport};

/// Maximum size of a reply read by a client (100 MB)
pub const MAX_RESPONSE_SIZE: usize = 100 * 1024 * 1024;

/// Maximum size of a request line read by a server (1 MB)
pub const MAX_REQUEST_SIZE: usize = 1024 * 1024;

/// Maximum size of a discovery datagram (64 KB)
pub const MAX_DATAGRAM_SIZE: usize = 64 * 1024;

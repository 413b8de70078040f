//! calcrpc Common Types and Transport
//!
//! This crate provides the protocol definitions, static configuration and the
//! network transports shared by every calcrpc component.
//!
//! # Overview
//!
//! calcrpc is a small distributed RPC platform made of three kinds of process:
//!
//! - **Registry**: a UDP discovery service mapping an operation name to the
//!   address of the server that implements it
//! - **Operation servers**: TCP servers that execute commands and keep a
//!   bounded on-disk cache of their results
//! - **Clients**: resolve, call, and cache results in memory and on disk
//!
//! # Wire Protocols
//!
//! Both protocols are plain UTF-8 text, one message per round trip:
//!
//! - **Discovery (UDP)**: request is the operation identifier, response is a
//!   JSON object `{"server_ip": ..., "server_port": ...}` or `{"error": ...}`
//! - **Operation (TCP)**: request is the command line `"<opcode> <arg> ..."`,
//!   response is either bare text or a JSON array depending on the opcode
//!
//! # Components
//!
//! - [`protocol`] - Commands, opcodes, results, discovery messages and errors
//! - [`config`] - Static configuration loaded once at process start
//! - [`transport`] - TCP and UDP transports
//!
//! # Example
//!
//! ```
//! use calcrpc_common::{Command, OpCode, OperationResult};
//!
//! let command = Command::parse("sum 2 3").unwrap();
//! assert_eq!(command.op(), OpCode::Sum);
//! assert_eq!(command.cache_key(), "sum 2 3");
//!
//! let result = OperationResult::decode_wire(command.op().shape(), "5");
//! assert_eq!(result, OperationResult::Scalar(5.0));
//! ```

pub mod config;
pub mod protocol;
pub mod transport;

pub use config::Config;
pub use protocol::*;

pub mod command;
pub mod discovery;
pub mod error;
pub mod result;
pub mod role;


pub use command::{Command, OpCode, Shape};
pub use discovery::{DiscoveryResponse, Liveness, PortField, Resolution};
pub use error::{CalcrpcError, Result};
pub use result::{EngineError, OperationResult, ERROR_PREFIX};
pub use role::ServerRole;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalcrpcError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown operation: '{0}'")]
    UnknownOperation(String),

    #[error("Unsupported operation at registry: {0}")]
    UnsupportedOperation(String),

    #[error("Server {0} is unreachable and no cached result is available")]
    ServerUnreachable(String),
}

pub type Result<T> = std::result::Result<T, CalcrpcError>;

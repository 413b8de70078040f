//! Discovery Messages
//!
//! The registry answers a UDP datagram carrying an operation identifier with
//! one JSON object:
//!
//! ```text
//! {"server_ip": "127.0.0.1", "server_port": "7001"}
//! {"error": "unsupported operation"}
//! ```
//!
//! `server_port` may be sent either as a string or as an integer.

use serde::{Deserialize, Serialize};

use super::error::{CalcrpcError, Result};

/// A port as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortField {
    Number(u16),
    Text(String),
}

impl PortField {
    pub fn as_port(&self) -> Result<u16> {
        match self {
            PortField::Number(port) => Ok(*port),
            PortField::Text(text) => text.trim().parse::<u16>().map_err(|e| {
                CalcrpcError::InvalidResponse(format!("Invalid port '{}': {}", text, e))
            }),
        }
    }
}

/// Body of a registry reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiscoveryResponse {
    Resolved {
        server_ip: String,
        server_port: PortField,
    },
    Unsupported {
        error: String,
    },
}

impl DiscoveryResponse {
    pub fn resolved(host: impl Into<String>, port: u16) -> Self {
        DiscoveryResponse::Resolved {
            server_ip: host.into(),
            server_port: PortField::Text(port.to_string()),
        }
    }

    pub fn unsupported(reason: impl Into<String>) -> Self {
        DiscoveryResponse::Unsupported {
            error: reason.into(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Converts the reply into a resolution outcome.
    pub fn into_resolution(self) -> Result<Resolution> {
        match self {
            DiscoveryResponse::Resolved {
                server_ip,
                server_port,
            } => Ok(Resolution::Resolved(format!(
                "{}:{}",
                server_ip,
                server_port.as_port()?
            ))),
            DiscoveryResponse::Unsupported { error } => Ok(Resolution::Unsupported(error)),
        }
    }
}

/// Extracts the operation identifier from a discovery datagram.
///
/// Only the first token matters; anything after it is ignored.
pub fn operation_token(datagram: &str) -> &str {
    datagram.split_whitespace().next().unwrap_or("")
}

/// Outcome of asking the registry where an operation lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// `host:port` of the server implementing the operation
    Resolved(String),
    /// The registry knows no server for the operation
    Unsupported(String),
    /// The registry did not answer in time
    NoResponse,
}

/// Outcome of a liveness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Liveness {
    Alive,
    Unreachable(String),
}

impl Liveness {
    pub fn is_alive(&self) -> bool {
        matches!(self, Liveness::Alive)
    }
}

use std::time::Duration;

use tokio::net::UdpSocket;

use crate::protocol::discovery::{DiscoveryResponse, Resolution};
use crate::protocol::error::{CalcrpcError, Result};
use crate::transport::MAX_DATAGRAM_SIZE;

/// Default time to wait for a registry reply (2 seconds)
const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Client side of the discovery protocol.
///
/// Sends one datagram carrying the operation identifier and waits for one
/// reply. A missing reply is not an error: it resolves to
/// [`Resolution::NoResponse`] so the caller can fall back to its caches.
#[derive(Debug, Clone)]
pub struct UdpTransport {
    timeout: Duration,
}

impl UdpTransport {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_DISCOVERY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Asks the registry at `registry_addr` where `operation` is served.
    ///
    /// # Errors
    ///
    /// Returns an error only if a local socket cannot be created or the reply
    /// is malformed. Send failures and timeouts map to `NoResponse`.
    pub async fn resolve(&self, registry_addr: &str, operation: &str) -> Result<Resolution> {
        let socket = UdpSocket::bind(local_bind_addr(registry_addr))
            .await
            .map_err(|e| CalcrpcError::Transport(format!("Failed to open UDP socket: {}", e)))?;

        if let Err(e) = socket.send_to(operation.as_bytes(), registry_addr).await {
            tracing::warn!("Failed to reach registry at {}: {}", registry_addr, e);
            return Ok(Resolution::NoResponse);
        }

        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        let len = match tokio::time::timeout(self.timeout, socket.recv_from(&mut buf)).await {
            Ok(Ok((len, _))) => len,
            Ok(Err(e)) => {
                tracing::warn!("Registry at {} did not answer: {}", registry_addr, e);
                return Ok(Resolution::NoResponse);
            }
            Err(_) => {
                tracing::warn!(
                    "Registry at {} did not answer within {}ms",
                    registry_addr,
                    self.timeout.as_millis()
                );
                return Ok(Resolution::NoResponse);
            }
        };

        DiscoveryResponse::decode(&buf[..len])
            .map_err(|e| CalcrpcError::InvalidResponse(format!("Bad registry reply: {}", e)))?
            .into_resolution()
    }
}

impl Default for UdpTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Picks an ephemeral local address in the same family as the target.
fn local_bind_addr(target: &str) -> &'static str {
    if target.starts_with('[') {
        "[::]:0"
    } else {
        "0.0.0.0:0"
    }
}

/// Receive loop for the registry.
///
/// Every datagram is handed to a synchronous handler and its reply is sent
/// back to the sender. The handler must be cheap: datagrams are processed
/// one at a time.
pub struct UdpServer {
    socket: UdpSocket,
}

impl UdpServer {
    /// Binds the server to `bind_addr` (e.g., "0.0.0.0:6000").
    pub async fn new(bind_addr: &str) -> Result<Self> {
        let socket = UdpSocket::bind(bind_addr).await.map_err(|e| {
            CalcrpcError::Connection(format!("Failed to bind to {}: {}", bind_addr, e))
        })?;

        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        self.socket
            .local_addr()
            .map_err(|e| CalcrpcError::Connection(format!("Failed to get local addr: {}", e)))
    }

    /// Runs the receive loop forever.
    pub async fn run_with_handler<F>(&self, handler: F) -> Result<()>
    where
        F: Fn(&[u8]) -> Vec<u8>,
    {
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

        loop {
            let (len, peer) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    // ICMP errors from earlier replies surface here on some platforms
                    tracing::warn!("Failed to receive datagram: {}", e);
                    continue;
                }
            };

            let reply = handler(&buf[..len]);
            if let Err(e) = self.socket.send_to(&reply, peer).await {
                tracing::warn!("Failed to reply to {}: {}", peer, e);
            }
        }
    }
}

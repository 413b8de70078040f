use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::protocol::error::{CalcrpcError, Result};
use crate::transport::MAX_REQUEST_SIZE;

/// How long a connection may take to deliver its request.
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Async TCP server for operation servers.
///
/// Each accepted connection carries exactly one request and receives
/// exactly one reply. Connections are served on their own task; handlers
/// that share state must guard it themselves.
pub struct TcpServer {
    listener: TcpListener,
}

impl TcpServer {
    /// Creates a new TCP server bound to the specified address.
    ///
    /// # Arguments
    /// * `bind_addr` - The address to bind to (e.g., "0.0.0.0:7001")
    pub async fn new(bind_addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(bind_addr).await.map_err(|e| {
            CalcrpcError::Connection(format!("Failed to bind to {}: {}", bind_addr, e))
        })?;

        Ok(Self { listener })
    }

    /// Gets the actual bound address.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| CalcrpcError::Connection(format!("Failed to get local addr: {}", e)))
    }

    /// Runs the server with the given request handler.
    ///
    /// The handler receives the trimmed request and returns the reply text.
    /// Connections that close without sending anything (liveness probes) are
    /// dropped silently.
    pub async fn run_with_handler<F, Fut>(&self, handler: F) -> Result<()>
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = String> + Send + 'static,
    {
        let handler = Arc::new(handler);

        loop {
            let (stream, peer_addr) = self.listener.accept().await.map_err(|e| {
                CalcrpcError::Connection(format!("Failed to accept connection: {}", e))
            })?;

            tracing::debug!("Connection established from {}", peer_addr);

            let handler = handler.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, handler).await {
                    tracing::error!("Connection error from {}: {}", peer_addr, e);
                }
            });
        }
    }
}

/// Serves a single connection: one request in, one reply out.
///
/// The request is whatever the first read delivers, cut at the first `\n`.
/// Peers are not required to terminate the command or half-close before
/// waiting for the reply.
async fn handle_connection<F, Fut>(mut stream: TcpStream, handler: Arc<F>) -> Result<()>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = String> + Send + 'static,
{
    let mut buf = vec![0u8; MAX_REQUEST_SIZE];
    let n = match tokio::time::timeout(READ_TIMEOUT, stream.read(&mut buf)).await {
        Ok(Ok(n)) => n,
        Ok(Err(e)) => {
            return Err(CalcrpcError::Connection(format!("Failed to read request: {}", e)));
        }
        Err(_) => return Err(CalcrpcError::Timeout(READ_TIMEOUT.as_millis() as u64)),
    };

    let line = request_line(&buf[..n]);
    if line.is_empty() {
        tracing::trace!("Connection closed without a request");
        return Ok(());
    }

    let reply = handler(line).await;

    stream
        .write_all(reply.as_bytes())
        .await
        .map_err(|e| CalcrpcError::Connection(format!("Failed to send reply: {}", e)))?;
    stream
        .shutdown()
        .await
        .map_err(|e| CalcrpcError::Connection(format!("Failed to close connection: {}", e)))?;

    Ok(())
}

fn request_line(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == b'\n').unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim().to_string()
}

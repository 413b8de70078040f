use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::protocol::error::{CalcrpcError, Result};
use crate::protocol::Liveness;
use crate::transport::MAX_RESPONSE_SIZE;

/// Default timeout for establishing a connection (5 seconds)
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for a whole request/reply exchange (30 seconds)
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Async TCP transport for operation traffic.
///
/// Every call opens a fresh connection, so concurrent calls never share a
/// stream.
///
/// # Wire Protocol
///
/// ```text
/// client -> server: "<opcode> <arg1> <arg2> ...\n", then half-close
/// server -> client: encoded result, then close
/// ```
///
/// # Example
///
/// ```no_run
/// use calcrpc_common::transport::TcpTransport;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = TcpTransport::new().with_request_timeout(Duration::from_secs(60));
/// let reply = transport.send_command("127.0.0.1:7002", "fat 20").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TcpTransport {
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl TcpTransport {
    /// Creates a transport with default timeouts.
    pub fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Connects to a remote endpoint.
    ///
    /// # Arguments
    ///
    /// * `addr` - The address to connect to (e.g., "127.0.0.1:7001")
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if the connection is not established within the
    /// connect timeout, `Connection` if it is refused.
    pub async fn connect(&self, addr: &str) -> Result<TcpStream> {
        match tokio::time::timeout(self.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(CalcrpcError::Connection(format!(
                "Failed to connect to {}: {}",
                addr, e
            ))),
            Err(_) => Err(CalcrpcError::Timeout(self.connect_timeout.as_millis() as u64)),
        }
    }

    /// Sends a command line and returns the raw reply text.
    ///
    /// # Arguments
    ///
    /// * `addr` - Address of the operation server
    /// * `command` - The exact command string, without a line terminator
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails, the exchange exceeds the
    /// request timeout, the reply is larger than 100 MB or is not UTF-8.
    pub async fn send_command(&self, addr: &str, command: &str) -> Result<String> {
        let mut stream = self.connect(addr).await?;

        let exchange = async {
            stream
                .write_all(format!("{}\n", command).as_bytes())
                .await
                .map_err(|e| Self::map_io_error(e, "writing command"))?;
            stream
                .shutdown()
                .await
                .map_err(|e| Self::map_io_error(e, "closing write half"))?;

            let mut buf = Vec::new();
            (&mut stream)
                .take(MAX_RESPONSE_SIZE as u64 + 1)
                .read_to_end(&mut buf)
                .await
                .map_err(|e| Self::map_io_error(e, "reading reply"))?;

            if buf.len() > MAX_RESPONSE_SIZE {
                return Err(CalcrpcError::InvalidResponse(format!(
                    "Reply too large (max {} bytes)",
                    MAX_RESPONSE_SIZE
                )));
            }

            String::from_utf8(buf)
                .map_err(|e| CalcrpcError::InvalidResponse(format!("Reply is not UTF-8: {}", e)))
        };

        tokio::time::timeout(self.request_timeout, exchange)
            .await
            .map_err(|_| CalcrpcError::Timeout(self.request_timeout.as_millis() as u64))?
    }

    /// Checks whether a server accepts connections.
    ///
    /// Opens a connection with the given timeout and closes it immediately
    /// without sending anything.
    pub async fn probe(addr: &str, timeout: Duration) -> Liveness {
        match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => Liveness::Alive,
            Ok(Err(e)) => Liveness::Unreachable(e.to_string()),
            Err(_) => Liveness::Unreachable(format!(
                "no answer within {}ms",
                timeout.as_millis()
            )),
        }
    }

    /// Map IO errors to appropriate CalcrpcError variants
    ///
    /// - Timeouts/would block -> `Timeout`
    /// - Connection errors -> `Connection`
    /// - Other IO errors -> `Io`
    fn map_io_error(err: std::io::Error, context: &str) -> CalcrpcError {
        match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                CalcrpcError::Timeout(DEFAULT_REQUEST_TIMEOUT.as_millis() as u64)
            }
            std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected
            | std::io::ErrorKind::BrokenPipe => {
                CalcrpcError::Connection(format!("{}: Connection lost", context))
            }
            _ => CalcrpcError::Io(err),
        }
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

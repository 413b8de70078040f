use calcrpc_common::protocol::discovery::operation_token;
use calcrpc_common::transport::UdpServer;
use calcrpc_common::{DiscoveryResponse, Result};

use crate::index::RegistryIndex;

/// Reason sent back when no server lists the requested operation.
pub const UNSUPPORTED_REASON: &str = "unsupported operation";

/// Discovery endpoint.
///
/// Read-only over its index, so duplicate or reordered datagrams are
/// harmless: each one gets the same answer.
#[derive(Debug, Clone)]
pub struct DiscoveryService {
    index: RegistryIndex,
}

impl DiscoveryService {
    pub fn new(index: RegistryIndex) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &RegistryIndex {
        &self.index
    }

    /// Answers a request text. Only its first token is looked at.
    pub fn respond(&self, request: &str) -> DiscoveryResponse {
        let operation = operation_token(request);

        match self.index.resolve(operation) {
            Some(entry) => {
                tracing::debug!(
                    "Resolved '{}' to {} at {}",
                    operation,
                    entry.name,
                    entry.endpoint.addr()
                );
                DiscoveryResponse::resolved(entry.endpoint.host.clone(), entry.endpoint.port)
            }
            None => {
                tracing::debug!("No server for '{}'", operation);
                DiscoveryResponse::unsupported(UNSUPPORTED_REASON)
            }
        }
    }

    /// Answers a raw datagram with the encoded reply.
    pub fn handle_datagram(&self, datagram: &[u8]) -> Vec<u8> {
        let request = String::from_utf8_lossy(datagram);
        let response = self.respond(&request);

        match response.encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Failed to encode discovery reply: {}", e);
                br#"{"error":"internal error"}"#.to_vec()
            }
        }
    }

    /// Binds `bind_addr` and answers datagrams until the process exits.
    pub async fn run(&self, bind_addr: &str) -> Result<()> {
        let server = UdpServer::new(bind_addr).await?;
        self.serve(server).await
    }

    /// Answers datagrams on an already bound socket.
    pub async fn serve(&self, server: UdpServer) -> Result<()> {
        tracing::info!(
            "Registry listening on {} with {} servers",
            server.local_addr()?,
            self.index.len()
        );
        server
            .run_with_handler(|datagram| self.handle_datagram(datagram))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calcrpc_common::config::Config;
    use calcrpc_common::Resolution;

    fn service() -> DiscoveryService {
        DiscoveryService::new(RegistryIndex::from_config(&Config::default()))
    }

    #[test]
    fn test_respond_resolved() {
        assert_eq!(
            service().respond("prim"),
            DiscoveryResponse::resolved("127.0.0.1", 7002)
        );
    }

    #[test]
    fn test_trailing_text_is_ignored() {
        assert_eq!(
            service().respond("sum 2 3\n"),
            DiscoveryResponse::resolved("127.0.0.1", 7001)
        );
    }

    #[test]
    fn test_respond_unsupported() {
        assert_eq!(
            service().respond("solve x^2"),
            DiscoveryResponse::unsupported(UNSUPPORTED_REASON)
        );
    }

    #[test]
    fn test_datagram_reply_decodes() {
        let reply = service().handle_datagram(b"news");
        let resolution = DiscoveryResponse::decode(&reply)
            .unwrap()
            .into_resolution()
            .unwrap();
        assert_eq!(resolution, Resolution::Resolved("127.0.0.1:7003".to_string()));
    }

    #[test]
    fn test_invalid_utf8_is_unsupported() {
        let reply = service().handle_datagram(&[0xff, 0xfe, 0x00]);
        let response = DiscoveryResponse::decode(&reply).unwrap();
        assert!(matches!(response, DiscoveryResponse::Unsupported { .. }));
    }
}

// Integration tests for calcrpc-server
//
// These tests bind real operation servers on loopback ports and talk to them
// through the TCP transport the client uses.

use calcrpc_cache::CacheStore;
use calcrpc_common::transport::{TcpServer, TcpTransport};
use calcrpc_common::ServerRole;
use calcrpc_server::{OperationEngine, OperationServer};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Test Helpers
// ============================================================================

async fn spawn_server(role: ServerRole, dir: &tempfile::TempDir) -> String {
    let cache = CacheStore::load(dir.path().join(role.cache_file_name()), 4096);
    let server = Arc::new(OperationServer::new(
        role,
        Arc::new(OperationEngine::new()),
        cache,
    ));

    let listener = TcpServer::new("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });
    addr
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_arithmetic_over_tcp() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_server(ServerRole::Arithmetic, &dir).await;
    let transport = TcpTransport::new();

    assert_eq!(transport.send_command(&addr, "sum 2 3").await.unwrap(), "5");
    assert_eq!(transport.send_command(&addr, "sub 10 3 2").await.unwrap(), "5");
    assert_eq!(
        transport.send_command(&addr, "div 1 0").await.unwrap(),
        "Error: division by zero is not allowed"
    );
}

#[tokio::test]
async fn test_results_land_in_role_cache_file() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_server(ServerRole::Arithmetic, &dir).await;

    TcpTransport::new()
        .send_command(&addr, "prod 2 3 4")
        .await
        .unwrap();

    let cached: serde_json::Value = serde_json::from_slice(
        &std::fs::read(dir.path().join("arithmetic_cache.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(cached["prod 2 3 4"], serde_json::json!(24.0));
}

#[tokio::test]
async fn test_probe_leaves_server_usable() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_server(ServerRole::NumberTheory, &dir).await;

    let liveness = TcpTransport::probe(&addr, Duration::from_secs(2)).await;
    assert!(liveness.is_alive());

    let reply = TcpTransport::new()
        .send_command(&addr, "prim 4 17 1 2")
        .await
        .unwrap();
    assert_eq!(reply, "[false,true,false,true]");
}

#[tokio::test]
async fn test_concurrent_requests_share_one_cache() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_server(ServerRole::NumberTheory, &dir).await;
    let transport = TcpTransport::new();

    let requests = (1..=10).map(|n| {
        let transport = transport.clone();
        let addr = addr.clone();
        async move { transport.send_command(&addr, &format!("fat {}", n)).await }
    });
    let replies = futures::future::join_all(requests).await;

    let mut expected: u64 = 1;
    for (i, reply) in replies.into_iter().enumerate() {
        expected *= i as u64 + 1;
        assert_eq!(reply.unwrap(), expected.to_string());
    }

    let store = CacheStore::load(dir.path().join("number_theory_cache.json"), 4096);
    assert_eq!(store.len(), 10);
}

#[tokio::test]
async fn test_bare_command_is_answered_without_half_close() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_server(ServerRole::Arithmetic, &dir).await;

    let mut stream = tokio::net::TcpStream::connect(&addr).await.unwrap();
    stream.write_all(b"sum 2 3").await.unwrap();

    let mut reply = String::new();
    tokio::time::timeout(Duration::from_secs(3), stream.read_to_string(&mut reply))
        .await
        .expect("no reply to an unterminated command")
        .unwrap();
    assert_eq!(reply, "5");
}

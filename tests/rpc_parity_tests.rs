//! The RPC front-end returns the same data and error codes as REST.

mod test_utils;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use reposync::rpc::{RpcClient, RpcError, RpcRequest, RpcResponse, RpcServer};
use serde_json::Value;
use test_utils::{TestEnv, mount_commits, mount_repository};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

struct RpcHarness {
    shutdown: CancellationToken,
    handle: JoinHandle<std::io::Result<()>>,
}

impl RpcHarness {
    fn start(env: &TestEnv) -> Self {
        let server = RpcServer::bind(&env.socket_path(), env.service.clone()).unwrap();
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(server.serve(shutdown.clone()));
        Self { shutdown, handle }
    }

    async fn stop(self) {
        self.shutdown.cancel();
        self.handle.await.unwrap().unwrap();
    }
}

async fn rest_get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn reads_match_rest() {
    let env = TestEnv::new(&["octo/hello", "octo/world"]).await.unwrap();
    mount_repository(&env.github, "octo/hello", 10).await;
    mount_repository(&env.github, "octo/world", 20).await;
    mount_commits(&env.github, "octo/hello", &["s3", "s2", "s1"]).await;
    let rpc = RpcHarness::start(&env);
    let app = env.app();

    let mut client = RpcClient::connect(&env.socket_path()).await.unwrap();
    let synced = client.sync_repositories(Vec::new()).await.unwrap();
    assert_eq!(synced.synced_count, 2);
    let synced = client.sync_commits("octo/hello", 0).await.unwrap();
    assert_eq!(synced.synced_count, 3);

    let over_rpc = client.get_repositories().await.unwrap();
    let (_, over_rest) = rest_get(&app, "/api/v1/repositories").await;
    assert_eq!(serde_json::to_value(&over_rpc).unwrap(), over_rest);
    assert_eq!(over_rpc.repositories[0].full_name, "octo/world");

    let over_rpc = client.get_repository("octo/hello").await.unwrap();
    let (_, over_rest) = rest_get(&app, "/api/v1/repositories/octo/hello").await;
    assert_eq!(serde_json::to_value(&over_rpc).unwrap(), over_rest);

    let over_rpc = client.get_commits("octo/hello", 2, 1).await.unwrap();
    let (_, over_rest) = rest_get(&app, "/api/v1/commits/octo/hello?limit=2&offset=1").await;
    assert_eq!(serde_json::to_value(&over_rpc).unwrap(), over_rest);
    assert_eq!(over_rpc.total, 3);
    assert_eq!(over_rpc.commits[0].sha, "s2");

    let health = client.health().await.unwrap();
    let (_, over_rest) = rest_get(&app, "/api/v1/health").await;
    assert_eq!(serde_json::to_value(&health).unwrap(), over_rest);

    drop(client);
    rpc.stop().await;
}

#[tokio::test]
async fn errors_carry_rest_codes() {
    let env = TestEnv::new(&[]).await.unwrap();
    let rpc = RpcHarness::start(&env);
    let app = env.app();
    let mut client = RpcClient::connect(&env.socket_path()).await.unwrap();

    let err = client.get_repository("octo/missing").await.unwrap_err();
    let (status, over_rest) = rest_get(&app, "/api/v1/repositories/octo/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    match err {
        RpcError::Remote { code, .. } => assert_eq!(code, over_rest["code"]),
        other => panic!("expected remote error, got {other:?}"),
    }

    let err = client.sync_commits_all(Vec::new(), 0).await.unwrap_err();
    assert!(matches!(err, RpcError::Remote { ref code, .. } if code == "NO_TARGETS"));

    // The connection stays usable after an error response.
    let response = client.call(&RpcRequest::Health).await.unwrap();
    assert!(matches!(response, RpcResponse::Health(_)));

    drop(client);
    rpc.stop().await;
}

#[tokio::test]
async fn malformed_frame_gets_invalid_request() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let env = TestEnv::new(&[]).await.unwrap();
    let rpc = RpcHarness::start(&env);

    let mut stream = tokio::net::UnixStream::connect(env.socket_path())
        .await
        .unwrap();
    let payload = br#"{"method":"NoSuchMethod"}"#;
    stream
        .write_all(&(payload.len() as u32).to_le_bytes())
        .await
        .unwrap();
    stream.write_all(payload).await.unwrap();

    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await.unwrap();
    let mut body = vec![0u8; u32::from_le_bytes(len_buf) as usize];
    stream.read_exact(&mut body).await.unwrap();

    let response: RpcResponse = serde_json::from_slice(&body).unwrap();
    assert!(matches!(response, RpcResponse::Error { ref code, .. } if code == "INVALID_REQUEST"));

    drop(stream);
    rpc.stop().await;
}

#[tokio::test]
async fn shutdown_removes_socket_file() {
    let env = TestEnv::new(&[]).await.unwrap();
    let rpc = RpcHarness::start(&env);
    assert!(env.socket_path().exists());

    rpc.stop().await;

    assert!(!env.socket_path().exists());
}

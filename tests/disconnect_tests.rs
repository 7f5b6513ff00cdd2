//! Sync work started over REST finishes even when the client goes away.

mod test_utils;

use std::time::Duration;

use test_utils::{TestEnv, repository_json};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn repository_sync_survives_client_disconnect() {
    let env = TestEnv::new(&[]).await.unwrap();
    Mock::given(method("GET"))
        .and(path("/repos/octo/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(repository_json("octo/slow", 7))
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&env.github)
        .await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = env.app();
    tokio::spawn(async move { axum::serve(listener, app).await });

    let body = r#"{"repository_urls": ["https://github.com/octo/slow"]}"#;
    let request = format!(
        "POST /api/v1/repositories/sync HTTP/1.1\r\n\
         Host: {addr}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         \r\n\
         {body}",
        body.len()
    );
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    // Hang up while GitHub is still answering.
    tokio::time::sleep(Duration::from_millis(200)).await;
    drop(stream);

    let mut stored = None;
    for _ in 0..30 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if let Ok(repo) = env.service.get_repository("octo/slow").await {
            stored = Some(repo);
            break;
        }
    }

    let repo = stored.expect("repository written after the client disconnected");
    assert_eq!(repo.stars, 7);
}

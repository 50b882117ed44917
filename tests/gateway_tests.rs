mod common;

use common::{bypass_proxy, config_for, ok, spawn_backend, Reply};
use serde_json::json;
use vidify::api::backend::BackendGateway;
use vidify::models::session::SessionToken;
use vidify::{Config, SearchKind, Status};

#[tokio::test]
async fn test_transcript_request_shape() {
    let backend = spawn_backend(|_| {
        ok(json!({"results": [{"text": "never gonna", "timestamp": "0:43"}]}))
    })
    .await;
    let gateway = BackendGateway::new(&config_for(&backend)).unwrap();
    let token = SessionToken {
        token: "secret-token".to_string(),
        expires_at: u64::MAX,
    };

    let envelope = gateway
        .call(SearchKind::Transcript, "dQw4w9WgXcQ", "never gonna", Some(&token))
        .await;

    assert_eq!(envelope.status, Status::Success);
    let request = backend.last_request();
    let request_line = request.lines().next().unwrap();
    assert!(request_line.starts_with("GET /transcript_search?"));
    assert!(request_line.contains("yt_url=dQw4w9WgXcQ"));
    assert!(request_line.contains("keyword=never"));
    assert!(request.to_lowercase().contains("authorization: bearer secret-token"));
}

#[tokio::test]
async fn test_toc_request_has_no_keyword() {
    let backend = spawn_backend(|_| ok(json!({"results": [{"object": "car", "timestamps": [1.0]}]}))).await;
    let gateway = BackendGateway::new(&config_for(&backend)).unwrap();

    let envelope = gateway.call(SearchKind::Toc, "dQw4w9WgXcQ", "", None).await;

    assert_eq!(envelope.status, Status::Success);
    let request = backend.last_request();
    assert!(request.starts_with("GET /object_search?yt_url=dQw4w9WgXcQ "));
    assert!(!request.to_lowercase().contains("authorization"));
}

#[tokio::test]
async fn test_error_status_surfaces_body_message() {
    let backend = spawn_backend(|_| Reply::Respond(404, r#"{"message":"boom"}"#.to_string())).await;
    let gateway = BackendGateway::new(&config_for(&backend)).unwrap();

    let envelope = gateway.call(SearchKind::Object, "dQw4w9WgXcQ", "car", None).await;

    assert_eq!(envelope.status, Status::Error);
    assert_eq!(envelope.message.as_deref(), Some("boom"));
}

#[tokio::test]
async fn test_non_json_body_is_quoted() {
    let backend = spawn_backend(|_| Reply::Respond(200, "not json".to_string())).await;
    let gateway = BackendGateway::new(&config_for(&backend)).unwrap();

    let envelope = gateway.call(SearchKind::Transcript, "dQw4w9WgXcQ", "x", None).await;

    assert_eq!(envelope.status, Status::Error);
    assert!(envelope.message.unwrap().contains("not json"));
}

#[tokio::test]
async fn test_timeout_becomes_error_without_retry() {
    let backend = spawn_backend(|_| Reply::Hang).await;
    let config = Config {
        detection_timeout_ms: 200,
        ..config_for(&backend)
    };
    let gateway = BackendGateway::new(&config).unwrap();

    let envelope = gateway.call(SearchKind::Object, "dQw4w9WgXcQ", "car", None).await;

    assert_eq!(envelope.status, Status::Error);
    assert!(envelope.message.unwrap().contains("timed out after 200 ms"));
    assert_eq!(backend.hits(), 1);
}

#[tokio::test]
async fn test_transcript_search_uses_transcript_timeout() {
    let backend = spawn_backend(|_| Reply::Hang).await;
    let config = Config {
        transcript_timeout_ms: 150,
        detection_timeout_ms: 30_000,
        ..config_for(&backend)
    };
    let gateway = BackendGateway::new(&config).unwrap();

    let envelope = gateway.call(SearchKind::Transcript, "dQw4w9WgXcQ", "never", None).await;

    assert_eq!(envelope.status, Status::Error);
    assert!(envelope.message.unwrap().contains("timed out after 150 ms"));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    bypass_proxy();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let config = Config {
        backend_url: url,
        ..Config::default()
    };
    let gateway = BackendGateway::new(&config).unwrap();

    let envelope = gateway.call(SearchKind::Transcript, "dQw4w9WgXcQ", "x", None).await;

    assert_eq!(envelope.status, Status::Error);
    assert!(envelope.message.unwrap().starts_with("Network error"));
}

#[tokio::test]
async fn test_validate_and_request_token() {
    let backend = spawn_backend(|target| {
        if target.starts_with("/auth/token") {
            ok(json!({"token": "issued", "expires_at": 4102444800.5}))
        } else if target.starts_with("/auth/validate") {
            ok(json!({"valid": true, "user": {"name": "Rick"}}))
        } else {
            Reply::Respond(404, "{}".to_string())
        }
    })
    .await;
    let gateway = BackendGateway::new(&config_for(&backend)).unwrap();

    let token = gateway.request_token("vidify-test").await.unwrap();
    assert_eq!(token.token, "issued");
    assert_eq!(token.expires_at, 4102444800);
    assert!(backend
        .last_request()
        .to_lowercase()
        .contains("x-extension-id: vidify-test"));

    let status = gateway.validate_token("issued").await.unwrap();
    assert!(status.valid);
    assert_eq!(status.user, Some(json!({"name": "Rick"})));
}

#[tokio::test]
async fn test_rejected_token_is_invalid_not_error() {
    let backend = spawn_backend(|_| Reply::Respond(401, r#"{"message":"expired"}"#.to_string())).await;
    let gateway = BackendGateway::new(&config_for(&backend)).unwrap();

    let status = gateway.validate_token("stale").await.unwrap();
    assert!(!status.valid);
}

use std::time::{Duration, Instant};

use wayback_save_client::http_client::ReqwestSaveClient;
use wayback_save_client::progress::NoopProgress;
use wayback_save_client::{ErrorKind, PollingEngine, SaveClient, SaveError, Status};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ReqwestSaveClient {
    ReqwestSaveClient::new(&server.uri(), Duration::from_secs(5), false).expect("client")
}

#[tokio::test]
async fn poll_parses_pending_with_retry_hint() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "job_id": "abc123",
        "status": "pending",
        "resources": ["https://x.com/", "https://x.com/style.css"],
        "download_size": 2048,
        "total_size": 8192
    });
    Mock::given(method("GET"))
        .and(path("/save/status/abc123"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("retry-after", "4")
                .set_body_json(&body),
        )
        .mount(&server)
        .await;

    let status = client(&server).poll_status("abc123").await.expect("status");
    assert_eq!(status.status, Status::Pending);
    assert_eq!(status.resources.as_ref().map(Vec::len), Some(2));
    assert_eq!(status.download_size, Some(2048));
    assert_eq!(status.retry_after, Some(Duration::from_millis(4000)));

    let received = server.received_requests().await.unwrap();
    let query = received[0].url.query().unwrap_or_default().to_string();
    assert!(query.starts_with("_t="), "missing cache buster in {query}");
    assert!(received[0].headers.get("user-agent").is_some());
}

#[tokio::test]
async fn poll_parses_success_fields() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "job_id": "abc123",
        "status": "success",
        "timestamp": "20240101000000",
        "original_url": "https://x.com/"
    });
    Mock::given(method("GET"))
        .and(path("/save/status/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let status = client(&server).poll_status("abc123").await.expect("status");
    assert_eq!(status.status, Status::Success);
    assert_eq!(status.timestamp.as_deref(), Some("20240101000000"));
    assert_eq!(status.original_url.as_deref(), Some("https://x.com/"));
    assert!(status.retry_after.is_none());
}

#[tokio::test]
async fn poll_non_success_becomes_service_error() {
    let server = MockServer::start().await;
    let body = serde_json::json!({"status": "error", "job_id": "abc123", "message": "overloaded"});
    Mock::given(method("GET"))
        .and(path("/save/status/abc123"))
        .respond_with(
            ResponseTemplate::new(503)
                .insert_header("retry-after", "1")
                .set_body_json(&body),
        )
        .mount(&server)
        .await;

    let err = client(&server).poll_status("abc123").await.unwrap_err();
    assert!(err.is_retryable_for("abc123"));
    assert_eq!(err.retry_after(), Some(Duration::from_millis(1000)));
    match err {
        SaveError::Service(status) => {
            assert_eq!(status.status, Status::Error);
            assert_eq!(status.message.as_deref(), Some("HTTP 503: overloaded"));
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test]
async fn poll_unparseable_error_body_still_unified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/save/status/abc123"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client(&server).poll_status("abc123").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServiceReported);
    assert_eq!(err.job_id(), Some("abc123"));
    assert_eq!(err.to_string(), "job abc123: HTTP 500");
}

#[tokio::test]
async fn poll_unknown_status_is_protocol_violation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/save/status/abc123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"job_id": "abc123", "status": "queued"})),
        )
        .mount(&server)
        .await;

    let err = client(&server).poll_status("abc123").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(!err.is_retryable_for("abc123"));
}

#[tokio::test]
async fn poll_fills_missing_job_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/save/status/abc123"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "pending"})),
        )
        .mount(&server)
        .await;

    let status = client(&server).poll_status("abc123").await.expect("status");
    assert_eq!(status.job_id, "abc123");
}

#[tokio::test]
async fn poll_status_for_another_job_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/save/status/abc123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"job_id": "zzz999", "status": "success"})),
        )
        .mount(&server)
        .await;

    let err = client(&server).poll_status("abc123").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert_eq!(err.job_id(), Some("abc123"));
    assert!(err.to_string().contains("zzz999"), "{err}");
}

#[tokio::test]
async fn slow_status_response_does_not_outlast_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/save/status/abc123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(4))
                .set_body_json(serde_json::json!({"job_id": "abc123", "status": "pending"})),
        )
        .mount(&server)
        .await;

    let client = ReqwestSaveClient::new(&server.uri(), Duration::from_secs(30), false)
        .expect("client");
    let started = Instant::now();
    let err = PollingEngine::default()
        .run(&client, "abc123", Duration::from_millis(1_000), &NoopProgress)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(
        started.elapsed() < Duration::from_secs(3),
        "took {:?}",
        started.elapsed()
    );
}

use std::time::Duration;

use wayback_save_cli::{CliError, run};
use wayback_save_client::{Config, FailureStage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> Config {
    Config {
        base_url: server.uri(),
        poll_timeout: Duration::from_secs(10),
        request_timeout: Duration::from_secs(5),
        ..Config::default()
    }
}

#[tokio::test]
async fn run_prints_archived_url_on_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/save/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<script>spn.watchJob("job9")</script>"#),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/save/status/job9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "job_id": "job9",
            "status": "success",
            "timestamp": "20250102030405",
            "original_url": "https://example.org/"
        })))
        .mount(&server)
        .await;

    let archived = run("https://example.org/", &config(&server))
        .await
        .expect("archived");
    assert_eq!(
        archived,
        format!("{}/web/20250102030405/https://example.org/", server.uri())
    );
}

#[tokio::test]
async fn run_reports_service_failure_with_job_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/save/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<script>spn.watchJob("job9")</script>"#),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/save/status/job9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "job_id": "job9",
            "status": "error",
            "message": "Couldn't resolve host"
        })))
        .mount(&server)
        .await;

    let err = run("example.org", &config(&server)).await.unwrap_err();
    match err {
        CliError::Failed {
            stage,
            job_id,
            message,
        } => {
            assert_eq!(stage, FailureStage::Capture);
            assert_eq!(job_id.as_deref(), Some("job9"));
            assert_eq!(message, "job job9: Couldn't resolve host");
        }
        other => panic!("unexpected {other:?}"),
    }
}

//! HTTP behavior of the dashboard router.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use gmgnwatch::ui::server::{create_router, DashboardState, UpdateCommand};
use gmgnwatch::{Snapshot, SnapshotStore};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;
use tower::ServiceExt;

fn sample() -> Snapshot {
    Snapshot::from_records(vec![
        json!({
            "symbol": "TEST1",
            "name": "Test Token 1",
            "price": 0.001,
            "change_24h": 45.0,
            "market_cap": 1000000,
            "volume_24h": 500000,
            "timestamp": "2024-01-01T12:00:00"
        }),
        json!({
            "symbol": "TEST2",
            "name": "Test Token 2",
            "price": 0.002,
            "change_24h": -15.0,
            "market_cap": 2000000,
            "volume_24h": 750000,
            "timestamp": "2024-01-01T12:00:00"
        }),
    ])
}

fn shell(script: &str) -> UpdateCommand {
    UpdateCommand::new("sh", vec!["-c".into(), script.into()])
}

fn router(dir: &Path, update_command: UpdateCommand) -> Router {
    create_router(Arc::new(DashboardState::new(
        SnapshotStore::new(dir),
        30.0,
        20.0,
        update_command,
    )))
}

async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn dashboard_renders_without_data() {
    let dir = tempdir().unwrap();

    let (status, body) = send(router(dir.path(), shell("true")), "GET", "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("GMGN"));
    assert!(body.to_lowercase().contains("tracker"));
    assert!(body.contains("just now"));
}

#[tokio::test]
async fn dashboard_shows_tokens_alerts_and_counts() {
    let dir = tempdir().unwrap();
    SnapshotStore::new(dir.path()).try_persist(&sample()).unwrap();

    let (status, body) = send(router(dir.path(), shell("true")), "GET", "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<div class=\"stat-value\">2</div>"));
    assert!(body.contains("<div class=\"stat-value\">1</div>"));
    assert!(body.contains("12:00:00"));
    assert!(body.contains("TEST1 is up by +45.0%"));
    assert!(!body.contains("TEST2 is up by"));
    assert!(body.contains("$0.002000"));
    assert!(body.contains("$2,000,000"));
}

#[tokio::test]
async fn dashboard_survives_malformed_records() {
    let dir = tempdir().unwrap();
    let snapshot = Snapshot::from_records(vec![
        json!({ "symbol": "NOCHANGE", "name": "Missing change" }),
        json!({ "symbol": "WEIRD", "change_24h": "a lot" }),
        json!(17),
    ]);
    SnapshotStore::new(dir.path()).try_persist(&snapshot).unwrap();

    let (status, body) = send(router(dir.path(), shell("true")), "GET", "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("NOCHANGE"));
    assert!(body.contains("WEIRD"));
}

#[tokio::test]
async fn api_tokens_returns_latest_snapshot() {
    let dir = tempdir().unwrap();
    SnapshotStore::new(dir.path()).try_persist(&sample()).unwrap();

    let (status, body) = send(router(dir.path(), shell("true")), "GET", "/api/tokens").await;

    assert_eq!(status, StatusCode::OK);
    let payload: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(payload["success"], true);
    assert_eq!(payload["count"], 2);
    let data = payload["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["symbol"], "TEST1");
    for token in data {
        assert!(token["price"].as_f64().unwrap() > 0.0);
        assert!(token["change_24h"].is_number());
    }
}

#[tokio::test]
async fn api_tokens_with_no_data_is_empty_success() {
    let dir = tempdir().unwrap();

    let (status, body) = send(router(dir.path(), shell("true")), "GET", "/api/tokens").await;

    assert_eq!(status, StatusCode::OK);
    let payload: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(payload, json!({ "success": true, "data": [], "count": 0 }));
}

#[tokio::test]
async fn api_update_reports_success() {
    let dir = tempdir().unwrap();

    let (status, body) = send(router(dir.path(), shell("exit 0")), "POST", "/api/update").await;

    assert_eq!(status, StatusCode::OK);
    let payload: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(payload["success"], true);
    assert!(payload["message"].is_string());
    assert!(payload.get("error").is_none());
}

#[tokio::test]
async fn api_update_reports_stderr_on_failure() {
    let dir = tempdir().unwrap();
    let command = shell("echo 'Error message' >&2; exit 1");

    let (status, body) = send(router(dir.path(), command), "POST", "/api/update").await;

    assert_eq!(status, StatusCode::OK);
    let payload: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(payload["success"], false);
    assert_eq!(payload["error"], "Error message");
}

#[tokio::test]
async fn api_update_reports_spawn_failure() {
    let dir = tempdir().unwrap();
    let command = UpdateCommand::new("/nonexistent/gmgnwatch-collector", Vec::new());

    let (status, body) = send(router(dir.path(), command), "POST", "/api/update").await;

    assert_eq!(status, StatusCode::OK);
    let payload: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(payload["success"], false);
    assert!(!payload["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn update_only_accepts_post() {
    let dir = tempdir().unwrap();

    let (status, _) = send(router(dir.path(), shell("true")), "GET", "/api/update").await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn health_is_ok() {
    let dir = tempdir().unwrap();

    let (status, body) = send(router(dir.path(), shell("true")), "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({ "status": "ok" }));
}

#[tokio::test]
async fn concurrent_updates_run_one_at_a_time() {
    let dir = tempdir().unwrap();
    let marker = dir.path().join("running");
    let script = format!(
        "if [ -e '{m}' ]; then echo 'overlapping update' >&2; exit 1; fi; \
         touch '{m}'; sleep 0.3; rm '{m}'",
        m = marker.display()
    );
    let app = router(dir.path(), shell(&script));

    let (first, second) = tokio::join!(
        send(app.clone(), "POST", "/api/update"),
        send(app, "POST", "/api/update")
    );

    for (status, body) in [first, second] {
        assert_eq!(status, StatusCode::OK);
        let payload: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(payload["success"], true, "{}", body);
    }
    assert!(!marker.exists());
}

pub mod health;
pub mod routes;

use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::batch::BatchCoordinator;
use crate::models::ConverterConfig;
use crate::store::JobStatusStore;

/// Shared application state for the Axum server.
pub struct AppState {
    pub coordinator: BatchCoordinator,
    pub store: Arc<JobStatusStore>,
    pub config: Arc<ConverterConfig>,
    pub start_time: Instant,
}

/// Create the Axum router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/convert", post(routes::convert))
        .route("/status", get(routes::status))
        .route("/clear", post(routes::clear))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

// ===========================================================================
// Tests
// ===========================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::MockConverter;
    use crate::models::JobStatus;
    use crate::patterns::PatternExpander;
    use crate::pool::WorkerPool;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    // -----------------------------------------------------------------------
    // Test helpers
    // -----------------------------------------------------------------------

    fn make_test_state(converter: Arc<MockConverter>) -> Arc<AppState> {
        let config = Arc::new(ConverterConfig {
            workers: 2,
            ..Default::default()
        });
        let store = Arc::new(JobStatusStore::new());
        let pool = WorkerPool::start(
            config.worker_count(),
            Arc::clone(&store),
            converter,
            Duration::from_secs(config.timeout_secs),
        );
        let coordinator = BatchCoordinator::new(
            PatternExpander::new(&config.extensions),
            Arc::clone(&store),
            pool,
        );
        Arc::new(AppState {
            coordinator,
            store,
            config,
            start_time: Instant::now(),
        })
    }

    fn make_test_app(state: Arc<AppState>) -> Router {
        create_router(state)
    }

    /// Helper to read the full body from a response.
    async fn body_string(body: Body) -> String {
        let bytes = body.collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn convert_request<S: serde::Serialize>(paths: &[S]) -> Request<Body> {
        let body = serde_json::json!({ "paths": paths }).to_string();
        Request::builder()
            .method("POST")
            .uri("/convert")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    fn touch(dir: &TempDir, name: &str) -> String {
        let path = dir.path().join(name);
        std::fs::write(&path, b"content").expect("write file");
        path.to_string_lossy().into_owned()
    }

    async fn wait_until_settled(store: &JobStatusStore) {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let snapshot = store.snapshot();
            if !snapshot.is_empty() && snapshot.values().all(|r| r.status.is_terminal()) {
                return;
            }
            assert!(Instant::now() < deadline, "jobs did not settle");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    // =======================================================================
    // 1. GET /health returns 200 with all expected fields
    // =======================================================================
    #[tokio::test]
    async fn test_health_returns_200_with_expected_fields() {
        let state = make_test_state(Arc::new(MockConverter::instant()));
        let app = make_test_app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response.into_body()).await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(json["status"], "ok");
        assert!(json["uptime_seconds"].is_number());
        assert_eq!(json["workers"], 2);
        assert_eq!(json["queued"], 0);
        assert_eq!(json["processing"], 0);
        assert_eq!(json["completed"], 0);
        assert_eq!(json["errors"], 0);
        assert_eq!(json["version"], "0.1.0");
    }

    // =======================================================================
    // 2. POST /convert with a resolvable file returns 200 and queues it
    // =======================================================================
    #[tokio::test]
    async fn test_convert_valid_file_returns_200() {
        let dir = TempDir::new().expect("tempdir");
        let file = touch(&dir, "report.pdf");

        let state = make_test_state(Arc::new(MockConverter::instant()));
        let app = make_test_app(Arc::clone(&state));

        let response = app.oneshot(convert_request(&[&file])).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response.into_body()).await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["queued"], 1);
        assert_eq!(json["files"][0], file);
        assert_eq!(json["unmatched_patterns"].as_array().unwrap().len(), 0);

        // Registration happens synchronously, so the record is visible to a
        // status poll issued right after the response.
        assert!(state.store.snapshot().contains_key(&file));
    }

    // =======================================================================
    // 3. POST /convert with an empty path list returns 400, success=false
    // =======================================================================
    #[tokio::test]
    async fn test_convert_empty_paths_returns_400() {
        let state = make_test_state(Arc::new(MockConverter::instant()));
        let app = make_test_app(state);

        let response = app.oneshot(convert_request::<&str>(&[])).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_string(response.into_body()).await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["queued"], 0);
    }

    // =======================================================================
    // 4. POST /convert with only blank patterns returns 400
    // =======================================================================
    #[tokio::test]
    async fn test_convert_blank_paths_returns_400() {
        let state = make_test_state(Arc::new(MockConverter::instant()));
        let app = make_test_app(state);

        let response = app
            .oneshot(convert_request(&["", "   "]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // =======================================================================
    // 5. POST /convert with a missing paths field returns 400
    // =======================================================================
    #[tokio::test]
    async fn test_convert_missing_paths_field_returns_400() {
        let state = make_test_state(Arc::new(MockConverter::instant()));
        let app = make_test_app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/convert")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // =======================================================================
    // 6. Duplicate paths in one submission queue a single job
    // =======================================================================
    #[tokio::test]
    async fn test_convert_duplicate_paths_queued_once() {
        let dir = TempDir::new().expect("tempdir");
        let a = touch(&dir, "a.pdf");
        let b = touch(&dir, "b.docx");

        let state = make_test_state(Arc::new(MockConverter::instant()));
        let app = make_test_app(state);

        let response = app
            .oneshot(convert_request(&[&a, &a, &b]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response.into_body()).await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["queued"], 2);
        assert_eq!(json["files"].as_array().unwrap().len(), 2);
        assert_eq!(json["files"][0], a);
        assert_eq!(json["files"][1], b);
    }

    // =======================================================================
    // 7. Zero-match pattern reported in unmatched_patterns, not an error
    // =======================================================================
    #[tokio::test]
    async fn test_convert_unmatched_pattern_reported() {
        let dir = TempDir::new().expect("tempdir");
        let pattern = dir
            .path()
            .join("missing")
            .join("*.pdf")
            .to_string_lossy()
            .into_owned();

        let state = make_test_state(Arc::new(MockConverter::instant()));
        let app = make_test_app(state);

        let response = app.oneshot(convert_request(&[&pattern])).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response.into_body()).await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["queued"], 0);
        assert_eq!(json["unmatched_patterns"][0], pattern);
    }

    // =======================================================================
    // 8. GET /status starts empty and reflects submitted jobs
    // =======================================================================
    #[tokio::test]
    async fn test_status_reflects_jobs() {
        let dir = TempDir::new().expect("tempdir");
        let file = touch(&dir, "report.pdf");

        let state = make_test_state(Arc::new(MockConverter::instant()));
        let app = make_test_app(Arc::clone(&state));

        // Empty before any submission.
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response.into_body()).await;
        assert_eq!(body, "{}");

        let _ = app
            .clone()
            .oneshot(convert_request(&[&file]))
            .await
            .unwrap();
        wait_until_settled(&state.store).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_string(response.into_body()).await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();

        let record = &json[&file];
        assert_eq!(record["status"], "Completed");
        assert!(record["message"]
            .as_str()
            .unwrap()
            .starts_with("Converted to "));
        assert!(record["timestamp"].is_string());
    }

    // =======================================================================
    // 9. POST /clear empties the store
    // =======================================================================
    #[tokio::test]
    async fn test_clear_empties_status() {
        let dir = TempDir::new().expect("tempdir");
        let file = touch(&dir, "report.pdf");

        let state = make_test_state(Arc::new(MockConverter::instant()));
        let app = make_test_app(Arc::clone(&state));

        let _ = app
            .clone()
            .oneshot(convert_request(&[&file]))
            .await
            .unwrap();
        wait_until_settled(&state.store).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/clear")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response.into_body()).await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["success"], true);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_string(response.into_body()).await;
        assert_eq!(body, "{}");
    }

    // =======================================================================
    // 10. A failed conversion surfaces as an Error record
    // =======================================================================
    #[tokio::test]
    async fn test_failed_conversion_reported_in_status() {
        let dir = TempDir::new().expect("tempdir");
        let file = touch(&dir, "bad-scan.pdf");

        let state = make_test_state(Arc::new(MockConverter::instant().failing_for("bad")));
        let app = make_test_app(Arc::clone(&state));

        let response = app
            .clone()
            .oneshot(convert_request(&[&file]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        wait_until_settled(&state.store).await;

        let snapshot = state.store.snapshot();
        let record = &snapshot[&file];
        assert_eq!(record.status, JobStatus::Error);
        assert!(record
            .message
            .as_deref()
            .unwrap()
            .contains("mock conversion failed"));
    }

    // =======================================================================
    // 11. Health counters track terminal jobs
    // =======================================================================
    #[tokio::test]
    async fn test_health_counts_completed_jobs() {
        let dir = TempDir::new().expect("tempdir");
        let a = touch(&dir, "a.pdf");
        let b = touch(&dir, "b-bad.pdf");

        let state = make_test_state(Arc::new(MockConverter::instant().failing_for("bad")));
        let app = make_test_app(Arc::clone(&state));

        let _ = app
            .clone()
            .oneshot(convert_request(&[&a, &b]))
            .await
            .unwrap();
        wait_until_settled(&state.store).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_string(response.into_body()).await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["completed"], 1);
        assert_eq!(json["errors"], 1);
        assert_eq!(json["queued"], 0);
        assert_eq!(json["processing"], 0);
    }
}

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use super::AppState;
use crate::models::JobStatus;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub workers: usize,
    pub queued: usize,
    pub processing: usize,
    pub completed: usize,
    pub errors: usize,
    pub version: String,
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::debug!("Health check");

    let snapshot = state.store.snapshot();
    let count = |status: JobStatus| snapshot.values().filter(|r| r.status == status).count();

    let response = HealthResponse {
        status: "ok".to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        workers: state.config.worker_count(),
        queued: count(JobStatus::Queued),
        processing: count(JobStatus::Processing),
        completed: count(JobStatus::Completed),
        errors: count(JobStatus::Error),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}

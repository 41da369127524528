use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;

/// POST /convert request body: the raw pattern lines from the client.
#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    #[serde(default)]
    pub paths: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub success: bool,
    pub queued: usize,
    pub files: Vec<String>,
    pub unmatched_patterns: Vec<String>,
}

impl ConvertResponse {
    fn rejected() -> Self {
        Self {
            success: false,
            queued: 0,
            files: Vec::new(),
            unmatched_patterns: Vec::new(),
        }
    }
}

/// POST /convert
///
/// Accepts a batch of path patterns and returns as soon as the resolved
/// jobs are queued; it never waits for a conversion to finish.
pub async fn convert(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConvertRequest>,
) -> impl IntoResponse {
    let patterns: Vec<String> = request
        .paths
        .iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    if patterns.is_empty() {
        tracing::warn!("Rejecting submission with no usable patterns");
        return (StatusCode::BAD_REQUEST, Json(ConvertResponse::rejected()));
    }

    match state.coordinator.submit(&patterns) {
        Ok(summary) => (
            StatusCode::OK,
            Json(ConvertResponse {
                success: true,
                queued: summary.queued,
                files: summary.files,
                unmatched_patterns: summary.unmatched_patterns,
            }),
        ),
        Err(e) => {
            tracing::error!("Batch submission failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ConvertResponse::rejected()),
            )
        }
    }
}

/// GET /status
///
/// A point-in-time snapshot of every job record, keyed by source path.
/// Safe to poll on any cadence; never blocks on the workers.
pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.snapshot())
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub success: bool,
}

/// POST /clear
pub async fn clear(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.store.clear();
    tracing::info!("Cleared all job records");
    Json(ClearResponse { success: true })
}

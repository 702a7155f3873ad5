use crate::{server::AppState, types::HealthResponse};
use axum::{extract::State, Json};
use catalog_indexing::read_snapshot_or_empty;
use chrono::Utc;
use tracing::warn;

/// Liveness plus a glance at catalog size. Unauthenticated.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let documents = match read_snapshot_or_empty(&state.snapshot_path).await {
        Ok(snapshot) => snapshot.len(),
        Err(e) => {
            warn!(error = %e, "Snapshot unreadable during health check");
            0
        }
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        documents,
        subscribers: state.broadcaster.subscriber_count().await,
        timestamp: Utc::now(),
    })
}

//! Scheduler status handler.

use axum::extract::State;
use axum::Json;

use clipo_models::QueueStatus;

use crate::state::AppState;

/// GET /api/queue/status
pub async fn get_queue_status(State(state): State<AppState>) -> Json<QueueStatus> {
    Json(state.scheduler.status().await)
}

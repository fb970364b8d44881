//! Liveness and readiness probes.

use std::collections::BTreeMap;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

/// GET /health and /healthz
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    Ready,
    Degraded,
}

/// Outcome of one dependency probe.
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Probe {
    Ok { latency_ms: u64 },
    Error { error: String },
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: Readiness,
    pub checks: BTreeMap<&'static str, Probe>,
}

/// GET /ready
///
/// The record store must answer a lookup and the scheduler must own at
/// least one slot.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let mut checks = BTreeMap::new();

    let start = Instant::now();
    // A missing id still proves the store round trip works
    let store = match state.store.get_video(0).await {
        Ok(_) => Probe::Ok { latency_ms: elapsed_ms(start) },
        Err(e) => Probe::Error { error: e.to_string() },
    };
    checks.insert("store", store);

    let start = Instant::now();
    let scheduler = if state.scheduler.status().await.max_processes > 0 {
        Probe::Ok { latency_ms: elapsed_ms(start) }
    } else {
        Probe::Error { error: "scheduler has no slots".to_string() }
    };
    checks.insert("scheduler", scheduler);

    let all_ok = checks.values().all(|p| matches!(p, Probe::Ok { .. }));
    let (code, status) = if all_ok {
        (StatusCode::OK, Readiness::Ready)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Readiness::Degraded)
    };

    (code, Json(ReadinessResponse { status, checks }))
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

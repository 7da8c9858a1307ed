//! Health endpoints.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use yt_core::JobStatus;

use crate::context::AppContext;

/// GET /health -- liveness only.
pub async fn liveness() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /api/health
pub async fn health(State(ctx): State<AppContext>) -> Json<Value> {
    let store = &ctx.store;
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "mode": ctx.extractor.name(),
        "queue": {
            "pending": ctx.scheduler.pending(),
            "running": ctx.scheduler.is_running(),
            "jobs": store.len(),
            "queued": store.count_by_status(JobStatus::Queued),
            "downloading": store.count_by_status(JobStatus::Downloading),
            "completed": store.count_by_status(JobStatus::Completed),
            "error": store.count_by_status(JobStatus::Error),
        },
    }))
}

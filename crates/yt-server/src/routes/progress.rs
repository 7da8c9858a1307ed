//! Job status polling.

use axum::extract::{Path, State};
use axum::Json;
use yt_core::{Error, Job};

use super::parse_task_id;
use crate::context::AppContext;
use crate::error::AppError;

/// GET /api/progress/{task_id}
pub async fn get_progress(
    State(ctx): State<AppContext>,
    Path(raw_id): Path<String>,
) -> Result<Json<Job>, AppError> {
    let id = parse_task_id(&raw_id)?;
    let job = ctx
        .store
        .get(id)
        .ok_or_else(|| Error::not_found("Task", id))?;
    Ok(Json(job))
}

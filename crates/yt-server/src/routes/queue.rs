//! Job submission.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use yt_core::{Error, Job, TaskId};

use crate::context::AppContext;
use crate::error::AppError;
use crate::validate::{is_youtube_url, parse_bitrate};

/// Body accepted by `POST /queue` and `POST /convert`.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitRequest {
    pub url: Option<String>,
    /// Number or numeric string; see [`parse_bitrate`].
    pub bitrate: Option<serde_json::Value>,
}

/// Response for `POST /queue`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub task_id: TaskId,
    pub job: Job,
}

/// Validated submission: a trimmed YouTube URL and a clamped bitrate.
pub(crate) fn read_submission(body: &[u8]) -> Result<(String, u32), Error> {
    let payload: SubmitRequest = serde_json::from_slice(body).unwrap_or_default();
    let url = payload
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| Error::Validation("JSON payload required".into()))?;
    let bitrate = parse_bitrate(payload.bitrate.as_ref());
    if !is_youtube_url(url) {
        return Err(Error::Validation("Invalid YouTube URL".into()));
    }
    Ok((url.to_string(), bitrate))
}

/// POST /api/queue
pub async fn submit(
    State(ctx): State<AppContext>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let (url, bitrate) = read_submission(&body)?;
    let task_id = ctx.scheduler.submit(url, bitrate);
    let job = ctx
        .store
        .get(task_id)
        .ok_or_else(|| Error::Internal(format!("job {task_id} vanished after submit")))?;

    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { task_id, job })))
}

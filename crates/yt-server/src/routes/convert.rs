//! Deprecated one-shot conversion.
//!
//! Submits through the same queue as `POST /queue`, holds the request open
//! until the job is terminal, then answers with the MP3 itself.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use yt_core::{Error, FailureKind, JobStatus};

use super::download::mp3_response;
use crate::context::AppContext;
use crate::error::AppError;
use crate::routes::queue::read_submission;

const DOWNLOAD_FAILED: &str = "Failed to download video. Video may be private or unavailable.";
const CONVERSION_FAILED: &str = "Conversion failed";

/// POST /api/convert
pub async fn convert(State(ctx): State<AppContext>, body: Bytes) -> Result<Response, AppError> {
    let (url, bitrate) = read_submission(&body)?;

    let id = ctx.scheduler.submit(url, bitrate);
    tracing::debug!(task_id = %id, "Legacy convert request waiting on queue");

    let job = ctx.scheduler.wait_for_terminal(id).await.ok_or_else(|| {
        AppError::new(Error::Internal(format!("job {id} disappeared while waiting")))
            .with_public(StatusCode::INTERNAL_SERVER_ERROR, CONVERSION_FAILED)
    })?;

    if job.status == JobStatus::Error {
        return Err(match job.failure {
            Some(FailureKind::MissingOutput) => AppError::new(Error::missing_output(&job.file_path))
                .with_public(StatusCode::INTERNAL_SERVER_ERROR, CONVERSION_FAILED),
            _ => AppError::new(Error::tool("yt-dlp", job.message))
                .with_public(StatusCode::BAD_REQUEST, DOWNLOAD_FAILED),
        });
    }

    mp3_response(&job.file_path, "download.mp3").await.map_err(|e| {
        AppError::new(Error::from(e)).with_public(StatusCode::INTERNAL_SERVER_ERROR, CONVERSION_FAILED)
    })
}

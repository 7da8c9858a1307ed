//! MP3 file delivery.

use std::path::Path as FsPath;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use tokio_util::io::ReaderStream;
use yt_core::{Error, JobStatus};

use super::parse_task_id;
use crate::context::AppContext;
use crate::error::AppError;

/// Stream `path` as an `audio/mpeg` attachment named `filename`.
pub(crate) async fn mp3_response(path: &FsPath, filename: &str) -> std::io::Result<Response> {
    let file = tokio::fs::File::open(path).await?;
    let len = file.metadata().await?.len();

    let mut response = Response::new(Body::from_stream(ReaderStream::new(file)));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\"")) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

/// GET /api/download/{task_id}
pub async fn download(
    State(ctx): State<AppContext>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_task_id(&raw_id)?;
    let job = ctx
        .store
        .get(id)
        .ok_or_else(|| Error::not_found("Task", id))?;

    if job.status != JobStatus::Completed {
        return Err(Error::Conflict(format!("Task is {}, not completed", job.status)).into());
    }

    match mp3_response(&job.file_path, &format!("{id}.mp3")).await {
        Ok(resp) => Ok(resp),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::not_found("File", job.file_path.display()).into())
        }
        Err(e) => Err(Error::from(e).into()),
    }
}

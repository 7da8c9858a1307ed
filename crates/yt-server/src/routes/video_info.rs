//! Metadata lookup ahead of conversion.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use yt_core::Error;
use yt_extract::VideoInfo;

use crate::context::AppContext;
use crate::error::AppError;
use crate::validate::is_youtube_url;

#[derive(Debug, Default, Deserialize)]
pub struct VideoInfoRequest {
    pub url: Option<String>,
}

/// POST /api/video-info
pub async fn video_info(
    State(ctx): State<AppContext>,
    body: Bytes,
) -> Result<Json<VideoInfo>, AppError> {
    let payload: VideoInfoRequest = serde_json::from_slice(&body).unwrap_or_default();
    let url = payload
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| Error::Validation("JSON payload required".into()))?;
    if !is_youtube_url(url) {
        return Err(Error::Validation("Invalid YouTube URL".into()).into());
    }

    let raw = ctx.extractor.fetch_info(url).await.map_err(|e| {
        AppError::new(e).with_public(
            StatusCode::BAD_REQUEST,
            "Failed to extract video info. Video may be private or unavailable.",
        )
    })?;

    Ok(Json(VideoInfo::from_raw(&raw, url)))
}

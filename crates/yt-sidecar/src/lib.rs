//! yt-sidecar: a tiny HTTP front for `yt-dlp`.
//!
//! Runs next to the tool (usually in its own container) and exposes
//!
//! - `GET /health` -> `{"ok":true}`
//! - `POST /json {url}` -> the tool's metadata document, passed through as-is
//! - `POST /convert {url, out, bitrate}` -> `{"ok":true}` once the tool exits
//!   cleanly; the caller checks that `out` was written
//!
//! Failures answer 400 with `{"error": "<tool diagnostics>"}`; unknown routes
//! answer 404 with `{"error":"not found"}`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use yt_core::bitrate::parse_bitrate;
use yt_core::config::ExecutionConfig;
use yt_core::Error;
use yt_extract::args::{convert_args, info_args};
use yt_extract::tools::{locate_ytdlp, YTDLP};
use yt_extract::ToolCommand;

/// State shared by the sidecar handlers.
#[derive(Debug, Clone)]
pub struct SidecarState {
    program: Arc<PathBuf>,
}

impl SidecarState {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: Arc::new(program.into()),
        }
    }

    /// Resolve `yt-dlp` from configuration, falling back to the bare name.
    pub fn from_config(config: &ExecutionConfig) -> Self {
        let program = locate_ytdlp(config).unwrap_or_else(|e| {
            tracing::warn!("{e}");
            PathBuf::from(YTDLP)
        });
        Self::new(program)
    }

    fn command(&self) -> ToolCommand {
        ToolCommand::new(self.program.as_ref().clone())
    }
}

#[derive(Debug, Default, Deserialize)]
struct JsonRequest {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ConvertRequest {
    url: Option<String>,
    out: Option<String>,
    /// Number or numeric string.
    bitrate: Option<serde_json::Value>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// The tool's own text, without the `Tool error [..]` prefix.
fn tool_failure(e: Error) -> Response {
    tracing::warn!("yt-dlp failed: {e}");
    let message = match e {
        Error::Tool { message, .. } => message,
        other => other.to_string(),
    };
    error_response(StatusCode::BAD_REQUEST, message)
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

async fn metadata(State(state): State<SidecarState>, body: Bytes) -> Response {
    let req: JsonRequest = serde_json::from_slice(&body).unwrap_or_default();
    let Some(url) = non_empty(req.url) else {
        return error_response(StatusCode::BAD_REQUEST, "url required");
    };

    match state.command().args(info_args(&url)).execute().await {
        Ok(output) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            output.stdout,
        )
            .into_response(),
        Err(e) => tool_failure(e),
    }
}

async fn convert(State(state): State<SidecarState>, body: Bytes) -> Response {
    let req: ConvertRequest = serde_json::from_slice(&body).unwrap_or_default();
    let (Some(url), Some(out)) = (non_empty(req.url), non_empty(req.out)) else {
        return error_response(StatusCode::BAD_REQUEST, "url and out required");
    };
    let bitrate = parse_bitrate(req.bitrate.as_ref());
    let out = PathBuf::from(out);

    tracing::info!(url = %url, out = %out.display(), bitrate, "Converting");
    match state
        .command()
        .args(convert_args(&url, &out, bitrate))
        .execute()
        .await
    {
        Ok(_) => Json(json!({ "ok": true })).into_response(),
        Err(e) => tool_failure(e),
    }
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "not found")
}

/// Build the sidecar router.
pub fn build_router(state: SidecarState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/json", post(metadata))
        .route("/convert", post(convert))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the sidecar on `addr` until `cancel` fires.
pub async fn serve(
    addr: SocketAddr,
    state: SidecarState,
    cancel: CancellationToken,
) -> yt_core::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind to {addr}: {e}")))?;
    tracing::info!("Sidecar listening on {addr}");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| Error::Internal(format!("Server error: {e}")))?;

    tracing::info!("Sidecar stopped");
    Ok(())
}

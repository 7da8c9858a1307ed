//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`yt_core::Error`] so that route handlers
//! can return `Result<T, AppError>` and use `?` on core results. The JSON
//! body is also attached to the response as an [`ErrorBody`] extension; the
//! request-id middleware uses it to fill in `request_id`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use yt_core::Error;

/// Error payload carried in response extensions until the request-id
/// middleware has stamped it.
#[derive(Debug, Clone)]
pub struct ErrorBody(pub serde_json::Value);

/// Wrapper so we can implement `IntoResponse` for an external type.
pub struct AppError {
    inner: Error,
    request_id: Option<String>,
    status: Option<StatusCode>,
    message: Option<String>,
}

impl AppError {
    pub fn new(inner: Error) -> Self {
        Self {
            inner,
            request_id: None,
            status: None,
            message: None,
        }
    }

    pub fn with_request_id(mut self, id: String) -> Self {
        self.request_id = Some(id);
        self
    }

    /// Answer with a fixed status and user-facing text instead of the ones
    /// derived from the inner error. The inner error is still logged.
    pub fn with_public(mut self, status: StatusCode, message: impl Into<String>) -> Self {
        self.status = Some(status);
        self.message = Some(message.into());
        self
    }

    pub fn inner(&self) -> &Error {
        &self.inner
    }

    fn status(&self) -> StatusCode {
        self.status.unwrap_or_else(|| {
            StatusCode::from_u16(self.inner.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        })
    }

    fn public_message(&self) -> String {
        if let Some(ref m) = self.message {
            return m.clone();
        }
        match &self.inner {
            Error::Validation(m) | Error::Conflict(m) => m.clone(),
            Error::NotFound { entity, .. } => format!("{entity} not found"),
            other => other.to_string(),
        }
    }
}

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in API handler"
            );
        } else if self.message.is_some() {
            tracing::warn!(status = %status, error = %self.inner, "Request failed");
        }

        let code = match &self.inner {
            Error::NotFound { .. } => "not_found",
            Error::Validation(_) => "validation_error",
            Error::Conflict(_) => "conflict",
            Error::Tool { .. } => "tool_error",
            Error::Sidecar(_) => "sidecar_error",
            Error::MissingOutput { .. } => "missing_output",
            Error::Io { .. } => "io_error",
            Error::Internal(_) => "internal_error",
        };

        let body = json!({
            "error": self.public_message(),
            "code": code,
            "request_id": self.request_id,
        });

        let mut response = (status, axum::Json(body.clone())).into_response();
        response.extensions_mut().insert(ErrorBody(body));
        response
    }
}

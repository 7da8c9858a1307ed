//! Unified error type for yttmp3.
//!
//! All crates funnel their failures into [`Error`], which carries enough context
//! for API handlers to derive an HTTP status code via [`Error::http_status`]
//! and for the scheduler to classify a failed job via [`Error::failure_kind`].

use std::fmt;
use std::path::PathBuf;

use crate::job::FailureKind;

/// Unified error type covering all failure modes in yttmp3.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "task").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The resource exists but is not in a state that allows the request.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The external tool (yt-dlp) returned an error or could not be run.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description, usually the tool's stderr.
        message: String,
    },

    /// Talking to the sidecar service failed, or it answered with an error.
    #[error("Sidecar error: {0}")]
    Sidecar(String),

    /// The tool reported success but the expected output file is absent.
    #[error("conversion did not produce a file: {}", path.display())]
    MissingOutput {
        /// Where the file was expected.
        path: PathBuf,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Validation(_) => 400,
            Error::Conflict(_) => 409,
            Error::Tool { .. } => 502,
            Error::Sidecar(_) => 502,
            Error::MissingOutput { .. } => 500,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Classify this error for the `failure` field of a failed job.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Error::Tool { .. } | Error::Sidecar(_) => FailureKind::Tool,
            Error::MissingOutput { .. } => FailureKind::MissingOutput,
            _ => FailureKind::Internal,
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::MissingOutput`].
    pub fn missing_output(path: impl Into<PathBuf>) -> Self {
        Error::MissingOutput { path: path.into() }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

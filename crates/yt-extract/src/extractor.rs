//! The [`Extractor`] trait and the pieces shared by its strategies.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use yt_core::config::{ExecutionConfig, ExecutionMode};
use yt_core::{Error, Result};

use crate::local::LocalExtractor;
use crate::sidecar::SidecarExtractor;

/// Sender for reporting conversion progress.
///
/// Wraps a callback that receives a progress percentage (0.0 -- 100.0) and
/// the tool line it came from.
pub struct ProgressSender {
    callback: Box<dyn Fn(f32, &str) + Send + Sync>,
}

impl ProgressSender {
    /// Create a new sender from the given callback.
    pub fn new(callback: impl Fn(f32, &str) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Create a no-op sender that discards all progress reports.
    pub fn noop() -> Self {
        Self {
            callback: Box::new(|_, _| {}),
        }
    }

    /// Report progress.
    pub fn send(&self, progress: f32, line: &str) {
        (self.callback)(progress, line);
    }
}

impl std::fmt::Debug for ProgressSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSender").finish_non_exhaustive()
    }
}

/// One URL-to-MP3 conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertRequest {
    pub url: String,
    /// Final `.mp3` path.
    pub output: PathBuf,
    /// Kbps, already clamped by the caller.
    pub bitrate: u32,
}

/// A way of running `yt-dlp`.
///
/// Implementors only run the tool; checking that the output file exists is
/// [`run_conversion`]'s job so every strategy fails the same way.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Short name for logs and the health endpoint (e.g. "local").
    fn name(&self) -> &'static str;

    /// Fetch the tool's raw metadata document for `url`.
    async fn fetch_info(&self, url: &str) -> Result<serde_json::Value>;

    /// Download and transcode. Progress is reported when the strategy can
    /// observe it.
    async fn convert(&self, request: &ConvertRequest, progress: &ProgressSender) -> Result<()>;

    /// Whether the strategy is usable right now.
    async fn health(&self) -> Result<()>;
}

/// Build the strategy selected by `config.mode`.
pub fn build_extractor(config: &ExecutionConfig) -> Result<Arc<dyn Extractor>> {
    let extractor: Arc<dyn Extractor> = match config.mode {
        ExecutionMode::Local => Arc::new(LocalExtractor::from_config(config)),
        ExecutionMode::Sidecar => Arc::new(SidecarExtractor::new(&config.sidecar)?),
    };
    tracing::info!(strategy = extractor.name(), "Execution strategy selected");
    Ok(extractor)
}

/// Run a conversion and verify it produced `request.output`.
///
/// # Errors
///
/// Whatever the strategy returns ([`Error::Tool`], [`Error::Sidecar`]), or
/// [`Error::MissingOutput`] when the tool claimed success but left no file.
pub async fn run_conversion(
    extractor: &dyn Extractor,
    request: &ConvertRequest,
    progress: &ProgressSender,
) -> Result<()> {
    extractor.convert(request, progress).await?;

    if !tokio::fs::try_exists(&request.output).await? {
        return Err(Error::missing_output(&request.output));
    }
    Ok(())
}

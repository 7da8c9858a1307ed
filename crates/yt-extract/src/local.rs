//! Local strategy: spawn `yt-dlp` as a child process.

use std::path::PathBuf;

use async_trait::async_trait;
use yt_core::config::ExecutionConfig;
use yt_core::{Error, Result};

use crate::args::{convert_args, info_args};
use crate::command::ToolCommand;
use crate::extractor::{ConvertRequest, Extractor, ProgressSender};
use crate::progress::parse_progress;
use crate::tools::{locate_ytdlp, YTDLP};

/// Runs `yt-dlp` on this host.
#[derive(Debug, Clone)]
pub struct LocalExtractor {
    program: PathBuf,
}

impl LocalExtractor {
    /// Use an explicit binary.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Resolve the binary from configuration. When it cannot be found the
    /// bare name is kept, so every conversion fails with a spawn error
    /// instead of the server refusing to start.
    pub fn from_config(config: &ExecutionConfig) -> Self {
        let program = locate_ytdlp(config).unwrap_or_else(|e| {
            tracing::warn!("{e}");
            PathBuf::from(YTDLP)
        });
        Self::new(program)
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }
}

#[async_trait]
impl Extractor for LocalExtractor {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn fetch_info(&self, url: &str) -> Result<serde_json::Value> {
        let output = ToolCommand::new(self.program.clone())
            .args(info_args(url))
            .execute()
            .await?;
        serde_json::from_str(&output.stdout)
            .map_err(|e| Error::tool(YTDLP, format!("invalid metadata JSON: {e}")))
    }

    async fn convert(&self, request: &ConvertRequest, progress: &ProgressSender) -> Result<()> {
        let output = ToolCommand::new(self.program.clone())
            .args(convert_args(&request.url, &request.output, request.bitrate))
            .execute_streaming(|line| {
                if let Some(pct) = parse_progress(line) {
                    progress.send(pct, line);
                }
            })
            .await?;

        if !output.stderr.trim().is_empty() {
            tracing::debug!(stderr = %output.stderr.trim(), "yt-dlp diagnostics");
        }
        Ok(())
    }

    async fn health(&self) -> Result<()> {
        ToolCommand::new(self.program.clone())
            .arg("--version")
            .timeout(std::time::Duration::from_secs(10))
            .execute()
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Write an executable shell script standing in for yt-dlp.
    #[cfg(unix)]
    fn fake_tool(dir: &std::path::Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-yt-dlp");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn convert_reports_parsed_progress() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(
            dir.path(),
            "echo '[youtube] abc: Downloading webpage'\n\
             echo '[download]  12.5% of 1MiB'\n\
             echo '[download] 100% of 1MiB'",
        );

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress = ProgressSender::new(move |pct, _| sink.lock().unwrap().push(pct));

        let request = ConvertRequest {
            url: "https://youtu.be/dQw4w9WgXcQ".into(),
            output: dir.path().join("out.mp3"),
            bitrate: 128,
        };
        LocalExtractor::new(tool)
            .convert(&request, &progress)
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![12.5, 100.0]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_tool_surfaces_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(dir.path(), "echo 'ERROR: Private video' >&2\nexit 1");

        let err = LocalExtractor::new(tool)
            .fetch_info("https://youtu.be/dQw4w9WgXcQ")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Tool { .. }));
        assert!(err.to_string().contains("Private video"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn fetch_info_parses_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(dir.path(), r#"echo '{"id":"dQw4w9WgXcQ","title":"T"}'"#);

        let info = LocalExtractor::new(tool)
            .fetch_info("https://youtu.be/dQw4w9WgXcQ")
            .await
            .unwrap();
        assert_eq!(info["title"], "T");
    }

    #[tokio::test]
    async fn missing_binary_fails_health() {
        let extractor = LocalExtractor::new("/nonexistent/yt-dlp");
        assert!(extractor.health().await.is_err());
    }
}

//! External tool detection.
//!
//! `yt-dlp` is the only tool invoked directly; `ffmpeg` is reported too
//! because `yt-dlp` shells out to it for the MP3 transcode.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use yt_core::config::ExecutionConfig;
use yt_core::{Error, Result};

use crate::command::ToolCommand;

/// Binary name searched for on `PATH`.
pub const YTDLP: &str = "yt-dlp";

/// Tools reported by [`check`].
const KNOWN_TOOLS: &[&str] = &[YTDLP, "ffmpeg"];

/// Availability information for a tool, returned by [`check`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the tool was found.
    pub available: bool,
    /// Version string (first line of the version output), if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

fn resolve(name: &str, custom: Option<&Path>) -> Option<PathBuf> {
    match custom {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        // Custom path does not exist; fall back to PATH.
        _ => which::which(name).ok(),
    }
}

/// Find the `yt-dlp` binary, preferring `execution.ytdlp_path` when it
/// points at an existing file.
pub fn locate_ytdlp(config: &ExecutionConfig) -> Result<PathBuf> {
    resolve(YTDLP, config.ytdlp_path.as_deref())
        .ok_or_else(|| Error::tool(YTDLP, format!("{YTDLP} not found; is it installed and in PATH?")))
}

/// Check all known tools and return availability information.
pub async fn check(config: &ExecutionConfig) -> Vec<ToolInfo> {
    let mut infos = Vec::with_capacity(KNOWN_TOOLS.len());
    for &name in KNOWN_TOOLS {
        let custom = if name == YTDLP {
            config.ytdlp_path.as_deref()
        } else {
            None
        };
        let info = match resolve(name, custom) {
            Some(path) => ToolInfo {
                name: name.to_string(),
                available: true,
                version: detect_version(name, &path).await,
                path: Some(path),
            },
            None => ToolInfo {
                name: name.to_string(),
                available: false,
                version: None,
                path: None,
            },
        };
        infos.push(info);
    }
    infos
}

/// Run `<tool> --version` (`-version` for ffmpeg) and return the first line
/// of stdout.
async fn detect_version(name: &str, path: &Path) -> Option<String> {
    let version_arg = if name == "ffmpeg" { "-version" } else { "--version" };
    let output = ToolCommand::new(path.to_path_buf())
        .arg(version_arg)
        .timeout(std::time::Duration::from_secs(10))
        .execute()
        .await
        .ok()?;
    output.stdout.lines().next().map(|s| s.trim().to_string())
}

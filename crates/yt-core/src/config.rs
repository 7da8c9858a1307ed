//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON. Every section
//! defaults sensibly so a completely empty `{}` file is valid. Environment
//! overrides are applied once at startup by [`Config::apply_env`]; the
//! resolved values are then handed to the components that need them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub execution: ExecutionConfig,
    pub storage: StorageConfig,
    pub stream: StreamConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary lookup (the environment in
    /// production, a map in tests).
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("USE_YTDLP_CONTAINER") {
            self.execution.mode = if v == "1" || v.eq_ignore_ascii_case("true") {
                ExecutionMode::Sidecar
            } else {
                ExecutionMode::Local
            };
        }
        if let Some(host) = lookup("YTDLP_SIDECAR_HOST") {
            self.execution.sidecar.host = host;
        }
        if let Some(port) = lookup("YTDLP_SIDECAR_PORT") {
            match port.parse() {
                Ok(p) => self.execution.sidecar.port = p,
                Err(_) => tracing::warn!("Ignoring invalid YTDLP_SIDECAR_PORT={port}"),
            }
        }
        if let Some(path) = lookup("YTDLP_PATH") {
            self.execution.ytdlp_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = lookup("OUTPUT_DIR") {
            self.storage.output_dir = Some(PathBuf::from(dir));
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!("Ignoring invalid PORT={port}"),
            }
        }
    }

    /// Directory converted files are written to.
    ///
    /// In sidecar mode this must be a path both containers share, so the
    /// default is `/tmp` rather than whatever the local temp dir is.
    pub fn output_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.storage.output_dir {
            return dir.clone();
        }
        match self.execution.mode {
            ExecutionMode::Sidecar => PathBuf::from("/tmp"),
            ExecutionMode::Local => std::env::temp_dir(),
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.execution.mode == ExecutionMode::Sidecar {
            if self.execution.sidecar.host.is_empty() {
                warnings.push("execution.sidecar.host is empty".into());
            }
            if self.execution.sidecar.port == 0 {
                warnings.push("execution.sidecar.port is 0".into());
            }
            if self.storage.output_dir.is_none() {
                warnings.push(
                    "sidecar mode without storage.output_dir; assuming /tmp is a shared volume"
                        .into(),
                );
            }
        }

        if self.storage.cleanup_interval_secs == 0 {
            warnings.push("storage.cleanup_interval_secs is 0; cleanup is disabled".into());
        }

        if self.stream.keepalive_secs == 0 {
            warnings.push("stream.keepalive_secs is 0; using 1 second".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

/// Where yt-dlp runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Spawn yt-dlp as a child process.
    #[default]
    Local,
    /// Call the sidecar HTTP service.
    Sidecar,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Local => f.write_str("local"),
            ExecutionMode::Sidecar => f.write_str("sidecar"),
        }
    }
}

/// How the external tool is reached.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub mode: ExecutionMode,
    /// Explicit yt-dlp binary; `PATH` is searched when unset.
    pub ytdlp_path: Option<PathBuf>,
    pub sidecar: SidecarConfig,
}

/// Sidecar service location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SidecarConfig {
    pub host: String,
    pub port: u16,
    /// Transport timeout for a single sidecar request.
    pub timeout_secs: u64,
}

impl SidecarConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            host: "ytdlp".into(),
            port: 8080,
            timeout_secs: 3600,
        }
    }
}

/// Output files and their retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub output_dir: Option<PathBuf>,
    pub retention_secs: u64,
    pub cleanup_interval_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            retention_secs: 3600,
            cleanup_interval_secs: 300,
        }
    }
}

/// Event stream settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub keepalive_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { keepalive_secs: 15 }
    }
}

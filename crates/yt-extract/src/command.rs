//! Builder for executing external tool commands.
//!
//! Unlike a plain `wait_with_output`, [`ToolCommand::execute_streaming`]
//! hands every stdout line to a callback as soon as it is printed, which is
//! how download progress reaches the job store.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use yt_core::{Error, Result};

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
///
/// # Example
///
/// ```no_run
/// use yt_extract::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> yt_core::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("yt-dlp"))
///     .arg("--version")
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Kill the process if it runs longer than `d`. No limit by default;
    /// conversions rely on the tool's own retry flags.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = Some(d);
        self
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tool`] if spawning fails, the process times out, or
    /// it exits with a non-zero status (message is the trimmed stderr).
    pub async fn execute(&self) -> Result<ToolOutput> {
        self.execute_streaming(|_| {}).await
    }

    /// Execute the command, calling `on_line` for every stdout line as it
    /// arrives. Stderr is collected in the background and returned (or used as
    /// the error message) once the process exits.
    pub async fn execute_streaming<F>(&self, mut on_line: F) -> Result<ToolOutput>
    where
        F: FnMut(&str) + Send,
    {
        let name = self.program_name();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(tool = %name, args = ?self.args, "Spawning tool");

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::tool(&name, format!("failed to spawn: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::tool(&name, "stdout was not captured"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::tool(&name, "stderr was not captured"))?;

        // Drain stderr concurrently so a chatty tool cannot fill the pipe and
        // stall while we are blocked on stdout.
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            String::from_utf8_lossy(&buf).to_string()
        });

        let mut collected = String::new();
        let run = async {
            let mut lines = BufReader::new(stdout).split(b'\n');
            while let Some(raw) = lines.next_segment().await? {
                let line = String::from_utf8_lossy(&raw);
                let line = line.trim_end_matches('\r');
                on_line(line);
                collected.push_str(line);
                collected.push('\n');
            }
            child.wait().await
        };

        let waited = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| Error::tool(&name, format!("timed out after {limit:?}")))?,
            None => run.await,
        };
        let status =
            waited.map_err(|e| Error::tool(&name, format!("I/O error waiting for process: {e}")))?;

        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let detail = stderr.trim();
            let message = if detail.is_empty() {
                format!("exited with {status}")
            } else {
                detail.to_string()
            };
            return Err(Error::tool(name, message));
        }

        Ok(ToolOutput {
            status,
            stdout: collected,
            stderr,
        })
    }
}

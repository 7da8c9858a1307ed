//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which builds a full [`AppContext`] around a
//! scripted [`FakeExtractor`] writing into a temporary output directory. The
//! [`TestHarness::with_server`] constructor starts Axum on a random port for
//! HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::Notify;
use yt_core::config::Config;
use yt_core::{Error, Job, Result, TaskId};
use yt_extract::{ConvertRequest, Extractor, ProgressSender};
use yt_server::context::AppContext;
use yt_server::router::build_router;

/// A valid video URL. Append a marker query parameter to script the fake:
///
/// - `fail`: the tool exits with an error
/// - `nofile`: the tool succeeds without writing the output
/// - `hold`: conversion waits until [`FakeExtractor::release`] is called
pub const VIDEO: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

pub fn video(marker: &str) -> String {
    format!("{VIDEO}&t={marker}")
}

/// Extractor that never spawns anything.
#[derive(Default)]
pub struct FakeExtractor {
    calls: Mutex<Vec<String>>,
    gate: Notify,
}

impl FakeExtractor {
    /// URLs passed to `convert`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Let one held conversion continue.
    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl Extractor for FakeExtractor {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch_info(&self, url: &str) -> Result<Value> {
        if url.contains("fail") {
            return Err(Error::tool("yt-dlp", "ERROR: Private video"));
        }
        Ok(json!({
            "id": "dQw4w9WgXcQ",
            "title": "Never Gonna Give You Up",
            "uploader": "Rick Astley",
            "duration": 212.0,
            "duration_string": "3:32",
            "view_count": 1_500_000_000u64,
            "upload_date": "20091025",
            "formats": [{}, {}, {}],
            "is_live": false,
        }))
    }

    async fn convert(&self, request: &ConvertRequest, progress: &ProgressSender) -> Result<()> {
        self.calls.lock().unwrap().push(request.url.clone());

        if request.url.contains("hold") {
            self.gate.notified().await;
        }
        if request.url.contains("fail") {
            return Err(Error::tool("yt-dlp", "ERROR: Video unavailable"));
        }

        progress.send(50.0, "[download]  50.0% of 3.00MiB");
        if !request.url.contains("nofile") {
            tokio::fs::write(&request.output, b"ID3fake-mp3-bytes").await?;
        }
        Ok(())
    }

    async fn health(&self) -> Result<()> {
        Ok(())
    }
}

/// Test harness wrapping a fully-constructed [`AppContext`].
pub struct TestHarness {
    pub ctx: AppContext,
    pub extractor: Arc<FakeExtractor>,
    _output: TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration. The output
    /// directory is always a fresh temp dir.
    pub fn with_config(mut config: Config) -> Self {
        let output = tempfile::tempdir().expect("failed to create temp dir");
        config.storage.output_dir = Some(output.path().to_path_buf());

        let extractor = Arc::new(FakeExtractor::default());
        let ctx = AppContext::new(config, extractor.clone());

        Self {
            ctx,
            extractor,
            _output: output,
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = build_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Wait until the job reaches `completed` or `error`.
    pub async fn wait_terminal(&self, id: TaskId) -> Job {
        tokio::time::timeout(Duration::from_secs(5), self.ctx.scheduler.wait_for_terminal(id))
            .await
            .expect("job did not finish in time")
            .expect("job vanished")
    }
}

/// `POST /api/queue` and return `(status, body)`.
pub async fn submit(addr: SocketAddr, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/queue"))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

/// Submit a valid URL and return its task id.
pub async fn submit_ok(addr: SocketAddr, url: &str) -> TaskId {
    let (status, body) = submit(addr, json!({ "url": url })).await;
    assert_eq!(status, 202, "{body}");
    body["taskId"].as_str().unwrap().parse().unwrap()
}

/// Event names from a raw SSE body, in order. Keep-alive comments are skipped.
pub fn sse_events(body: &str) -> Vec<(String, Value)> {
    let mut events = Vec::new();
    let mut name = String::from("message");
    for line in body.lines() {
        if let Some(n) = line.strip_prefix("event:") {
            name = n.trim().to_string();
        } else if let Some(d) = line.strip_prefix("data:") {
            let data = serde_json::from_str(d.trim()).unwrap_or(Value::Null);
            events.push((std::mem::replace(&mut name, "message".into()), data));
        }
    }
    events
}

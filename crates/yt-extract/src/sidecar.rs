//! Sidecar strategy: delegate to the `yt-sidecar` HTTP service.
//!
//! The sidecar runs `yt-dlp` in its own container and writes into a volume
//! shared with this process, so `ConvertRequest::output` is passed through
//! unchanged. No progress is observable over this transport.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use yt_core::config::SidecarConfig;
use yt_core::{Error, Result};

use crate::extractor::{ConvertRequest, Extractor, ProgressSender};
use crate::tools::YTDLP;

#[derive(Serialize)]
struct InfoBody<'a> {
    url: &'a str,
}

#[derive(Serialize)]
struct ConvertBody<'a> {
    url: &'a str,
    out: String,
    bitrate: u32,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the sidecar service.
#[derive(Debug, Clone)]
pub struct SidecarExtractor {
    http: reqwest::Client,
    base_url: String,
}

impl SidecarExtractor {
    pub fn new(config: &SidecarConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Sidecar(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(http, config.base_url()))
    }

    /// Use a prebuilt client against an arbitrary base URL.
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let url = format!("{}{path}", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Sidecar(format!("request to {url} failed: {e}")))?;
        check_status(resp).await
    }
}

/// Turn a non-2xx answer into the same error class the local strategy
/// produces for a failing tool.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.error)
        .unwrap_or_else(|_| format!("sidecar answered {status}: {text}"));
    Err(Error::tool(YTDLP, message))
}

#[async_trait]
impl Extractor for SidecarExtractor {
    fn name(&self) -> &'static str {
        "sidecar"
    }

    async fn fetch_info(&self, url: &str) -> Result<serde_json::Value> {
        let resp = self.post("/json", &InfoBody { url }).await?;
        resp.json()
            .await
            .map_err(|e| Error::Sidecar(format!("invalid metadata JSON: {e}")))
    }

    async fn convert(&self, request: &ConvertRequest, _progress: &ProgressSender) -> Result<()> {
        let body = ConvertBody {
            url: &request.url,
            out: request.output.to_string_lossy().into_owned(),
            bitrate: request.bitrate,
        };
        self.post("/convert", &body).await?;
        Ok(())
    }

    async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let resp = self
            .http
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| Error::Sidecar(format!("request to {url} failed: {e}")))?;
        check_status(resp).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SidecarExtractor {
        SidecarExtractor::with_client(reqwest::Client::new(), server.uri())
    }

    #[tokio::test]
    async fn fetch_info_posts_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/json"))
            .and(body_json(serde_json::json!({"url": "https://youtu.be/dQw4w9WgXcQ"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "dQw4w9WgXcQ"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let info = client(&server)
            .fetch_info("https://youtu.be/dQw4w9WgXcQ")
            .await
            .unwrap();
        assert_eq!(info["id"], "dQw4w9WgXcQ");
    }

    #[tokio::test]
    async fn convert_sends_out_and_bitrate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/convert"))
            .and(body_json(serde_json::json!({
                "url": "https://youtu.be/dQw4w9WgXcQ",
                "out": "/tmp/abc.mp3",
                "bitrate": 256,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let request = ConvertRequest {
            url: "https://youtu.be/dQw4w9WgXcQ".into(),
            output: "/tmp/abc.mp3".into(),
            bitrate: 256,
        };
        client(&server)
            .convert(&request, &ProgressSender::noop())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn error_body_becomes_tool_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/json"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"error": "ERROR: Video unavailable"})),
            )
            .mount(&server)
            .await;

        let err = client(&server).fetch_info("x").await.unwrap_err();
        match err {
            Error::Tool { message, .. } => assert_eq!(message, "ERROR: Video unavailable"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_sidecar_is_sidecar_error() {
        // Nothing listens on port 9 on a test host.
        let extractor =
            SidecarExtractor::with_client(reqwest::Client::new(), "http://127.0.0.1:9/");
        assert_eq!(extractor.base_url(), "http://127.0.0.1:9");
        let err = extractor.health().await.unwrap_err();
        assert!(matches!(err, Error::Sidecar(_)));
    }

    #[tokio::test]
    async fn health_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;
        client(&server).health().await.unwrap();
    }
}

// Chat completions API client
// Author: kelexine (https://github.com/kelexine)

use super::ChatCompletionRequest;
use crate::config::UpstreamConfig;
use crate::error::{RelayError, Result};
use crate::utils::logging;
use bytes::Bytes;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

/// Raw outcome of a single upstream call.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: String,
}

/// Client for a vision-capable chat completions endpoint.
///
/// One attempt per call; there is no retry policy. The bearer credential is
/// taken from the injected configuration, never from the environment.
#[derive(Debug, Clone)]
pub struct VisionClient {
    http_client: Client,
    config: UpstreamConfig,
    sanitize_logs: bool,
}

impl VisionClient {
    /// Create a client with connection pooling and the configured timeout.
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .build()
            .map_err(|e| RelayError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        debug!("Created HTTP client with {}s timeout", config.timeout_seconds);

        Ok(Self {
            http_client,
            config: config.clone(),
            sanitize_logs: true,
        })
    }

    /// Toggle redaction of secrets in debug logs.
    pub fn with_log_sanitizing(mut self, enabled: bool) -> Self {
        self.sanitize_logs = enabled;
        self
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    /// Full URL of the chat completions endpoint
    pub fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_base_url.trim_end_matches('/')
        )
    }

    /// Fail before any network traffic when no credential is configured.
    pub fn ensure_credentials(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| RelayError::Config("OPENAI_API_KEY not configured".to_string()))
    }

    /// POST the payload and return status and body untouched.
    pub async fn send(&self, request: &ChatCompletionRequest) -> Result<UpstreamReply> {
        let api_key = self.ensure_credentials()?;
        let url = self.endpoint();

        info!(
            "Calling chat completions: model={}, max_tokens={}",
            request.model, request.max_tokens
        );
        if tracing::enabled!(tracing::Level::DEBUG) {
            let payload = serde_json::to_string(request)?;
            debug!(
                "Upstream payload: {}",
                logging::preview(&payload, 300, self.sanitize_logs)
            );
        }

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!("Upstream responded with HTTP {}", status);
        Ok(UpstreamReply { status, body })
    }

    /// Send the payload and parse a successful JSON reply.
    ///
    /// Non-2xx statuses surface as [`RelayError::UpstreamStatus`] carrying
    /// the upstream body; a 2xx body that is not JSON surfaces as
    /// [`RelayError::UpstreamShape`] carrying the raw text.
    pub async fn complete(&self, request: &ChatCompletionRequest) -> Result<Value> {
        let reply = self.send(request).await?;

        if !(200..300).contains(&reply.status) {
            error!(
                "OpenAI API error: HTTP {} - Response body: {}",
                reply.status,
                logging::preview(&reply.body, 1000, self.sanitize_logs)
            );
            return Err(RelayError::UpstreamStatus {
                status: reply.status,
                body: reply.body,
            });
        }

        serde_json::from_str(&reply.body).map_err(|e| {
            error!("Failed to parse upstream response: {}", e);
            RelayError::UpstreamShape {
                body: Value::String(reply.body),
            }
        })
    }

    /// Download a remote image so it can be resized locally.
    ///
    /// The body is read chunk by chunk and abandoned as soon as it passes
    /// `max_bytes`, so an oversized remote file is never fully buffered.
    pub async fn fetch_image(&self, url: &str, max_bytes: usize) -> Result<(Bytes, Option<String>)> {
        debug!("Fetching remote image {}", url);

        let mut response = self.http_client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Decode(format!(
                "Failed to fetch image from {}: HTTP {}",
                url, status
            )));
        }

        let media_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

        if let Some(length) = response.content_length() {
            if length > max_bytes as u64 {
                return Err(oversized_remote(url, max_bytes));
            }
        }

        let mut data = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if data.len() + chunk.len() > max_bytes {
                return Err(oversized_remote(url, max_bytes));
            }
            data.extend_from_slice(&chunk);
        }

        Ok((Bytes::from(data), media_type))
    }
}

fn oversized_remote(url: &str, max_bytes: usize) -> RelayError {
    RelayError::Decode(format!(
        "Image at {} exceeds maximum of {} bytes",
        url, max_bytes
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openai::build_request;
    use serde_json::json;

    fn client_for(base_url: &str, api_key: Option<&str>) -> VisionClient {
        let config = UpstreamConfig {
            api_base_url: base_url.to_string(),
            api_key: api_key.map(str::to_string),
            timeout_seconds: 5,
            ..UpstreamConfig::default()
        };
        VisionClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let client = client_for("https://api.openai.com/v1/", Some("k"));
        assert_eq!(client.endpoint(), "https://api.openai.com/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let client = client_for(&server.url(), None);
        let request = build_request(None, "https://example.com/a.png".to_string(), client.config());
        let result = client.complete(&request).await;

        assert!(matches!(result, Err(RelayError::Config(msg)) if msg == "OPENAI_API_KEY not configured"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_sends_bearer_and_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(mockito::Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "max_tokens": 512
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"ok"}}]}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server.url(), Some("sk-test"));
        let request = build_request(None, "https://example.com/a.png".to_string(), client.config());
        let body = client.complete(&request).await.unwrap();

        assert_eq!(body["choices"][0]["message"]["content"], "ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"bad key"}}"#)
            .create_async()
            .await;

        let client = client_for(&server.url(), Some("sk-test"));
        let request = build_request(None, "https://example.com/a.png".to_string(), client.config());

        match client.complete(&request).await {
            Err(RelayError::UpstreamStatus { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("bad key"));
            }
            other => panic!("expected upstream status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let client = client_for(&server.url(), Some("sk-test"));
        let request = build_request(None, "https://example.com/a.png".to_string(), client.config());
        let result = client.complete(&request).await;

        assert!(matches!(result, Err(RelayError::UpstreamShape { body }) if body == json!("<html>gateway</html>")));
    }

    #[tokio::test]
    async fn test_transport_failure() {
        // Nothing listens on port 9 locally
        let client = client_for("http://127.0.0.1:9", Some("sk-test"));
        let request = build_request(None, "https://example.com/a.png".to_string(), client.config());
        let result = client.complete(&request).await;

        assert!(matches!(result, Err(RelayError::Transport(_))));
    }

    #[tokio::test]
    async fn test_fetch_image_stops_at_size_limit() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/huge.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(vec![0u8; 64 * 1024])
            .create_async()
            .await;

        let client = client_for(&server.url(), Some("sk-test"));
        let result = client
            .fetch_image(&format!("{}/huge.png", server.url()), 1024)
            .await;

        assert!(matches!(result, Err(RelayError::Decode(msg)) if msg.contains("exceeds maximum")));
    }

    #[tokio::test]
    async fn test_fetch_image_within_limit() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/small.png")
            .with_status(200)
            .with_header("content-type", "image/png; charset=binary")
            .with_body(vec![7u8; 512])
            .create_async()
            .await;

        let client = client_for(&server.url(), Some("sk-test"));
        let (data, media_type) = client
            .fetch_image(&format!("{}/small.png", server.url()), 1024)
            .await
            .unwrap();

        assert_eq!(data.len(), 512);
        assert_eq!(media_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_fetch_image_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.png")
            .with_status(404)
            .create_async()
            .await;

        let client = client_for(&server.url(), Some("sk-test"));
        let result = client
            .fetch_image(&format!("{}/missing.png", server.url()), 1024)
            .await;

        assert!(matches!(result, Err(RelayError::Decode(msg)) if msg.contains("HTTP 404")));
    }
}

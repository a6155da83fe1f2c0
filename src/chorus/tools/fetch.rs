//! HTTP content-fetch adapter.
//!
//! Wraps `reqwest` behind the uniform [`ToolAdapter`] interface with the
//! single operation `fetch {url} -> {text}`. URLs are validated before any
//! network traffic (only `http`/`https` schemes are accepted), responses
//! are size-capped, and every request carries a per-call deadline so a
//! stalled fetch surfaces as [`ToolFailure::Timeout`] instead of blocking
//! the scheduler.
//!
//! # Example
//!
//! ```rust,no_run
//! use chorus::tools::HttpFetchTool;
//! use chorus::tool::{ToolAdapter, ToolRequest};
//! use serde_json::json;
//! use std::time::Duration;
//!
//! # async {
//! let fetch = HttpFetchTool::new().with_timeout(Duration::from_secs(10));
//! let page = fetch
//!     .call(ToolRequest::new("fetch", json!({"url": "https://example.com"})))
//!     .await
//!     .unwrap();
//! println!("{}", page["text"]);
//! # };
//! ```

use crate::chorus::tool::{ToolAdapter, ToolFailure, ToolOutcome, ToolRequest};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default cap on the amount of body text returned, in bytes.
const DEFAULT_MAX_BYTES: usize = 1024 * 1024;

/// Fetches the textual content of a URL.
pub struct HttpFetchTool {
    client: reqwest::Client,
    timeout: Duration,
    max_bytes: usize,
}

impl Default for HttpFetchTool {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetchTool {
    /// Create a fetch tool with a fresh HTTP client and default limits.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: DEFAULT_TIMEOUT,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }

    /// Override the per-call deadline (builder pattern).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the response-size cap (builder pattern).
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn validate_url(&self, raw: &str) -> Result<reqwest::Url, ToolFailure> {
        let url = reqwest::Url::parse(raw)
            .map_err(|e| ToolFailure::InvalidInput(format!("unparseable url '{}': {}", raw, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ToolFailure::InvalidInput(format!(
                "unsupported scheme '{}'",
                other
            ))),
        }
    }
}

#[async_trait]
impl ToolAdapter for HttpFetchTool {
    fn name(&self) -> &str {
        "http_fetch"
    }

    async fn call(&self, request: ToolRequest) -> ToolOutcome {
        if request.operation != "fetch" {
            return Err(ToolFailure::InvalidInput(format!(
                "http_fetch has no operation '{}'",
                request.operation
            )));
        }
        let raw = request.params["url"]
            .as_str()
            .ok_or_else(|| ToolFailure::InvalidInput("missing string parameter 'url'".into()))?;
        let url = self.validate_url(raw)?;

        log::debug!("http_fetch: GET {}", url);
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ToolFailure::Timeout(format!("fetch of '{}' after {:?}", raw, self.timeout))
                } else {
                    ToolFailure::NonZeroStatus(format!("fetch of '{}' failed: {}", raw, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolFailure::NonZeroStatus(format!(
                "'{}' answered {}",
                raw, status
            )));
        }

        let mut text = response.text().await.map_err(|e| {
            ToolFailure::MalformedResponse(format!("undecodable body from '{}': {}", raw, e))
        })?;
        if text.len() > self.max_bytes {
            let mut cut = self.max_bytes;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            text.truncate(cut);
        }

        Ok(json!({ "text": text }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_unknown_operation_and_bad_urls() {
        let tool = HttpFetchTool::new();

        let err = tool
            .call(ToolRequest::new("post", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolFailure::InvalidInput(_)));

        let err = tool
            .call(ToolRequest::new("fetch", json!({"url": "not a url"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolFailure::InvalidInput(_)));

        let err = tool
            .call(ToolRequest::new("fetch", json!({"url": "ftp://example.com"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolFailure::InvalidInput(_)));
    }
}

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use tracing::debug;

use super::types::*;
use crate::error::AiError;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub(crate) struct ClaudeClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl ClaudeClient {
    pub fn new(api_key: &str) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            api_key: api_key.to_string(),
            http,
            base_url: ANTHROPIC_API_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap, AiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| AiError::Config(format!("invalid API key header: {e}")))?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    pub async fn messages(&self, request: &MessagesRequest) -> Result<MessagesResponse, AiError> {
        let url = format!("{}/messages", self.base_url);

        debug!(model = %request.model, "Claude messages request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Anthropic sends retry-after as a header rather than in the body.
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.unwrap_or_default();
            let body = error_body(body, retry_after.as_deref());
            return Err(AiError::Api {
                provider: "Claude",
                status,
                body,
            });
        }

        Ok(response.json().await?)
    }
}

/// Error payload with any `retry-after` hint appended in a form the
/// classifier's delay parser recognises.
fn error_body(mut body: String, retry_after: Option<&str>) -> String {
    if let Some(secs) = retry_after.map(str::trim).filter(|s| !s.is_empty()) {
        body.push_str(&format!(" (retry after {secs} seconds)"));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_header_is_appended_to_body() {
        let body = error_body(r#"{"type":"rate_limit_error"}"#.to_string(), Some("30"));
        assert_eq!(body, r#"{"type":"rate_limit_error"} (retry after 30 seconds)"#);
    }

    #[test]
    fn body_is_unchanged_without_retry_after() {
        assert_eq!(error_body("overloaded".to_string(), None), "overloaded");
        assert_eq!(error_body("overloaded".to_string(), Some("  ")), "overloaded");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ClaudeClient::new("sk-ant-test")
            .unwrap()
            .with_base_url("http://localhost:9999/v1/");
        assert_eq!(client.base_url, "http://localhost:9999/v1");
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Non-2xx response. `status` renders as e.g. `429 Too Many Requests`,
    /// and `body` is the provider's raw error payload.
    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Empty response from {0}")]
    EmptyResponse(&'static str),
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AiError::Timeout(e.to_string())
        } else {
            AiError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for AiError {
    fn from(e: serde_json::Error) -> Self {
        AiError::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_description_carries_status_and_body() {
        let err = AiError::Api {
            provider: "Gemini",
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
            body: r#"{"error":{"code":429}}"#.to_string(),
        };
        let text = err.to_string();
        assert!(text.starts_with("Gemini API error (429 Too Many Requests)"));
        assert!(text.contains(r#""code":429"#));
    }

    #[test]
    fn other_statuses_render_without_rate_limit_markers() {
        let err = AiError::Api {
            provider: "Claude",
            status: reqwest::StatusCode::UNAUTHORIZED,
            body: "invalid x-api-key".to_string(),
        };
        assert_eq!(err.to_string(), "Claude API error (401 Unauthorized): invalid x-api-key");
    }

    #[test]
    fn timeouts_say_timed_out() {
        let err = AiError::Timeout("operation timed out".to_string());
        assert!(err.to_string().starts_with("Request timed out"));
    }
}

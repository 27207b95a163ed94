use std::sync::{Arc, LazyLock};
use std::time::Duration;

use rand::Rng;
use regex::Regex;
use tracing::{debug, warn};

use toxicity_common::{
    is_missing_text, secs_to_duration, truncate_chars, Backoff, ClassificationResult,
};

use crate::normalizer;
use crate::prompt::build_prompt;
use crate::traits::CompletionModel;

/// Characters of the error description kept in a terminal explanation.
const ERROR_EXCERPT_CHARS: usize = 100;
pub const RETRIES_EXHAUSTED: &str = "Failed after maximum retries";

const RATE_LIMIT_MARKERS: &[&str] = &["429", "rate limit", "resource_exhausted", "quota"];
const TIMEOUT_MARKERS: &[&str] = &["timed out", "deadline_exceeded", "deadline exceeded"];

// gRPC-style `retry_delay { seconds: 37 }`, REST JSON `"retryDelay": "37s"`,
// and plain `retry after 37 seconds`.
static RETRY_DELAY_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)retry_delay\s*\{\s*seconds:\s*(\d+)").expect("static regex"),
        Regex::new(r#"(?i)"retryDelay"\s*:\s*"(\d+(?:\.\d+)?)s""#).expect("static regex"),
        Regex::new(r"(?i)retry after (\d+(?:\.\d+)?) seconds?").expect("static regex"),
    ]
});

/// Whether an error description signals quota exhaustion.
pub fn is_rate_limited(description: &str) -> bool {
    let lower = description.to_ascii_lowercase();
    RATE_LIMIT_MARKERS.iter().any(|m| lower.contains(m))
}

fn is_timeout(description: &str) -> bool {
    let lower = description.to_ascii_lowercase();
    TIMEOUT_MARKERS.iter().any(|m| lower.contains(m))
}

/// Server-suggested wait, in seconds, embedded in an error description.
pub fn suggested_retry_delay(description: &str) -> Option<f64> {
    RETRY_DELAY_PATTERNS.iter().find_map(|re| {
        re.captures(description)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
    })
}

/// Wait before the retry following failure number `attempts` (1-based).
/// A server suggestion wins over computed backoff; both are capped.
pub fn retry_delay(description: &str, attempts: u32, backoff: &Backoff, jitter: f64) -> Duration {
    let secs = suggested_retry_delay(description).unwrap_or_else(|| {
        backoff.base_secs * 2f64.powi(attempts.min(30) as i32) + jitter
    });
    secs_to_duration(secs.min(backoff.max_secs))
}

/// Scores one text at a time against the remote model, absorbing every
/// failure into a neutral result.
pub struct RetryingClassifier {
    model: Arc<dyn CompletionModel>,
    backoff: Backoff,
    max_retries: u32,
}

impl RetryingClassifier {
    pub fn new(model: Arc<dyn CompletionModel>, backoff: Backoff, max_retries: u32) -> Self {
        Self {
            model,
            backoff,
            max_retries,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub async fn classify(&self, text: &str) -> ClassificationResult {
        self.classify_with_retries(text, self.max_retries).await
    }

    /// At most `max_retries + 1` model calls. Only rate-limit and timeout
    /// failures are retried; any other failure returns immediately.
    pub async fn classify_with_retries(
        &self,
        text: &str,
        max_retries: u32,
    ) -> ClassificationResult {
        if is_missing_text(text) {
            return normalizer::empty_text();
        }

        let prompt = build_prompt(text.trim());
        let mut attempts: u32 = 0;

        while attempts <= max_retries {
            match self.model.complete(&prompt).await {
                Ok(raw) => {
                    debug!(
                        attempts,
                        model = self.model.model_name(),
                        "Classification response received"
                    );
                    return normalizer::normalize(&raw);
                }
                Err(err) => {
                    let description = format!("{err:#}");
                    attempts += 1;

                    let retryable = is_rate_limited(&description) || is_timeout(&description);
                    if retryable && attempts <= max_retries {
                        let delay =
                            retry_delay(&description, attempts, &self.backoff, self.jitter());
                        warn!(
                            attempt = attempts,
                            max_retries,
                            delay_secs = delay.as_secs_f64(),
                            "Classifier rate limited, waiting before retry"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    if attempts > max_retries {
                        warn!(
                            attempts,
                            error = %description,
                            "Maximum retries exceeded, giving up on text"
                        );
                    } else {
                        warn!(error = %description, "Classification failed");
                    }
                    return ClassificationResult::fallback(format!(
                        "Error: {}...",
                        truncate_chars(&description, ERROR_EXCERPT_CHARS)
                    ));
                }
            }
        }

        ClassificationResult::fallback(RETRIES_EXHAUSTED)
    }

    fn jitter(&self) -> f64 {
        if self.backoff.jitter_secs > 0.0 {
            rand::rng().random_range(0.0..self.backoff.jitter_secs)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedModel;

    fn classifier(model: &Arc<ScriptedModel>) -> RetryingClassifier {
        RetryingClassifier::new(model.clone(), Backoff::default(), 5)
    }

    #[test]
    fn rate_limit_markers() {
        assert!(is_rate_limited("Gemini API error (429 Too Many Requests): {}"));
        assert!(is_rate_limited("RESOURCE_EXHAUSTED: quota exceeded"));
        assert!(is_rate_limited("Rate limit reached for requests"));
        assert!(!is_rate_limited("Gemini API error (400 Bad Request): API key not valid"));
    }

    #[test]
    fn suggested_delay_formats() {
        assert_eq!(
            suggested_retry_delay("429 ... retry_delay {\n  seconds: 37\n}"),
            Some(37.0)
        );
        let rest_body =
            r#"{"@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": "12s"}"#;
        assert_eq!(suggested_retry_delay(rest_body), Some(12.0));
        assert_eq!(suggested_retry_delay("429 (Retry after 8 seconds)"), Some(8.0));
        assert_eq!(suggested_retry_delay("429 Too Many Requests"), None);
    }

    #[test]
    fn backoff_grows_and_is_capped() {
        let backoff = Backoff::default();
        assert_eq!(retry_delay("429", 1, &backoff, 0.0), Duration::from_secs(120));
        assert_eq!(retry_delay("429", 1, &backoff, 9.5), Duration::from_secs_f64(129.5));
        assert_eq!(retry_delay("429", 2, &backoff, 0.0), Duration::from_secs(240));
        assert_eq!(retry_delay("429", 3, &backoff, 0.0), Duration::from_secs(300));
        assert_eq!(retry_delay("429", 40, &backoff, 0.0), Duration::from_secs(300));
    }

    #[test]
    fn server_suggestion_wins_but_is_capped() {
        let backoff = Backoff::default();
        assert_eq!(
            retry_delay("429 retry after 7 seconds", 3, &backoff, 5.0),
            Duration::from_secs(7)
        );
        assert_eq!(
            retry_delay("429 retry after 9000 seconds", 1, &backoff, 0.0),
            Duration::from_secs(300)
        );
    }

    #[test]
    fn oversized_delays_saturate_instead_of_panicking() {
        let backoff = Backoff {
            max_secs: f64::MAX,
            ..Backoff::default()
        };
        let huge = format!("429 retry after {} seconds", "9".repeat(400));
        assert_eq!(retry_delay(&huge, 1, &backoff, 0.0), Duration::MAX);
        assert_eq!(retry_delay("429", 1000, &backoff, 0.0), Duration::from_secs(60 << 30));

        let negative = Backoff {
            max_secs: -1.0,
            ..Backoff::default()
        };
        assert_eq!(retry_delay("429", 1, &negative, 0.0), Duration::ZERO);
    }

    #[tokio::test]
    async fn blank_text_makes_no_calls() {
        let model = Arc::new(ScriptedModel::always(r#"{"toxicity_score": 9}"#));
        let classifier = classifier(&model);

        for text in ["", "   ", "\n\t", "nan"] {
            let result = classifier.classify(text).await;
            assert_eq!(result, ClassificationResult::fallback("Empty text"));
        }
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn success_is_normalized() {
        let model = Arc::new(ScriptedModel::always(
            r#"```json {"toxicity_score": 3, "explanation": "mild"} ```"#,
        ));
        let result = classifier(&model).classify("  you are wrong  ").await;
        assert_eq!(result, ClassificationResult::new(3, "mild"));
        assert_eq!(model.calls(), 1);
        assert!(model.prompts()[0].contains("\"you are wrong\""));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_retries_then_gives_up() {
        let model = Arc::new(ScriptedModel::always_err(
            "Gemini API error (429 Too Many Requests): quota",
        ));
        let started = tokio::time::Instant::now();

        let result = classifier(&model).classify_with_retries("hello", 3).await;

        assert_eq!(model.calls(), 4);
        assert_eq!(result.score, 1);
        assert!(result.explanation.starts_with("Error: Gemini API error (429"));
        assert!(result.explanation.ends_with("..."));
        // 120 + 240 + 300 seconds, plus up to 10s jitter on the first two.
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(660));
        assert!(waited < Duration::from_secs(681));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_then_success() {
        let model = Arc::new(ScriptedModel::sequence(vec![
            Err("429 retry after 3 seconds".to_string()),
            Ok(r#"{"toxicity_score": 5, "explanation": "ok"}"#.to_string()),
        ]));
        let started = tokio::time::Instant::now();

        let result = classifier(&model).classify("hello").await;

        assert_eq!(result, ClassificationResult::new(5, "ok"));
        assert_eq!(model.calls(), 2);
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(3) && waited < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn permanent_error_returns_after_one_call() {
        let model = Arc::new(ScriptedModel::always_err(
            "Gemini API error (400 Bad Request): API key not valid. Please pass a valid API key.",
        ));
        let result = classifier(&model).classify("hello").await;

        assert_eq!(model.calls(), 1);
        assert_eq!(result.score, 1);
        assert!(result.explanation.starts_with("Error: Gemini API error (400 Bad Request)"));
    }

    #[tokio::test]
    async fn error_excerpt_is_truncated_to_100_chars() {
        let long = format!("boom {}", "x".repeat(300));
        let model = Arc::new(ScriptedModel::always_err(&long));
        let result = classifier(&model).classify("hello").await;

        let excerpt = result
            .explanation
            .strip_prefix("Error: ")
            .and_then(|s| s.strip_suffix("..."))
            .unwrap();
        assert_eq!(excerpt.chars().count(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_means_single_attempt() {
        let model = Arc::new(ScriptedModel::always_err("429 Too Many Requests"));
        let result = classifier(&model).classify_with_retries("hello", 0).await;
        assert_eq!(model.calls(), 1);
        assert!(result.explanation.starts_with("Error: 429"));
    }

    #[tokio::test(start_paused = true)]
    async fn timeouts_are_retried() {
        let model = Arc::new(ScriptedModel::sequence(vec![
            Err("Request timed out: operation timed out".to_string()),
            Ok(r#"{"toxicity_score": 2, "explanation": "calm"}"#.to_string()),
        ]));
        let result = classifier(&model).classify("hello").await;
        assert_eq!(result.score, 2);
        assert_eq!(model.calls(), 2);
    }
}

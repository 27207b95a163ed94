//! Turns whatever the model sent back into a [`ClassificationResult`].
//!
//! The model is asked for bare JSON but routinely wraps it in prose or code
//! fences, so the first `{` through the last `}` is taken as the candidate
//! object. Nothing here fails: every malformed shape maps to the neutral score
//! with a fixed explanation.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use toxicity_common::{ClassificationResult, MIN_SCORE};

pub const EMPTY_TEXT: &str = "Empty text";
pub const NO_JSON_FOUND: &str = "No JSON found in response";
pub const PARSE_FAILED: &str = "Failed to parse JSON response";
pub const NO_EXPLANATION: &str = "No explanation provided";

static JSON_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("static regex"));

/// Result for text that has nothing to classify.
pub fn empty_text() -> ClassificationResult {
    ClassificationResult::fallback(EMPTY_TEXT)
}

/// Greedy `{ ... }` span of `response`, if any.
pub fn extract_json_block(response: &str) -> Option<&str> {
    JSON_BLOCK.find(response).map(|m| m.as_str())
}

pub fn normalize(response: &str) -> ClassificationResult {
    if response.trim().is_empty() {
        return empty_text();
    }

    let Some(block) = extract_json_block(response) else {
        return ClassificationResult::fallback(NO_JSON_FOUND);
    };

    let object: Map<String, Value> = match serde_json::from_str(block) {
        Ok(object) => object,
        Err(e) => {
            tracing::debug!(error = %e, "Unparseable classifier JSON");
            return ClassificationResult::fallback(PARSE_FAILED);
        }
    };

    let score = coerce_score(object.get("toxicity_score"));
    let explanation = match object.get("explanation") {
        None | Some(Value::Null) => NO_EXPLANATION.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    ClassificationResult::new(score, explanation)
}

/// Integer value of a JSON score. Floats and numeric strings truncate toward
/// zero; anything else is the minimum score.
fn coerce_score(value: Option<&Value>) -> i64 {
    let fallback = MIN_SCORE as i64;
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(fallback),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f.trunc() as i64)
                })
                .unwrap_or(fallback)
        }
        _ => fallback,
    }
}

use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// CompletionModel Trait
// =============================================================================

/// A single-shot text completion: prompt in, raw response text out.
///
/// Errors are returned as-is; callers that care about quota exhaustion inspect
/// the error description (providers render the HTTP status into it).
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Human-readable model identifier for logs.
    fn model_name(&self) -> &str;
}

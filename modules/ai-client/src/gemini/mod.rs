mod client;
pub(crate) mod types;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::error::AiError;
use crate::traits::CompletionModel;
use client::GeminiClient;
use types::GenerateContentRequest;

// =============================================================================
// Gemini Model
// =============================================================================

#[derive(Clone)]
pub struct Gemini {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
    temperature: Option<f32>,
}

impl Gemini {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            temperature: None,
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .map_err(|_| anyhow!("GEMINI_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> Result<GeminiClient, AiError> {
        let client = GeminiClient::new(&self.api_key)?;
        Ok(match self.base_url {
            Some(ref url) => client.with_base_url(url),
            None => client,
        })
    }

    /// Send a single user prompt and return the text of the first candidate.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, AiError> {
        let mut request = GenerateContentRequest::prompt(prompt);
        if let Some(t) = self.temperature {
            request = request.temperature(t);
        }

        let response = self.client()?.generate(&self.model, &request).await?;

        response.text().ok_or(AiError::EmptyResponse("Gemini"))
    }
}

#[async_trait]
impl CompletionModel for Gemini {
    async fn complete(&self, prompt: &str) -> Result<String> {
        Ok(self.generate_text(prompt).await?)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

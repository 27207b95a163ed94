use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::error::ToxicityError;

const CONFIG_ENV: &str = "TOXICITY_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "toxicity.toml";

/// Longest pacing or backoff delay a config may ask for.
pub const MAX_DELAY_SECS: f64 = 86_400.0;

/// Seconds to a `Duration`, saturating instead of panicking on values a
/// `Duration` cannot hold. NaN and negatives become zero.
pub fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

// --- Enumerations ---

/// Ranking window for a source's `top` listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingWindow {
    Hour,
    Day,
    Week,
    #[default]
    Month,
    Year,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    Claude,
}

impl Provider {
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.0-flash-lite",
            Provider::Claude => "claude-3-5-haiku-latest",
        }
    }
}

// --- Pacing and backoff ---

/// Courtesy delays toward the content source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Pacing {
    pub comment_delay_secs: f64,
    pub post_delay_secs: f64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            comment_delay_secs: 2.0,
            post_delay_secs: 5.0,
        }
    }
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            comment_delay_secs: 0.0,
            post_delay_secs: 0.0,
        }
    }

    pub fn comment_delay(&self) -> Duration {
        secs_to_duration(self.comment_delay_secs)
    }

    pub fn post_delay(&self) -> Duration {
        secs_to_duration(self.post_delay_secs)
    }
}

/// Rate-limit backoff: `min(base * 2^attempt + jitter, max)`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Backoff {
    pub base_secs: f64,
    pub max_secs: f64,
    pub jitter_secs: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base_secs: 60.0,
            max_secs: 300.0,
            jitter_secs: 10.0,
        }
    }
}

// --- Run configuration ---

/// Everything a run needs besides secrets. Passed explicitly into the corpus
/// builder; nothing here is process-global.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoutConfig {
    pub sources: Vec<String>,
    pub post_limit: u32,
    pub comment_limit: usize,
    pub window: RankingWindow,
    pub max_retries: u32,
    pub pacing: Pacing,
    pub backoff: Backoff,
    pub output_path: PathBuf,
    pub provider: Provider,
    pub model: Option<String>,
    pub report_top_n: usize,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            sources: vec!["politics".to_string(), "conservative".to_string()],
            post_limit: 10,
            comment_limit: 5,
            window: RankingWindow::Month,
            max_retries: 5,
            pacing: Pacing::default(),
            backoff: Backoff::default(),
            output_path: PathBuf::from("monthly_toxicity_analysis.csv"),
            provider: Provider::Gemini,
            model: None,
            report_top_n: 3,
        }
    }
}

impl ScoutConfig {
    /// Defaults overlaid with `$TOXICITY_CONFIG` (or `./toxicity.toml` when it
    /// exists). An explicitly named file must exist.
    pub fn load() -> Result<Self, ToxicityError> {
        match env::var(CONFIG_ENV) {
            Ok(path) => Self::from_toml_file(Path::new(&path)),
            Err(_) => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_toml_file(path)
                } else {
                    let config = Self::default();
                    config.validate()?;
                    Ok(config)
                }
            }
        }
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ToxicityError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ToxicityError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&content).map_err(|e| match e {
            ToxicityError::Config(msg) => {
                ToxicityError::Config(format!("{}: {msg}", path.display()))
            }
            other => other,
        })?;
        info!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ToxicityError> {
        let config: ScoutConfig =
            toml::from_str(content).map_err(|e| ToxicityError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ToxicityError> {
        if self.sources.is_empty() {
            return Err(ToxicityError::Config("sources must not be empty".into()));
        }
        if let Some(blank) = self.sources.iter().find(|s| s.trim().is_empty()) {
            return Err(ToxicityError::Config(format!("invalid source name {blank:?}")));
        }
        let delays = [
            self.pacing.comment_delay_secs,
            self.pacing.post_delay_secs,
            self.backoff.base_secs,
            self.backoff.max_secs,
            self.backoff.jitter_secs,
        ];
        if delays.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(ToxicityError::Config(
                "pacing and backoff values must be finite and non-negative".into(),
            ));
        }
        if delays.iter().any(|d| *d > MAX_DELAY_SECS) {
            return Err(ToxicityError::Config(format!(
                "pacing and backoff values must not exceed {MAX_DELAY_SECS} seconds"
            )));
        }
        if self.report_top_n == 0 {
            return Err(ToxicityError::Config("report_top_n must be at least 1".into()));
        }
        Ok(())
    }

    pub fn model_name(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }
}

// --- Secrets ---

/// Credentials and identifiers that stay in the environment.
#[derive(Clone, Default)]
pub struct Secrets {
    pub gemini_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub reddit_user_agent: Option<String>,
}

impl Secrets {
    /// Read from the environment, after loading `.env` when present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            gemini_api_key: env::var("GEMINI_API_KEY")
                .or_else(|_| env::var("GOOGLE_API_KEY"))
                .ok(),
            anthropic_api_key: env::var("ANTHROPIC_API_KEY").ok(),
            reddit_user_agent: env::var("REDDIT_USER_AGENT").ok(),
        }
    }

    pub fn api_key_for(&self, provider: Provider) -> Result<&str, ToxicityError> {
        let (key, var) = match provider {
            Provider::Gemini => (&self.gemini_api_key, "GEMINI_API_KEY"),
            Provider::Claude => (&self.anthropic_api_key, "ANTHROPIC_API_KEY"),
        };
        key.as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ToxicityError::Config(format!("{var} environment variable is required")))
    }

    pub fn log_redacted(&self) {
        info!(
            gemini_api_key = presence(&self.gemini_api_key),
            anthropic_api_key = presence(&self.anthropic_api_key),
            reddit_user_agent = self.reddit_user_agent.as_deref().unwrap_or("(default)"),
            "Secrets loaded"
        );
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("gemini_api_key", &presence(&self.gemini_api_key))
            .field("anthropic_api_key", &presence(&self.anthropic_api_key))
            .field("reddit_user_agent", &self.reddit_user_agent)
            .finish()
    }
}

fn presence(value: &Option<String>) -> &'static str {
    match value {
        Some(v) if !v.is_empty() => "set",
        _ => "missing",
    }
}

pub mod config;
pub mod error;
pub mod text;
pub mod types;

pub use config::{
    secs_to_duration, Backoff, Pacing, Provider, RankingWindow, ScoutConfig, Secrets,
    MAX_DELAY_SECS,
};
pub use error::ToxicityError;
pub use text::{is_missing_text, truncate_chars};
pub use types::*;

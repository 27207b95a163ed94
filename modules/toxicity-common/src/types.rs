use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::text::is_missing_text;

/// Lowest score on the rubric, and the neutral score every failure falls back to.
pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;

// --- Item kind ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Post,
    Comment,
}

impl ItemKind {
    pub const ALL: [ItemKind; 2] = [ItemKind::Post, ItemKind::Comment];

    pub fn plural(&self) -> &'static str {
        match self {
            ItemKind::Post => "posts",
            ItemKind::Comment => "comments",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Post => f.write_str("post"),
            ItemKind::Comment => f.write_str("comment"),
        }
    }
}

// --- Classification ---

/// A normalized classifier verdict. `score` is always within
/// [`MIN_SCORE`, `MAX_SCORE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub score: u8,
    pub explanation: String,
}

impl ClassificationResult {
    /// Build a result from any integer score, clamping into the rubric range.
    pub fn new(score: i64, explanation: impl Into<String>) -> Self {
        let score = score.clamp(MIN_SCORE as i64, MAX_SCORE as i64) as u8;
        Self {
            score,
            explanation: explanation.into(),
        }
    }

    /// The neutral score with a diagnostic explanation.
    pub fn fallback(explanation: impl Into<String>) -> Self {
        Self {
            score: MIN_SCORE,
            explanation: explanation.into(),
        }
    }
}

// --- Scored item ---

/// One scored post title or comment body, as produced during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredItem {
    pub source: String,
    pub parent_title: String,
    pub kind: ItemKind,
    pub text: String,
    pub score: u8,
    pub explanation: String,
    pub post_date: Option<NaiveDate>,
    pub comment_date: Option<NaiveDate>,
}

/// A persisted row. Posts carry an empty `comment_text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub subreddit: String,
    pub post_title: String,
    pub post_date: Option<NaiveDate>,
    pub comment_date: Option<NaiveDate>,
    #[serde(default)]
    pub comment_text: String,
    pub toxicity_score: u8,
    #[serde(default)]
    pub explanation: String,
}

/// Column order of the persisted table.
pub const CORPUS_COLUMNS: [&str; 7] = [
    "subreddit",
    "post_title",
    "post_date",
    "comment_date",
    "comment_text",
    "toxicity_score",
    "explanation",
];

impl CorpusRecord {
    pub fn kind(&self) -> ItemKind {
        if is_missing_text(&self.comment_text) {
            ItemKind::Post
        } else {
            ItemKind::Comment
        }
    }
}

impl From<&ScoredItem> for CorpusRecord {
    fn from(item: &ScoredItem) -> Self {
        let comment_text = match item.kind {
            ItemKind::Post => String::new(),
            ItemKind::Comment => item.text.clone(),
        };
        CorpusRecord {
            subreddit: item.source.clone(),
            post_title: item.parent_title.clone(),
            post_date: item.post_date,
            comment_date: item.comment_date,
            comment_text,
            toxicity_score: item.score,
            explanation: item.explanation.clone(),
        }
    }
}

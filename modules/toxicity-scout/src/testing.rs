// Test doubles for the corpus pipeline.
//
// - MockSource (ContentSource): scripted subreddits, posts and comment trees,
//   with per-source and per-post failure injection.
// - ScriptedModel (CompletionModel): canned or prompt-dependent responses,
//   recording every prompt it receives.
//
// Plus constructors for `Submission` and `Comment` fixtures.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use toxicity_common::RankingWindow;

use crate::traits::{Comment, CompletionModel, ContentSource, Submission};

// ---------------------------------------------------------------------------
// Fixture constructors
// ---------------------------------------------------------------------------

/// 2024-06-01T00:00:00Z
pub const FIXTURE_EPOCH: i64 = 1_717_200_000;

pub fn submission(id: &str, title: &str) -> Submission {
    Submission {
        id: id.to_string(),
        subreddit: String::new(),
        title: title.to_string(),
        created_at: DateTime::<Utc>::from_timestamp(FIXTURE_EPOCH, 0),
        permalink: None,
        num_comments: 0,
    }
}

pub fn comment(id: &str, body: &str) -> Comment {
    Comment {
        id: id.to_string(),
        body: Some(body.to_string()),
        created_at: DateTime::<Utc>::from_timestamp(FIXTURE_EPOCH + 86_400, 0),
    }
}

/// A comment whose payload carried no body.
pub fn bodiless_comment(id: &str) -> Comment {
    Comment {
        id: id.to_string(),
        body: None,
        created_at: None,
    }
}

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// In-memory content source. Unregistered sources return `Err`.
/// Builder pattern: `.on_source()`, `.failing_source()`, `.failing_comments()`.
pub struct MockSource {
    sources: HashMap<String, Vec<(Submission, Vec<Comment>)>>,
    failing_sources: HashSet<String>,
    failing_comments: HashSet<String>,
    requests: Mutex<Vec<(String, RankingWindow, u32)>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
            failing_sources: HashSet::new(),
            failing_comments: HashSet::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn on_source(mut self, source: &str, posts: Vec<(Submission, Vec<Comment>)>) -> Self {
        self.sources.insert(source.to_string(), posts);
        self
    }

    pub fn failing_source(mut self, source: &str) -> Self {
        self.failing_sources.insert(source.to_string());
        self
    }

    pub fn failing_comments(mut self, post_id: &str) -> Self {
        self.failing_comments.insert(post_id.to_string());
        self
    }

    /// Every `top_submissions` call as `(source, window, limit)`.
    pub fn requests(&self) -> Vec<(String, RankingWindow, u32)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentSource for MockSource {
    async fn top_submissions(
        &self,
        source: &str,
        window: RankingWindow,
        limit: u32,
    ) -> Result<Vec<Submission>> {
        self.requests
            .lock()
            .unwrap()
            .push((source.to_string(), window, limit));

        if self.failing_sources.contains(source) {
            return Err(anyhow!("MockSource: listing for {source} failed"));
        }
        let posts = self
            .sources
            .get(source)
            .ok_or_else(|| anyhow!("MockSource: no source registered for {source}"))?;
        Ok(posts
            .iter()
            .take(limit as usize)
            .map(|(s, _)| Submission {
                subreddit: source.to_string(),
                ..s.clone()
            })
            .collect())
    }

    async fn top_comments(&self, submission: &Submission) -> Result<Vec<Comment>> {
        if self.failing_comments.contains(&submission.id) {
            return Err(anyhow!("MockSource: comments for {} failed", submission.id));
        }
        self.sources
            .values()
            .flatten()
            .find(|(s, _)| s.id == submission.id)
            .map(|(_, comments)| comments.clone())
            .ok_or_else(|| anyhow!("MockSource: no post registered with id {}", submission.id))
    }
}

// ---------------------------------------------------------------------------
// ScriptedModel
// ---------------------------------------------------------------------------

type Responder = Box<dyn Fn(&str) -> std::result::Result<String, String> + Send + Sync>;

/// Completion model driven by a script. Errors are plain strings so tests can
/// embed rate-limit markers exactly as a provider would.
pub struct ScriptedModel {
    responder: Responder,
    queue: Mutex<VecDeque<std::result::Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    /// Responses computed from the prompt.
    pub fn from_fn(
        f: impl Fn(&str) -> std::result::Result<String, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(f),
            queue: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn always(response: impl Into<String>) -> Self {
        let response = response.into();
        Self::from_fn(move |_| Ok(response.clone()))
    }

    pub fn always_err(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_fn(move |_| Err(message.clone()))
    }

    /// Replies in order; once exhausted every call fails.
    pub fn sequence(replies: Vec<std::result::Result<String, String>>) -> Self {
        let model = Self::from_fn(|_| Err("ScriptedModel: script exhausted".to_string()));
        *model.queue.lock().unwrap() = replies.into();
        model
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let queued = self.queue.lock().unwrap().pop_front();
        let reply = match queued {
            Some(reply) => reply,
            None => (self.responder)(prompt),
        };
        reply.map_err(|e| anyhow!(e))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// JSON reply in the shape the prompt asks for.
pub fn verdict(score: u8, explanation: &str) -> String {
    serde_json::json!({ "toxicity_score": score, "explanation": explanation }).to_string()
}

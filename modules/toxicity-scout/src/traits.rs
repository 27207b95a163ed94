// Collaborator seams for the corpus pipeline.
//
// ContentSource: ranked submissions and their comment trees.
// CompletionModel (re-exported from ai-client): prompt in, raw text out.
//
// Both are implemented by the real network clients here and by the mocks in
// `testing`, so the whole pipeline runs in tests without network.

use anyhow::Result;
use async_trait::async_trait;

pub use ai_client::CompletionModel;
pub use reddit_client::{Comment, Submission};

use reddit_client::{RedditClient, TimeFilter};
use toxicity_common::RankingWindow;

// ---------------------------------------------------------------------------
// ContentSource
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Top-ranked submissions of `source` within `window`, best first.
    async fn top_submissions(
        &self,
        source: &str,
        window: RankingWindow,
        limit: u32,
    ) -> Result<Vec<Submission>>;

    /// The submission's comments in `top` order, flattened, without any
    /// "load more" placeholders.
    async fn top_comments(&self, submission: &Submission) -> Result<Vec<Comment>>;
}

fn time_filter(window: RankingWindow) -> TimeFilter {
    match window {
        RankingWindow::Hour => TimeFilter::Hour,
        RankingWindow::Day => TimeFilter::Day,
        RankingWindow::Week => TimeFilter::Week,
        RankingWindow::Month => TimeFilter::Month,
        RankingWindow::Year => TimeFilter::Year,
        RankingWindow::All => TimeFilter::All,
    }
}

#[async_trait]
impl ContentSource for RedditClient {
    async fn top_submissions(
        &self,
        source: &str,
        window: RankingWindow,
        limit: u32,
    ) -> Result<Vec<Submission>> {
        Ok(self.top_posts(source, time_filter(window), limit).await?)
    }

    async fn top_comments(&self, submission: &Submission) -> Result<Vec<Comment>> {
        Ok(RedditClient::top_comments(self, &submission.id).await?)
    }
}

pub mod error;
pub mod types;

pub use error::{RedditError, Result};
pub use types::{Comment, Submission, TimeFilter};

use std::time::Duration;

use serde::de::DeserializeOwned;
use types::{flatten_comment_tree, Listing};

const BASE_URL: &str = "https://www.reddit.com";
const DEFAULT_USER_AGENT: &str = "script:toxicity-analysis:v1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Read-only client over Reddit's public `.json` listings.
pub struct RedditClient {
    client: reqwest::Client,
    base_url: String,
}

impl RedditClient {
    pub fn new(user_agent: Option<&str>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let resp = self.client.get(url).query(query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RedditError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Top submissions of `subreddit` within `window`, at most `limit`.
    pub async fn top_posts(
        &self,
        subreddit: &str,
        window: TimeFilter,
        limit: u32,
    ) -> Result<Vec<Submission>> {
        tracing::info!(subreddit, %window, limit, "Fetching top posts");

        let url = format!("{}/r/{}/top.json", self.base_url, subreddit);
        let listing: Listing = self
            .get_json(
                &url,
                &[
                    ("t", window.as_str().to_string()),
                    ("limit", limit.to_string()),
                    ("raw_json", "1".to_string()),
                ],
            )
            .await?;

        let mut posts = listing.into_submissions();
        posts.truncate(limit as usize);
        tracing::info!(subreddit, count = posts.len(), "Fetched top posts");
        Ok(posts)
    }

    /// The submission's comment tree sorted by `top`, flattened breadth-first,
    /// with "load more" stubs skipped.
    pub async fn top_comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        let url = format!("{}/comments/{}.json", self.base_url, post_id);
        // Response is a two-element array: [link listing, comment listing].
        let mut listings: Vec<Listing> = self
            .get_json(
                &url,
                &[("sort", "top".to_string()), ("raw_json", "1".to_string())],
            )
            .await?;

        if listings.len() < 2 {
            return Err(RedditError::Shape(format!(
                "expected [post, comments] listings for {post_id}, got {}",
                listings.len()
            )));
        }
        let comments = listings.swap_remove(1);

        let flat = flatten_comment_tree(comments.data.children);
        tracing::debug!(post_id, count = flat.len(), "Fetched comment tree");
        Ok(flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = RedditClient::new(None)
            .unwrap()
            .with_base_url("http://localhost:8080/");
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let client = RedditClient::new(Some("test-agent"))
            .unwrap()
            .with_base_url("http://127.0.0.1:1");
        let err = client
            .top_posts("politics", TimeFilter::Month, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, RedditError::Network(_)));
    }
}

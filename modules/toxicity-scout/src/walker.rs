use std::sync::Arc;

use async_stream::stream;
use chrono::NaiveDate;
use futures::Stream;
use tracing::{error, info, warn};

use toxicity_common::{is_missing_text, ItemKind, Pacing, RankingWindow};

use crate::traits::{ContentSource, Submission};

/// The submission an item belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentContext {
    pub source: String,
    pub title: String,
    pub post_date: Option<NaiveDate>,
}

impl ParentContext {
    fn new(source: &str, submission: &Submission) -> Self {
        Self {
            source: source.to_string(),
            title: submission.title.clone(),
            post_date: submission.created_at.map(|t| t.date_naive()),
        }
    }
}

/// One piece of text to classify.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkItem {
    pub parent: ParentContext,
    pub kind: ItemKind,
    pub text: String,
    /// Creation date of a comment; `None` for posts.
    pub comment_date: Option<NaiveDate>,
}

/// Walks a source's top submissions and, under each, its top comments.
pub struct ContentWalker {
    source: Arc<dyn ContentSource>,
    window: RankingWindow,
    pacing: Pacing,
}

impl ContentWalker {
    pub fn new(source: Arc<dyn ContentSource>, window: RankingWindow, pacing: Pacing) -> Self {
        Self {
            source,
            window,
            pacing,
        }
    }

    /// Lazily yields each post (its title) followed by up to `comment_limit`
    /// of its comments.
    ///
    /// Pacing sleeps run when the consumer asks for the next item, so they
    /// fall after the consumer has finished with the previous one: the
    /// comment delay after every comment, the post delay after each post's
    /// subtree. A failed comment fetch skips that post's comments; a failed
    /// listing ends this source's walk.
    pub fn walk<'a>(
        &'a self,
        source_id: &'a str,
        post_limit: u32,
        comment_limit: usize,
    ) -> impl Stream<Item = WalkItem> + Send + 'a {
        stream! {
            let submissions = match self
                .source
                .top_submissions(source_id, self.window, post_limit)
                .await
            {
                Ok(submissions) => submissions,
                Err(e) => {
                    error!(
                        source = source_id,
                        error = %format!("{e:#}"),
                        "Failed to list submissions, skipping source"
                    );
                    return;
                }
            };

            let total = submissions.len();
            for (index, submission) in submissions.iter().take(post_limit as usize).enumerate() {
                info!(source = source_id, post = index + 1, total, "Walking submission");
                let parent = ParentContext::new(source_id, submission);

                yield WalkItem {
                    parent: parent.clone(),
                    kind: ItemKind::Post,
                    text: submission.title.clone(),
                    comment_date: None,
                };

                match self.source.top_comments(submission).await {
                    Ok(comments) => {
                        for comment in comments.into_iter().take(comment_limit) {
                            let body = comment.body.filter(|b| !is_missing_text(b));
                            if let Some(body) = body {
                                yield WalkItem {
                                    parent: parent.clone(),
                                    kind: ItemKind::Comment,
                                    text: body,
                                    comment_date: comment.created_at.map(|t| t.date_naive()),
                                };
                            }
                            tokio::time::sleep(self.pacing.comment_delay()).await;
                        }
                    }
                    Err(e) => {
                        warn!(
                            source = source_id,
                            post_id = %submission.id,
                            error = %format!("{e:#}"),
                            "Failed to fetch comments, continuing with next submission"
                        );
                    }
                }

                tokio::time::sleep(self.pacing.post_delay()).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::testing::{bodiless_comment, comment, submission, MockSource};

    fn walker(source: MockSource, pacing: Pacing) -> ContentWalker {
        ContentWalker::new(Arc::new(source), RankingWindow::Month, pacing)
    }

    fn labels(items: &[WalkItem]) -> Vec<(ItemKind, &str)> {
        items.iter().map(|i| (i.kind, i.text.as_str())).collect()
    }

    #[tokio::test]
    async fn posts_then_their_limited_comments() {
        let source = MockSource::new().on_source(
            "x",
            vec![
                (
                    submission("p1", "post1"),
                    vec![
                        comment("c1", "comment1"),
                        comment("c2", "comment2"),
                        comment("c3", "comment3"),
                    ],
                ),
                (submission("p2", "post2"), vec![]),
            ],
        );
        let walker = walker(source, Pacing::none());

        let items: Vec<WalkItem> = walker.walk("x", 2, 1).collect().await;

        assert_eq!(
            labels(&items),
            vec![
                (ItemKind::Post, "post1"),
                (ItemKind::Comment, "comment1"),
                (ItemKind::Post, "post2"),
            ]
        );
        assert_eq!(items[1].parent.title, "post1");
        assert_eq!(items[1].parent.source, "x");
        assert_eq!(items[0].parent.post_date, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert_eq!(items[1].comment_date, NaiveDate::from_ymd_opt(2024, 6, 2));
        assert_eq!(items[0].comment_date, None);
    }

    #[tokio::test]
    async fn bodiless_comments_are_skipped_but_count_toward_limit() {
        let source = MockSource::new().on_source(
            "x",
            vec![(
                submission("p1", "post1"),
                vec![
                    bodiless_comment("c1"),
                    comment("c2", "  "),
                    comment("c3", "kept"),
                    comment("c4", "beyond"),
                ],
            )],
        );
        let walker = walker(source, Pacing::none());

        let items: Vec<WalkItem> = walker.walk("x", 5, 3).collect().await;

        assert_eq!(
            labels(&items),
            vec![(ItemKind::Post, "post1"), (ItemKind::Comment, "kept")]
        );
    }

    #[tokio::test]
    async fn comment_failure_moves_on_to_next_post() {
        let source = MockSource::new()
            .on_source(
                "x",
                vec![
                    (submission("p1", "post1"), vec![comment("c1", "lost")]),
                    (submission("p2", "post2"), vec![comment("c2", "kept")]),
                ],
            )
            .failing_comments("p1");
        let walker = walker(source, Pacing::none());

        let items: Vec<WalkItem> = walker.walk("x", 2, 5).collect().await;

        assert_eq!(
            labels(&items),
            vec![
                (ItemKind::Post, "post1"),
                (ItemKind::Post, "post2"),
                (ItemKind::Comment, "kept"),
            ]
        );
    }

    #[tokio::test]
    async fn listing_failure_yields_nothing() {
        let walker = walker(MockSource::new().failing_source("x"), Pacing::none());
        let items: Vec<WalkItem> = walker.walk("x", 2, 5).collect().await;
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn requests_use_configured_window_and_limit() {
        let source = Arc::new(MockSource::new().on_source("x", vec![]));
        let walker = ContentWalker::new(source.clone(), RankingWindow::All, Pacing::none());

        let _: Vec<WalkItem> = walker.walk("x", 7, 5).collect().await;

        assert_eq!(source.requests(), vec![("x".to_string(), RankingWindow::All, 7)]);
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_follows_each_comment_and_post() {
        let source = MockSource::new().on_source(
            "x",
            vec![
                (submission("p1", "post1"), vec![comment("c1", "a"), comment("c2", "b")]),
                (submission("p2", "post2"), vec![comment("c3", "c")]),
            ],
        );
        let walker = walker(source, Pacing::default());
        let started = tokio::time::Instant::now();

        let stream = walker.walk("x", 2, 5);
        futures::pin_mut!(stream);

        let mut arrivals = Vec::new();
        while let Some(item) = stream.next().await {
            arrivals.push((item.text, started.elapsed().as_secs()));
        }

        assert_eq!(
            arrivals,
            vec![
                ("post1".to_string(), 0),
                ("a".to_string(), 0),
                ("b".to_string(), 2),
                ("post2".to_string(), 9),
                ("c".to_string(), 9),
            ]
        );
        assert_eq!(started.elapsed().as_secs(), 16);
    }
}

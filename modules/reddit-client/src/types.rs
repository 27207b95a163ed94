use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;

// --- Ranking window ---

/// Reddit's `t=` parameter for `top` listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFilter {
    Hour,
    Day,
    Week,
    #[default]
    Month,
    Year,
    All,
}

impl TimeFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFilter::Hour => "hour",
            TimeFilter::Day => "day",
            TimeFilter::Week => "week",
            TimeFilter::Month => "month",
            TimeFilter::Year => "year",
            TimeFilter::All => "all",
        }
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Public model ---

/// A top-level submission from a subreddit listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub id: String,
    pub subreddit: String,
    pub title: String,
    pub created_at: Option<DateTime<Utc>>,
    pub permalink: Option<String>,
    pub num_comments: u64,
}

/// A single comment from a flattened comment tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: String,
    /// `None` when the payload carried no body at all.
    pub body: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

// --- Wire types ---

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListingData {
    #[serde(default)]
    pub children: Vec<Thing>,
}

/// `kind` is `t3` for links, `t1` for comments, `more` for "load more" stubs.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Thing {
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LinkData {
    pub id: String,
    #[serde(default)]
    pub subreddit: String,
    #[serde(default)]
    pub title: String,
    pub created_utc: Option<f64>,
    pub permalink: Option<String>,
    #[serde(default)]
    pub num_comments: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CommentData {
    pub id: String,
    pub body: Option<String>,
    pub created_utc: Option<f64>,
    /// Either a nested listing or `""` when there are no replies.
    #[serde(default)]
    pub replies: serde_json::Value,
}

fn epoch_to_utc(secs: Option<f64>) -> Option<DateTime<Utc>> {
    secs.and_then(|s| DateTime::from_timestamp(s as i64, 0))
}

impl From<LinkData> for Submission {
    fn from(d: LinkData) -> Self {
        Submission {
            id: d.id,
            subreddit: d.subreddit,
            title: d.title,
            created_at: epoch_to_utc(d.created_utc),
            permalink: d.permalink,
            num_comments: d.num_comments,
        }
    }
}

impl Listing {
    /// Links (`t3`) in listing order. Other kinds are skipped.
    pub(crate) fn into_submissions(self) -> Vec<Submission> {
        self.data
            .children
            .into_iter()
            .filter(|t| t.kind == "t3")
            .filter_map(|t| match serde_json::from_value::<LinkData>(t.data) {
                Ok(d) => Some(Submission::from(d)),
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping malformed link");
                    None
                }
            })
            .collect()
    }
}

/// Flatten a comment forest breadth-first: every top-level comment in listing
/// order, then their replies level by level. `more` stubs are dropped, never
/// expanded.
pub(crate) fn flatten_comment_tree(roots: Vec<Thing>) -> Vec<Comment> {
    let mut queue: VecDeque<Thing> = roots.into();
    let mut flat = Vec::new();

    while let Some(thing) = queue.pop_front() {
        if thing.kind != "t1" {
            continue;
        }
        let data: CommentData = match serde_json::from_value(thing.data) {
            Ok(d) => d,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed comment");
                continue;
            }
        };

        if data.replies.is_object() {
            match serde_json::from_value::<Listing>(data.replies) {
                Ok(listing) => queue.extend(listing.data.children),
                Err(e) => tracing::debug!(comment_id = %data.id, error = %e, "Unreadable replies"),
            }
        }

        flat.push(Comment {
            id: data.id,
            body: data.body,
            created_at: epoch_to_utc(data.created_utc),
        });
    }

    flat
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment_json(id: &str, body: &str, replies: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "kind": "t1",
            "data": { "id": id, "body": body, "created_utc": 1_700_000_000.0, "replies": replies }
        })
    }

    fn listing(children: Vec<serde_json::Value>) -> serde_json::Value {
        serde_json::json!({ "kind": "Listing", "data": { "children": children } })
    }

    #[test]
    fn flattens_breadth_first_and_drops_more_stubs() {
        let tree = listing(vec![
            comment_json(
                "a",
                "first",
                listing(vec![
                    comment_json("a1", "reply to first", serde_json::json!("")),
                    serde_json::json!({
                        "kind": "more",
                        "data": { "count": 40, "children": ["x", "y"] }
                    }),
                ]),
            ),
            comment_json("b", "second", serde_json::json!("")),
            serde_json::json!({ "kind": "more", "data": { "count": 12 } }),
        ]);
        let listing: Listing = serde_json::from_value(tree).unwrap();

        let flat = flatten_comment_tree(listing.data.children);
        let ids: Vec<&str> = flat.iter().map(|c| c.id.as_str()).collect();

        assert_eq!(ids, vec!["a", "b", "a1"]);
        assert_eq!(flat[0].body.as_deref(), Some("first"));
        assert_eq!(
            flat[0].created_at.map(|t| t.timestamp()),
            Some(1_700_000_000)
        );
    }

    #[test]
    fn comment_without_body_is_kept_with_none() {
        let tree = listing(vec![serde_json::json!({
            "kind": "t1",
            "data": { "id": "gone", "replies": "" }
        })]);
        let listing: Listing = serde_json::from_value(tree).unwrap();
        let flat = flatten_comment_tree(listing.data.children);
        assert_eq!(flat.len(), 1);
        assert!(flat[0].body.is_none());
        assert!(flat[0].created_at.is_none());
    }

    #[test]
    fn listing_yields_only_links() {
        let raw = serde_json::json!({
            "kind": "Listing",
            "data": {
                "after": "t3_zzz",
                "children": [
                    { "kind": "t3", "data": {
                        "id": "p1", "subreddit": "politics", "title": "Hello world",
                        "created_utc": 1_717_200_000.0, "permalink": "/r/politics/comments/p1/",
                        "num_comments": 3 } },
                    { "kind": "t5", "data": { "display_name": "politics" } }
                ]
            }
        });
        let listing: Listing = serde_json::from_value(raw).unwrap();
        let subs = listing.into_submissions();

        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].title, "Hello world");
        assert_eq!(subs[0].num_comments, 3);
        assert_eq!(subs[0].created_at.unwrap().format("%Y-%m-%d").to_string(), "2024-06-01");
    }

    #[test]
    fn time_filter_query_values() {
        assert_eq!(TimeFilter::default().as_str(), "month");
        assert_eq!(TimeFilter::All.to_string(), "all");
    }
}

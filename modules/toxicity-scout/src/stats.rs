use std::fmt;

use toxicity_common::{ItemKind, ScoredItem};

/// Count/mean/min/max of a group of scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSummary {
    pub count: usize,
    pub mean: f64,
    pub min: u8,
    pub max: u8,
}

impl ScoreSummary {
    pub fn from_scores(scores: impl IntoIterator<Item = u8>) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0u64;
        let mut min = u8::MAX;
        let mut max = u8::MIN;
        for score in scores {
            count += 1;
            sum += score as u64;
            min = min.min(score);
            max = max.max(score);
        }
        (count > 0).then(|| ScoreSummary {
            count,
            mean: sum as f64 / count as f64,
            min,
            max,
        })
    }
}

/// Aggregates over a finished corpus. Sources appear in the order they were
/// first seen; kinds are always post then comment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusStats {
    pub total: usize,
    pub by_source: Vec<(String, ScoreSummary)>,
    pub by_source_kind: Vec<(String, ItemKind, ScoreSummary)>,
    pub by_kind: Vec<(ItemKind, ScoreSummary)>,
}

impl CorpusStats {
    pub fn from_items(items: &[ScoredItem]) -> Self {
        let mut sources: Vec<&str> = Vec::new();
        for item in items {
            if !sources.contains(&item.source.as_str()) {
                sources.push(&item.source);
            }
        }

        let by_source = sources
            .iter()
            .filter_map(|source| {
                let scores = items.iter().filter(|i| i.source == *source).map(|i| i.score);
                ScoreSummary::from_scores(scores).map(|s| (source.to_string(), s))
            })
            .collect();

        let by_source_kind = sources
            .iter()
            .flat_map(|source| ItemKind::ALL.iter().map(move |kind| (*source, *kind)))
            .filter_map(|(source, kind)| {
                let scores = items
                    .iter()
                    .filter(|i| i.source == source && i.kind == kind)
                    .map(|i| i.score);
                ScoreSummary::from_scores(scores).map(|s| (source.to_string(), kind, s))
            })
            .collect();

        let by_kind = ItemKind::ALL
            .iter()
            .filter_map(|kind| {
                let scores = items.iter().filter(|i| i.kind == *kind).map(|i| i.score);
                ScoreSummary::from_scores(scores).map(|s| (*kind, s))
            })
            .collect();

        CorpusStats {
            total: items.len(),
            by_source,
            by_source_kind,
            by_kind,
        }
    }

    pub fn source(&self, source: &str) -> Option<&ScoreSummary> {
        self.by_source
            .iter()
            .find(|(s, _)| s == source)
            .map(|(_, summary)| summary)
    }

    pub fn source_kind(&self, source: &str, kind: ItemKind) -> Option<&ScoreSummary> {
        self.by_source_kind
            .iter()
            .find(|(s, k, _)| s == source && *k == kind)
            .map(|(_, _, summary)| summary)
    }

    pub fn kind(&self, kind: ItemKind) -> Option<&ScoreSummary> {
        self.by_kind
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, summary)| summary)
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, label: &str, s: &ScoreSummary) -> fmt::Result {
    writeln!(
        f,
        "  {:<28} {:>6} {:>6.2} {:>4} {:>4}",
        label, s.count, s.mean, s.min, s.max
    )
}

impl fmt::Display for CorpusStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Toxicity Corpus ===")?;
        writeln!(f, "Total items analyzed: {}", self.total)?;
        if self.total == 0 {
            return Ok(());
        }

        let header = format!("  {:<28} {:>6} {:>6} {:>4} {:>4}", "", "count", "mean", "min", "max");

        writeln!(f, "\nToxicity by source:")?;
        writeln!(f, "{header}")?;
        for (source, summary) in &self.by_source {
            write_row(f, source, summary)?;
        }

        writeln!(f, "\nBy source and kind:")?;
        writeln!(f, "{header}")?;
        for (source, kind, summary) in &self.by_source_kind {
            write_row(f, &format!("{source} / {}", kind.plural()), summary)?;
        }

        writeln!(f, "\nPosts vs comments:")?;
        for (kind, summary) in &self.by_kind {
            writeln!(f, "  Average {kind} toxicity: {:.2}", summary.mean)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(source: &str, kind: ItemKind, score: u8) -> ScoredItem {
        ScoredItem {
            source: source.to_string(),
            parent_title: "t".into(),
            kind,
            text: "x".into(),
            score,
            explanation: String::new(),
            post_date: None,
            comment_date: None,
        }
    }

    #[test]
    fn summary_of_scores() {
        let s = ScoreSummary::from_scores([2, 8, 5]).unwrap();
        assert_eq!(s.count, 3);
        assert_eq!(s.min, 2);
        assert_eq!(s.max, 8);
        assert!((s.mean - 5.0).abs() < f64::EPSILON);
        assert!(ScoreSummary::from_scores([]).is_none());
    }

    #[test]
    fn groups_by_source_and_kind() {
        let items = vec![
            item("politics", ItemKind::Post, 2),
            item("politics", ItemKind::Comment, 8),
            item("politics", ItemKind::Comment, 6),
            item("conservative", ItemKind::Post, 4),
        ];
        let stats = CorpusStats::from_items(&items);

        assert_eq!(stats.total, 4);
        let sources: Vec<&str> = stats.by_source.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(sources, vec!["politics", "conservative"]);

        let politics = stats.source("politics").unwrap();
        assert_eq!((politics.count, politics.min, politics.max), (3, 2, 8));

        let comments = stats.source_kind("politics", ItemKind::Comment).unwrap();
        assert!((comments.mean - 7.0).abs() < f64::EPSILON);
        assert!(stats.source_kind("conservative", ItemKind::Comment).is_none());

        assert_eq!(stats.kind(ItemKind::Post).unwrap().count, 2);
        assert_eq!(stats.kind(ItemKind::Comment).unwrap().max, 8);
    }

    #[test]
    fn display_lists_every_group() {
        let items = vec![
            item("politics", ItemKind::Post, 2),
            item("politics", ItemKind::Comment, 8),
        ];
        let rendered = CorpusStats::from_items(&items).to_string();
        assert!(rendered.contains("Total items analyzed: 2"));
        assert!(rendered.contains("politics / posts"));
        assert!(rendered.contains("politics / comments"));
        assert!(rendered.contains("Average comment toxicity: 8.00"));
    }

    #[test]
    fn empty_corpus_renders_total_only() {
        let rendered = CorpusStats::from_items(&[]).to_string();
        assert!(rendered.contains("Total items analyzed: 0"));
        assert!(!rendered.contains("by source"));
    }
}

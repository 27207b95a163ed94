use std::sync::Arc;

use futures::{pin_mut, StreamExt};
use tracing::{error, info};

use toxicity_common::{CorpusRecord, ScoredItem, ScoutConfig};

use crate::classifier::RetryingClassifier;
use crate::persist::{save_corpus, PersistOutcome};
use crate::stats::CorpusStats;
use crate::traits::{CompletionModel, ContentSource};
use crate::walker::ContentWalker;

/// Scored items in the order they were produced. Single writer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    items: Vec<ScoredItem>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: ScoredItem) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[ScoredItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredItem> {
        self.items.iter()
    }

    pub fn records(&self) -> Vec<CorpusRecord> {
        self.items.iter().map(CorpusRecord::from).collect()
    }
}

/// Result of a full run. `persisted` is `None` when both the CSV and the
/// JSON fallback failed.
#[derive(Debug)]
pub struct RunSummary {
    pub corpus: Corpus,
    pub stats: CorpusStats,
    pub persisted: Option<PersistOutcome>,
}

pub struct CorpusBuilder {
    config: ScoutConfig,
    walker: ContentWalker,
    classifier: RetryingClassifier,
}

impl CorpusBuilder {
    pub fn new(
        config: ScoutConfig,
        source: Arc<dyn ContentSource>,
        model: Arc<dyn CompletionModel>,
    ) -> Self {
        let walker = ContentWalker::new(source, config.window, config.pacing.clone());
        let classifier = RetryingClassifier::new(model, config.backoff.clone(), config.max_retries);
        Self {
            config,
            walker,
            classifier,
        }
    }

    pub fn config(&self) -> &ScoutConfig {
        &self.config
    }

    /// Walks each source in order, classifying every yielded item before
    /// asking for the next one.
    pub async fn build(&self, sources: &[String]) -> Corpus {
        let mut corpus = Corpus::new();

        for source in sources {
            info!(source = %source, "Analyzing source");
            let before = corpus.len();

            let items = self
                .walker
                .walk(source, self.config.post_limit, self.config.comment_limit);
            pin_mut!(items);

            while let Some(item) = items.next().await {
                let verdict = self.classifier.classify(&item.text).await;
                corpus.push(ScoredItem {
                    source: item.parent.source,
                    parent_title: item.parent.title,
                    kind: item.kind,
                    text: item.text,
                    score: verdict.score,
                    explanation: verdict.explanation,
                    post_date: item.parent.post_date,
                    comment_date: item.comment_date,
                });
            }

            info!(source = %source, items = corpus.len() - before, "Source complete");
        }

        corpus
    }

    /// Builds the corpus over the configured sources, persists it, and
    /// computes statistics. A persistence failure is logged, not returned.
    pub async fn run(&self) -> RunSummary {
        let corpus = self.build(&self.config.sources).await;

        let persisted = match save_corpus(&corpus.records(), &self.config.output_path) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!(error = %e, rows = corpus.len(), "Failed to persist corpus");
                None
            }
        };

        let stats = CorpusStats::from_items(corpus.items());
        info!(total = stats.total, "Corpus build complete");

        RunSummary {
            corpus,
            stats,
            persisted,
        }
    }
}

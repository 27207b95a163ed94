use std::io::{self, Write};

use toxicity_common::{truncate_chars, CorpusRecord, ItemKind};

/// Comment bodies longer than this are cut in the report.
pub const COMMENT_PREVIEW_CHARS: usize = 150;

/// Prints the most and least toxic posts and comments of each source from a
/// persisted corpus.
#[derive(Debug, Clone)]
pub struct Reporter {
    top_n: usize,
}

impl Default for Reporter {
    fn default() -> Self {
        Self { top_n: 3 }
    }
}

impl Reporter {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn report<W: Write>(
        &self,
        records: &[CorpusRecord],
        sources: &[String],
        out: &mut W,
    ) -> io::Result<()> {
        let posts = records.iter().filter(|r| r.kind() == ItemKind::Post).count();
        writeln!(out, "Total posts found: {posts}")?;
        writeln!(out, "Total comments found: {}", records.len() - posts)?;

        for source in sources {
            for kind in ItemKind::ALL {
                let group: Vec<&CorpusRecord> = records
                    .iter()
                    .filter(|r| r.subreddit == *source && r.kind() == kind)
                    .collect();

                if group.is_empty() {
                    writeln!(out, "No {} found for r/{source}", kind.plural())?;
                    continue;
                }

                // Stable sorts: equal scores keep their persisted order.
                let mut highest = group.clone();
                highest.sort_by(|a, b| b.toxicity_score.cmp(&a.toxicity_score));
                let mut lowest = group;
                lowest.sort_by_key(|r| r.toxicity_score);

                writeln!(
                    out,
                    "\nTop {} highest toxicity {} in r/{source}:",
                    self.top_n,
                    kind.plural()
                )?;
                for record in highest.iter().take(self.top_n) {
                    write_entry(out, record, kind)?;
                }

                writeln!(
                    out,
                    "\nTop {} lowest toxicity {} in r/{source}:",
                    self.top_n,
                    kind.plural()
                )?;
                for record in lowest.iter().take(self.top_n) {
                    write_entry(out, record, kind)?;
                }
            }
        }
        Ok(())
    }
}

fn write_entry<W: Write>(out: &mut W, record: &CorpusRecord, kind: ItemKind) -> io::Result<()> {
    match kind {
        ItemKind::Post => {
            writeln!(out, "Score: {} - \"{}\"", record.toxicity_score, record.post_title)?;
        }
        ItemKind::Comment => {
            writeln!(
                out,
                "Score: {} - Post: \"{}\"",
                record.toxicity_score, record.post_title
            )?;
            let body = record.comment_text.trim();
            let preview = truncate_chars(body, COMMENT_PREVIEW_CHARS);
            if preview.len() < body.len() {
                writeln!(out, "Comment: \"{preview}...\"")?;
            } else {
                writeln!(out, "Comment: \"{body}\"")?;
            }
        }
    }
    writeln!(out, "Explanation: {}\n", record.explanation)
}

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};

use toxicity_common::{CorpusRecord, ToxicityError, CORPUS_COLUMNS};

/// Where a corpus ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Csv(PathBuf),
    JsonFallback(PathBuf),
}

impl PersistOutcome {
    pub fn path(&self) -> &Path {
        match self {
            PersistOutcome::Csv(p) | PersistOutcome::JsonFallback(p) => p,
        }
    }
}

/// Writes the corpus table to `path`, overwriting any previous run. If the
/// CSV cannot be written the records go to `path` with a `json` extension
/// instead; only when both fail is an error returned.
pub fn save_corpus(records: &[CorpusRecord], path: &Path) -> Result<PersistOutcome, ToxicityError> {
    let csv_err = match write_csv(records, path) {
        Ok(()) => {
            info!(path = %path.display(), rows = records.len(), "Corpus saved");
            return Ok(PersistOutcome::Csv(path.to_path_buf()));
        }
        Err(e) => e,
    };

    let json_path = path.with_extension("json");
    warn!(
        path = %path.display(),
        fallback = %json_path.display(),
        error = %format!("{csv_err:#}"),
        "CSV write failed, falling back to JSON"
    );

    match write_json(records, &json_path) {
        Ok(()) => {
            info!(path = %json_path.display(), rows = records.len(), "Corpus saved as JSON");
            Ok(PersistOutcome::JsonFallback(json_path))
        }
        Err(json_err) => Err(ToxicityError::Persist(format!(
            "csv: {csv_err:#}; json: {json_err:#}"
        ))),
    }
}

/// The header row is written even for an empty corpus.
pub fn write_csv(records: &[CorpusRecord], path: &Path) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    writer.write_record(CORPUS_COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush().context("flushing csv")?;
    Ok(())
}

fn write_json(records: &[CorpusRecord], path: &Path) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, records).context("serializing corpus")?;
    Ok(())
}

/// Reads a corpus table written by [`save_corpus`]. Empty date cells load
/// as `None`.
pub fn load_corpus(path: &Path) -> Result<Vec<CorpusRecord>, ToxicityError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| ToxicityError::Persist(format!("opening {}: {e}", path.display())))?;
    reader
        .deserialize()
        .collect::<Result<Vec<CorpusRecord>, _>>()
        .map_err(|e| ToxicityError::Persist(format!("reading {}: {e}", path.display())))
}

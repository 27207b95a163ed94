//! Prints the most and least toxic posts and comments per source from the
//! corpus written by a previous run.
//!
//! The corpus path and source list come from the same config as the scout.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use toxicity_common::ScoutConfig;
use toxicity_scout::persist::load_corpus;
use toxicity_scout::report::Reporter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("toxicity=warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = ScoutConfig::load()?;
    let path = &config.output_path;
    let records = load_corpus(path).with_context(|| format!("loading {}", path.display()))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    Reporter::new(config.report_top_n).report(&records, &config.sources, &mut out)?;

    Ok(())
}

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::{Claude, CompletionModel, Gemini};
use reddit_client::RedditClient;
use toxicity_common::{Provider, ScoutConfig, Secrets};
use toxicity_scout::corpus::CorpusBuilder;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("toxicity=info".parse()?)
                .add_directive("reddit_client=info".parse()?)
                .add_directive("ai_client=info".parse()?),
        )
        .init();

    info!("Toxicity scout starting...");

    let config = ScoutConfig::load()?;
    let secrets = Secrets::from_env();
    secrets.log_redacted();

    let api_key = secrets.api_key_for(config.provider)?;
    let model: Arc<dyn CompletionModel> = match config.provider {
        Provider::Gemini => Arc::new(Gemini::new(api_key, config.model_name())),
        Provider::Claude => Arc::new(Claude::new(api_key, config.model_name())),
    };
    let reddit = RedditClient::new(secrets.reddit_user_agent.as_deref())?;

    info!(
        sources = ?config.sources,
        window = ?config.window,
        post_limit = config.post_limit,
        comment_limit = config.comment_limit,
        model = model.model_name(),
        "Configuration loaded"
    );

    let builder = CorpusBuilder::new(config, Arc::new(reddit), model);
    let summary = builder.run().await;

    match &summary.persisted {
        Some(outcome) => info!(path = %outcome.path().display(), "Results saved"),
        None => info!("Results were not saved"),
    }
    println!("{}", summary.stats);

    Ok(())
}

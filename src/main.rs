use anyhow::Context;
use lpledger::feed::read_events;
use lpledger::{
    config::Config, db::init_db, ChainReader, Indexer, IndexerSettings, Repository,
    RpcChainReader,
};
use std::fs::File;
use std::io::{self, BufReader};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("Configuration error")?;

    let pool = init_db(&config.database_path)
        .await
        .with_context(|| format!("Failed to initialize database at {}", config.database_path))?;
    let repo = Arc::new(Repository::new(pool));
    let chain: Arc<dyn ChainReader> = Arc::new(RpcChainReader::new(config.rpc_url.clone()));
    let indexer = Indexer::new(repo.clone(), chain, IndexerSettings::from(&config));

    let events = match &config.events_path {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("Failed to open {}", path))?;
            read_events(BufReader::new(file))?
        }
        None => read_events(io::stdin().lock())?,
    };
    tracing::info!(events = events.len(), "Replaying event feed");

    let summary = indexer.replay(&events).await?;
    let counts = repo.entity_counts().await?;
    tracing::info!(
        applied = summary.applied,
        skipped = summary.skipped,
        positions = counts.positions,
        snapshots = counts.snapshots,
        incentives = counts.incentives,
        stakes = counts.stakes,
        unstakes = counts.unstakes,
        claims = counts.claims,
        "Replay complete"
    );

    Ok(())
}

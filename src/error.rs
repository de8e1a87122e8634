use crate::chain::ChainError;
use crate::config::ConfigError;
use crate::feed::FeedError;
use thiserror::Error;

/// Infrastructure failure that stops ingestion.
///
/// Expected conditions (reverted reads, missing prerequisites, excluded blocks,
/// out-of-range amounts) are not errors; handlers report them as skipped outcomes.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),
    #[error("Chain read failed: {0}")]
    Chain(#[from] ChainError),
    #[error("Event feed error: {0}")]
    Feed(#[from] FeedError),
}

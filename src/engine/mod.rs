//! Event handlers that materialize ledger state.
//!
//! The [`Indexer`] dispatches each decoded chain event to exactly one handler. Handlers
//! run to completion, including their chain reads, before the next event is processed.
//! Every handler returns a [`HandlerOutcome`]; conditions such as a missing prerequisite
//! or an excluded block are skips, not errors.

use crate::chain::ChainReader;
use crate::config::{CollectFeesMode, Config, ExclusionSet};
use crate::db::Repository;
use crate::domain::{Address, ChainEvent, EventKind};
use crate::error::LedgerError;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub mod materializer;
pub mod mutators;
pub mod pools;
pub mod registry;
pub mod snapshot;
pub mod staking;

/// Contract addresses and policy knobs the handlers need.
#[derive(Debug, Clone)]
pub struct IndexerSettings {
    pub position_manager: Address,
    pub factory: Address,
    pub exclusions: ExclusionSet,
    pub collect_fees_mode: CollectFeesMode,
}

impl IndexerSettings {
    pub fn new(position_manager: Address, factory: Address) -> Self {
        Self {
            position_manager,
            factory,
            exclusions: ExclusionSet::default(),
            collect_fees_mode: CollectFeesMode::default(),
        }
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn with_collect_fees_mode(mut self, mode: CollectFeesMode) -> Self {
        self.collect_fees_mode = mode;
        self
    }
}

impl From<&Config> for IndexerSettings {
    fn from(config: &Config) -> Self {
        IndexerSettings::new(config.position_manager, config.factory)
            .with_exclusions(config.exclusions.clone())
            .with_collect_fees_mode(config.collect_fees_mode)
    }
}

/// Why a handler left the store untouched (apart from load-or-create side effects).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ExcludedBlock,
    ExcludedPool,
    MissingToken(Address),
    MissingPool(Address),
    MissingPosition,
    MissingIncentivePosition,
    MissingIncentive,
    UnknownIncentive,
    /// A scaled amount or running total leaves the decimal range.
    AmountOverflow,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ExcludedBlock => f.write_str("excluded block"),
            SkipReason::ExcludedPool => f.write_str("excluded pool"),
            SkipReason::MissingToken(token) => write!(f, "token {} not registered", token),
            SkipReason::MissingPool(pool) => write!(f, "pool {} not registered", pool),
            SkipReason::MissingPosition => f.write_str("position not materialized"),
            SkipReason::MissingIncentivePosition => f.write_str("incentive position not found"),
            SkipReason::MissingIncentive => f.write_str("incentive not found"),
            SkipReason::UnknownIncentive => f.write_str("unknown incentive"),
            SkipReason::AmountOverflow => f.write_str("amount exceeds decimal range"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    Applied,
    Skipped(SkipReason),
}

impl HandlerOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, HandlerOutcome::Applied)
    }
}

/// Totals from replaying a batch of events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub skipped: usize,
}

/// Event-to-state materializer.
#[derive(Debug, Clone)]
pub struct Indexer {
    repo: Arc<Repository>,
    chain: Arc<dyn ChainReader>,
    settings: IndexerSettings,
}

impl Indexer {
    pub fn new(repo: Arc<Repository>, chain: Arc<dyn ChainReader>, settings: IndexerSettings) -> Self {
        Self {
            repo,
            chain,
            settings,
        }
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    pub fn settings(&self) -> &IndexerSettings {
        &self.settings
    }

    /// Dispatch one event to its handler.
    ///
    /// # Errors
    /// Returns an error only for infrastructure failures (store, chain transport,
    /// amount overflow). The event may have been partially applied.
    pub async fn handle(&self, event: &ChainEvent) -> Result<HandlerOutcome, LedgerError> {
        let ctx = &event.context;
        let outcome = match &event.event {
            EventKind::IncreaseLiquidity(change) => {
                self.handle_increase_liquidity(change, ctx).await?
            }
            EventKind::DecreaseLiquidity(change) => {
                self.handle_decrease_liquidity(change, ctx).await?
            }
            EventKind::Collect(collect) => self.handle_collect(collect, ctx).await?,
            EventKind::Transfer(transfer) => self.handle_transfer(transfer, ctx).await?,
            EventKind::PoolCreated(created) => self.handle_pool_created(created, ctx).await?,
            EventKind::IncentiveCreated(created) => {
                self.handle_incentive_created(created, ctx).await?
            }
            EventKind::IncentiveEnded(ended) => self.handle_incentive_ended(ended).await?,
            EventKind::TokenStaked(staked) => self.handle_token_staked(staked, ctx).await?,
            EventKind::TokenUnstaked(unstaked) => {
                self.handle_token_unstaked(unstaked, ctx).await?
            }
            EventKind::RewardClaimed(claimed) => self.handle_reward_claimed(claimed, ctx).await?,
            EventKind::DepositTransferred(transferred) => {
                self.handle_deposit_transferred(transferred, ctx).await?
            }
        };

        match outcome {
            HandlerOutcome::Applied => debug!(
                kind = event.event.name(),
                block = ctx.block_number,
                log_index = ctx.log_index,
                "Event applied"
            ),
            HandlerOutcome::Skipped(reason) => debug!(
                kind = event.event.name(),
                block = ctx.block_number,
                log_index = ctx.log_index,
                %reason,
                "Event skipped"
            ),
        }

        Ok(outcome)
    }

    /// Handle `events` strictly in the given order, stopping at the first error.
    pub async fn replay(&self, events: &[ChainEvent]) -> Result<ReplaySummary, LedgerError> {
        let mut summary = ReplaySummary::default();
        for event in events {
            match self.handle(event).await? {
                HandlerOutcome::Applied => summary.applied += 1,
                HandlerOutcome::Skipped(_) => summary.skipped += 1,
            }
        }
        Ok(summary)
    }
}

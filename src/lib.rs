pub mod chain;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod feed;

pub use chain::{CallResult, ChainError, ChainReader, MockChainReader, PositionView, RpcChainReader};
pub use config::{CollectFeesMode, Config, ExclusionSet};
pub use db::{init_db, Repository};
pub use domain::{
    Address, ChainEvent, Decimal, EventContext, EventKind, Hash32, Position, PositionSnapshot,
    TokenId, TxHash,
};
pub use engine::{HandlerOutcome, Indexer, IndexerSettings, ReplaySummary, SkipReason};
pub use error::LedgerError;

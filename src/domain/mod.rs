//! Domain types for the position and staking ledger.
//!
//! This module provides:
//! - Lossless token amounts via the Decimal wrapper
//! - Chain primitives: Address, Hash32, TokenId
//! - Materialized entities (positions, snapshots, incentives, stake log)
//! - Decoded chain events and the content-addressed incentive id

pub mod decimal;
pub mod event;
pub mod incentive_id;
pub mod position;
pub mod primitives;
pub mod registry;
pub mod staking;

pub use decimal::{AmountScaleError, Decimal};
pub use event::{ChainEvent, EventContext, EventKind};
pub use incentive_id::IncentiveKey;
pub use position::{tick_id, Position, PositionSnapshot};
pub use primitives::{Address, AddressParseError, Hash32, TokenId, TxHash};
pub use registry::{Erc20Token, Identity, Pool, Token, TokenMetadata, Transaction};
pub use staking::{Claim, Incentive, IncentivePosition, Stake, Unstake};

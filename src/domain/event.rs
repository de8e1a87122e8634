//! Decoded chain events consumed by the indexer.
//!
//! Events arrive already ABI-decoded from the chain-data source. Each carries an
//! [`EventContext`] (where and when it was emitted) and a kind-specific payload.

use crate::domain::primitives::u256_string;
use crate::domain::{Address, Hash32, TokenId, TxHash};
use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// Block, transaction and log metadata shared by every event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContext {
    /// Contract that emitted the log.
    pub address: Address,
    pub block_number: u64,
    pub block_timestamp: u64,
    pub tx_hash: TxHash,
    pub log_index: u64,
    /// Originator (`tx.from`) of the enclosing transaction.
    pub tx_from: Address,
}

/// `IncreaseLiquidity` / `DecreaseLiquidity` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityChange {
    pub token_id: TokenId,
    #[serde(with = "u256_string")]
    pub liquidity: U256,
    #[serde(with = "u256_string")]
    pub amount0: U256,
    #[serde(with = "u256_string")]
    pub amount1: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collect {
    pub token_id: TokenId,
    pub recipient: Address,
    #[serde(with = "u256_string")]
    pub amount0: U256,
    #[serde(with = "u256_string")]
    pub amount1: U256,
}

/// ERC-721 `Transfer` of a position NFT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftTransfer {
    pub from: Address,
    pub to: Address,
    pub token_id: TokenId,
}

/// Factory `PoolCreated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCreated {
    pub token0: Address,
    pub token1: Address,
    pub fee: u32,
    pub tick_spacing: i32,
    pub pool: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentiveCreated {
    pub reward_token: Address,
    pub pool: Address,
    #[serde(with = "u256_string")]
    pub start_time: U256,
    #[serde(with = "u256_string")]
    pub end_time: U256,
    #[serde(with = "u256_string")]
    pub vesting_period: U256,
    pub refundee: Address,
    #[serde(with = "u256_string")]
    pub reward: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentiveEnded {
    pub incentive_id: Hash32,
    #[serde(with = "u256_string", default)]
    pub refund: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStaked {
    pub token_id: TokenId,
    pub incentive_id: Hash32,
    #[serde(with = "u256_string", default)]
    pub liquidity: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUnstaked {
    pub token_id: TokenId,
    pub incentive_id: Hash32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardClaimed {
    pub reward_token: Address,
    pub to: Address,
    #[serde(with = "u256_string")]
    pub reward: U256,
}

/// Staker-level ownership change of a deposited position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositTransferred {
    pub token_id: TokenId,
    pub old_owner: Address,
    pub new_owner: Address,
}

/// Every event kind the indexer handles, tagged by `kind` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EventKind {
    IncreaseLiquidity(LiquidityChange),
    DecreaseLiquidity(LiquidityChange),
    Collect(Collect),
    Transfer(NftTransfer),
    PoolCreated(PoolCreated),
    IncentiveCreated(IncentiveCreated),
    IncentiveEnded(IncentiveEnded),
    TokenStaked(TokenStaked),
    TokenUnstaked(TokenUnstaked),
    RewardClaimed(RewardClaimed),
    DepositTransferred(DepositTransferred),
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::IncreaseLiquidity(_) => "IncreaseLiquidity",
            EventKind::DecreaseLiquidity(_) => "DecreaseLiquidity",
            EventKind::Collect(_) => "Collect",
            EventKind::Transfer(_) => "Transfer",
            EventKind::PoolCreated(_) => "PoolCreated",
            EventKind::IncentiveCreated(_) => "IncentiveCreated",
            EventKind::IncentiveEnded(_) => "IncentiveEnded",
            EventKind::TokenStaked(_) => "TokenStaked",
            EventKind::TokenUnstaked(_) => "TokenUnstaked",
            EventKind::RewardClaimed(_) => "RewardClaimed",
            EventKind::DepositTransferred(_) => "DepositTransferred",
        }
    }
}

/// A decoded event together with its chain context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEvent {
    pub context: EventContext,
    pub event: EventKind,
}

impl ChainEvent {
    /// Canonical chain order: block number, then log index within the block.
    pub fn ordering_key(&self) -> (u64, u64) {
        (self.context.block_number, self.context.log_index)
    }
}

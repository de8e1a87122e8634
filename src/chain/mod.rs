//! On-chain state reader abstraction.
//!
//! Contract view calls either return a decoded value or revert. A revert is an expected
//! outcome (the queried state no longer exists or never existed) and is reported as
//! [`CallResult::Reverted`], never as an error. [`ChainError`] covers only transport and
//! decoding faults.

use crate::domain::{Address, TokenId, TokenMetadata};
use alloy::primitives::U256;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod abi;
pub mod mock;
pub mod rpc;

pub use mock::MockChainReader;
pub use rpc::RpcChainReader;

/// Outcome of a view call that may revert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallResult<T> {
    Value(T),
    Reverted,
}

impl<T> CallResult<T> {
    pub fn is_reverted(&self) -> bool {
        matches!(self, CallResult::Reverted)
    }

    pub fn value(self) -> Option<T> {
        match self {
            CallResult::Value(v) => Some(v),
            CallResult::Reverted => None,
        }
    }
}

/// Decoded return of the position manager's `positions(tokenId)` view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionView {
    pub nonce: U256,
    pub operator: Address,
    pub token0: Address,
    pub token1: Address,
    pub fee: u32,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub fee_growth_inside0_last_x128: U256,
    pub fee_growth_inside1_last_x128: U256,
    pub tokens_owed0: u128,
    pub tokens_owed1: u128,
}

/// Synchronous reads of contract state at a given block.
///
/// Reads are never retried on revert; callers substitute a documented default.
#[async_trait]
pub trait ChainReader: Send + Sync + fmt::Debug {
    /// `NonfungiblePositionManager.positions(tokenId)`.
    async fn positions(
        &self,
        manager: &Address,
        token_id: &TokenId,
        block: u64,
    ) -> Result<CallResult<PositionView>, ChainError>;

    /// `Factory.getPool(token0, token1, fee)`.
    async fn get_pool(
        &self,
        factory: &Address,
        token0: &Address,
        token1: &Address,
        fee: u32,
        block: u64,
    ) -> Result<CallResult<Address>, ChainError>;

    /// ERC-20 `name()`, `symbol()` and `decimals()`. Not revert-tolerant: any failure is
    /// an error.
    async fn erc20_metadata(&self, token: &Address, block: u64)
        -> Result<TokenMetadata, ChainError>;
}

/// Transport or decoding failure while talking to the chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Rate limited")]
    RateLimited,
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Decode error: {0}")]
    Decode(String),
}

//! Mock chain reader for testing without an RPC endpoint.

use super::{CallResult, ChainError, ChainReader, PositionView};
use crate::domain::{Address, TokenId, TokenMetadata};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// Mock chain reader that answers from predefined state.
///
/// A token id with no registered view reverts, as does a pool lookup with no
/// registered pool. Token metadata lookups for unregistered tokens fail.
#[derive(Debug, Default)]
pub struct MockChainReader {
    positions: RwLock<HashMap<TokenId, PositionView>>,
    pools: HashMap<(Address, Address, u32), CallResult<Address>>,
    tokens: HashMap<Address, TokenMetadata>,
    position_calls: AtomicUsize,
}

impl MockChainReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `positions(token_id)` with `view`.
    pub fn with_position(self, token_id: TokenId, view: PositionView) -> Self {
        self.set_position(token_id, view);
        self
    }

    /// Answer `getPool(token0, token1, fee)` with `pool`.
    pub fn with_pool(mut self, token0: Address, token1: Address, fee: u32, pool: Address) -> Self {
        self.pools
            .insert((token0, token1, fee), CallResult::Value(pool));
        self
    }

    /// Make `getPool(token0, token1, fee)` revert. Unregistered pools revert anyway;
    /// this overrides an earlier `with_pool`.
    pub fn with_reverted_pool(mut self, token0: Address, token1: Address, fee: u32) -> Self {
        self.pools.insert((token0, token1, fee), CallResult::Reverted);
        self
    }

    pub fn with_token(mut self, token: Address, metadata: TokenMetadata) -> Self {
        self.tokens.insert(token, metadata);
        self
    }

    /// Replace the view returned for `token_id`, e.g. to advance fee growth between
    /// events.
    pub fn set_position(&self, token_id: TokenId, view: PositionView) {
        self.positions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(token_id, view);
    }

    /// Make `positions(token_id)` revert from now on (a burned position).
    pub fn set_position_reverted(&self, token_id: &TokenId) {
        self.positions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(token_id);
    }

    /// Number of `positions()` calls served so far.
    pub fn position_calls(&self) -> usize {
        self.position_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainReader for MockChainReader {
    async fn positions(
        &self,
        _manager: &Address,
        token_id: &TokenId,
        _block: u64,
    ) -> Result<CallResult<PositionView>, ChainError> {
        self.position_calls.fetch_add(1, Ordering::SeqCst);
        let positions = self.positions.read().unwrap_or_else(|e| e.into_inner());
        Ok(match positions.get(token_id) {
            Some(view) => CallResult::Value(view.clone()),
            None => CallResult::Reverted,
        })
    }

    async fn get_pool(
        &self,
        _factory: &Address,
        token0: &Address,
        token1: &Address,
        fee: u32,
        _block: u64,
    ) -> Result<CallResult<Address>, ChainError> {
        Ok(self
            .pools
            .get(&(*token0, *token1, fee))
            .cloned()
            .unwrap_or(CallResult::Reverted))
    }

    async fn erc20_metadata(
        &self,
        token: &Address,
        _block: u64,
    ) -> Result<TokenMetadata, ChainError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| ChainError::Decode(format!("no metadata for {}", token)))
    }
}

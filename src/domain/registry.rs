//! Reference entities: identities, token metadata caches, pools, transactions.

use crate::domain::{Address, TxHash};

/// A wallet, owner or farmer. Carries nothing but its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity {
    pub id: Address,
}

/// Name, symbol and decimals read from an ERC-20 contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Pool token, registered when its pool is created. Decimals drive amount scaling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub id: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

/// Reward-token metadata cache used by the staker entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Erc20Token {
    pub id: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    pub id: Address,
    pub token0: Address,
    pub token1: Address,
    pub fee_tier: u32,
    pub tick_spacing: i32,
    pub created_at_block: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: TxHash,
    pub block_number: u64,
    pub timestamp: u64,
}

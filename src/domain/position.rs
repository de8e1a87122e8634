//! Liquidity position and its point-in-time snapshots.

use crate::domain::{Address, Decimal, TxHash};
use alloy::primitives::{I256, U256};

/// Composite id of a tick: `<poolId>#<tickIndex>`.
pub fn tick_id(pool: &Address, tick: i32) -> String {
    format!("{}#{}", pool, tick)
}

/// A liquidity position, keyed by its NFT token id (decimal string).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub id: String,
    pub owner: Address,
    pub minter: Address,
    pub pool: Address,
    pub token0: Address,
    pub token1: Address,
    pub tick_lower: String,
    pub tick_upper: String,
    /// Running sum of liquidity deltas. Not clamped: a decrease larger than the
    /// recorded increases drives it negative.
    pub liquidity: I256,
    pub deposited_token0: Decimal,
    pub deposited_token1: Decimal,
    pub withdrawn_token0: Decimal,
    pub withdrawn_token1: Decimal,
    pub collected_fees_token0: Decimal,
    pub collected_fees_token1: Decimal,
    pub fee_growth_inside0_last_x128: U256,
    pub fee_growth_inside1_last_x128: U256,
    /// Transaction in which the position was first materialized.
    pub transaction: TxHash,
}

impl Position {
    /// A position with no usable on-chain state: zero pool and tokens, ticks at `0`,
    /// every accumulator at zero.
    pub fn degenerate(id: String, owner: Address, minter: Address, transaction: TxHash) -> Self {
        Self {
            id,
            owner,
            minter,
            pool: Address::ZERO,
            token0: Address::ZERO,
            token1: Address::ZERO,
            tick_lower: tick_id(&Address::ZERO, 0),
            tick_upper: tick_id(&Address::ZERO, 0),
            liquidity: I256::ZERO,
            deposited_token0: Decimal::zero(),
            deposited_token1: Decimal::zero(),
            withdrawn_token0: Decimal::zero(),
            withdrawn_token1: Decimal::zero(),
            collected_fees_token0: Decimal::zero(),
            collected_fees_token1: Decimal::zero(),
            fee_growth_inside0_last_x128: U256::ZERO,
            fee_growth_inside1_last_x128: U256::ZERO,
            transaction,
        }
    }

    /// Fill in the pool, tokens, ticks and fee-growth checkpoints decoded from chain.
    #[allow(clippy::too_many_arguments)]
    pub fn with_pool_state(
        mut self,
        pool: Address,
        token0: Address,
        token1: Address,
        tick_lower: i32,
        tick_upper: i32,
        fee_growth_inside0_last_x128: U256,
        fee_growth_inside1_last_x128: U256,
    ) -> Self {
        self.tick_lower = tick_id(&pool, tick_lower);
        self.tick_upper = tick_id(&pool, tick_upper);
        self.pool = pool;
        self.token0 = token0;
        self.token1 = token1;
        self.fee_growth_inside0_last_x128 = fee_growth_inside0_last_x128;
        self.fee_growth_inside1_last_x128 = fee_growth_inside1_last_x128;
        self
    }

    /// Move ownership to `new_owner`, back-filling the minter while it is still the
    /// zero sentinel. A transfer out of the zero address is the mint itself, so the
    /// recipient becomes the minter; otherwise the previous owner does.
    pub fn transfer_ownership(&mut self, old_owner: Address, new_owner: Address) {
        if self.minter.is_zero() {
            self.minter = if old_owner.is_zero() {
                new_owner
            } else {
                old_owner
            };
        }
        self.owner = new_owner;
    }
}

/// Immutable copy of a position's mutable fields after one mutating event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionSnapshot {
    /// `<positionId>#<blockNumber>`.
    pub id: String,
    pub owner: Address,
    pub pool: Address,
    pub position: String,
    pub block_number: u64,
    pub timestamp: u64,
    pub liquidity: I256,
    pub deposited_token0: Decimal,
    pub deposited_token1: Decimal,
    pub withdrawn_token0: Decimal,
    pub withdrawn_token1: Decimal,
    pub collected_fees_token0: Decimal,
    pub collected_fees_token1: Decimal,
    pub fee_growth_inside0_last_x128: U256,
    pub fee_growth_inside1_last_x128: U256,
    pub transaction: TxHash,
}

impl PositionSnapshot {
    /// Snapshot key. Keyed by block only, so two mutations of the same position in
    /// one block share a key and the later one wins.
    pub fn snapshot_id(position_id: &str, block_number: u64) -> String {
        format!("{}#{}", position_id, block_number)
    }

    pub fn capture(
        position: &Position,
        block_number: u64,
        timestamp: u64,
        transaction: TxHash,
    ) -> Self {
        Self {
            id: Self::snapshot_id(&position.id, block_number),
            owner: position.owner,
            pool: position.pool,
            position: position.id.clone(),
            block_number,
            timestamp,
            liquidity: position.liquidity,
            deposited_token0: position.deposited_token0,
            deposited_token1: position.deposited_token1,
            withdrawn_token0: position.withdrawn_token0,
            withdrawn_token1: position.withdrawn_token1,
            collected_fees_token0: position.collected_fees_token0,
            collected_fees_token1: position.collected_fees_token1,
            fee_growth_inside0_last_x128: position.fee_growth_inside0_last_x128,
            fee_growth_inside1_last_x128: position.fee_growth_inside1_last_x128,
            transaction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 20])
    }

    #[test]
    fn test_degenerate_position_uses_zero_sentinels() {
        let p = Position::degenerate("7".to_string(), Address::ZERO, Address::ZERO, TxHash::default());
        assert_eq!(p.pool, Address::ZERO);
        assert_eq!(p.token0, Address::ZERO);
        assert_eq!(p.token1, Address::ZERO);
        assert_eq!(p.tick_lower, "0x0000000000000000000000000000000000000000#0");
        assert_eq!(p.tick_upper, p.tick_lower);
        assert_eq!(p.liquidity, I256::ZERO);
    }

    #[test]
    fn test_with_pool_state_builds_tick_ids() {
        let pool = addr(0xaa);
        let p = Position::degenerate("1".to_string(), addr(1), Address::ZERO, TxHash::default())
            .with_pool_state(pool, addr(2), addr(3), -887220, 887220, U256::from(5u8), U256::from(6u8));
        assert_eq!(p.tick_lower, format!("{}#-887220", pool));
        assert_eq!(p.tick_upper, format!("{}#887220", pool));
        assert_eq!(p.fee_growth_inside1_last_x128, U256::from(6u8));
    }

    #[test]
    fn test_mint_transfer_sets_recipient_as_minter() {
        let mut p = Position::degenerate("1".to_string(), Address::ZERO, Address::ZERO, TxHash::default());
        p.transfer_ownership(Address::ZERO, addr(0xa));
        assert_eq!(p.minter, addr(0xa));
        assert_eq!(p.owner, addr(0xa));

        p.transfer_ownership(addr(0xa), addr(0xb));
        assert_eq!(p.minter, addr(0xa));
        assert_eq!(p.owner, addr(0xb));
    }

    #[test]
    fn test_first_observed_transfer_backfills_previous_owner() {
        let mut p = Position::degenerate("1".to_string(), addr(0xa), Address::ZERO, TxHash::default());
        p.transfer_ownership(addr(0xa), addr(0xb));
        assert_eq!(p.minter, addr(0xa));
    }

    #[test]
    fn test_snapshot_id_format() {
        assert_eq!(PositionSnapshot::snapshot_id("5", 12345), "5#12345");
    }
}

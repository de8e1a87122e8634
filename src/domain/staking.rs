//! Liquidity-mining entities: incentives, their positions, and the stake/unstake/claim log.

use crate::domain::{Address, Hash32, TokenId, TxHash};
use alloy::primitives::U256;

/// Key of an append-only event-log entity: `<txHash>#<logIndexHex>`.
pub fn event_entity_id(tx_hash: &TxHash, log_index: u64) -> String {
    format!("{}#{:#x}", tx_hash, log_index)
}

/// Key of the join between an incentive and a position: `<incentiveId>#<tokenId>`.
pub fn incentive_position_id(incentive_id: &Hash32, token_id: &TokenId) -> String {
    format!("{}#{}", incentive_id, token_id)
}

/// A time-bounded reward program, content-addressed by its key parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incentive {
    pub id: Hash32,
    /// Staker contract that emitted the creation event.
    pub contract: Address,
    pub reward_token: Address,
    pub pool: Address,
    pub start_time: U256,
    pub end_time: U256,
    pub refundee: Address,
    pub reward: U256,
    pub vesting_period: U256,
    /// `Active -> Ended` only; never reset.
    pub ended: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncentivePosition {
    pub id: String,
    pub position: String,
    pub incentive: Hash32,
    pub claimed: U256,
}

impl IncentivePosition {
    pub fn new(incentive: Hash32, token_id: &TokenId) -> Self {
        Self {
            id: incentive_position_id(&incentive, token_id),
            position: token_id.to_string(),
            incentive,
            claimed: U256::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stake {
    pub id: String,
    pub farmer: Address,
    pub position: String,
    pub reward_token: Address,
    pub block_number: u64,
    pub timestamp: u64,
    pub tx_hash: TxHash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unstake {
    pub id: String,
    pub farmer: Address,
    pub position: String,
    pub reward_token: Address,
    pub block_number: u64,
    pub timestamp: u64,
    pub tx_hash: TxHash,
}

/// A reward payout. `amount` is the raw, unscaled token amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub id: String,
    pub farmer: Address,
    pub reward_token: Address,
    pub amount: U256,
    pub block_number: u64,
    pub timestamp: u64,
    pub tx_hash: TxHash,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_entity_id_uses_hex_log_index() {
        let tx = TxHash::new([0x11; 32]);
        assert_eq!(
            event_entity_id(&tx, 26),
            format!("0x{}#0x1a", "11".repeat(32))
        );
    }

    #[test]
    fn test_incentive_position_id() {
        let incentive = Hash32::new([0xab; 32]);
        let id = incentive_position_id(&incentive, &TokenId::from(5));
        assert_eq!(id, format!("0x{}#5", "ab".repeat(32)));
    }

    #[test]
    fn test_new_incentive_position_starts_unclaimed() {
        let ip = IncentivePosition::new(Hash32::new([1; 32]), &TokenId::from(9));
        assert_eq!(ip.position, "9");
        assert_eq!(ip.claimed, U256::ZERO);
    }
}

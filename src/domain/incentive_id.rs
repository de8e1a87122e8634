//! Content-addressed incentive identifiers.
//!
//! The staker contract identifies an incentive by
//! `keccak256(abi.encode(IncentiveKey))`; the id computed here must match it bit for
//! bit, or later stake/unstake events that reference the incentive are orphaned.

use crate::domain::event::IncentiveCreated;
use crate::domain::{Address, Hash32};
use alloy::primitives::{keccak256, U256};
use alloy::sol_types::SolValue;

/// The parameters the staker hashes, in its field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncentiveKey {
    pub reward_token: Address,
    pub pool: Address,
    pub start_time: U256,
    pub end_time: U256,
    pub vesting_period: U256,
    pub refundee: Address,
}

impl IncentiveKey {
    /// ABI encoding of the key tuple. Every member is static, so this is six
    /// consecutive 32-byte words.
    pub fn abi_encode(&self) -> Vec<u8> {
        (
            self.reward_token.to_evm(),
            self.pool.to_evm(),
            self.start_time,
            self.end_time,
            self.vesting_period,
            self.refundee.to_evm(),
        )
            .abi_encode()
    }

    pub fn id(&self) -> Hash32 {
        Hash32::from(keccak256(self.abi_encode()))
    }
}

impl From<&IncentiveCreated> for IncentiveKey {
    fn from(event: &IncentiveCreated) -> Self {
        Self {
            reward_token: event.reward_token,
            pool: event.pool,
            start_time: event.start_time,
            end_time: event.end_time,
            vesting_period: event.vesting_period,
            refundee: event.refundee,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> IncentiveKey {
        IncentiveKey {
            reward_token: Address::parse("0x1f9840a85d5af5bf1d1762f925bdaddc4201f984").unwrap(),
            pool: Address::parse("0x1d42064fc4beb5f8aaf85f4617ae8b3b5b8bd801").unwrap(),
            start_time: U256::from(1_700_000_000u64),
            end_time: U256::from(1_700_086_400u64),
            vesting_period: U256::from(604_800u64),
            refundee: Address::parse("0x000000000000000000000000000000000000dead").unwrap(),
        }
    }

    #[test]
    fn test_encoding_is_six_static_words() {
        let encoded = key().abi_encode();
        assert_eq!(encoded.len(), 6 * 32);
        assert_eq!(
            hex::encode(&encoded),
            concat!(
                "0000000000000000000000001f9840a85d5af5bf1d1762f925bdaddc4201f984",
                "0000000000000000000000001d42064fc4beb5f8aaf85f4617ae8b3b5b8bd801",
                "000000000000000000000000000000000000000000000000000000006553f100",
                "0000000000000000000000000000000000000000000000000000000065554280",
                "0000000000000000000000000000000000000000000000000000000000093a80",
                "000000000000000000000000000000000000000000000000000000000000dead",
            )
        );
    }

    #[test]
    fn test_incentive_id_matches_keccak_of_encoding() {
        assert_eq!(
            key().id().to_string(),
            "0xf66887ed40b16ea66a1e68cbc0b07273bff7cf8a764f060f6bbd085ffb62bc2c"
        );
    }

    #[test]
    fn test_field_order_matters() {
        let mut swapped = key();
        std::mem::swap(&mut swapped.start_time, &mut swapped.end_time);
        assert_ne!(swapped.id(), key().id());
    }
}

//! Domain primitives: Address, Hash32, TokenId.

use alloy::primitives::{B256, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("invalid integer: {0}")]
    InvalidInteger(String),
}

fn parse_hex_fixed<const N: usize>(s: &str) -> Result<[u8; N], AddressParseError> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = hex::decode(digits).map_err(|e| AddressParseError::InvalidHex(e.to_string()))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| AddressParseError::InvalidLength {
            expected: N,
            got: bytes.len(),
        })
}

/// 20-byte account or contract address.
///
/// Rendered as lowercase `0x`-prefixed hex (no checksum), which is also the entity key
/// for identities, tokens and pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(alloy::primitives::Address);

impl Address {
    /// The zero address; used as the "no owner / unminted / burned" sentinel.
    pub const ZERO: Address = Address(alloy::primitives::Address::ZERO);

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(alloy::primitives::Address::from(bytes))
    }

    /// Parse a hex address. Accepts 20-byte values and 32-byte left-padded words
    /// (indexed topics).
    pub fn parse(s: &str) -> Result<Self, AddressParseError> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        if digits.len() == 64 {
            let word = parse_hex_fixed::<32>(trimmed)?;
            let mut out = [0u8; 20];
            out.copy_from_slice(&word[12..32]);
            return Ok(Address::from_bytes(out));
        }
        parse_hex_fixed::<20>(trimmed).map(Address::from_bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// The underlying EVM address, for ABI encoding.
    pub fn to_evm(self) -> alloy::primitives::Address {
        self.0
    }

    /// Lowercase `0x`-prefixed hex form.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0.as_slice()))
    }
}

impl From<alloy::primitives::Address> for Address {
    fn from(value: alloy::primitives::Address) -> Self {
        Address(value)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// 32-byte hash: transaction hashes and incentive identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash32(B256);

/// Transaction hash.
pub type TxHash = Hash32;

impl Hash32 {
    pub fn new(bytes: [u8; 32]) -> Self {
        Hash32(B256::from(bytes))
    }

    pub fn parse(s: &str) -> Result<Self, AddressParseError> {
        parse_hex_fixed::<32>(s).map(Hash32::new)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0.as_slice()))
    }
}

impl From<B256> for Hash32 {
    fn from(value: B256) -> Self {
        Hash32(value)
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Hash32 {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash32::parse(s)
    }
}

impl Serialize for Hash32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Hash32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash32::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// NFT token id of a liquidity position. Its decimal rendering is the `Position` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenId(pub U256);

impl TokenId {
    pub fn new(value: U256) -> Self {
        TokenId(value)
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }
}

impl From<u64> for TokenId {
    fn from(value: u64) -> Self {
        TokenId(U256::from(value))
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TokenId {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_u256(s).map(TokenId)
    }
}

impl Serialize for TokenId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        u256_string::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for TokenId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u256_string::deserialize(deserializer).map(TokenId)
    }
}

/// Parse an unsigned 256-bit integer from decimal or `0x` hex.
pub fn parse_u256(s: &str) -> Result<U256, AddressParseError> {
    let trimmed = s.trim();
    let parsed = match trimmed.strip_prefix("0x") {
        Some(digits) => U256::from_str_radix(digits, 16),
        None => U256::from_str_radix(trimmed, 10),
    };
    parsed.map_err(|e| AddressParseError::InvalidInteger(format!("{}: {}", trimmed, e)))
}

/// Serde adapter for `U256` as a decimal string; also accepts `0x` hex strings and
/// plain JSON integers on input.
pub mod u256_string {
    use super::parse_u256;
    use alloy::primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(u64),
    }

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Str(s) => parse_u256(&s).map_err(serde::de::Error::custom),
            Raw::Num(n) => Ok(U256::from(n)),
        }
    }
}

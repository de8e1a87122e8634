//! Lossless decimal numeric type backed by rust_decimal.
//!
//! Provides canonical parsing from strings, formatting without exponent notation, and
//! conversion of raw on-chain integer amounts into token units.

use alloy::primitives::U256;
use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest mantissa rust_decimal can hold (96 bits).
const MAX_MANTISSA: u128 = (1u128 << 96) - 1;

/// Largest scale rust_decimal can hold.
const MAX_SCALE: u32 = 28;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountScaleError {
    #[error("amount {raw} with {decimals} decimals does not fit a 96-bit decimal")]
    Overflow { raw: String, decimals: u8 },
}

/// Lossless decimal numeric type for token amounts.
///
/// Backed by rust_decimal to avoid floating-point drift.
/// Serializes to a JSON string so large amounts survive round trips.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::str")] RustDecimal);

impl Decimal {
    /// Create a Decimal from a RustDecimal.
    pub fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Parse a Decimal from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Decimal)
    }

    /// Convert a raw on-chain amount to token units: `raw / 10^decimals`.
    ///
    /// Amounts whose mantissa exceeds 96 bits lose their least significant fractional
    /// digits; only an integer part beyond the decimal range is an error.
    pub fn from_raw_units(raw: U256, decimals: u8) -> Result<Self, AmountScaleError> {
        let ten = U256::from(10u8);
        let mut mantissa = raw;
        let mut scale = u32::from(decimals);

        while scale > MAX_SCALE || mantissa > U256::from(MAX_MANTISSA) {
            if scale == 0 {
                return Err(AmountScaleError::Overflow {
                    raw: raw.to_string(),
                    decimals,
                });
            }
            mantissa /= ten;
            scale -= 1;
        }

        let mantissa = u128::try_from(mantissa).map_err(|_| AmountScaleError::Overflow {
            raw: raw.to_string(),
            decimals,
        })?;
        RustDecimal::try_from_i128_with_scale(mantissa as i128, scale)
            .map(|d| Decimal(d.normalize()))
            .map_err(|_| AmountScaleError::Overflow {
                raw: raw.to_string(),
                decimals,
            })
    }

    /// Format the Decimal as a canonical string (no exponent notation).
    pub fn to_canonical_string(&self) -> String {
        let normalized = self.0.normalize();
        format!("{}", normalized)
    }

    /// Get the underlying RustDecimal.
    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    /// Sum, or `None` when it leaves the 96-bit decimal range.
    pub fn checked_add(self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_add(rhs.0).map(Decimal)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl From<Decimal> for RustDecimal {
    fn from(value: Decimal) -> Self {
        value.0
    }
}

//! # 18-Decimal Fixed Point
//!
//! Prices, multipliers and ratios are unsigned 18-decimal fixed-point values
//! ([`Wad`]). Products of two such values overflow `u128`, so every
//! multiply-then-divide goes through a 256-bit intermediate and rounds
//! exactly once, in a direction the caller states explicitly.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};

/// `1.0` in 18-decimal fixed point.
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Rounding direction for a single division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Toward zero.
    Down,
    /// Away from zero.
    Up,
    /// To the nearest representable value, ties away from zero.
    HalfUp,
}

/// Computes `a * b / denominator` with a single rounding step.
///
/// # Errors
///
/// [`VaultError::Overflow`] if `denominator` is zero or the result does not
/// fit in a `u128`.
pub fn mul_div(a: u128, b: u128, denominator: u128, rounding: Rounding) -> Result<u128> {
    if denominator == 0 {
        return Err(VaultError::Overflow("mul_div: division by zero"));
    }
    let product = U256::from(a) * U256::from(b);
    let denominator = U256::from(denominator);
    let quotient = product / denominator;
    let remainder = product % denominator;

    let bump = match rounding {
        Rounding::Down => false,
        Rounding::Up => !remainder.is_zero(),
        // remainder >= denominator / 2, rounding the half up; written as
        // 2 * remainder >= denominator to stay exact for odd denominators.
        Rounding::HalfUp => remainder * U256::from(2u8) >= denominator,
    };
    let result = if bump {
        quotient + U256::from(1u8)
    } else {
        quotient
    };

    u128::try_from(result).map_err(|_| VaultError::Overflow("mul_div: result exceeds u128"))
}

/// Rounds `value` to the nearest multiple of `grid`, ties away from zero.
pub fn round_to_grid(value: u128, grid: u128) -> Result<u128> {
    if grid <= 1 {
        return Ok(value);
    }
    let units = mul_div(value, 1, grid, Rounding::HalfUp)?;
    units
        .checked_mul(grid)
        .ok_or(VaultError::Overflow("round_to_grid"))
}

/// An unsigned 18-decimal fixed-point number.
///
/// Serialized as its raw integer (e.g. `0.95` is `950000000000000000`),
/// matching how EVM tooling writes these values.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Wad(u128);

impl Wad {
    /// `0.0`
    pub const ZERO: Wad = Wad(0);
    /// `1.0`
    pub const ONE: Wad = Wad(WAD);

    /// Wraps a raw 18-decimal integer.
    pub const fn from_raw(raw: u128) -> Self {
        Wad(raw)
    }

    /// The raw 18-decimal integer.
    pub const fn raw(self) -> u128 {
        self.0
    }

    /// `numerator / denominator` as a `Wad`, rounded as requested.
    pub fn from_ratio(numerator: u128, denominator: u128, rounding: Rounding) -> Result<Self> {
        mul_div(numerator, WAD, denominator, rounding).map(Wad)
    }

    /// Fixed-point product, rounded as requested.
    pub fn mul(self, other: Wad, rounding: Rounding) -> Result<Wad> {
        mul_div(self.0, other.0, WAD, rounding).map(Wad)
    }

    /// Applies this value as a multiplier to a raw integer amount.
    pub fn apply(self, amount: u128, rounding: Rounding) -> Result<u128> {
        mul_div(amount, self.0, WAD, rounding)
    }

    /// Checked addition.
    pub fn checked_add(self, other: Wad) -> Option<Wad> {
        self.0.checked_add(other.0).map(Wad)
    }

    /// Checked subtraction.
    pub fn checked_sub(self, other: Wad) -> Option<Wad> {
        self.0.checked_sub(other.0).map(Wad)
    }

    /// `|self - other|`
    pub fn abs_diff(self, other: Wad) -> Wad {
        Wad(self.0.abs_diff(other.0))
    }

    /// Whether this is exactly zero.
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Wad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let whole = self.0 / WAD;
        let frac = self.0 % WAD;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{frac:018}");
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div_rounding_modes() {
        assert_eq!(mul_div(10, 1, 4, Rounding::Down).unwrap(), 2);
        assert_eq!(mul_div(10, 1, 4, Rounding::Up).unwrap(), 3);
        assert_eq!(mul_div(10, 1, 4, Rounding::HalfUp).unwrap(), 3);
        assert_eq!(mul_div(9, 1, 4, Rounding::HalfUp).unwrap(), 2);
        assert_eq!(mul_div(8, 1, 4, Rounding::Up).unwrap(), 2);
    }

    #[test]
    fn mul_div_handles_products_beyond_u128() {
        // 2500e18 * 1.05e18 does not fit in a u128, the quotient does.
        let price = 2_500 * WAD;
        let m = 1_050_000_000_000_000_000;
        assert_eq!(mul_div(price, m, WAD, Rounding::Down).unwrap(), 2_625 * WAD);
    }

    #[test]
    fn mul_div_rejects_zero_denominator() {
        assert!(matches!(
            mul_div(1, 1, 0, Rounding::Down),
            Err(VaultError::Overflow(_))
        ));
    }

    #[test]
    fn mul_div_rejects_oversized_result() {
        assert!(mul_div(u128::MAX, 2, 1, Rounding::Down).is_err());
    }

    #[test]
    fn grid_rounding() {
        assert_eq!(round_to_grid(188_269_128_137_331_675, 1_000).unwrap(), 188_269_128_137_332_000);
        assert_eq!(round_to_grid(1_499, 1_000).unwrap(), 1_000);
        assert_eq!(round_to_grid(1_500, 1_000).unwrap(), 2_000);
        assert_eq!(round_to_grid(7, 1).unwrap(), 7);
    }

    #[test]
    fn wad_display() {
        assert_eq!(Wad::from_raw(950_000_000_000_000_000).to_string(), "0.95");
        assert_eq!(Wad::ONE.to_string(), "1");
        assert_eq!(Wad::from_raw(2_362_500_000_000_000_000_000).to_string(), "2362.5");
    }

    #[test]
    fn wad_ratio_and_mul() {
        let quarter = Wad::from_ratio(1, 4, Rounding::Down).unwrap();
        assert_eq!(quarter.raw(), WAD / 4);
        let half = Wad::from_raw(WAD / 2);
        assert_eq!(quarter.mul(half, Rounding::Down).unwrap().raw(), WAD / 8);
    }
}

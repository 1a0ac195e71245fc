//! # Asset-Tagged Amounts
//!
//! The three tracked assets use different decimal scales (the base and
//! volatility assets carry 18 decimals, the stable asset 6). Mixing them
//! up is the classic way to be off by twelve orders of magnitude, so every
//! amount carries its asset in its type: an [`Amount<Stable>`] cannot be
//! added to an [`Amount<Base>`] without an explicit conversion through a
//! [`PriceSnapshot`].
//!
//! ```text
//! Amount<Stable> --to_base(prices)--> Amount<Base> <--to_base(prices)-- Amount<Vol>
//! ```

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use super::fixed::{mul_div, Rounding, Wad, WAD};
use crate::error::{Result, VaultError};

// ---------------------------------------------------------------------------
// Asset identifiers
// ---------------------------------------------------------------------------

/// Runtime identifier of a tracked asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AssetId {
    /// The numeraire (ETH-like, 18 decimals).
    Base,
    /// The price-stable asset (USDC-like, 6 decimals).
    Stable,
    /// The volatility derivative (oSQTH-like, 18 decimals).
    Vol,
}

impl AssetId {
    /// All tracked assets, in canonical order.
    pub const ALL: [AssetId; 3] = [AssetId::Base, AssetId::Stable, AssetId::Vol];

    /// Decimal places of the asset's smallest unit.
    pub fn decimals(self) -> u32 {
        match self {
            AssetId::Base => Base::DECIMALS,
            AssetId::Stable => Stable::DECIMALS,
            AssetId::Vol => Vol::DECIMALS,
        }
    }

    /// Values `raw` units of this asset in base units.
    pub fn to_base_value(self, raw: u128, prices: &PriceSnapshot, rounding: Rounding) -> Result<u128> {
        match self {
            AssetId::Base => Base::to_base_value(raw, prices, rounding),
            AssetId::Stable => Stable::to_base_value(raw, prices, rounding),
            AssetId::Vol => Vol::to_base_value(raw, prices, rounding),
        }
    }

    /// Units of this asset worth `base_value` base units.
    pub fn from_base_value(self, base_value: u128, prices: &PriceSnapshot, rounding: Rounding) -> Result<u128> {
        match self {
            AssetId::Base => Base::from_base_value(base_value, prices, rounding),
            AssetId::Stable => Stable::from_base_value(base_value, prices, rounding),
            AssetId::Vol => Vol::from_base_value(base_value, prices, rounding),
        }
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetId::Base => write!(f, "base"),
            AssetId::Stable => write!(f, "stable"),
            AssetId::Vol => write!(f, "vol"),
        }
    }
}

// ---------------------------------------------------------------------------
// Prices
// ---------------------------------------------------------------------------

/// The two prices the engine consumes, both 18-decimal.
///
/// * `vol_base` — base units per volatility unit (e.g. 0.1992 ETH per oSQTH).
/// * `base_stable` — stable units per base unit (e.g. 2500 USDC per ETH).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    /// Price of the volatility asset in the base asset.
    pub vol_base: Wad,
    /// Price of the base asset in the stable asset.
    pub base_stable: Wad,
}

impl PriceSnapshot {
    /// Builds a snapshot, rejecting zero prices.
    pub fn new(vol_base: Wad, base_stable: Wad) -> Result<Self> {
        let snapshot = Self {
            vol_base,
            base_stable,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// A zero price makes every valuation degenerate.
    pub fn validate(&self) -> Result<()> {
        if self.vol_base.is_zero() || self.base_stable.is_zero() {
            return Err(VaultError::PriceUnavailable(
                "price input returned a zero price".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Asset markers
// ---------------------------------------------------------------------------

/// Compile-time description of a tracked asset.
pub trait Asset: Copy + 'static {
    /// The runtime identifier.
    const ID: AssetId;
    /// Decimal places of the smallest unit.
    const DECIMALS: u32;

    /// Values `raw` units of this asset in base units.
    fn to_base_value(raw: u128, prices: &PriceSnapshot, rounding: Rounding) -> Result<u128>;

    /// How many units of this asset are worth `base_value` base units.
    fn from_base_value(base_value: u128, prices: &PriceSnapshot, rounding: Rounding)
        -> Result<u128>;
}

/// Marker for the base asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Base;

/// Marker for the stable asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stable;

/// Marker for the volatility asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Vol;

/// `10^(18 - 6)` scaled by `WAD`: converts a 6-decimal stable amount into an
/// 18-decimal quantity and divides by an 18-decimal price in one step.
const STABLE_TO_WAD_SCALE: u128 = 1_000_000_000_000 * WAD;

impl Asset for Base {
    const ID: AssetId = AssetId::Base;
    const DECIMALS: u32 = 18;

    fn to_base_value(raw: u128, _prices: &PriceSnapshot, _rounding: Rounding) -> Result<u128> {
        Ok(raw)
    }

    fn from_base_value(base_value: u128, _: &PriceSnapshot, _: Rounding) -> Result<u128> {
        Ok(base_value)
    }
}

impl Asset for Stable {
    const ID: AssetId = AssetId::Stable;
    const DECIMALS: u32 = 6;

    fn to_base_value(raw: u128, prices: &PriceSnapshot, rounding: Rounding) -> Result<u128> {
        mul_div(raw, STABLE_TO_WAD_SCALE, prices.base_stable.raw(), rounding)
    }

    fn from_base_value(base_value: u128, prices: &PriceSnapshot, rounding: Rounding) -> Result<u128> {
        mul_div(base_value, prices.base_stable.raw(), STABLE_TO_WAD_SCALE, rounding)
    }
}

impl Asset for Vol {
    const ID: AssetId = AssetId::Vol;
    const DECIMALS: u32 = 18;

    fn to_base_value(raw: u128, prices: &PriceSnapshot, rounding: Rounding) -> Result<u128> {
        mul_div(raw, prices.vol_base.raw(), WAD, rounding)
    }

    fn from_base_value(base_value: u128, prices: &PriceSnapshot, rounding: Rounding) -> Result<u128> {
        mul_div(base_value, WAD, prices.vol_base.raw(), rounding)
    }
}

// ---------------------------------------------------------------------------
// Amount
// ---------------------------------------------------------------------------

/// A quantity of asset `A` in its smallest unit.
///
/// The trait impls below are written by hand so that they do not require
/// the marker type itself to implement them.
#[derive(Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct Amount<A: Asset> {
    raw: u128,
    #[serde(skip)]
    _asset: PhantomData<A>,
}

impl<A: Asset> Amount<A> {
    /// Zero units.
    pub const ZERO: Self = Self {
        raw: 0,
        _asset: PhantomData,
    };

    /// Wraps a raw smallest-unit quantity.
    pub const fn new(raw: u128) -> Self {
        Self {
            raw,
            _asset: PhantomData,
        }
    }

    /// The raw smallest-unit quantity.
    pub const fn raw(self) -> u128 {
        self.raw
    }

    /// Whether this is zero.
    pub const fn is_zero(self) -> bool {
        self.raw == 0
    }

    /// The asset this amount is denominated in.
    pub const fn asset(self) -> AssetId {
        A::ID
    }

    /// Checked addition.
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.raw.checked_add(other.raw).map(Self::new)
    }

    /// Checked subtraction; `None` if the result would be negative.
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.raw.checked_sub(other.raw).map(Self::new)
    }

    /// Subtraction floored at zero.
    pub fn saturating_sub(self, other: Self) -> Self {
        Self::new(self.raw.saturating_sub(other.raw))
    }

    /// The smaller of two amounts.
    pub fn min(self, other: Self) -> Self {
        Self::new(self.raw.min(other.raw))
    }

    /// Values this amount in the base asset.
    pub fn to_base(self, prices: &PriceSnapshot, rounding: Rounding) -> Result<Amount<Base>> {
        A::to_base_value(self.raw, prices, rounding).map(Amount::new)
    }

    /// The quantity of `A` worth `value` base units.
    pub fn from_base(value: Amount<Base>, prices: &PriceSnapshot, rounding: Rounding) -> Result<Self> {
        A::from_base_value(value.raw(), prices, rounding).map(Self::new)
    }

    /// `self * numerator / denominator`, rounded as requested.
    pub fn scale(self, numerator: u128, denominator: u128, rounding: Rounding) -> Result<Self> {
        mul_div(self.raw, numerator, denominator, rounding).map(Self::new)
    }
}

impl<A: Asset> Clone for Amount<A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A: Asset> Copy for Amount<A> {}

impl<A: Asset> Default for Amount<A> {
    fn default() -> Self {
        Self::ZERO
    }
}

impl<A: Asset> PartialEq for Amount<A> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<A: Asset> Eq for Amount<A> {}

impl<A: Asset> PartialOrd for Amount<A> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<A: Asset> Ord for Amount<A> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<A: Asset> std::hash::Hash for Amount<A> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<A: Asset> std::fmt::Debug for Amount<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Amount<{}>({})", A::ID, self.raw)
    }
}

impl<A: Asset> std::fmt::Display for Amount<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.raw, A::ID)
    }
}

// ---------------------------------------------------------------------------
// Basket
// ---------------------------------------------------------------------------

/// One amount of each tracked asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Basket {
    /// Base asset leg.
    pub base: Amount<Base>,
    /// Stable asset leg.
    pub stable: Amount<Stable>,
    /// Volatility asset leg.
    pub vol: Amount<Vol>,
}

impl Basket {
    /// An empty basket.
    pub const EMPTY: Basket = Basket {
        base: Amount::ZERO,
        stable: Amount::ZERO,
        vol: Amount::ZERO,
    };

    /// Builds a basket from raw smallest-unit quantities.
    pub const fn from_raw(base: u128, stable: u128, vol: u128) -> Self {
        Self {
            base: Amount::new(base),
            stable: Amount::new(stable),
            vol: Amount::new(vol),
        }
    }

    /// The raw quantity of `asset`.
    pub fn get(&self, asset: AssetId) -> u128 {
        match asset {
            AssetId::Base => self.base.raw(),
            AssetId::Stable => self.stable.raw(),
            AssetId::Vol => self.vol.raw(),
        }
    }

    /// Whether every leg is zero.
    pub fn is_empty(&self) -> bool {
        self.base.is_zero() && self.stable.is_zero() && self.vol.is_zero()
    }

    /// Total value of the basket in base units.
    pub fn value_in_base(&self, prices: &PriceSnapshot, rounding: Rounding) -> Result<Amount<Base>> {
        let stable = self.stable.to_base(prices, rounding)?;
        let vol = self.vol.to_base(prices, rounding)?;
        self.base
            .checked_add(stable)
            .and_then(|v| v.checked_add(vol))
            .ok_or(VaultError::Overflow("basket value"))
    }

    /// Leg-wise checked addition.
    pub fn checked_add(&self, other: &Basket) -> Option<Basket> {
        Some(Basket {
            base: self.base.checked_add(other.base)?,
            stable: self.stable.checked_add(other.stable)?,
            vol: self.vol.checked_add(other.vol)?,
        })
    }

    /// Leg-wise checked subtraction; `None` if any leg would go negative.
    pub fn checked_sub(&self, other: &Basket) -> Option<Basket> {
        Some(Basket {
            base: self.base.checked_sub(other.base)?,
            stable: self.stable.checked_sub(other.stable)?,
            vol: self.vol.checked_sub(other.vol)?,
        })
    }

    /// Scales every leg by `numerator / denominator`.
    pub fn scale(&self, numerator: u128, denominator: u128, rounding: Rounding) -> Result<Basket> {
        Ok(Basket {
            base: self.base.scale(numerator, denominator, rounding)?,
            stable: self.stable.scale(numerator, denominator, rounding)?,
            vol: self.vol.scale(numerator, denominator, rounding)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prices() -> PriceSnapshot {
        PriceSnapshot::new(
            Wad::from_raw(200_000_000_000_000_000), // 0.2 base per vol
            Wad::from_raw(2_500 * WAD),             // 2500 stable per base
        )
        .unwrap()
    }

    #[test]
    fn stable_converts_across_decimal_scales() {
        // 2500 USDC (6 decimals) is exactly one base unit (18 decimals).
        let usdc = Amount::<Stable>::new(2_500_000_000);
        let base = usdc.to_base(&prices(), Rounding::Down).unwrap();
        assert_eq!(base.raw(), WAD);

        let back = Amount::<Stable>::from_base(base, &prices(), Rounding::Down).unwrap();
        assert_eq!(back, usdc);
    }

    #[test]
    fn vol_converts_at_vol_price() {
        let vol = Amount::<Vol>::new(5 * WAD);
        assert_eq!(vol.to_base(&prices(), Rounding::Down).unwrap().raw(), WAD);
    }

    #[test]
    fn basket_value_sums_legs() {
        let basket = Basket::from_raw(WAD, 2_500_000_000, 5 * WAD);
        assert_eq!(basket.value_in_base(&prices(), Rounding::Down).unwrap().raw(), 3 * WAD);
    }

    #[test]
    fn basket_subtraction_never_goes_negative() {
        let a = Basket::from_raw(1, 1, 1);
        let b = Basket::from_raw(1, 2, 0);
        assert!(a.checked_sub(&b).is_none());
        assert_eq!(a.checked_sub(&a).unwrap(), Basket::EMPTY);
    }

    #[test]
    fn zero_price_is_rejected() {
        assert!(PriceSnapshot::new(Wad::ZERO, Wad::ONE).is_err());
    }

    #[test]
    fn amount_serializes_as_raw_integer() {
        let amount = Amount::<Vol>::new(42);
        assert_eq!(serde_json::to_string(&amount).unwrap(), "42");
        let parsed: Amount<Vol> = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, amount);
    }
}

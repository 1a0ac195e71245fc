//! # Auction Pricing
//!
//! Rebalances clear through a Dutch auction. From the moment an auction is
//! anchored, the multiplier applied to the oracle prices slides linearly
//! across `[min_price_multiplier, max_price_multiplier]` over
//! `auction_duration` seconds, then stays pinned at the terminal bound:
//!
//! ```text
//!   multiplier
//!   max ┤‾‾‾‾\                              ___________ (increasing)
//!       │     \                       ____/
//!       │      \               ______/
//!       │       \        _____/
//!   min ┤        \______/_________________ (decreasing)
//!       └────────┬──────────────┬────────► now
//!             trigger     trigger + duration
//! ```
//!
//! The direction is fixed when the anchor is created, so the price path is
//! monotonic for the lifetime of one auction and watchers can predict it.
//!
//! ## Rounding
//!
//! Each adjusted price is computed as one exact `price * multiplier`
//! product, then rounded half-up onto a grid of
//! [`PRICE_ROUNDING_GRID`] wei. Both legs use the same rule so the auction
//! never opens a rounding spread between them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{VaultConfiguration, PRICE_ROUNDING_GRID};
use crate::error::{Result, VaultError};
use crate::math::{mul_div, PriceSnapshot, Rounding, Wad, WAD};

/// Fixes one instance of the decaying price curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionAnchor {
    /// Unix seconds at which the curve starts.
    pub trigger_timestamp: u64,
    /// `true`: the multiplier rises from min to max. `false`: it falls
    /// from max to min.
    pub is_price_increasing: bool,
}

/// Oracle prices after the auction multiplier has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionPrices {
    /// Adjusted price of the volatility asset in base.
    pub vol_base: Wad,
    /// Adjusted price of the base asset in stable.
    pub base_stable: Wad,
    /// The multiplier that produced them.
    pub multiplier: Wad,
}

impl AuctionPrices {
    /// The adjusted prices as a snapshot usable for valuation.
    pub fn snapshot(&self) -> PriceSnapshot {
        PriceSnapshot {
            vol_base: self.vol_base,
            base_stable: self.base_stable,
        }
    }
}

/// Computes auction prices. Reads configuration, never writes anything.
#[derive(Debug, Clone, Copy)]
pub struct AuctionPricer<'a> {
    config: &'a VaultConfiguration,
}

impl<'a> AuctionPricer<'a> {
    /// A pricer bound to `config`.
    pub fn new(config: &'a VaultConfiguration) -> Self {
        Self { config }
    }

    /// The multiplier in force at `now` for `anchor`.
    ///
    /// `now` before the trigger counts as zero elapsed time, and anything
    /// at or past `auction_duration` returns the terminal bound exactly.
    pub fn price_multiplier(&self, anchor: &AuctionAnchor, now: u64) -> Result<Wad> {
        let config = self.config;
        let duration = config.auction_duration;
        if duration == 0 {
            return Err(VaultError::InvalidConfiguration(
                "auction duration must be positive".into(),
            ));
        }
        let elapsed = now.saturating_sub(anchor.trigger_timestamp);

        if elapsed >= duration {
            return Ok(if anchor.is_price_increasing {
                config.max_price_multiplier
            } else {
                config.min_price_multiplier
            });
        }

        let progress = Wad::from_ratio(u128::from(elapsed), u128::from(duration), Rounding::Down)?;
        let travelled = config.multiplier_span().mul(progress, Rounding::Down)?;

        let multiplier = if anchor.is_price_increasing {
            config.min_price_multiplier.checked_add(travelled)
        } else {
            config.max_price_multiplier.checked_sub(travelled)
        };
        multiplier.ok_or(VaultError::Overflow("price multiplier"))
    }

    /// Applies the multiplier at `now` to both oracle prices.
    pub fn get_auction_prices(
        &self,
        anchor: &AuctionAnchor,
        prices: &PriceSnapshot,
        now: u64,
    ) -> Result<AuctionPrices> {
        let multiplier = self.price_multiplier(anchor, now)?;
        let vol_base = adjust(prices.vol_base, multiplier)?;
        let base_stable = adjust(prices.base_stable, multiplier)?;

        debug!(
            trigger = anchor.trigger_timestamp,
            increasing = anchor.is_price_increasing,
            now,
            %multiplier,
            %vol_base,
            %base_stable,
            "auction prices"
        );

        Ok(AuctionPrices {
            vol_base,
            base_stable,
            multiplier,
        })
    }
}

/// `price * multiplier`, rounded half-up onto the price grid in one step.
fn adjust(price: Wad, multiplier: Wad) -> Result<Wad> {
    let units = mul_div(
        price.raw(),
        multiplier.raw(),
        WAD * PRICE_ROUNDING_GRID,
        Rounding::HalfUp,
    )?;
    units
        .checked_mul(PRICE_ROUNDING_GRID)
        .map(Wad::from_raw)
        .ok_or(VaultError::Overflow("auction price"))
}

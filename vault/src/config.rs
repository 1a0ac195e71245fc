//! # Vault Configuration & Constants
//!
//! Every tunable of the engine lives here: the protocol constants at the top
//! of the file, and the mutable risk parameters in [`VaultConfiguration`].
//!
//! The configuration is a plain struct owned by the [`crate::vault::Vault`]
//! and handed by reference to every component that needs it. It is never
//! written field by field from the outside: each change goes through a
//! setter that re-validates the whole struct and leaves the previous value
//! in place when the new one would break an invariant.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};
use crate::ledger::AccountId;
use crate::math::{Amount, Base, Wad, WAD};

// ---------------------------------------------------------------------------
// Protocol Constants
// ---------------------------------------------------------------------------

/// Auction prices are quoted on a grid of this many wei (1e-15 of a unit).
///
/// Both adjusted prices are rounded half-up onto the grid, so neither leg
/// can pick up a rounding spread the other does not have.
pub const PRICE_ROUNDING_GRID: u128 = 1_000;

/// Largest tick a concentrated-liquidity position can reference.
pub const MAX_TICK: u32 = 887_272;

/// Basis-point denominator (1 bp = 0.01%).
pub const BPS_DENOMINATOR: u128 = 10_000;

// ---------------------------------------------------------------------------
// Deployment Presets
// ---------------------------------------------------------------------------

/// Mainnet deposit cap: 100 base units.
pub const MAINNET_CAP_TOTAL_DEPOSITS: u128 = 100 * WAD;

/// Mainnet minimum spacing between rebalances: 12 hours.
pub const MAINNET_REBALANCE_TIME_THRESHOLD: u64 = 43_200;

/// Mainnet early-rebalance trigger: a 10% move in the base price.
pub const MAINNET_PRICE_DEVIATION_THRESHOLD: u128 = 100_000_000_000_000_000;

/// Mainnet auction length: 10 minutes.
pub const MAINNET_AUCTION_DURATION: u64 = 600;

/// Lower auction multiplier bound, 0.95.
pub const DEFAULT_MIN_PRICE_MULTIPLIER: u128 = 950_000_000_000_000_000;

/// Upper auction multiplier bound, 1.05.
pub const DEFAULT_MAX_PRICE_MULTIPLIER: u128 = 1_050_000_000_000_000_000;

/// Default position half-width in ticks.
pub const DEFAULT_BASE_THRESHOLD: u32 = 1_200;

/// Target value weights of the basket: 50% base, 26.22% stable, 23.78% vol.
pub const DEFAULT_TARGET_BASE_SHARE: u128 = 500_000_000_000_000_000;
/// See [`DEFAULT_TARGET_BASE_SHARE`].
pub const DEFAULT_TARGET_STABLE_SHARE: u128 = 262_200_000_000_000_000;
/// See [`DEFAULT_TARGET_BASE_SHARE`].
pub const DEFAULT_TARGET_VOL_SHARE: u128 = 237_800_000_000_000_000;

/// Testnet cap is effectively unbounded.
pub const TESTNET_CAP_TOTAL_DEPOSITS: u128 = 4_000_000_000_000 * WAD;

/// Testnet gates rebalances every 10 seconds so keepers can be exercised.
pub const TESTNET_REBALANCE_TIME_THRESHOLD: u64 = 10;

/// Testnet deviation trigger, 5%.
pub const TESTNET_PRICE_DEVIATION_THRESHOLD: u128 = 50_000_000_000_000_000;

/// Testnet auction length, 10 seconds.
pub const TESTNET_AUCTION_DURATION: u64 = 10;

// ---------------------------------------------------------------------------
// VaultConfiguration
// ---------------------------------------------------------------------------

/// Mutable risk parameters of the vault.
///
/// Invariants (checked by [`validate`](Self::validate)):
///
/// * `min_price_multiplier < 1.0 < max_price_multiplier`
/// * `auction_duration > 0`, `rebalance_time_threshold > 0`
/// * `rebalance_price_deviation_threshold > 0`
/// * `0 < base_threshold <= MAX_TICK`
/// * `min_price_multiplier_fine < 1.0` and, when non-zero, no greater than
///   `min_price_multiplier`
/// * the three target shares sum to exactly `1.0`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfiguration {
    /// The only account allowed to call setters.
    pub governance: AccountId,
    /// Upper bound on cumulative base-denominated deposits.
    pub cap_total_deposits: Amount<Base>,
    /// Seconds over which the auction multiplier travels its full range.
    pub auction_duration: u64,
    /// Minimum seconds between rebalances (absent a price move).
    pub rebalance_time_threshold: u64,
    /// Fractional base-price move that permits an early rebalance.
    pub rebalance_price_deviation_threshold: Wad,
    /// Cheapest multiplier the auction may quote.
    pub min_price_multiplier: Wad,
    /// Most expensive multiplier the auction may quote.
    pub max_price_multiplier: Wad,
    /// Position half-width in ticks.
    pub base_threshold: u32,
    /// Floor for `min_price_multiplier`; zero disables it.
    pub min_price_multiplier_fine: Wad,
    /// Target value weight of the base asset.
    pub target_base_share: Wad,
    /// Target value weight of the stable asset.
    pub target_stable_share: Wad,
    /// Target value weight of the volatility asset.
    pub target_vol_share: Wad,
    /// When set, everything but withdrawal is rejected.
    pub paused: bool,
}

impl VaultConfiguration {
    /// Mainnet deployment parameters.
    pub fn mainnet(governance: AccountId) -> Self {
        Self {
            governance,
            cap_total_deposits: Amount::new(MAINNET_CAP_TOTAL_DEPOSITS),
            auction_duration: MAINNET_AUCTION_DURATION,
            rebalance_time_threshold: MAINNET_REBALANCE_TIME_THRESHOLD,
            rebalance_price_deviation_threshold: Wad::from_raw(MAINNET_PRICE_DEVIATION_THRESHOLD),
            min_price_multiplier: Wad::from_raw(DEFAULT_MIN_PRICE_MULTIPLIER),
            max_price_multiplier: Wad::from_raw(DEFAULT_MAX_PRICE_MULTIPLIER),
            base_threshold: DEFAULT_BASE_THRESHOLD,
            min_price_multiplier_fine: Wad::ZERO,
            target_base_share: Wad::from_raw(DEFAULT_TARGET_BASE_SHARE),
            target_stable_share: Wad::from_raw(DEFAULT_TARGET_STABLE_SHARE),
            target_vol_share: Wad::from_raw(DEFAULT_TARGET_VOL_SHARE),
            paused: false,
        }
    }

    /// Testnet parameters: short thresholds, no practical cap.
    pub fn testnet(governance: AccountId) -> Self {
        Self {
            cap_total_deposits: Amount::new(TESTNET_CAP_TOTAL_DEPOSITS),
            auction_duration: TESTNET_AUCTION_DURATION,
            rebalance_time_threshold: TESTNET_REBALANCE_TIME_THRESHOLD,
            rebalance_price_deviation_threshold: Wad::from_raw(TESTNET_PRICE_DEVIATION_THRESHOLD),
            ..Self::mainnet(governance)
        }
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| VaultError::InvalidConfiguration(format!("malformed json: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Renders the configuration as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| VaultError::InvalidConfiguration(format!("unserializable: {e}")))
    }

    /// Checks every invariant listed on the type.
    pub fn validate(&self) -> Result<()> {
        if self.min_price_multiplier >= Wad::ONE || self.max_price_multiplier <= Wad::ONE {
            return Err(invalid(format!(
                "multipliers must satisfy min < 1 < max (min {}, max {})",
                self.min_price_multiplier, self.max_price_multiplier
            )));
        }
        if self.auction_duration == 0 {
            return Err(invalid("auction duration must be positive"));
        }
        if self.rebalance_time_threshold == 0 {
            return Err(invalid("rebalance time threshold must be positive"));
        }
        if self.rebalance_price_deviation_threshold.is_zero() {
            return Err(invalid("price deviation threshold must be positive"));
        }
        if self.base_threshold == 0 || self.base_threshold > MAX_TICK {
            return Err(invalid(format!(
                "base threshold {} outside 1..={MAX_TICK}",
                self.base_threshold
            )));
        }
        if self.min_price_multiplier_fine >= Wad::ONE {
            return Err(invalid("fine multiplier floor must be below 1"));
        }
        if !self.min_price_multiplier_fine.is_zero()
            && self.min_price_multiplier < self.min_price_multiplier_fine
        {
            return Err(invalid(format!(
                "min multiplier {} below floor {}",
                self.min_price_multiplier, self.min_price_multiplier_fine
            )));
        }
        let total_share = self
            .target_base_share
            .checked_add(self.target_stable_share)
            .and_then(|s| s.checked_add(self.target_vol_share))
            .ok_or(VaultError::Overflow("target shares"))?;
        if total_share != Wad::ONE {
            return Err(invalid(format!("target shares sum to {total_share}, not 1")));
        }
        Ok(())
    }

    /// Whether `account` may change parameters.
    pub fn is_governance(&self, account: &AccountId) -> bool {
        &self.governance == account
    }

    /// Full multiplier range, `max - min`.
    pub fn multiplier_span(&self) -> Wad {
        // validate() guarantees max > 1 > min.
        self.max_price_multiplier.abs_diff(self.min_price_multiplier)
    }

    // -----------------------------------------------------------------------
    // Setters
    // -----------------------------------------------------------------------

    /// Pauses or unpauses the vault.
    pub fn set_pause(&mut self, paused: bool) -> Result<()> {
        self.update(|c| c.paused = paused)
    }

    /// Sets the cheapest auction multiplier.
    pub fn set_min_price_multiplier(&mut self, value: Wad) -> Result<()> {
        self.update(|c| c.min_price_multiplier = value)
    }

    /// Sets the most expensive auction multiplier.
    pub fn set_max_price_multiplier(&mut self, value: Wad) -> Result<()> {
        self.update(|c| c.max_price_multiplier = value)
    }

    /// Sets the price deviation that permits an early rebalance.
    pub fn set_rebalance_threshold(&mut self, value: Wad) -> Result<()> {
        self.update(|c| c.rebalance_price_deviation_threshold = value)
    }

    /// Sets the minimum spacing between rebalances.
    pub fn set_rebalance_time_threshold(&mut self, seconds: u64) -> Result<()> {
        self.update(|c| c.rebalance_time_threshold = seconds)
    }

    /// Sets the auction length.
    pub fn set_auction_duration(&mut self, seconds: u64) -> Result<()> {
        self.update(|c| c.auction_duration = seconds)
    }

    /// Sets the position half-width.
    pub fn set_base_threshold(&mut self, ticks: u32) -> Result<()> {
        self.update(|c| c.base_threshold = ticks)
    }

    /// Sets the floor for the minimum multiplier.
    pub fn set_min_price_multiplier_fine(&mut self, value: Wad) -> Result<()> {
        self.update(|c| c.min_price_multiplier_fine = value)
    }

    /// Sets the deposit cap.
    pub fn set_cap_total_deposits(&mut self, cap: Amount<Base>) -> Result<()> {
        self.update(|c| c.cap_total_deposits = cap)
    }

    /// Sets the three target value weights at once.
    pub fn set_target_shares(&mut self, base: Wad, stable: Wad, vol: Wad) -> Result<()> {
        self.update(|c| {
            c.target_base_share = base;
            c.target_stable_share = stable;
            c.target_vol_share = vol;
        })
    }

    fn update(&mut self, change: impl FnOnce(&mut Self)) -> Result<()> {
        let mut next = self.clone();
        change(&mut next);
        next.validate()?;
        *self = next;
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> VaultError {
    VaultError::InvalidConfiguration(msg.into())
}

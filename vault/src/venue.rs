//! # Swap Venue
//!
//! External liquidity the flash rebalancer and the one-click deposit helper
//! route through. The core never prices anything off a venue; venues only
//! turn one tracked asset into another for a caller that asked for it.
//!
//! [`OracleVenue`] fills every order at a fixed price snapshot less a
//! basis-point fee, out of reserves its account holds on the ledger. That
//! makes it deterministic, which is what keepers' dry runs and the test
//! suites need.

use tracing::debug;

use crate::config::BPS_DENOMINATOR;
use crate::error::{Result, VaultError};
use crate::ledger::{AccountId, AssetLedger};
use crate::math::{mul_div, AssetId, PriceSnapshot, Rounding};

/// Converts one tracked asset into another.
pub trait SwapVenue {
    /// Output for selling exactly `amount_in` of `asset_in`.
    fn quote_out(&self, asset_in: AssetId, asset_out: AssetId, amount_in: u128) -> Result<u128>;

    /// Input needed to buy exactly `amount_out` of `asset_out`.
    fn quote_in(&self, asset_in: AssetId, asset_out: AssetId, amount_out: u128) -> Result<u128>;

    /// Sells exactly `amount_in` of `asset_in` from `trader`'s balance.
    ///
    /// # Errors
    ///
    /// [`VaultError::SlippageExceeded`] if the output would fall below
    /// `min_out`; [`VaultError::InsufficientFunds`] if the trader or the
    /// venue's reserves come up short.
    fn swap_exact_in<L: AssetLedger + ?Sized>(
        &self,
        ledger: &mut L,
        trader: &AccountId,
        asset_in: AssetId,
        asset_out: AssetId,
        amount_in: u128,
        min_out: u128,
    ) -> Result<u128>;

    /// Buys exactly `amount_out` of `asset_out`, paying in `asset_in`.
    /// Returns the amount paid.
    fn swap_exact_out<L: AssetLedger + ?Sized>(
        &self,
        ledger: &mut L,
        trader: &AccountId,
        asset_in: AssetId,
        asset_out: AssetId,
        amount_out: u128,
    ) -> Result<u128>;
}

/// A venue that trades at a fixed price snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleVenue {
    account: AccountId,
    prices: PriceSnapshot,
    fee_bps: u128,
}

impl OracleVenue {
    /// A venue whose reserves sit in `account`.
    ///
    /// # Errors
    ///
    /// [`VaultError::InvalidConfiguration`] for a fee of 100% or more.
    pub fn new(account: AccountId, prices: PriceSnapshot, fee_bps: u128) -> Result<Self> {
        prices.validate()?;
        if fee_bps >= BPS_DENOMINATOR {
            return Err(VaultError::InvalidConfiguration(format!(
                "venue fee {fee_bps} bps leaves nothing to trade"
            )));
        }
        Ok(Self {
            account,
            prices,
            fee_bps,
        })
    }

    /// The reserve account.
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// The snapshot orders fill at.
    pub fn prices(&self) -> PriceSnapshot {
        self.prices
    }

    fn after_fee(&self) -> u128 {
        BPS_DENOMINATOR - self.fee_bps
    }
}

impl SwapVenue for OracleVenue {
    fn quote_out(&self, asset_in: AssetId, asset_out: AssetId, amount_in: u128) -> Result<u128> {
        if asset_in == asset_out {
            return Ok(amount_in);
        }
        let value = asset_in.to_base_value(amount_in, &self.prices, Rounding::Down)?;
        let net = mul_div(value, self.after_fee(), BPS_DENOMINATOR, Rounding::Down)?;
        asset_out.from_base_value(net, &self.prices, Rounding::Down)
    }

    fn quote_in(&self, asset_in: AssetId, asset_out: AssetId, amount_out: u128) -> Result<u128> {
        if asset_in == asset_out {
            return Ok(amount_out);
        }
        let value = asset_out.to_base_value(amount_out, &self.prices, Rounding::Up)?;
        let gross = mul_div(value, BPS_DENOMINATOR, self.after_fee(), Rounding::Up)?;
        asset_in.from_base_value(gross, &self.prices, Rounding::Up)
    }

    fn swap_exact_in<L: AssetLedger + ?Sized>(
        &self,
        ledger: &mut L,
        trader: &AccountId,
        asset_in: AssetId,
        asset_out: AssetId,
        amount_in: u128,
        min_out: u128,
    ) -> Result<u128> {
        let amount_out = self.quote_out(asset_in, asset_out, amount_in)?;
        if amount_out < min_out {
            return Err(VaultError::SlippageExceeded {
                leg: asset_out.into(),
                minimum: min_out,
                realized: amount_out,
            });
        }
        self.fill(ledger, trader, asset_in, amount_in, asset_out, amount_out)?;
        Ok(amount_out)
    }

    fn swap_exact_out<L: AssetLedger + ?Sized>(
        &self,
        ledger: &mut L,
        trader: &AccountId,
        asset_in: AssetId,
        asset_out: AssetId,
        amount_out: u128,
    ) -> Result<u128> {
        let amount_in = self.quote_in(asset_in, asset_out, amount_out)?;
        self.fill(ledger, trader, asset_in, amount_in, asset_out, amount_out)?;
        Ok(amount_in)
    }
}

impl OracleVenue {
    fn fill<L: AssetLedger + ?Sized>(
        &self,
        ledger: &mut L,
        trader: &AccountId,
        asset_in: AssetId,
        amount_in: u128,
        asset_out: AssetId,
        amount_out: u128,
    ) -> Result<()> {
        if asset_in == asset_out || (amount_in == 0 && amount_out == 0) {
            return Ok(());
        }
        ledger.transfer(asset_in, trader, &self.account, amount_in)?;
        ledger.transfer(asset_out, &self.account, trader, amount_out)?;
        debug!(%trader, %asset_in, amount_in, %asset_out, amount_out, "venue fill");
        Ok(())
    }
}

//! # Rebalance Executor
//!
//! Sizes and settles one rebalance against a keeper.
//!
//! Holdings are valued at the auction prices, split into per-asset targets by
//! the configured value weights, and the keeper makes up the difference:
//!
//! ```text
//!   target_i   = ceil(units_i(total_value * weight_i))
//!   receive_i  = max(target_i - held_i, 0)     keeper -> vault
//!   pay_i      = max(held_i - target_i, 0)     vault  -> keeper
//! ```
//!
//! Targets round up, so the vault receives rounded up and pays rounded down.
//! The trade is value-neutral at auction prices apart from that rounding;
//! the keeper's edge is the gap between the auction price and the market.
//!
//! Settlement checks every minimum-output bound before it moves anything,
//! and the caller runs it inside a unit of work, so a failed rebalance leaves
//! no trace.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auction::{AuctionAnchor, AuctionPrices, AuctionPricer};
use crate::config::VaultConfiguration;
use crate::error::{Result, VaultError};
use crate::gate::RebalanceGate;
use crate::holdings::VaultHoldings;
use crate::ledger::{AccountId, AssetLedger};
use crate::math::{Amount, Asset, AssetId, Base, Basket, PriceSnapshot, Rounding, Stable, Vol, Wad};

/// A sized rebalance, ready to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceTrade {
    /// The anchor the prices were derived from.
    pub anchor: AuctionAnchor,
    /// Auction prices the trade is sized at.
    pub prices: AuctionPrices,
    /// What the keeper must supply.
    pub vault_receives: Basket,
    /// What the vault hands the keeper.
    pub vault_pays: Basket,
}

impl RebalanceTrade {
    /// Whether the vault is already on target.
    pub fn is_empty(&self) -> bool {
        self.vault_receives.is_empty() && self.vault_pays.is_empty()
    }
}

/// Caller side of a `time_rebalance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceRequest {
    /// The account that supplies and receives the traded legs.
    pub keeper: AccountId,
    /// Least the keeper accepts of each asset. A leg the keeper does not
    /// receive realizes zero, so a non-zero minimum on it fails the call.
    pub min_amounts_out: Basket,
    /// Unix seconds of the call.
    pub now: u64,
}

impl RebalanceRequest {
    /// A request without output bounds.
    pub fn unbounded(keeper: AccountId, now: u64) -> Self {
        Self {
            keeper,
            min_amounts_out: Basket::EMPTY,
            now,
        }
    }
}

/// What a committed rebalance moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutedAmounts {
    /// The anchor the auction ran on.
    pub anchor: AuctionAnchor,
    /// The prices it cleared at.
    pub prices: AuctionPrices,
    /// Supplied by the keeper.
    pub received: Basket,
    /// Paid to the keeper.
    pub paid: Basket,
}

/// Sizes and settles rebalances. Reads configuration only; the state it
/// writes is handed in by the vault.
#[derive(Debug, Clone, Copy)]
pub struct RebalanceExecutor<'a> {
    config: &'a VaultConfiguration,
}

impl<'a> RebalanceExecutor<'a> {
    /// An executor bound to `config`.
    pub fn new(config: &'a VaultConfiguration) -> Self {
        Self { config }
    }

    /// Sizes the trade that would move `holdings` to target at the auction
    /// prices for `anchor` at `now`.
    pub fn quote(
        &self,
        anchor: &AuctionAnchor,
        holdings: &Basket,
        prices: &PriceSnapshot,
        now: u64,
    ) -> Result<RebalanceTrade> {
        let auction = AuctionPricer::new(self.config).get_auction_prices(anchor, prices, now)?;
        let at = auction.snapshot();
        let total = holdings.value_in_base(&at, Rounding::Down)?;

        let target = Basket {
            base: target_units::<Base>(total, self.config.target_base_share, &at)?,
            stable: target_units::<Stable>(total, self.config.target_stable_share, &at)?,
            vol: target_units::<Vol>(total, self.config.target_vol_share, &at)?,
        };

        let trade = RebalanceTrade {
            anchor: *anchor,
            prices: auction,
            vault_receives: Basket {
                base: target.base.saturating_sub(holdings.base),
                stable: target.stable.saturating_sub(holdings.stable),
                vol: target.vol.saturating_sub(holdings.vol),
            },
            vault_pays: Basket {
                base: holdings.base.saturating_sub(target.base),
                stable: holdings.stable.saturating_sub(target.stable),
                vol: holdings.vol.saturating_sub(target.vol),
            },
        };
        debug!(
            total = %total,
            receives = ?trade.vault_receives,
            pays = ?trade.vault_pays,
            "rebalance sized"
        );
        Ok(trade)
    }

    /// Fails with [`VaultError::SlippageExceeded`] on the first leg where
    /// the keeper would receive less than its minimum.
    pub fn check_min_out(trade: &RebalanceTrade, min_out: &Basket) -> Result<()> {
        for asset in AssetId::ALL {
            let realized = trade.vault_pays.get(asset);
            let minimum = min_out.get(asset);
            if realized < minimum {
                return Err(VaultError::SlippageExceeded {
                    leg: asset.into(),
                    minimum,
                    realized,
                });
            }
        }
        Ok(())
    }

    /// Moves the traded legs on the ledger and in the books.
    ///
    /// Bounds are checked first. Transfers may still fail halfway (a keeper
    /// short of funds); the enclosing unit of work discards the partial
    /// moves.
    pub fn settle<L: AssetLedger>(
        &self,
        trade: &RebalanceTrade,
        min_out: &Basket,
        holdings: &mut VaultHoldings,
        ledger: &mut L,
        vault: &AccountId,
        keeper: &AccountId,
    ) -> Result<ExecutedAmounts> {
        Self::check_min_out(trade, min_out)?;

        ledger.transfer_basket(&trade.vault_receives, keeper, vault)?;
        holdings.credit(&trade.vault_receives)?;

        ledger.transfer_basket(&trade.vault_pays, vault, keeper)?;
        holdings.debit(&trade.vault_pays)?;

        Ok(ExecutedAmounts {
            anchor: trade.anchor,
            prices: trade.prices,
            received: trade.vault_receives,
            paid: trade.vault_pays,
        })
    }

    /// One full rebalance: arm (or reuse) the auction, size the trade,
    /// settle it, and reset the gate.
    ///
    /// # Errors
    ///
    /// * [`VaultError::NotEligible`] when paused or the gate is idle.
    /// * [`VaultError::SlippageExceeded`] when a minimum is not met.
    /// * [`VaultError::InsufficientFunds`] when the keeper cannot supply its
    ///   legs.
    pub fn time_rebalance<L: AssetLedger>(
        &self,
        gate: &mut RebalanceGate,
        holdings: &mut VaultHoldings,
        ledger: &mut L,
        vault: &AccountId,
        prices: &PriceSnapshot,
        request: &RebalanceRequest,
    ) -> Result<ExecutedAmounts> {
        let anchor = gate.arm(self.config, prices.base_stable, request.now)?;
        let trade = self.quote(&anchor, &holdings.balances, prices, request.now)?;
        let executed = self.settle(
            &trade,
            &request.min_amounts_out,
            holdings,
            ledger,
            vault,
            &request.keeper,
        )?;
        gate.reset_after_rebalance(prices.base_stable, request.now);
        Ok(executed)
    }
}

/// Units of `A` worth `weight` of `total`, rounded up.
fn target_units<A: Asset>(
    total: Amount<Base>,
    weight: Wad,
    prices: &PriceSnapshot,
) -> Result<Amount<A>> {
    let value = Amount::<Base>::new(weight.apply(total.raw(), Rounding::Down)?);
    Amount::<A>::from_base(value, prices, Rounding::Up)
}

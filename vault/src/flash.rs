//! # Flash-Capital Rebalancer
//!
//! Lets a keeper with no inventory run a rebalance on borrowed capital. One
//! call to [`FlashRebalancer::rebalance`] is one unit of work:
//!
//! ```text
//!   borrow ─► buy what the vault demands ─► time_rebalance ─► cover the loan
//!          ─► repay principal + fee ─► check min profit ─► sweep to owner
//! ```
//!
//! Any step failing discards the unit, loan included: the lender, the vault
//! and the rebalancer's account are left exactly as they were. On success the
//! rebalancer's account holds what it started with and the owner holds the
//! gain.
//!
//! Inventory the account held before the call is never spent: it is neither
//! sold to cover the loan nor counted as profit.
//!
//! There is deliberately no public way to run only part of the sequence.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::BPS_DENOMINATOR;
use crate::error::{Result, VaultError};
use crate::events::VaultEvent;
use crate::executor::RebalanceRequest;
use crate::ledger::{AccountId, AssetLedger};
use crate::math::{mul_div, Amount, AssetId, Base, Basket, Rounding};
use crate::price::PriceInput;
use crate::vault::{UnitOfWork, Vault};
use crate::venue::SwapVenue;

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

/// Funding strategy of a flash rebalance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RebalanceMode {
    /// Borrow exactly the legs the vault demands; sell what it returns to
    /// repay them.
    Direct,
    /// Borrow base, buy the demanded legs, sell everything returned back to
    /// base.
    ViaBase,
    /// As [`ViaBase`](Self::ViaBase) with the stable asset as working
    /// capital.
    ViaStable,
}

impl RebalanceMode {
    /// The asset borrowed as working capital, if a single one is.
    pub fn working_asset(self) -> Option<AssetId> {
        match self {
            RebalanceMode::Direct => None,
            RebalanceMode::ViaBase => Some(AssetId::Base),
            RebalanceMode::ViaStable => Some(AssetId::Stable),
        }
    }
}

impl TryFrom<u8> for RebalanceMode {
    type Error = VaultError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(RebalanceMode::Direct),
            1 => Ok(RebalanceMode::ViaBase),
            2 => Ok(RebalanceMode::ViaStable),
            other => Err(VaultError::UnknownMode(other)),
        }
    }
}

impl From<RebalanceMode> for u8 {
    fn from(mode: RebalanceMode) -> u8 {
        match mode {
            RebalanceMode::Direct => 0,
            RebalanceMode::ViaBase => 1,
            RebalanceMode::ViaStable => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Lender
// ---------------------------------------------------------------------------

/// A source of flash liquidity.
pub trait FlashLender {
    /// Account the loan comes from and is repaid to.
    fn account(&self) -> &AccountId;

    /// Fee charged on a loan of `amount`.
    fn flash_fee(&self, asset: AssetId, amount: u128) -> Result<u128>;

    /// Most that can be borrowed of `asset` right now.
    fn max_flash_loan<L: AssetLedger + ?Sized>(&self, ledger: &L, asset: AssetId) -> u128 {
        ledger.balance_of(self.account(), asset)
    }
}

/// A lender charging a flat basis-point fee out of its ledger balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolLender {
    account: AccountId,
    fee_bps: u128,
}

impl PoolLender {
    /// A lender at `account` charging `fee_bps`.
    pub fn new(account: AccountId, fee_bps: u128) -> Result<Self> {
        if fee_bps >= BPS_DENOMINATOR {
            return Err(VaultError::InvalidConfiguration(format!(
                "flash fee {fee_bps} bps is not a fee"
            )));
        }
        Ok(Self { account, fee_bps })
    }
}

impl FlashLender for PoolLender {
    fn account(&self) -> &AccountId {
        &self.account
    }

    fn flash_fee(&self, _asset: AssetId, amount: u128) -> Result<u128> {
        mul_div(amount, self.fee_bps, BPS_DENOMINATOR, Rounding::Up)
    }
}

// ---------------------------------------------------------------------------
// Rebalancer
// ---------------------------------------------------------------------------

/// Result of a committed flash rebalance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashOutcome {
    /// Strategy used.
    pub mode: RebalanceMode,
    /// Principal borrowed.
    pub borrowed: Basket,
    /// Fees paid on it.
    pub fees: Basket,
    /// What was swept to the owner.
    pub swept: Basket,
    /// `swept` valued at oracle prices.
    pub profit: Amount<Base>,
}

/// A keeper that funds rebalances with flash loans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashRebalancer {
    account: AccountId,
    owner: AccountId,
    min_profit: Amount<Base>,
}

impl FlashRebalancer {
    /// A rebalancer trading from `account` and paying out to `owner`.
    pub fn new(account: AccountId, owner: AccountId) -> Self {
        Self {
            account,
            owner,
            min_profit: Amount::ZERO,
        }
    }

    /// Refuse to run for less than `min_profit`, valued in base.
    pub fn with_min_profit(mut self, min_profit: Amount<Base>) -> Self {
        self.min_profit = min_profit;
        self
    }

    /// The trading account.
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// Where proceeds go.
    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    /// Runs a flash rebalance against `vault` at `now`.
    ///
    /// # Errors
    ///
    /// * [`VaultError::UnknownMode`] for an invalid `mode`.
    /// * [`VaultError::NotEligible`] when the vault cannot rebalance.
    /// * [`VaultError::RepaymentShortfall`] when the proceeds cannot cover
    ///   principal, fee and minimum profit.
    pub fn rebalance<L, P, F, V>(
        &self,
        vault: &mut Vault<L, P>,
        lender: &F,
        venue: &V,
        mode: u8,
        now: u64,
    ) -> Result<FlashOutcome>
    where
        L: AssetLedger + Clone,
        P: PriceInput,
        F: FlashLender,
        V: SwapVenue,
    {
        let mode = RebalanceMode::try_from(mode)?;
        vault.transact("flash_rebalance", |unit| self.run(unit, lender, venue, mode, now))
    }

    fn run<L, F, V>(
        &self,
        unit: &mut UnitOfWork<'_, L>,
        lender: &F,
        venue: &V,
        mode: RebalanceMode,
        now: u64,
    ) -> Result<FlashOutcome>
    where
        L: AssetLedger,
        F: FlashLender,
        V: SwapVenue,
    {
        let trade = unit.quote_rebalance(now)?;
        let demanded = trade.vault_receives;
        let inventory = unit.ledger().basket_of(&self.account);

        let borrowed = match mode.working_asset() {
            None => demanded,
            Some(working) => {
                let mut principal = 0u128;
                for asset in AssetId::ALL {
                    let cost = venue.quote_in(working, asset, demanded.get(asset))?;
                    principal = principal
                        .checked_add(cost)
                        .ok_or(VaultError::Overflow("flash principal"))?;
                }
                basket_of(working, principal)
            }
        };

        let mut fees = Basket::EMPTY;
        for asset in AssetId::ALL {
            let amount = borrowed.get(asset);
            if amount == 0 {
                continue;
            }
            fees = fees
                .checked_add(&basket_of(asset, lender.flash_fee(asset, amount)?))
                .ok_or(VaultError::Overflow("flash fee"))?;
            unit.ledger_mut()
                .transfer(asset, lender.account(), &self.account, amount)?;
        }
        debug!(?mode, ?borrowed, ?fees, "flash loan drawn");

        if let Some(working) = mode.working_asset() {
            for asset in AssetId::ALL {
                let wanted = demanded.get(asset);
                if asset != working && wanted > 0 {
                    venue.swap_exact_out(unit.ledger_mut(), &self.account, working, asset, wanted)?;
                }
            }
        }

        unit.time_rebalance(&RebalanceRequest::unbounded(self.account.clone(), now))?;

        if let Some(working) = mode.working_asset() {
            for asset in AssetId::ALL {
                let held = unit
                    .ledger()
                    .balance_of(&self.account, asset)
                    .saturating_sub(inventory.get(asset));
                if asset != working && held > 0 {
                    venue.swap_exact_in(unit.ledger_mut(), &self.account, asset, working, held, 0)?;
                }
            }
        }

        let owed = borrowed
            .checked_add(&fees)
            .ok_or(VaultError::Overflow("flash repayment"))?;
        self.cover(unit.ledger_mut(), venue, &owed, &inventory)?;
        for asset in AssetId::ALL {
            let amount = owed.get(asset);
            if amount > 0 {
                unit.ledger_mut()
                    .transfer(asset, &self.account, lender.account(), amount)?;
            }
        }

        let swept = unit
            .ledger()
            .basket_of(&self.account)
            .checked_sub(&inventory)
            .ok_or_else(|| VaultError::InconsistentState("flash rebalancer spent its inventory".into()))?;
        let profit = swept.value_in_base(&unit.prices(), Rounding::Down)?;
        if profit < self.min_profit {
            return Err(VaultError::RepaymentShortfall {
                asset: AssetId::Base,
                owed: self.min_profit.raw(),
                available: profit.raw(),
            });
        }
        unit.ledger_mut()
            .transfer_basket(&swept, &self.account, &self.owner)?;

        info!(rebalancer = %self.account, ?mode, %profit, "flash rebalance settled");
        unit.emit(VaultEvent::FlashRebalanced {
            rebalancer: self.account.clone(),
            mode: mode.into(),
            profit,
        });
        Ok(FlashOutcome {
            mode,
            borrowed,
            fees,
            swept,
            profit,
        })
    }

    /// Sells surplus legs on `venue` until the account holds `owed` on top of
    /// `inventory`.
    fn cover<L, V>(&self, ledger: &mut L, venue: &V, owed: &Basket, inventory: &Basket) -> Result<()>
    where
        L: AssetLedger,
        V: SwapVenue,
    {
        let required = owed
            .checked_add(inventory)
            .ok_or(VaultError::Overflow("flash repayment"))?;
        for target in AssetId::ALL {
            for source in AssetId::ALL {
                if source == target {
                    continue;
                }
                let held = ledger.balance_of(&self.account, target);
                let short = required.get(target).saturating_sub(held);
                if short == 0 {
                    break;
                }
                let surplus = ledger
                    .balance_of(&self.account, source)
                    .saturating_sub(required.get(source));
                if surplus == 0 {
                    continue;
                }
                let cost = venue.quote_in(source, target, short)?;
                if cost <= surplus {
                    venue.swap_exact_out(ledger, &self.account, source, target, short)?;
                } else {
                    venue.swap_exact_in(ledger, &self.account, source, target, surplus, 0)?;
                }
            }

            let held = ledger.balance_of(&self.account, target);
            if held < required.get(target) {
                return Err(VaultError::RepaymentShortfall {
                    asset: target,
                    owed: owed.get(target),
                    available: held.saturating_sub(inventory.get(target)),
                });
            }
        }
        Ok(())
    }
}

fn basket_of(asset: AssetId, amount: u128) -> Basket {
    match asset {
        AssetId::Base => Basket::from_raw(amount, 0, 0),
        AssetId::Stable => Basket::from_raw(0, amount, 0),
        AssetId::Vol => Basket::from_raw(0, 0, amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_round_trip_through_u8() {
        for mode in [RebalanceMode::Direct, RebalanceMode::ViaBase, RebalanceMode::ViaStable] {
            assert_eq!(RebalanceMode::try_from(u8::from(mode)).unwrap(), mode);
        }
        assert_eq!(RebalanceMode::try_from(3).unwrap_err(), VaultError::UnknownMode(3));
    }

    #[test]
    fn pool_fee_rounds_up() {
        let lender = PoolLender::new(AccountId::from("pool"), 9).unwrap();
        assert_eq!(lender.flash_fee(AssetId::Stable, 10_000).unwrap(), 9);
        assert_eq!(lender.flash_fee(AssetId::Stable, 10_001).unwrap(), 10);
        assert_eq!(lender.flash_fee(AssetId::Stable, 0).unwrap(), 0);
    }

    #[test]
    fn working_assets() {
        assert_eq!(RebalanceMode::Direct.working_asset(), None);
        assert_eq!(RebalanceMode::ViaStable.working_asset(), Some(AssetId::Stable));
    }
}

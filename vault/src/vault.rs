//! # Vault
//!
//! The composition root. A [`Vault`] owns the configuration, the rebalance
//! gate, the holdings, the asset ledger and the price input, and is the only
//! way to reach any of them mutably.
//!
//! ## Units of work
//!
//! Every mutating call runs through [`Vault::transact`]:
//!
//! ```text
//!   prices() ─► stage copies of gate, holdings, ledger
//!            ─► run the operation against the copies
//!            ─► check holdings invariants and ledger reconciliation
//!            ─► commit (swap copies in, publish events)  or  discard
//! ```
//!
//! A failed unit leaves every piece of vault state exactly as it was and
//! publishes no events. Units are serialized by `&mut self`; there is no
//! interleaving to reason about.
//!
//! The configuration is not staged. It changes only through the governance
//! setters, each of which validates before it writes.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::auction::{AuctionAnchor, AuctionPrices, AuctionPricer};
use crate::config::VaultConfiguration;
use crate::error::{OutputLeg, Result, VaultError};
use crate::events::VaultEvent;
use crate::executor::{ExecutedAmounts, RebalanceExecutor, RebalanceRequest, RebalanceTrade};
use crate::gate::{GateState, RebalanceGate};
use crate::holdings::VaultHoldings;
use crate::ledger::{AccountId, AssetLedger, InMemoryLedger};
use crate::math::{mul_div, Amount, AssetId, Base, Basket, PriceSnapshot, Rounding, Wad};
use crate::price::{PriceInput, StaticPrices};
use crate::shares::{basket_for_value, calc_shares_and_amounts, calc_withdraw_amounts, SharesOutcome};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A deposit sized by base-asset value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRequest {
    /// Account the assets are pulled from.
    pub depositor: AccountId,
    /// Account credited with the shares.
    pub recipient: AccountId,
    /// Base-denominated value to deposit. The vault pulls the basket worth
    /// this much in its current mix.
    pub amount_base_in: Amount<Base>,
    /// Least shares the depositor accepts.
    pub min_shares_out: u128,
}

impl DepositRequest {
    /// Deposits `amount_base_in` from `depositor` to itself, unbounded.
    pub fn new(depositor: AccountId, amount_base_in: Amount<Base>) -> Self {
        Self {
            recipient: depositor.clone(),
            depositor,
            amount_base_in,
            min_shares_out: 0,
        }
    }

    /// Credits the shares to `recipient` instead.
    pub fn to(mut self, recipient: AccountId) -> Self {
        self.recipient = recipient;
        self
    }

    /// Requires at least `min_shares_out` shares.
    pub fn with_min_shares(mut self, min_shares_out: u128) -> Self {
        self.min_shares_out = min_shares_out;
        self
    }
}

/// A withdrawal by share count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawRequest {
    /// Account whose shares are burnt.
    pub owner: AccountId,
    /// Account paid.
    pub recipient: AccountId,
    /// Shares to burn.
    pub shares_in: u128,
    /// Least of each asset the owner accepts.
    pub min_amounts_out: Basket,
}

impl WithdrawRequest {
    /// Burns `shares_in` of `owner`'s shares and pays `owner`, unbounded.
    pub fn new(owner: AccountId, shares_in: u128) -> Self {
        Self {
            recipient: owner.clone(),
            owner,
            shares_in,
            min_amounts_out: Basket::EMPTY,
        }
    }

    /// Pays `recipient` instead.
    pub fn to(mut self, recipient: AccountId) -> Self {
        self.recipient = recipient;
        self
    }

    /// Requires at least `min_amounts_out` of each asset.
    pub fn with_min_amounts(mut self, min_amounts_out: Basket) -> Self {
        self.min_amounts_out = min_amounts_out;
        self
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The persisted state of a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSnapshot {
    /// The vault's ledger account.
    pub account: AccountId,
    /// Risk parameters.
    pub config: VaultConfiguration,
    /// Gate checkpoint and anchor.
    pub gate: RebalanceGate,
    /// Books.
    pub holdings: VaultHoldings,
}

// ---------------------------------------------------------------------------
// UnitOfWork
// ---------------------------------------------------------------------------

/// Staged vault state for one unit of work.
///
/// Everything here operates on copies. Nothing is visible outside until
/// [`Vault::transact`] commits, and a unit that returns an error is dropped
/// whole.
pub struct UnitOfWork<'a, L> {
    account: &'a AccountId,
    config: &'a VaultConfiguration,
    prices: PriceSnapshot,
    gate: RebalanceGate,
    holdings: VaultHoldings,
    ledger: L,
    events: Vec<VaultEvent>,
}

impl<'a, L: AssetLedger> UnitOfWork<'a, L> {
    /// The vault's ledger account.
    pub fn vault_account(&self) -> &AccountId {
        self.account
    }

    /// Configuration in force.
    pub fn config(&self) -> &VaultConfiguration {
        self.config
    }

    /// Prices read once at the start of the unit.
    pub fn prices(&self) -> PriceSnapshot {
        self.prices
    }

    /// Staged books.
    pub fn holdings(&self) -> &VaultHoldings {
        &self.holdings
    }

    /// Staged gate.
    pub fn gate(&self) -> &RebalanceGate {
        &self.gate
    }

    /// Staged ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Staged ledger, for collaborators that move assets as part of the
    /// unit. The vault account must still reconcile with the books when the
    /// unit ends.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    /// The basket worth `value` in the vault's current mix.
    pub fn basket_for_value(&self, value: Amount<Base>) -> Result<Basket> {
        basket_for_value(value, &self.holdings.balances, &self.prices)
    }

    /// Pulls the basket worth `amount_base_in` and mints shares.
    pub fn deposit(&mut self, request: &DepositRequest) -> Result<SharesOutcome> {
        if self.config.paused {
            return Err(VaultError::paused());
        }
        if request.amount_base_in.is_zero() {
            return Err(VaultError::ZeroAmount);
        }

        let offered = self.basket_for_value(request.amount_base_in)?;
        let outcome = calc_shares_and_amounts(
            self.holdings.total_shares,
            &offered,
            &self.holdings.balances,
            true,
        )?;
        if outcome.shares == 0 {
            return Err(VaultError::ZeroAmount);
        }
        if outcome.shares < request.min_shares_out {
            return Err(VaultError::SlippageExceeded {
                leg: OutputLeg::Shares,
                minimum: request.min_shares_out,
                realized: outcome.shares,
            });
        }

        let value = outcome
            .amounts
            .value_in_base(&self.prices, Rounding::Down)?
            .min(request.amount_base_in);
        let total = self
            .holdings
            .total_base_deposited
            .checked_add(value)
            .ok_or(VaultError::Overflow("total deposits"))?;
        if total > self.config.cap_total_deposits {
            return Err(VaultError::DepositCapExceeded {
                cap: self.config.cap_total_deposits.raw(),
                attempted: total.raw(),
            });
        }

        self.ledger
            .transfer_basket(&outcome.amounts, &request.depositor, self.account)?;
        self.holdings.credit(&outcome.amounts)?;
        self.holdings.mint_shares(&request.recipient, outcome.shares)?;
        self.holdings.total_base_deposited = total;

        self.events.push(VaultEvent::Deposited {
            depositor: request.depositor.clone(),
            recipient: request.recipient.clone(),
            shares: outcome.shares,
            amounts: outcome.amounts,
            total_base_deposited: total,
        });
        Ok(outcome)
    }

    /// Burns shares and pays out the pro-rata basket. Allowed while paused.
    pub fn withdraw(&mut self, request: &WithdrawRequest) -> Result<Basket> {
        if request.shares_in == 0 {
            return Err(VaultError::ZeroAmount);
        }
        let owned = self.holdings.shares_of(&request.owner);
        if owned < request.shares_in {
            return Err(VaultError::InsufficientShares {
                owned,
                requested: request.shares_in,
            });
        }

        let supply = self.holdings.total_shares;
        let amounts = calc_withdraw_amounts(supply, request.shares_in, &self.holdings.balances)?;
        for asset in AssetId::ALL {
            let realized = amounts.get(asset);
            let minimum = request.min_amounts_out.get(asset);
            if realized < minimum {
                return Err(VaultError::SlippageExceeded {
                    leg: asset.into(),
                    minimum,
                    realized,
                });
            }
        }

        let deposited = self.holdings.total_base_deposited;
        let released = mul_div(deposited.raw(), request.shares_in, supply, Rounding::Up)?;
        self.holdings.total_base_deposited = deposited.saturating_sub(Amount::new(released));

        self.holdings.burn_shares(&request.owner, request.shares_in)?;
        self.holdings.debit(&amounts)?;
        self.ledger
            .transfer_basket(&amounts, self.account, &request.recipient)?;

        self.events.push(VaultEvent::Withdrawn {
            owner: request.owner.clone(),
            recipient: request.recipient.clone(),
            shares: request.shares_in,
            amounts,
        });
        Ok(amounts)
    }

    /// Arms the gate if eligible and returns the anchor in force.
    pub fn arm_auction(&mut self, now: u64) -> Result<AuctionAnchor> {
        let was_idle = self.gate.state() == GateState::Idle;
        let anchor = self.gate.arm(self.config, self.prices.base_stable, now)?;
        if was_idle {
            self.events.push(VaultEvent::AuctionArmed { anchor });
        }
        Ok(anchor)
    }

    /// The trade a rebalance at `now` would perform.
    pub fn quote_rebalance(&self, now: u64) -> Result<RebalanceTrade> {
        let anchor = self
            .gate
            .current_anchor(self.config, self.prices.base_stable, now)?;
        RebalanceExecutor::new(self.config).quote(&anchor, &self.holdings.balances, &self.prices, now)
    }

    /// Runs a full rebalance against `request.keeper`.
    pub fn time_rebalance(&mut self, request: &RebalanceRequest) -> Result<ExecutedAmounts> {
        let was_idle = self.gate.state() == GateState::Idle;
        let executed = RebalanceExecutor::new(self.config).time_rebalance(
            &mut self.gate,
            &mut self.holdings,
            &mut self.ledger,
            self.account,
            &self.prices,
            request,
        )?;
        if was_idle {
            self.events.push(VaultEvent::AuctionArmed {
                anchor: executed.anchor,
            });
        }
        self.events.push(VaultEvent::Rebalanced {
            keeper: request.keeper.clone(),
            executed,
        });
        Ok(executed)
    }

    /// Appends an event to the unit's log.
    pub fn emit(&mut self, event: VaultEvent) {
        self.events.push(event);
    }

    fn check(&self) -> Result<()> {
        self.holdings.check_invariants()?;
        let on_ledger = self.ledger.basket_of(self.account);
        if on_ledger != self.holdings.balances {
            return Err(VaultError::InconsistentState(format!(
                "ledger holds {:?} for the vault, books say {:?}",
                on_ledger, self.holdings.balances
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// A three-asset hedging vault.
#[derive(Debug, Clone)]
pub struct Vault<L = InMemoryLedger, P = StaticPrices> {
    account: AccountId,
    config: VaultConfiguration,
    gate: RebalanceGate,
    holdings: VaultHoldings,
    ledger: L,
    prices: P,
    events: Vec<VaultEvent>,
}

impl<L, P> Vault<L, P>
where
    L: AssetLedger + Clone,
    P: PriceInput,
{
    /// A fresh vault. The gate's checkpoint is seeded at `now` with the
    /// current base price.
    ///
    /// # Errors
    ///
    /// [`VaultError::InvalidConfiguration`] for an invalid configuration,
    /// [`VaultError::InconsistentState`] if `account` already holds assets.
    pub fn new(account: AccountId, config: VaultConfiguration, ledger: L, prices: P, now: u64) -> Result<Self> {
        let current = prices.prices()?;
        Self::restore(
            VaultSnapshot {
                account,
                gate: RebalanceGate::genesis(now, current.base_stable),
                holdings: VaultHoldings::new(),
                config,
            },
            ledger,
            prices,
        )
    }

    /// Rebuilds a vault from persisted state.
    pub fn restore(snapshot: VaultSnapshot, ledger: L, prices: P) -> Result<Self> {
        snapshot.config.validate()?;
        snapshot.holdings.check_invariants()?;
        let on_ledger = ledger.basket_of(&snapshot.account);
        if on_ledger != snapshot.holdings.balances {
            return Err(VaultError::InconsistentState(format!(
                "ledger holds {:?} for {}, books say {:?}",
                on_ledger, snapshot.account, snapshot.holdings.balances
            )));
        }
        info!(
            account = %snapshot.account,
            shares = snapshot.holdings.total_shares,
            "vault opened"
        );
        Ok(Self {
            account: snapshot.account,
            config: snapshot.config,
            gate: snapshot.gate,
            holdings: snapshot.holdings,
            ledger,
            prices,
            events: Vec::new(),
        })
    }

    /// The persisted state.
    pub fn snapshot(&self) -> VaultSnapshot {
        VaultSnapshot {
            account: self.account.clone(),
            config: self.config.clone(),
            gate: self.gate.clone(),
            holdings: self.holdings.clone(),
        }
    }

    /// The vault's ledger account.
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// Configuration in force.
    pub fn config(&self) -> &VaultConfiguration {
        &self.config
    }

    /// The rebalance gate.
    pub fn gate(&self) -> &RebalanceGate {
        &self.gate
    }

    /// The books.
    pub fn holdings(&self) -> &VaultHoldings {
        &self.holdings
    }

    /// The asset ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// The price input.
    pub fn price_input(&self) -> &P {
        &self.prices
    }

    /// The price input, e.g. to move a test oracle.
    pub fn price_input_mut(&mut self) -> &mut P {
        &mut self.prices
    }

    /// Current oracle prices.
    pub fn prices(&self) -> Result<PriceSnapshot> {
        self.prices.prices()
    }

    /// Seeds balances outside any unit of work. Only accounts other than
    /// the vault's may be touched; the books would not reconcile otherwise.
    pub fn ledger_setup(&mut self, seed: impl FnOnce(&mut L) -> Result<()>) -> Result<()> {
        let mut staged = self.ledger.clone();
        seed(&mut staged)?;
        if staged.basket_of(&self.account) != self.holdings.balances {
            return Err(VaultError::InconsistentState(
                "ledger setup touched the vault account".into(),
            ));
        }
        self.ledger = staged;
        Ok(())
    }

    /// Events of committed units, oldest first, without removing them.
    pub fn events(&self) -> &[VaultEvent] {
        &self.events
    }

    /// Takes the event log.
    pub fn drain_events(&mut self) -> Vec<VaultEvent> {
        std::mem::take(&mut self.events)
    }

    /// Runs `op` as one unit of work.
    ///
    /// Prices are read once up front. `op` works on staged copies of the
    /// gate, the holdings and the ledger; they replace the live state only if
    /// `op` succeeds and the books still reconcile with the ledger.
    pub fn transact<T>(
        &mut self,
        label: &'static str,
        op: impl FnOnce(&mut UnitOfWork<'_, L>) -> Result<T>,
    ) -> Result<T> {
        let prices = self.prices.prices()?;
        let mut unit = UnitOfWork {
            account: &self.account,
            config: &self.config,
            prices,
            gate: self.gate.clone(),
            holdings: self.holdings.clone(),
            ledger: self.ledger.clone(),
            events: Vec::new(),
        };

        let outcome = op(&mut unit).and_then(|value| unit.check().map(|()| value));
        match outcome {
            Ok(value) => {
                let UnitOfWork {
                    gate,
                    holdings,
                    ledger,
                    events,
                    ..
                } = unit;
                debug!(unit = label, events = events.len(), "unit committed");
                for event in &events {
                    info!(unit = label, ?event, "vault event");
                }
                self.gate = gate;
                self.holdings = holdings;
                self.ledger = ledger;
                self.events.extend(events);
                Ok(value)
            }
            Err(err) => {
                warn!(unit = label, error = %err, retryable = err.is_retryable(), "unit discarded");
                Err(err)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Deposit / withdraw
    // -----------------------------------------------------------------------

    /// Deposits the basket worth `request.amount_base_in`. The first deposit
    /// takes base only and mints shares 1:1 with it.
    pub fn deposit(&mut self, request: &DepositRequest) -> Result<SharesOutcome> {
        self.transact("deposit", |unit| unit.deposit(request))
    }

    /// Burns shares for the pro-rata basket.
    pub fn withdraw(&mut self, request: &WithdrawRequest) -> Result<Basket> {
        self.transact("withdraw", |unit| unit.withdraw(request))
    }

    // -----------------------------------------------------------------------
    // Rebalance
    // -----------------------------------------------------------------------

    /// Whether a rebalance is permitted at `now`.
    pub fn is_time_rebalance(&self, now: u64) -> Result<bool> {
        let prices = self.prices.prices()?;
        self.gate.is_time_rebalance(&self.config, prices.base_stable, now)
    }

    /// The auction prices a rebalance at `now` would clear at.
    ///
    /// # Errors
    ///
    /// [`VaultError::NotEligible`] when paused or no auction is due.
    pub fn get_auction_params(&self, now: u64) -> Result<AuctionPrices> {
        let prices = self.prices.prices()?;
        let anchor = self.gate.current_anchor(&self.config, prices.base_stable, now)?;
        AuctionPricer::new(&self.config).get_auction_prices(&anchor, &prices, now)
    }

    /// The trade a rebalance at `now` would perform. Mutates nothing.
    pub fn quote_rebalance(&self, now: u64) -> Result<RebalanceTrade> {
        let prices = self.prices.prices()?;
        let anchor = self.gate.current_anchor(&self.config, prices.base_stable, now)?;
        RebalanceExecutor::new(&self.config).quote(&anchor, &self.holdings.balances, &prices, now)
    }

    /// Commits the auction anchor so its curve keeps running across calls.
    pub fn arm_auction(&mut self, now: u64) -> Result<AuctionAnchor> {
        self.transact("arm_auction", |unit| unit.arm_auction(now))
    }

    /// Rebalances toward target against `request.keeper`.
    pub fn time_rebalance(&mut self, request: &RebalanceRequest) -> Result<ExecutedAmounts> {
        self.transact("time_rebalance", |unit| unit.time_rebalance(request))
    }

    // -----------------------------------------------------------------------
    // Governance
    // -----------------------------------------------------------------------

    /// Pauses or unpauses everything but withdrawal.
    pub fn set_pause(&mut self, caller: &AccountId, paused: bool) -> Result<()> {
        self.govern(caller, "set_pause", paused, |c| c.set_pause(paused))
    }

    /// Sets the cheapest auction multiplier.
    pub fn set_min_price_multiplier(&mut self, caller: &AccountId, value: Wad) -> Result<()> {
        self.govern(caller, "set_min_price_multiplier", value, |c| {
            c.set_min_price_multiplier(value)
        })
    }

    /// Sets the most expensive auction multiplier.
    pub fn set_max_price_multiplier(&mut self, caller: &AccountId, value: Wad) -> Result<()> {
        self.govern(caller, "set_max_price_multiplier", value, |c| {
            c.set_max_price_multiplier(value)
        })
    }

    /// Sets the price deviation that permits an early rebalance.
    pub fn set_rebalance_threshold(&mut self, caller: &AccountId, value: Wad) -> Result<()> {
        self.govern(caller, "set_rebalance_threshold", value, |c| {
            c.set_rebalance_threshold(value)
        })
    }

    /// Sets the minimum spacing between rebalances.
    pub fn set_rebalance_time_threshold(&mut self, caller: &AccountId, seconds: u64) -> Result<()> {
        self.govern(caller, "set_rebalance_time_threshold", seconds, |c| {
            c.set_rebalance_time_threshold(seconds)
        })
    }

    /// Sets the auction length.
    pub fn set_auction_duration(&mut self, caller: &AccountId, seconds: u64) -> Result<()> {
        self.govern(caller, "set_auction_duration", seconds, |c| {
            c.set_auction_duration(seconds)
        })
    }

    /// Sets the position half-width.
    pub fn set_base_threshold(&mut self, caller: &AccountId, ticks: u32) -> Result<()> {
        self.govern(caller, "set_base_threshold", ticks, |c| c.set_base_threshold(ticks))
    }

    /// Sets the floor for the minimum multiplier.
    pub fn set_min_price_multiplier_fine(&mut self, caller: &AccountId, value: Wad) -> Result<()> {
        self.govern(caller, "set_min_price_multiplier_fine", value, |c| {
            c.set_min_price_multiplier_fine(value)
        })
    }

    /// Sets the deposit cap.
    pub fn set_cap_total_deposits(&mut self, caller: &AccountId, cap: Amount<Base>) -> Result<()> {
        self.govern(caller, "set_cap_total_deposits", cap, |c| c.set_cap_total_deposits(cap))
    }

    /// Sets the target value weights.
    pub fn set_target_shares(&mut self, caller: &AccountId, base: Wad, stable: Wad, vol: Wad) -> Result<()> {
        let rendered = format!("{base}/{stable}/{vol}");
        self.govern(caller, "set_target_shares", rendered, |c| {
            c.set_target_shares(base, stable, vol)
        })
    }

    fn govern(
        &mut self,
        caller: &AccountId,
        parameter: &'static str,
        value: impl std::fmt::Display,
        change: impl FnOnce(&mut VaultConfiguration) -> Result<()>,
    ) -> Result<()> {
        if !self.config.is_governance(caller) {
            warn!(%caller, parameter, "setter rejected: not governance");
            return Err(VaultError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        if let Err(err) = change(&mut self.config) {
            warn!(parameter, error = %err, "setter rejected");
            return Err(err);
        }
        info!(parameter, %value, "parameter changed");
        self.events.push(VaultEvent::ParameterChanged {
            parameter: parameter.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::WAD;

    const GENESIS: u64 = 1_700_000_000;

    fn gov() -> AccountId {
        AccountId::from("governance")
    }

    fn alice() -> AccountId {
        AccountId::from("alice")
    }

    fn vault() -> Vault {
        let prices = StaticPrices::new(
            Wad::from_raw(200_000_000_000_000_000),
            Wad::from_raw(2_000 * WAD),
        )
        .unwrap();
        let mut vault = Vault::new(
            AccountId::from("vault"),
            VaultConfiguration::mainnet(gov()),
            InMemoryLedger::new(),
            prices,
            GENESIS,
        )
        .unwrap();
        vault
            .ledger_setup(|ledger| ledger.mint_basket(&alice(), &Basket::from_raw(50 * WAD, 0, 0)))
            .unwrap();
        vault
    }

    #[test]
    fn first_deposit_mints_one_to_one_and_records_it() {
        let mut vault = vault();
        let x = Amount::<Base>::new(3 * WAD);
        let out = vault.deposit(&DepositRequest::new(alice(), x)).unwrap();

        assert_eq!(out.shares, x.raw());
        assert_eq!(vault.holdings().total_shares, x.raw());
        assert_eq!(vault.holdings().total_base_deposited, x);
        assert_eq!(vault.holdings().shares_of(&alice()), x.raw());
        assert_eq!(vault.ledger().basket_of(vault.account()), Basket::from_raw(3 * WAD, 0, 0));
    }

    #[test]
    fn deposit_over_cap_is_discarded() {
        let mut vault = vault();
        vault
            .set_cap_total_deposits(&gov(), Amount::new(2 * WAD))
            .unwrap();
        vault.drain_events();
        let before = vault.snapshot();

        let err = vault
            .deposit(&DepositRequest::new(alice(), Amount::new(3 * WAD)))
            .unwrap_err();
        assert_eq!(
            err,
            VaultError::DepositCapExceeded {
                cap: 2 * WAD,
                attempted: 3 * WAD
            }
        );
        assert_eq!(vault.snapshot(), before);
        assert!(vault.events().is_empty());
    }

    #[test]
    fn min_shares_bound_is_enforced() {
        let mut vault = vault();
        let request = DepositRequest::new(alice(), Amount::new(WAD)).with_min_shares(WAD + 1);
        assert!(matches!(
            vault.deposit(&request),
            Err(VaultError::SlippageExceeded {
                leg: OutputLeg::Shares,
                ..
            })
        ));
        assert_eq!(vault.holdings().total_shares, 0);
    }

    #[test]
    fn paused_vault_still_allows_withdrawal() {
        let mut vault = vault();
        vault
            .deposit(&DepositRequest::new(alice(), Amount::new(WAD)))
            .unwrap();
        vault.set_pause(&gov(), true).unwrap();

        assert_eq!(
            vault
                .deposit(&DepositRequest::new(alice(), Amount::new(WAD)))
                .unwrap_err(),
            VaultError::paused()
        );
        let out = vault.withdraw(&WithdrawRequest::new(alice(), WAD)).unwrap();
        assert_eq!(out, Basket::from_raw(WAD, 0, 0));
        assert_eq!(vault.holdings().total_shares, 0);
        assert!(vault.holdings().total_base_deposited.is_zero());
    }

    #[test]
    fn withdrawing_more_than_owned_fails() {
        let mut vault = vault();
        vault
            .deposit(&DepositRequest::new(alice(), Amount::new(WAD)))
            .unwrap();
        let err = vault
            .withdraw(&WithdrawRequest::new(alice(), WAD + 1))
            .unwrap_err();
        assert_eq!(
            err,
            VaultError::InsufficientShares {
                owned: WAD,
                requested: WAD + 1
            }
        );
    }

    #[test]
    fn setters_require_governance() {
        let mut vault = vault();
        let err = vault.set_pause(&alice(), true).unwrap_err();
        assert!(matches!(err, VaultError::Unauthorized { .. }));
        assert!(!vault.config().paused);

        vault
            .set_base_threshold(&gov(), 100_000)
            .unwrap();
        assert_eq!(
            vault.drain_events(),
            vec![VaultEvent::ParameterChanged {
                parameter: "set_base_threshold".into(),
                value: "100000".into(),
            }]
        );
    }

    #[test]
    fn auction_params_need_an_eligible_gate() {
        let vault = vault();
        assert!(!vault.is_time_rebalance(GENESIS + 1).unwrap());
        assert_eq!(
            vault.get_auction_params(GENESIS + 1).unwrap_err(),
            VaultError::gate_idle()
        );
        let late = GENESIS + vault.config().rebalance_time_threshold + 1;
        assert!(vault.is_time_rebalance(late).unwrap());
        // One second into a falling curve.
        let params = vault.get_auction_params(late).unwrap();
        assert!(params.multiplier < vault.config().max_price_multiplier);
        assert!(params.multiplier > Wad::ONE);
    }

    #[test]
    fn tampering_with_the_vault_account_is_refused() {
        let mut vault = vault();
        let account = vault.account().clone();
        let err = vault
            .ledger_setup(|ledger| ledger.mint(&account, AssetId::Base, 1))
            .unwrap_err();
        assert!(matches!(err, VaultError::InconsistentState(_)));
        assert!(vault.ledger().basket_of(&account).is_empty());
    }
}

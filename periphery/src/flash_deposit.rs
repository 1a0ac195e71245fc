//! # One-click Deposit
//!
//! Depositing into the vault normally means supplying all three assets in
//! its current mix. [`FlashDeposit`] takes base only:
//!
//! ```text
//!   pull base from user ─► size basket for amount * slippage
//!     ─► buy stable and vol legs with base ─► vault deposit (shares to `to`)
//!     ─► refund unspent base to user
//! ```
//!
//! The whole sequence is one vault unit of work. If any step fails (the
//! venue is short, the share bound is missed, the vault is paused) nothing
//! moves, the user's base included. A deposit whose swaps and vault leg cost
//! more base than the user supplied fails with
//! [`VaultError::InsufficientFunds`] rather than drawing on the helper's
//! dust.
//!
//! Stable and vol the vault does not take in full stay on the helper's
//! account as dust until governance sweeps it with
//! [`FlashDeposit::collect_remains`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use hedge_vault::{
    AccountId, Amount, AssetId, AssetLedger, Base, Basket, DepositRequest, PriceInput, Rounding,
    SwapVenue, UnitOfWork, Vault, VaultError, Wad,
};

use crate::error::{PeripheryError, Result};

/// A one-click deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashDepositRequest {
    /// Account the base asset is pulled from and refunded to.
    pub user: AccountId,
    /// Base pulled from the user.
    pub amount_base: Amount<Base>,
    /// Share of `amount_base` that goes into the vault, in `(0, 1]`. The
    /// rest covers the venue's fee and price drift and comes back unspent.
    pub slippage: Wad,
    /// Account credited with the shares.
    pub to: AccountId,
    /// Least shares the user accepts.
    pub min_shares_out: u128,
}

impl FlashDepositRequest {
    /// Deposits `amount_base` for `user`, crediting `user`, with no share
    /// bound.
    pub fn new(user: AccountId, amount_base: Amount<Base>, slippage: Wad) -> Self {
        Self {
            to: user.clone(),
            user,
            amount_base,
            slippage,
            min_shares_out: 0,
        }
    }

    /// Credits the shares to `to` instead.
    pub fn to(mut self, to: AccountId) -> Self {
        self.to = to;
        self
    }

    /// Requires at least `min_shares_out` shares.
    pub fn with_min_shares(mut self, min_shares_out: u128) -> Self {
        self.min_shares_out = min_shares_out;
        self
    }
}

/// What a committed one-click deposit did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashDepositOutcome {
    /// Shares minted to the recipient.
    pub shares: u128,
    /// Basket the vault took.
    pub deposited: Basket,
    /// Base spent on the venue buying the other legs.
    pub swap_cost: Amount<Base>,
    /// Base returned to the user.
    pub refunded: Amount<Base>,
}

/// The one-click deposit helper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashDeposit {
    account: AccountId,
    governance: AccountId,
}

impl FlashDeposit {
    /// A helper trading from `account`, swept by `governance`.
    pub fn new(account: AccountId, governance: AccountId) -> Self {
        Self {
            account,
            governance,
        }
    }

    /// The helper's ledger account.
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// Deposits base on the user's behalf.
    ///
    /// # Errors
    ///
    /// * [`PeripheryError::InvalidSlippage`] for a factor outside `(0, 1]`.
    /// * [`PeripheryError::Vault`] for anything the vault, the ledger or
    ///   the venue refuses; the unit is discarded whole.
    pub fn deposit<L, P, V>(
        &self,
        vault: &mut Vault<L, P>,
        venue: &V,
        request: &FlashDepositRequest,
    ) -> Result<FlashDepositOutcome>
    where
        L: AssetLedger + Clone,
        P: PriceInput,
        V: SwapVenue,
    {
        if request.slippage.is_zero() || request.slippage > Wad::ONE {
            return Err(PeripheryError::InvalidSlippage(request.slippage));
        }
        let outcome = vault.transact("flash_deposit", |unit| self.run(unit, venue, request))?;
        info!(
            user = %request.user,
            to = %request.to,
            shares = outcome.shares,
            refunded = %outcome.refunded,
            "flash deposit settled"
        );
        Ok(outcome)
    }

    fn run<L, V>(
        &self,
        unit: &mut UnitOfWork<'_, L>,
        venue: &V,
        request: &FlashDepositRequest,
    ) -> hedge_vault::Result<FlashDepositOutcome>
    where
        L: AssetLedger,
        V: SwapVenue,
    {
        if request.amount_base.is_zero() {
            return Err(VaultError::ZeroAmount);
        }
        // Pre-existing dust is not the user's to spend or receive.
        let held_before = unit.ledger().balance_of(&self.account, AssetId::Base);

        unit.ledger_mut().transfer(
            AssetId::Base,
            &request.user,
            &self.account,
            request.amount_base.raw(),
        )?;

        let value = Amount::<Base>::new(
            request
                .slippage
                .apply(request.amount_base.raw(), Rounding::Down)?,
        );
        let wanted = unit.basket_for_value(value)?;

        let mut swap_cost = 0u128;
        for asset in [AssetId::Stable, AssetId::Vol] {
            let amount = wanted.get(asset);
            if amount == 0 {
                continue;
            }
            let paid = venue.swap_exact_out(unit.ledger_mut(), &self.account, AssetId::Base, asset, amount)?;
            swap_cost = swap_cost
                .checked_add(paid)
                .ok_or(VaultError::Overflow("flash deposit swap cost"))?;
        }
        debug!(?wanted, swap_cost, "flash deposit legs bought");

        let deposit = DepositRequest::new(self.account.clone(), value)
            .to(request.to.clone())
            .with_min_shares(request.min_shares_out);
        let minted = unit.deposit(&deposit)?;

        let held_after = unit.ledger().balance_of(&self.account, AssetId::Base);
        let Some(refunded) = held_after.checked_sub(held_before) else {
            let overdraw = held_before - held_after;
            warn!(user = %request.user, overdraw, "flash deposit would spend the helper's dust");
            return Err(VaultError::InsufficientFunds {
                asset: AssetId::Base,
                account: request.user.to_string(),
                available: request.amount_base.raw(),
                requested: request
                    .amount_base
                    .raw()
                    .checked_add(overdraw)
                    .ok_or(VaultError::Overflow("flash deposit overdraw"))?,
            });
        };
        if refunded > 0 {
            unit.ledger_mut()
                .transfer(AssetId::Base, &self.account, &request.user, refunded)?;
        }

        Ok(FlashDepositOutcome {
            shares: minted.shares,
            deposited: minted.amounts,
            swap_cost: Amount::new(swap_cost),
            refunded: Amount::new(refunded),
        })
    }

    /// Sweeps `amounts` off the helper's account to `to`. Governance only.
    pub fn collect_remains<L, P>(
        &self,
        vault: &mut Vault<L, P>,
        caller: &AccountId,
        amounts: &Basket,
        to: &AccountId,
    ) -> Result<()>
    where
        L: AssetLedger + Clone,
        P: PriceInput,
    {
        if caller != &self.governance {
            warn!(%caller, "collect_remains rejected: not governance");
            return Err(PeripheryError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        vault.transact("collect_remains", |unit| {
            unit.ledger_mut().transfer_basket(amounts, &self.account, to)
        })?;
        info!(%to, ?amounts, "remains collected");
        Ok(())
    }
}

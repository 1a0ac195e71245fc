//! # Asset Ledger
//!
//! The engine does not move tokens itself. It asks an [`AssetLedger`] to
//! transfer the three tracked assets between accounts, and the ledger is
//! the only place where a balance can go up or down.
//!
//! [`InMemoryLedger`] is the reference implementation. It is `Clone` so a
//! unit of work can stage a copy, mutate it freely, and either swap it in
//! on success or drop it on failure.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};
use crate::math::{AssetId, Basket};

/// Identifies an account on the ledger (a user, the vault, a lender...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Wraps an account name.
    pub fn new(name: impl Into<String>) -> Self {
        AccountId(name.into())
    }

    /// The account name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccountId {
    fn from(name: &str) -> Self {
        AccountId(name.to_string())
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Balance-transfer primitive for the three tracked assets.
pub trait AssetLedger {
    /// Balance of `account` in `asset`. Unknown accounts hold nothing.
    fn balance_of(&self, account: &AccountId, asset: AssetId) -> u128;

    /// Moves `amount` of `asset` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// [`VaultError::InsufficientFunds`] if `from` holds less than `amount`;
    /// the ledger is left untouched in that case.
    fn transfer(&mut self, asset: AssetId, from: &AccountId, to: &AccountId, amount: u128)
        -> Result<()>;

    /// All three balances of `account`.
    fn basket_of(&self, account: &AccountId) -> Basket {
        Basket::from_raw(
            self.balance_of(account, AssetId::Base),
            self.balance_of(account, AssetId::Stable),
            self.balance_of(account, AssetId::Vol),
        )
    }

    /// Moves every non-zero leg of `basket` from `from` to `to`.
    fn transfer_basket(&mut self, basket: &Basket, from: &AccountId, to: &AccountId) -> Result<()> {
        for asset in AssetId::ALL {
            let amount = basket.get(asset);
            if amount > 0 {
                self.transfer(asset, from, to, amount)?;
            }
        }
        Ok(())
    }
}

/// Ledger held entirely in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryLedger {
    balances: BTreeMap<AccountId, BTreeMap<AssetId, u128>>,
}

impl InMemoryLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits `amount` out of thin air. Used to seed genesis balances and
    /// in tests; the engine itself never mints.
    pub fn mint(&mut self, account: &AccountId, asset: AssetId, amount: u128) -> Result<()> {
        let entry = self
            .balances
            .entry(account.clone())
            .or_default()
            .entry(asset)
            .or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(VaultError::Overflow("ledger mint"))?;
        Ok(())
    }

    /// Credits a whole basket via [`mint`](Self::mint).
    pub fn mint_basket(&mut self, account: &AccountId, basket: &Basket) -> Result<()> {
        for asset in AssetId::ALL {
            self.mint(account, asset, basket.get(asset))?;
        }
        Ok(())
    }
}

impl AssetLedger for InMemoryLedger {
    fn balance_of(&self, account: &AccountId, asset: AssetId) -> u128 {
        self.balances
            .get(account)
            .and_then(|assets| assets.get(&asset))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(
        &mut self,
        asset: AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<()> {
        let available = self.balance_of(from, asset);
        if available < amount {
            return Err(VaultError::InsufficientFunds {
                asset,
                account: from.to_string(),
                available,
                requested: amount,
            });
        }
        if from == to || amount == 0 {
            return Ok(());
        }

        let credited = self
            .balance_of(to, asset)
            .checked_add(amount)
            .ok_or(VaultError::Overflow("ledger transfer"))?;

        self.balances
            .entry(from.clone())
            .or_default()
            .insert(asset, available - amount);
        self.balances.entry(to.clone()).or_default().insert(asset, credited);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_moves_balance() {
        let alice = AccountId::from("alice");
        let bob = AccountId::from("bob");
        let mut ledger = InMemoryLedger::new();
        ledger.mint(&alice, AssetId::Stable, 100).unwrap();

        ledger.transfer(AssetId::Stable, &alice, &bob, 40).unwrap();
        assert_eq!(ledger.balance_of(&alice, AssetId::Stable), 60);
        assert_eq!(ledger.balance_of(&bob, AssetId::Stable), 40);
    }

    #[test]
    fn overdraft_is_rejected_without_mutation() {
        let alice = AccountId::from("alice");
        let bob = AccountId::from("bob");
        let mut ledger = InMemoryLedger::new();
        ledger.mint(&alice, AssetId::Base, 10).unwrap();
        let before = ledger.clone();

        let err = ledger.transfer(AssetId::Base, &alice, &bob, 11).unwrap_err();
        assert!(matches!(err, VaultError::InsufficientFunds { available: 10, requested: 11, .. }));
        assert_eq!(ledger, before);
    }

    #[test]
    fn basket_transfer_skips_empty_legs() {
        let alice = AccountId::from("alice");
        let bob = AccountId::from("bob");
        let mut ledger = InMemoryLedger::new();
        ledger.mint(&alice, AssetId::Vol, 5).unwrap();

        ledger
            .transfer_basket(&Basket::from_raw(0, 0, 5), &alice, &bob)
            .unwrap();
        assert_eq!(ledger.basket_of(&bob), Basket::from_raw(0, 0, 5));
    }
}

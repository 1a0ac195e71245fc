//! # Vault Holdings
//!
//! The vault's books: what it holds of each asset, how many shares are
//! outstanding, and who owns them. Only the share-accounting paths
//! (deposit, withdraw) and the rebalance executor write here, and only
//! through the checked helpers below, so no leg can ever go negative.
//!
//! The central invariant is "no phantom shares":
//!
//! ```text
//! total_shares == 0  <=>  base == 0 && stable == 0 && vol == 0
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};
use crate::ledger::AccountId;
use crate::math::{Amount, Base, Basket};

/// Balances, share supply, and share ownership of the vault.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultHoldings {
    /// What the position plus idle reserve currently holds.
    pub balances: Basket,
    /// Outstanding shares.
    pub total_shares: u128,
    /// Base-denominated value of deposits still in the vault, checked
    /// against the deposit cap.
    pub total_base_deposited: Amount<Base>,
    /// Per-account share balances; sums to `total_shares`.
    share_balances: BTreeMap<AccountId, u128>,
}

impl VaultHoldings {
    /// Empty books.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shares owned by `account`.
    pub fn shares_of(&self, account: &AccountId) -> u128 {
        self.share_balances.get(account).copied().unwrap_or(0)
    }

    /// Every account holding shares.
    pub fn shareholders(&self) -> impl Iterator<Item = (&AccountId, u128)> {
        self.share_balances.iter().map(|(k, v)| (k, *v))
    }

    /// Adds `basket` to the balances.
    pub fn credit(&mut self, basket: &Basket) -> Result<()> {
        self.balances = self
            .balances
            .checked_add(basket)
            .ok_or(VaultError::Overflow("holdings credit"))?;
        Ok(())
    }

    /// Removes `basket` from the balances.
    ///
    /// # Errors
    ///
    /// [`VaultError::InconsistentState`] if any leg would go negative.
    pub fn debit(&mut self, basket: &Basket) -> Result<()> {
        self.balances = self.balances.checked_sub(basket).ok_or_else(|| {
            VaultError::InconsistentState(format!(
                "debit {:?} exceeds holdings {:?}",
                basket, self.balances
            ))
        })?;
        Ok(())
    }

    /// Mints `shares` to `account`.
    pub fn mint_shares(&mut self, account: &AccountId, shares: u128) -> Result<()> {
        self.total_shares = self
            .total_shares
            .checked_add(shares)
            .ok_or(VaultError::Overflow("share supply"))?;
        let balance = self.share_balances.entry(account.clone()).or_insert(0);
        *balance = balance
            .checked_add(shares)
            .ok_or(VaultError::Overflow("share balance"))?;
        Ok(())
    }

    /// Burns `shares` from `account`.
    pub fn burn_shares(&mut self, account: &AccountId, shares: u128) -> Result<()> {
        let owned = self.shares_of(account);
        if owned < shares {
            return Err(VaultError::InsufficientShares {
                owned,
                requested: shares,
            });
        }
        let remaining = owned - shares;
        if remaining == 0 {
            self.share_balances.remove(account);
        } else {
            self.share_balances.insert(account.clone(), remaining);
        }
        self.total_shares = self
            .total_shares
            .checked_sub(shares)
            .ok_or_else(|| VaultError::InconsistentState("share supply underflow".into()))?;
        Ok(())
    }

    /// Verifies the books are self-consistent.
    pub fn check_invariants(&self) -> Result<()> {
        if (self.total_shares == 0) != self.balances.is_empty() {
            return Err(VaultError::InconsistentState(format!(
                "{} shares outstanding against holdings {:?}",
                self.total_shares, self.balances
            )));
        }
        let owned: u128 = self.share_balances.values().sum();
        if owned != self.total_shares {
            return Err(VaultError::InconsistentState(format!(
                "share balances sum to {owned}, supply is {}",
                self.total_shares
            )));
        }
        Ok(())
    }
}

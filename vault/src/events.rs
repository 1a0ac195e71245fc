//! Typed records of committed units of work.
//!
//! A unit of work collects its events while it runs; they reach the vault's
//! log only if the unit commits. Callers drain the log with
//! [`crate::vault::Vault::drain_events`].

use serde::{Deserialize, Serialize};

use crate::auction::AuctionAnchor;
use crate::executor::ExecutedAmounts;
use crate::ledger::AccountId;
use crate::math::{Amount, Base, Basket};

/// Something the vault did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VaultEvent {
    /// Assets came in and shares were minted.
    Deposited {
        /// Account the assets came from.
        depositor: AccountId,
        /// Account credited with the shares.
        recipient: AccountId,
        /// Shares minted.
        shares: u128,
        /// Assets taken in.
        amounts: Basket,
        /// Cumulative deposits after this one.
        total_base_deposited: Amount<Base>,
    },
    /// Shares were burnt and assets paid out.
    Withdrawn {
        /// Account whose shares were burnt.
        owner: AccountId,
        /// Account paid.
        recipient: AccountId,
        /// Shares burnt.
        shares: u128,
        /// Assets paid out.
        amounts: Basket,
    },
    /// A rebalance auction started.
    AuctionArmed {
        /// Its anchor.
        anchor: AuctionAnchor,
    },
    /// A rebalance settled.
    Rebalanced {
        /// The counterparty.
        keeper: AccountId,
        /// What moved, at which prices.
        executed: ExecutedAmounts,
    },
    /// A flash rebalance settled and its proceeds were swept.
    FlashRebalanced {
        /// The rebalancer account.
        rebalancer: AccountId,
        /// Strategy discriminant.
        mode: u8,
        /// Proceeds, valued in base.
        profit: Amount<Base>,
    },
    /// Governance changed a parameter.
    ParameterChanged {
        /// Setter name, e.g. `set_pause`.
        parameter: String,
        /// The new value, rendered.
        value: String,
    },
}

//! # Engine Errors
//!
//! One error enum for the whole engine. Every rejected unit of work maps to
//! exactly one of these kinds, and a rejected unit never leaves partial
//! mutations behind (see [`crate::vault::Vault`]).
//!
//! Callers decide whether to resubmit by looking at the kind:
//! [`VaultError::is_retryable`] is `true` for conditions that can clear on
//! their own (slippage, an idle gate, a thin flash spread) and `false` for
//! faults that will fail the same way every time.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::AssetId;

/// Why the rebalance path refused to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ineligibility {
    /// Governance has paused the vault.
    Paused,
    /// Neither the time threshold nor the price deviation threshold has been
    /// crossed since the last rebalance.
    GateIdle,
}

impl std::fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ineligibility::Paused => write!(f, "vault is paused"),
            Ineligibility::GateIdle => write!(f, "rebalance gate is idle"),
        }
    }
}

/// The output a minimum bound was placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputLeg {
    /// An asset leg of a withdrawal, rebalance or swap.
    Asset(AssetId),
    /// Shares minted by a deposit.
    Shares,
}

impl std::fmt::Display for OutputLeg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputLeg::Asset(asset) => write!(f, "{asset}"),
            OutputLeg::Shares => write!(f, "shares"),
        }
    }
}

impl From<AssetId> for OutputLeg {
    fn from(asset: AssetId) -> Self {
        OutputLeg::Asset(asset)
    }
}

/// Errors produced by the vault engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    /// The gate is not armed, or the vault is paused.
    #[error("not eligible: {reason}")]
    NotEligible {
        /// Which precondition failed.
        reason: Ineligibility,
    },

    /// A realized amount fell below the caller's minimum.
    #[error("slippage exceeded on {leg}: minimum {minimum}, realized {realized}")]
    SlippageExceeded {
        /// The output that breached its bound.
        leg: OutputLeg,
        /// The caller-supplied minimum.
        minimum: u128,
        /// What the unit of work would actually have delivered.
        realized: u128,
    },

    /// A flash rebalance could not cover principal, fee, and minimum profit.
    #[error("repayment shortfall on {asset}: owed {owed}, available {available}")]
    RepaymentShortfall {
        /// The asset that could not be repaid (or the base asset when the
        /// shortfall is on the profit margin).
        asset: AssetId,
        /// Principal plus fee (or the minimum profit).
        owed: u128,
        /// What the rebalancer actually held.
        available: u128,
    },

    /// A configuration change would violate an invariant.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The vault's books are internally inconsistent (e.g. outstanding
    /// shares against empty holdings).
    #[error("inconsistent state: {0}")]
    InconsistentState(String),

    /// The caller is not the governance account.
    #[error("unauthorized: {caller} is not the governance account")]
    Unauthorized {
        /// The rejected caller.
        caller: String,
    },

    /// The deposit would push cumulative deposits past the cap.
    #[error("deposit cap exceeded: cap {cap}, would reach {attempted}")]
    DepositCapExceeded {
        /// `cap_total_deposits`.
        cap: u128,
        /// Total deposits had the deposit been accepted.
        attempted: u128,
    },

    /// The account does not own enough shares.
    #[error("insufficient shares: owned {owned}, requested {requested}")]
    InsufficientShares {
        /// Shares held by the account.
        owned: u128,
        /// Shares the caller tried to burn.
        requested: u128,
    },

    /// A transfer would leave an account with a negative balance.
    #[error("insufficient {asset} funds in {account}: available {available}, requested {requested}")]
    InsufficientFunds {
        /// The asset being moved.
        asset: AssetId,
        /// The account being debited.
        account: String,
        /// Its balance.
        available: u128,
        /// The requested debit.
        requested: u128,
    },

    /// The operation would be a no-op.
    #[error("zero-amount operations are not permitted")]
    ZeroAmount,

    /// Checked arithmetic overflowed.
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    /// The flash rebalancer was given an unknown strategy discriminant.
    #[error("unknown rebalance mode {0}")]
    UnknownMode(u8),

    /// The price input could not produce a usable snapshot.
    #[error("price unavailable: {0}")]
    PriceUnavailable(String),
}

impl VaultError {
    /// Shorthand for the paused flavour of [`VaultError::NotEligible`].
    pub fn paused() -> Self {
        VaultError::NotEligible {
            reason: Ineligibility::Paused,
        }
    }

    /// Shorthand for the idle-gate flavour of [`VaultError::NotEligible`].
    pub fn gate_idle() -> Self {
        VaultError::NotEligible {
            reason: Ineligibility::GateIdle,
        }
    }

    /// Whether resubmitting the same call later can succeed.
    ///
    /// Slippage can be retried with looser bounds, an idle gate arms with
    /// time, and a flash spread widens as the auction decays. Configuration
    /// and state faults will fail identically on every retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VaultError::SlippageExceeded { .. }
                | VaultError::NotEligible { .. }
                | VaultError::RepaymentShortfall { .. }
                | VaultError::PriceUnavailable(_)
        )
    }
}

/// Engine-wide result alias.
pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds() {
        assert!(VaultError::paused().is_retryable());
        assert!(VaultError::SlippageExceeded {
            leg: AssetId::Base.into(),
            minimum: 2,
            realized: 1,
        }
        .is_retryable());
        assert!(!VaultError::InvalidConfiguration("x".into()).is_retryable());
        assert!(!VaultError::InconsistentState("x".into()).is_retryable());
    }

    #[test]
    fn slippage_names_the_leg() {
        let err = VaultError::SlippageExceeded {
            leg: OutputLeg::Shares,
            minimum: 10,
            realized: 9,
        };
        assert_eq!(err.to_string(), "slippage exceeded on shares: minimum 10, realized 9");
    }

    #[test]
    fn not_eligible_reason_is_rendered() {
        let msg = VaultError::gate_idle().to_string();
        assert!(msg.contains("idle"), "got: {msg}");
    }
}

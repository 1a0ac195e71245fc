use hedge_vault::{VaultError, Wad};
use thiserror::Error;

/// Errors produced by the periphery helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeripheryError {
    /// The vault (or the ledger and venue it drives) refused the unit.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// Slippage must lie in `(0, 1]`.
    #[error("slippage factor {0} is outside (0, 1]")]
    InvalidSlippage(Wad),

    /// Only the helper's governance account may sweep remains.
    #[error("unauthorized: {caller} is not the helper's governance account")]
    Unauthorized {
        /// The rejected caller.
        caller: String,
    },
}

impl PeripheryError {
    /// Whether resubmitting the same call later can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PeripheryError::Vault(err) => err.is_retryable(),
            PeripheryError::InvalidSlippage(_) | PeripheryError::Unauthorized { .. } => false,
        }
    }
}

/// Periphery-wide result alias.
pub type Result<T> = std::result::Result<T, PeripheryError>;

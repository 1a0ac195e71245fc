// Copyright (c) 2026 Hedge Vault Contributors. MIT License.
// See LICENSE for details.

//! # Hedge Vault — Periphery
//!
//! Helpers that sit outside the vault and call into it through its public
//! unit-of-work API. None of them can reach vault state the core would not
//! let any other caller reach.
//!
//! - **flash_deposit** — One-click deposit: base asset in, vault shares out.

pub mod error;
pub mod flash_deposit;

pub use error::{PeripheryError, Result};
pub use flash_deposit::{FlashDeposit, FlashDepositOutcome, FlashDepositRequest};

// Copyright (c) 2026 Hedge Vault Contributors. MIT License.
// See LICENSE for details.

//! # Hedge Vault — Core Library
//!
//! A pooled fund holding three assets (a base asset, a stable asset and a
//! volatility derivative) that periodically rebalances back to target
//! weights. Rebalances are not executed at a single oracle price: they are
//! offered to keepers through a time-decaying Dutch auction, so whoever acts
//! first accepts a worse price and no single instant can be manipulated.
//!
//! ## Architecture
//!
//! - **config** — Protocol constants and the validated risk parameters.
//! - **math** — 18-decimal fixed point and asset-tagged amounts.
//! - **shares** — Deposit/withdraw share math. Pure functions.
//! - **auction** — The Dutch-auction price curve. Pure functions.
//! - **gate** — The rebalance eligibility state machine.
//! - **executor** — Sizes a rebalance and settles it against a keeper.
//! - **flash** — Runs a rebalance on borrowed capital, all or nothing.
//! - **price / ledger / venue** — Seams to the outside world, each with an
//!   in-memory implementation.
//! - **vault** — The composition root and its units of work.
//!
//! ## Ground Rules
//!
//! 1. Every mutation is a unit of work: it commits whole or not at all.
//! 2. Amounts carry their asset in their type; conversions go through a
//!    price snapshot and state their rounding.
//! 3. Rounding always favours the vault's existing holders.
//! 4. No balance, anywhere, ever goes negative.

pub mod auction;
pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod flash;
pub mod gate;
pub mod holdings;
pub mod ledger;
pub mod math;
pub mod price;
pub mod shares;
pub mod vault;
pub mod venue;

pub use auction::{AuctionAnchor, AuctionPrices, AuctionPricer};
pub use config::VaultConfiguration;
pub use error::{Ineligibility, OutputLeg, Result, VaultError};
pub use events::VaultEvent;
pub use executor::{ExecutedAmounts, RebalanceExecutor, RebalanceRequest, RebalanceTrade};
pub use flash::{FlashLender, FlashOutcome, FlashRebalancer, PoolLender, RebalanceMode};
pub use gate::{GateState, RebalanceCheckpoint, RebalanceGate, Trigger};
pub use holdings::VaultHoldings;
pub use ledger::{AccountId, AssetLedger, InMemoryLedger};
pub use math::{Amount, AssetId, Base, Basket, PriceSnapshot, Rounding, Stable, Vol, Wad, WAD};
pub use price::{PriceInput, StaticPrices};
pub use shares::SharesOutcome;
pub use vault::{DepositRequest, UnitOfWork, Vault, VaultSnapshot, WithdrawRequest};
pub use venue::{OracleVenue, SwapVenue};

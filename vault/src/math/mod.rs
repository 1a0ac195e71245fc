//! # Fixed-Point Math
//!
//! ```text
//! fixed.rs   — 18-decimal Wad, 256-bit mul_div, explicit rounding
//! amount.rs  — asset-tagged amounts, price snapshot, three-asset baskets
//! ```

pub mod amount;
pub mod fixed;

pub use amount::{Amount, Asset, AssetId, Base, Basket, PriceSnapshot, Stable, Vol};
pub use fixed::{mul_div, round_to_grid, Rounding, Wad, WAD};

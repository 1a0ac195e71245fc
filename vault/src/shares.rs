//! # Share Accounting
//!
//! Pure functions that turn asset flows into share-supply changes and back.
//! Nothing here touches state; the [`crate::vault::Vault`] applies the
//! results inside a unit of work.
//!
//! ## Ratio preservation
//!
//! Once shares exist, a depositor must contribute the same relative mix the
//! vault already holds. Given offered amounts `in_i` and holdings `h_i`,
//! the deposit is sized by the scarcest leg:
//!
//! ```text
//! shares = min_i floor(supply * in_i / h_i)          (legs with h_i > 0)
//! used_i = ceil(h_i * shares / supply)               (<= in_i)
//! ```
//!
//! Whatever is offered beyond `used_i` is refused, never absorbed at a
//! different ratio. Shares round down and pulled amounts round up, so
//! rounding always favours the holders already in the vault. Withdrawals
//! mirror this: amounts paid out round down.
//!
//! Amounts are unsigned throughout, so negative inputs are unrepresentable.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};
use crate::math::{mul_div, Amount, AssetId, Base, Basket, PriceSnapshot, Rounding};

/// Result of a share computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharesOutcome {
    /// Shares to mint (deposit) or burn (withdrawal).
    pub shares: u128,
    /// Amounts actually taken in (deposit) or paid out (withdrawal).
    pub amounts: Basket,
}

/// Converts an asset flow into a share delta.
///
/// * Deposit into an empty vault: shares are minted 1:1 with the base
///   amount and every offered amount is accepted as-is.
/// * Deposit otherwise: sized by the scarcest leg relative to `holdings`.
/// * Withdrawal (`is_deposit == false`): `amounts_in` are the desired
///   outputs; returns the shares that must be burnt to cover them and the
///   pro-rata amounts those shares redeem, never more than `holdings`.
///
/// # Errors
///
/// [`VaultError::InconsistentState`] when outstanding shares face empty
/// holdings (or an empty supply faces non-empty holdings), since the
/// ratio is undefined.
pub fn calc_shares_and_amounts(
    total_supply: u128,
    amounts_in: &Basket,
    holdings: &Basket,
    is_deposit: bool,
) -> Result<SharesOutcome> {
    if total_supply == 0 {
        if !holdings.is_empty() {
            return Err(VaultError::InconsistentState(format!(
                "no shares outstanding against holdings {holdings:?}"
            )));
        }
        if !is_deposit {
            return Ok(SharesOutcome::default());
        }
        return Ok(SharesOutcome {
            shares: amounts_in.base.raw(),
            amounts: *amounts_in,
        });
    }

    if holdings.is_empty() {
        return Err(VaultError::InconsistentState(format!(
            "{total_supply} shares outstanding against empty holdings"
        )));
    }

    if is_deposit {
        deposit_shares(total_supply, amounts_in, holdings)
    } else {
        withdrawal_shares(total_supply, amounts_in, holdings)
    }
}

fn deposit_shares(total_supply: u128, offered: &Basket, holdings: &Basket) -> Result<SharesOutcome> {
    let mut shares: Option<u128> = None;
    for asset in AssetId::ALL {
        let held = holdings.get(asset);
        if held == 0 {
            continue;
        }
        let candidate = mul_div(total_supply, offered.get(asset), held, Rounding::Down)?;
        shares = Some(shares.map_or(candidate, |s| s.min(candidate)));
    }
    // holdings is non-empty, so at least one leg set `shares`.
    let shares = shares.unwrap_or(0);
    let amounts = holdings.scale(shares, total_supply, Rounding::Up)?;
    Ok(SharesOutcome { shares, amounts })
}

fn withdrawal_shares(total_supply: u128, wanted: &Basket, holdings: &Basket) -> Result<SharesOutcome> {
    let mut shares = 0u128;
    for asset in AssetId::ALL {
        let held = holdings.get(asset);
        if held == 0 {
            continue;
        }
        let needed = mul_div(total_supply, wanted.get(asset).min(held), held, Rounding::Up)?;
        shares = shares.max(needed);
    }
    let shares = shares.min(total_supply);
    let amounts = calc_withdraw_amounts(total_supply, shares, holdings)?;
    Ok(SharesOutcome { shares, amounts })
}

/// Pro-rata amounts redeemed by burning `shares`.
///
/// Burning the whole supply pays out the whole of `holdings`, so the last
/// holder out leaves nothing behind.
pub fn calc_withdraw_amounts(total_supply: u128, shares: u128, holdings: &Basket) -> Result<Basket> {
    if shares > total_supply {
        return Err(VaultError::InsufficientShares {
            owned: total_supply,
            requested: shares,
        });
    }
    if total_supply == 0 {
        return Ok(Basket::EMPTY);
    }
    if shares == total_supply {
        return Ok(*holdings);
    }
    holdings.scale(shares, total_supply, Rounding::Down)
}

/// The basket worth `value` base units in the vault's current mix.
///
/// This is what a single-asset deposit helper has to assemble before it
/// calls the deposit path. An empty vault takes base only.
pub fn basket_for_value(value: Amount<Base>, holdings: &Basket, prices: &PriceSnapshot) -> Result<Basket> {
    if holdings.is_empty() {
        return Ok(Basket {
            base: value,
            ..Basket::EMPTY
        });
    }
    let total = holdings.value_in_base(prices, Rounding::Down)?;
    if total.is_zero() {
        return Err(VaultError::InconsistentState(
            "holdings are worth nothing at current prices".into(),
        ));
    }
    holdings.scale(value.raw(), total.raw(), Rounding::Up)
}

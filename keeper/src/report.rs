//! Read-only reports the keeper prints as JSON.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use hedge_vault::{
    AuctionPrices, Basket, GateState, RebalanceCheckpoint, RebalanceTrade, Trigger, Vault,
    VaultError,
};

/// Gate state and, when one is due, the auction prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateReport {
    /// Evaluation time, unix seconds.
    pub now: u64,
    /// `now` as a timestamp, for humans.
    pub evaluated_at: Option<DateTime<Utc>>,
    /// Whether governance has paused the vault.
    pub paused: bool,
    /// Idle or armed.
    pub state: GateState,
    /// The last rebalance.
    pub checkpoint: RebalanceCheckpoint,
    /// The threshold crossed, if any.
    pub trigger: Option<Trigger>,
    /// Whether `time_rebalance` would be accepted at `now`.
    pub eligible: bool,
    /// Prices the auction clears at, when it is running or due.
    pub auction: Option<AuctionPrices>,
    /// Current books.
    pub holdings: Basket,
    /// Outstanding shares.
    pub total_shares: u128,
}

/// The trade a rebalance would perform, or why there is none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteReport {
    /// Evaluation time, unix seconds.
    pub now: u64,
    /// The sized trade.
    pub trade: Option<RebalanceTrade>,
    /// Why no trade is possible.
    pub refused: Option<String>,
}

/// Evaluates the gate at `now`.
pub fn gate_report(vault: &Vault, now: u64) -> Result<GateReport> {
    let prices = vault.prices()?;
    let config = vault.config();
    let trigger = vault.gate().trigger(config, prices.base_stable, now)?;
    let eligible = vault.is_time_rebalance(now)?;
    let auction = match vault.get_auction_params(now) {
        Ok(params) => Some(params),
        Err(VaultError::NotEligible { .. }) => None,
        Err(err) => return Err(err.into()),
    };

    Ok(GateReport {
        now,
        evaluated_at: i64::try_from(now)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        paused: config.paused,
        state: vault.gate().state(),
        checkpoint: vault.gate().checkpoint(),
        trigger,
        eligible,
        auction,
        holdings: vault.holdings().balances,
        total_shares: vault.holdings().total_shares,
    })
}

/// Quotes the rebalance at `now`.
pub fn quote_report(vault: &Vault, now: u64) -> Result<QuoteReport> {
    match vault.quote_rebalance(now) {
        Ok(trade) => Ok(QuoteReport {
            now,
            trade: Some(trade),
            refused: None,
        }),
        Err(err @ VaultError::NotEligible { .. }) => Ok(QuoteReport {
            now,
            trade: None,
            refused: Some(err.to_string()),
        }),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hedge_vault::{
        AccountId, Amount, Basket, DepositRequest, InMemoryLedger, PriceSnapshot, StaticPrices,
        VaultConfiguration, Wad, WAD,
    };

    const GENESIS: u64 = 1_700_000_000;

    fn vault() -> Vault {
        let prices = PriceSnapshot::new(
            Wad::from_raw(200_000_000_000_000_000),
            Wad::from_raw(2_000 * WAD),
        )
        .unwrap();
        let mut vault = Vault::new(
            AccountId::from("vault"),
            VaultConfiguration::mainnet(AccountId::from("governance")),
            InMemoryLedger::new(),
            StaticPrices::from(prices),
            GENESIS,
        )
        .unwrap();
        vault
            .ledger_setup(|ledger| {
                ledger.mint_basket(&AccountId::from("alice"), &Basket::from_raw(10 * WAD, 0, 0))
            })
            .unwrap();
        vault
            .deposit(&DepositRequest::new(AccountId::from("alice"), Amount::new(10 * WAD)))
            .unwrap();
        vault
    }

    #[test]
    fn idle_gate_reports_no_auction() {
        let vault = vault();
        let report = gate_report(&vault, GENESIS + 60).unwrap();
        assert!(!report.eligible);
        assert_eq!(report.trigger, None);
        assert_eq!(report.auction, None);
        assert_eq!(report.state, GateState::Idle);
        assert_eq!(report.total_shares, 10 * WAD);

        let quote = quote_report(&vault, GENESIS + 60).unwrap();
        assert!(quote.trade.is_none());
        assert!(quote.refused.is_some());
    }

    #[test]
    fn due_gate_reports_the_settled_floor() {
        let vault = vault();
        let config = vault.config();
        let now = GENESIS + config.rebalance_time_threshold + config.auction_duration;

        let report = gate_report(&vault, now).unwrap();
        assert!(report.eligible);
        assert_eq!(report.trigger, Some(Trigger::Time));
        assert_eq!(report.auction.unwrap().multiplier, config.min_price_multiplier);

        let quote = quote_report(&vault, now).unwrap();
        let trade = quote.trade.unwrap();
        assert_eq!(trade.vault_pays, Basket::from_raw(5 * WAD, 0, 0));
        assert!(!trade.vault_receives.is_empty());
    }

    #[test]
    fn reports_serialize() {
        let report = gate_report(&vault(), GENESIS).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["eligible"], false);
        assert!(json["evaluated_at"].is_string());
    }
}

//! # Snapshot Files
//!
//! What the keeper reads: a vault's persisted state plus the oracle prices
//! it was observed at, as one JSON document.
//!
//! The keeper never sees the real asset ledger. It rebuilds a private one
//! holding exactly the vault's books, which is all the read-only paths
//! (gate checks, auction prices, trade quotes) consult.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hedge_vault::{InMemoryLedger, PriceSnapshot, StaticPrices, Vault, VaultSnapshot};

/// On-disk keeper input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeeperSnapshot {
    /// When the prices were read.
    pub observed_at: DateTime<Utc>,
    /// Oracle prices at `observed_at`.
    pub prices: PriceSnapshot,
    /// The vault's persisted state.
    pub vault: VaultSnapshot,
}

impl KeeperSnapshot {
    /// Reads and parses a snapshot file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        let snapshot: Self = serde_json::from_str(&raw)
            .with_context(|| format!("malformed snapshot {}", path.display()))?;
        snapshot
            .prices
            .validate()
            .with_context(|| format!("unusable prices in {}", path.display()))?;
        Ok(snapshot)
    }

    /// Writes the snapshot as pretty JSON, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to encode snapshot")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write snapshot {}", path.display()))
    }

    /// Rebuilds a vault over a ledger that holds exactly its books.
    pub fn open(&self) -> Result<Vault> {
        let mut ledger = InMemoryLedger::new();
        ledger
            .mint_basket(&self.vault.account, &self.vault.holdings.balances)
            .context("failed to seed the vault account")?;
        Vault::restore(self.vault.clone(), ledger, StaticPrices::from(self.prices))
            .context("snapshot does not describe a consistent vault")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hedge_vault::{
        AccountId, Amount, AssetLedger, Basket, DepositRequest, VaultConfiguration, Wad, WAD,
    };

    const GENESIS: u64 = 1_700_000_000;

    fn prices() -> PriceSnapshot {
        PriceSnapshot::new(
            Wad::from_raw(200_000_000_000_000_000),
            Wad::from_raw(2_000 * WAD),
        )
        .unwrap()
    }

    fn funded_vault() -> Vault {
        let mut vault = Vault::new(
            AccountId::from("vault"),
            VaultConfiguration::mainnet(AccountId::from("governance")),
            InMemoryLedger::new(),
            StaticPrices::from(prices()),
            GENESIS,
        )
        .unwrap();
        vault
            .ledger_setup(|ledger| {
                ledger.mint_basket(&AccountId::from("alice"), &Basket::from_raw(4 * WAD, 0, 0))
            })
            .unwrap();
        vault
            .deposit(&DepositRequest::new(AccountId::from("alice"), Amount::new(4 * WAD)))
            .unwrap();
        vault
    }

    #[test]
    fn save_load_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.json");
        let vault = funded_vault();
        let snapshot = KeeperSnapshot {
            observed_at: Utc::now(),
            prices: prices(),
            vault: vault.snapshot(),
        };

        snapshot.save(&path).unwrap();
        let loaded = KeeperSnapshot::load(&path).unwrap();
        assert_eq!(loaded, snapshot);

        let reopened = loaded.open().unwrap();
        assert_eq!(reopened.snapshot(), vault.snapshot());
        assert_eq!(
            reopened.ledger().basket_of(reopened.account()),
            Basket::from_raw(4 * WAD, 0, 0)
        );
    }

    #[test]
    fn missing_and_malformed_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        let err = KeeperSnapshot::load(&missing).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read snapshot"));

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "{ not json").unwrap();
        let err = KeeperSnapshot::load(&garbage).unwrap_err();
        assert!(format!("{err:#}").contains("malformed snapshot"));
    }

    #[test]
    fn books_that_do_not_add_up_are_refused() {
        let mut state = funded_vault().snapshot();
        // Shares outstanding against empty holdings.
        state.holdings.balances = Basket::EMPTY;
        let snapshot = KeeperSnapshot {
            observed_at: Utc::now(),
            prices: prices(),
            vault: state,
        };
        assert!(snapshot.open().is_err());
    }
}

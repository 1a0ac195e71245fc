//! # CLI Interface
//!
//! Command-line structure for `hedge-keeper`, via `clap` derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use hedge_vault::{Wad, WAD};

use crate::logging::LogFormat;

/// Keeper for the hedge vault rebalance auction.
///
/// Reads a vault snapshot (the persisted books plus the oracle prices they
/// were observed at), reports whether a rebalance is due and what it would
/// trade, and can poll a snapshot file until one is.
#[derive(Parser, Debug)]
#[command(
    name = "hedge-keeper",
    about = "Keeper for the hedge vault rebalance auction",
    version,
    propagate_version = true
)]
pub struct KeeperCli {
    /// Log output format.
    #[arg(long, global = true, env = "HEDGE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, global = true, env = "HEDGE_LOG_LEVEL", default_value = "hedge_keeper=info,hedge_vault=info")]
    pub log_level: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a genesis snapshot for a fresh vault.
    Init(InitArgs),
    /// Report gate state and auction prices.
    Check(CheckArgs),
    /// Preview the trade a rebalance would perform.
    Quote(CheckArgs),
    /// Print a preset configuration as JSON.
    Params(ParamsArgs),
    /// Poll a snapshot file until a rebalance is due.
    Watch(WatchArgs),
    /// Print version information and exit.
    Version,
}

/// Deployment preset.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    /// Production parameters.
    Mainnet,
    /// Short thresholds, no practical cap.
    Testnet,
}

/// Arguments for `init`.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Where to write the snapshot.
    #[arg(long, short = 's', env = "HEDGE_SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Preset to start from.
    #[arg(long, value_enum, default_value_t = Network::Testnet)]
    pub network: Network,

    /// Governance account name.
    #[arg(long, env = "HEDGE_GOVERNANCE", default_value = "governance")]
    pub governance: String,

    /// Ledger account of the vault.
    #[arg(long, default_value = "vault")]
    pub account: String,

    /// Price of the volatility asset in base, e.g. `0.2`.
    #[arg(long, value_parser = parse_wad)]
    pub vol_base: Wad,

    /// Price of the base asset in stable, e.g. `2000`.
    #[arg(long, value_parser = parse_wad)]
    pub base_stable: Wad,

    /// Genesis time in unix seconds. Defaults to now.
    #[arg(long)]
    pub now: Option<u64>,
}

/// Arguments for `check` and `quote`.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Snapshot file to read.
    #[arg(long, short = 's', env = "HEDGE_SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Evaluation time in unix seconds. Defaults to now.
    #[arg(long)]
    pub now: Option<u64>,
}

/// Arguments for `params`.
#[derive(Parser, Debug)]
pub struct ParamsArgs {
    /// Preset to print.
    #[arg(long, value_enum, default_value_t = Network::Mainnet)]
    pub network: Network,

    /// Governance account name.
    #[arg(long, env = "HEDGE_GOVERNANCE", default_value = "governance")]
    pub governance: String,
}

/// Arguments for `watch`.
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Snapshot file to re-read on every tick.
    #[arg(long, short = 's', env = "HEDGE_SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Seconds between polls.
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Exit after the first poll that finds a rebalance due.
    #[arg(long)]
    pub once: bool,
}

/// Parses a non-negative decimal with up to 18 fractional digits.
pub fn parse_wad(input: &str) -> Result<Wad, String> {
    let input = input.trim();
    let (whole, frac) = input.split_once('.').unwrap_or((input, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err("empty number".into());
    }
    if frac.len() > 18 {
        return Err(format!("{input}: more than 18 decimal places"));
    }
    let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !digits(whole) || !digits(frac) {
        return Err(format!("{input}: not a decimal number"));
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|e| format!("{input}: {e}"))?
    };
    let frac: u128 = if frac.is_empty() {
        0
    } else {
        let scale = 10u128.pow(18 - frac.len() as u32);
        frac.parse::<u128>().map_err(|e| format!("{input}: {e}"))? * scale
    };
    whole
        .checked_mul(WAD)
        .and_then(|w| w.checked_add(frac))
        .map(Wad::from_raw)
        .ok_or_else(|| format!("{input}: out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        KeeperCli::command().debug_assert();
    }

    #[test]
    fn parses_decimal_prices() {
        assert_eq!(parse_wad("2000").unwrap(), Wad::from_raw(2_000 * WAD));
        assert_eq!(parse_wad("0.2").unwrap(), Wad::from_raw(200_000_000_000_000_000));
        assert_eq!(parse_wad(".5").unwrap(), Wad::from_raw(WAD / 2));
        assert_eq!(parse_wad("1.000000000000000001").unwrap(), Wad::from_raw(WAD + 1));
        assert!(parse_wad("1.0000000000000000001").is_err());
        assert!(parse_wad("-1").is_err());
        assert!(parse_wad("abc").is_err());
        assert!(parse_wad(".").is_err());
    }

    #[test]
    fn watch_rejects_a_zero_interval() {
        let parsed = KeeperCli::try_parse_from([
            "hedge-keeper",
            "watch",
            "--snapshot",
            "vault.json",
            "--interval",
            "0",
        ]);
        assert!(parsed.is_err());
    }
}

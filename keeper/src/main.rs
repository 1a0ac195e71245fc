// Copyright (c) 2026 Hedge Vault Contributors. MIT License.
// See LICENSE for details.

//! # Hedge Vault Keeper
//!
//! Entry point for the `hedge-keeper` binary. Parses CLI arguments,
//! initializes logging and dispatches:
//!
//! - `init`    — write a genesis snapshot
//! - `check`   — gate state and auction prices
//! - `quote`   — the trade a rebalance would perform
//! - `params`  — a preset configuration as JSON
//! - `watch`   — poll a snapshot file until a rebalance is due
//! - `version` — print build version information
//!
//! Reports go to stdout as JSON; logs go to stderr.

mod cli;
mod logging;
mod report;
mod snapshot;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use tokio::signal;

use hedge_vault::{AccountId, InMemoryLedger, PriceSnapshot, StaticPrices, Vault, VaultConfiguration};

use cli::{CheckArgs, Commands, InitArgs, KeeperCli, Network, ParamsArgs, WatchArgs};
use snapshot::KeeperSnapshot;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = KeeperCli::parse();
    logging::init_logging(&cli.log_level, cli.log_format);

    match cli.command {
        Commands::Init(args) => init_snapshot(args),
        Commands::Check(args) => check(args),
        Commands::Quote(args) => quote(args),
        Commands::Params(args) => params(args),
        Commands::Watch(args) => watch(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn preset(network: Network, governance: &str) -> VaultConfiguration {
    let governance = AccountId::new(governance);
    match network {
        Network::Mainnet => VaultConfiguration::mainnet(governance),
        Network::Testnet => VaultConfiguration::testnet(governance),
    }
}

fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to encode report")?;
    println!("{json}");
    Ok(())
}

/// Writes the snapshot of a vault with no deposits.
fn init_snapshot(args: InitArgs) -> Result<()> {
    let now = args.now.unwrap_or_else(unix_now);
    let prices = PriceSnapshot::new(args.vol_base, args.base_stable).context("invalid prices")?;
    let vault = Vault::new(
        AccountId::new(args.account),
        preset(args.network, &args.governance),
        InMemoryLedger::new(),
        StaticPrices::from(prices),
        now,
    )
    .context("failed to create vault")?;

    let snapshot = KeeperSnapshot {
        observed_at: Utc::now(),
        prices,
        vault: vault.snapshot(),
    };
    snapshot.save(&args.snapshot)?;
    tracing::info!(path = %args.snapshot.display(), now, "genesis snapshot written");
    Ok(())
}

fn check(args: CheckArgs) -> Result<()> {
    let vault = KeeperSnapshot::load(&args.snapshot)?.open()?;
    let now = args.now.unwrap_or_else(unix_now);
    print_json(&report::gate_report(&vault, now)?)
}

fn quote(args: CheckArgs) -> Result<()> {
    let vault = KeeperSnapshot::load(&args.snapshot)?.open()?;
    let now = args.now.unwrap_or_else(unix_now);
    print_json(&report::quote_report(&vault, now)?)
}

fn params(args: ParamsArgs) -> Result<()> {
    let config = preset(args.network, &args.governance);
    let json = config.to_json().context("failed to encode configuration")?;
    println!("{json}");
    Ok(())
}

/// Re-reads the snapshot every `interval` seconds and reports when a
/// rebalance becomes due. A snapshot that fails to load is logged and
/// retried on the next tick.
async fn watch(args: WatchArgs) -> Result<()> {
    tracing::info!(
        path = %args.snapshot.display(),
        interval_secs = args.interval,
        "watching snapshot"
    );
    let mut interval = tokio::time::interval(Duration::from_secs(args.interval));
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match poll(&args.snapshot) {
                    Ok(true) if args.once => return Ok(()),
                    Ok(_) => {}
                    Err(err) => tracing::warn!(error = %format!("{err:#}"), "poll failed"),
                }
            }
            _ = &mut shutdown => {
                tracing::info!("shutdown signal received");
                return Ok(());
            }
        }
    }
}

/// One watch tick. Returns whether a rebalance is due.
fn poll(path: &Path) -> Result<bool> {
    let vault = KeeperSnapshot::load(path)?.open()?;
    let report = report::gate_report(&vault, unix_now())?;
    if report.eligible {
        tracing::info!(trigger = ?report.trigger, auction = ?report.auction, "rebalance due");
        print_json(&report)?;
    } else {
        tracing::debug!(state = ?report.state, "no rebalance due");
    }
    Ok(report.eligible)
}

/// Prints version information to stdout.
fn print_version() {
    println!("hedge-keeper {}", env!("CARGO_PKG_VERSION"));
    println!("rustc        {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

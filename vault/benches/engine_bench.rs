// Copyright (c) 2026 Hedge Vault Contributors. MIT License.
// See LICENSE for details.

// Pricing and accounting benchmarks for the hedge vault engine.
//
// Covers the auction multiplier and price adjustment, rebalance sizing, the
// share math on both sides, and a full deposit unit of work including its
// stage/check/commit overhead.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use hedge_vault::auction::{AuctionAnchor, AuctionPricer};
use hedge_vault::executor::RebalanceExecutor;
use hedge_vault::shares::{basket_for_value, calc_shares_and_amounts, calc_withdraw_amounts};
use hedge_vault::{
    AccountId, Amount, Basket, DepositRequest, InMemoryLedger, PriceSnapshot, StaticPrices, Vault,
    VaultConfiguration, Wad, WAD,
};

const GENESIS: u64 = 1_700_000_000;

fn prices() -> PriceSnapshot {
    PriceSnapshot::new(
        Wad::from_raw(200_000_000_000_000_000),
        Wad::from_raw(2_000 * WAD),
    )
    .unwrap()
}

fn config() -> VaultConfiguration {
    VaultConfiguration::mainnet(AccountId::from("governance"))
}

fn holdings() -> Basket {
    Basket::from_raw(12 * WAD, 9_800_000_000, 45 * WAD)
}

fn bench_price_multiplier(c: &mut Criterion) {
    let config = config();
    let pricer = AuctionPricer::new(&config);
    let anchor = AuctionAnchor {
        trigger_timestamp: GENESIS,
        is_price_increasing: false,
    };

    let mut group = c.benchmark_group("auction/price_multiplier");
    for elapsed in [0u64, 150, 599, 600] {
        group.bench_with_input(BenchmarkId::from_parameter(elapsed), &elapsed, |b, &elapsed| {
            b.iter(|| pricer.price_multiplier(&anchor, GENESIS + elapsed).unwrap());
        });
    }
    group.finish();
}

fn bench_auction_prices(c: &mut Criterion) {
    let config = config();
    let pricer = AuctionPricer::new(&config);
    let anchor = AuctionAnchor {
        trigger_timestamp: GENESIS,
        is_price_increasing: true,
    };
    let prices = prices();

    c.bench_function("auction/get_auction_prices", |b| {
        b.iter(|| pricer.get_auction_prices(&anchor, &prices, GENESIS + 321).unwrap());
    });
}

fn bench_rebalance_quote(c: &mut Criterion) {
    let config = config();
    let executor = RebalanceExecutor::new(&config);
    let anchor = AuctionAnchor {
        trigger_timestamp: GENESIS,
        is_price_increasing: false,
    };
    let prices = prices();
    let holdings = holdings();

    c.bench_function("executor/quote", |b| {
        b.iter(|| executor.quote(&anchor, &holdings, &prices, GENESIS + 300).unwrap());
    });
}

fn bench_share_math(c: &mut Criterion) {
    let holdings = holdings();
    let prices = prices();
    let supply = 20 * WAD;
    let offered = basket_for_value(Amount::new(WAD), &holdings, &prices).unwrap();

    c.bench_function("shares/basket_for_value", |b| {
        b.iter(|| basket_for_value(Amount::new(WAD), &holdings, &prices).unwrap());
    });
    c.bench_function("shares/calc_deposit", |b| {
        b.iter(|| calc_shares_and_amounts(supply, &offered, &holdings, true).unwrap());
    });
    c.bench_function("shares/calc_withdraw", |b| {
        b.iter(|| calc_withdraw_amounts(supply, WAD, &holdings).unwrap());
    });
}

fn bench_deposit_unit(c: &mut Criterion) {
    let mut group = c.benchmark_group("vault/deposit_unit");

    for depositors in [1usize, 16, 256] {
        let mut vault = Vault::new(
            AccountId::from("vault"),
            // Mainnet's cap would stop the larger fixtures.
            VaultConfiguration::testnet(AccountId::from("governance")),
            InMemoryLedger::new(),
            StaticPrices::from(prices()),
            GENESIS,
        )
        .unwrap();
        let names: Vec<AccountId> = (0..depositors)
            .map(|i| AccountId::new(format!("lp-{i:04}")))
            .collect();
        vault
            .ledger_setup(|ledger| {
                for name in &names {
                    ledger.mint_basket(name, &Basket::from_raw(100 * WAD, 0, 0))?;
                }
                Ok(())
            })
            .unwrap();
        for name in &names {
            vault
                .deposit(&DepositRequest::new(name.clone(), Amount::new(WAD)))
                .unwrap();
        }

        // Ledger size grows with the number of accounts staged per unit.
        group.throughput(Throughput::Elements(depositors as u64));
        group.bench_with_input(BenchmarkId::from_parameter(depositors), &vault, |b, vault| {
            let request = DepositRequest::new(names[0].clone(), Amount::new(WAD / 1_000));
            b.iter(|| {
                let mut vault = vault.clone();
                vault.deposit(&request).unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_price_multiplier,
    bench_auction_prices,
    bench_rebalance_quote,
    bench_share_math,
    bench_deposit_unit,
);
criterion_main!(benches);

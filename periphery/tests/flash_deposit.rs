//! Integration tests for the one-click deposit helper.

use hedge_periphery::{FlashDeposit, FlashDepositRequest, PeripheryError};
use hedge_vault::{
    AccountId, Amount, AssetId, AssetLedger, Basket, DepositRequest, InMemoryLedger, OracleVenue,
    OutputLeg, PriceSnapshot, RebalanceRequest, StaticPrices, Vault, VaultConfiguration,
    VaultError, Wad, WAD,
};

const GENESIS: u64 = 1_700_000_000;

fn account(name: &str) -> AccountId {
    AccountId::from(name)
}

fn oracle() -> PriceSnapshot {
    PriceSnapshot::new(
        Wad::from_raw(200_000_000_000_000_000),
        Wad::from_raw(2_000 * WAD),
    )
    .unwrap()
}

fn helper() -> FlashDeposit {
    FlashDeposit::new(account("flash-deposit"), account("governance"))
}

fn ninety_nine_percent() -> Wad {
    Wad::from_raw(990_000_000_000_000_000)
}

/// A fresh vault with carol funded and the venue stocked.
fn empty_vault() -> (Vault, OracleVenue) {
    let mut vault = Vault::new(
        account("vault"),
        VaultConfiguration::mainnet(account("governance")),
        InMemoryLedger::new(),
        StaticPrices::from(oracle()),
        GENESIS,
    )
    .unwrap();
    let stock = Basket::from_raw(1_000 * WAD, 1_000_000_000_000, 1_000 * WAD);
    vault
        .ledger_setup(|ledger| {
            ledger.mint_basket(&account("alice"), &Basket::from_raw(10 * WAD, 0, 0))?;
            ledger.mint_basket(&account("carol"), &Basket::from_raw(2 * WAD, 0, 0))?;
            ledger.mint_basket(&account("keeper"), &Basket::from_raw(0, 10_000_000_000, 20 * WAD))?;
            ledger.mint_basket(&account("venue"), &stock)
        })
        .unwrap();
    let venue = OracleVenue::new(account("venue"), oracle(), 0).unwrap();
    (vault, venue)
}

/// A vault that has taken alice's 10 base and rebalanced into all three
/// assets.
fn mixed_vault() -> (Vault, OracleVenue) {
    let (mut vault, venue) = empty_vault();
    vault
        .deposit(&DepositRequest::new(account("alice"), Amount::new(10 * WAD)))
        .unwrap();
    let config = vault.config();
    let now = GENESIS + config.rebalance_time_threshold + config.auction_duration;
    vault
        .time_rebalance(&RebalanceRequest::unbounded(account("keeper"), now))
        .unwrap();
    assert!(!vault.holdings().balances.stable.is_zero());
    (vault, venue)
}

#[test]
fn first_deposit_needs_no_swaps() {
    let (mut vault, venue) = empty_vault();
    let request = FlashDepositRequest::new(account("carol"), Amount::new(WAD), Wad::ONE);

    let outcome = helper().deposit(&mut vault, &venue, &request).unwrap();

    assert_eq!(outcome.shares, WAD);
    assert_eq!(outcome.deposited, Basket::from_raw(WAD, 0, 0));
    assert!(outcome.swap_cost.is_zero());
    assert!(outcome.refunded.is_zero());
    assert_eq!(vault.holdings().shares_of(&account("carol")), WAD);
}

#[test]
fn deposit_into_a_mixed_vault_buys_the_missing_legs() {
    let (mut vault, venue) = mixed_vault();
    let helper = helper();
    let request = FlashDepositRequest::new(account("carol"), Amount::new(WAD), ninety_nine_percent())
        .to(account("dave"));

    let outcome = helper.deposit(&mut vault, &venue, &request).unwrap();

    assert!(outcome.shares > 0);
    assert!(!outcome.swap_cost.is_zero());
    assert!(!outcome.refunded.is_zero());
    for asset in AssetId::ALL {
        assert!(outcome.deposited.get(asset) > 0, "{asset} leg missing");
    }
    assert_eq!(vault.holdings().shares_of(&account("dave")), outcome.shares);
    assert_eq!(vault.holdings().shares_of(&account("carol")), 0);

    let ledger = vault.ledger();
    assert_eq!(
        ledger.balance_of(&account("carol"), AssetId::Base),
        WAD + outcome.refunded.raw()
    );
    assert_eq!(ledger.balance_of(helper.account(), AssetId::Base), 0);
    assert_eq!(ledger.basket_of(vault.account()), vault.holdings().balances);
}

#[test]
fn refused_deposit_leaves_the_user_untouched() {
    let (mut vault, venue) = mixed_vault();
    let ledger = vault.ledger().clone();
    let snapshot = vault.snapshot();

    let greedy = FlashDepositRequest::new(account("carol"), Amount::new(WAD), ninety_nine_percent())
        .with_min_shares(100 * WAD);
    let err = helper().deposit(&mut vault, &venue, &greedy).unwrap_err();
    assert!(matches!(
        err,
        PeripheryError::Vault(VaultError::SlippageExceeded {
            leg: OutputLeg::Shares,
            ..
        })
    ));
    assert!(err.is_retryable());

    vault.set_pause(&account("governance"), true).unwrap();
    let request = FlashDepositRequest::new(account("carol"), Amount::new(WAD), ninety_nine_percent());
    assert_eq!(
        helper().deposit(&mut vault, &venue, &request).unwrap_err(),
        PeripheryError::Vault(VaultError::paused())
    );

    assert_eq!(vault.ledger(), &ledger);
    assert_eq!(vault.holdings(), &snapshot.holdings);
}

#[test]
fn slippage_outside_the_unit_interval_is_rejected() {
    let (mut vault, venue) = empty_vault();
    for slippage in [Wad::ZERO, Wad::from_raw(WAD + 1)] {
        let request = FlashDepositRequest::new(account("carol"), Amount::new(WAD), slippage);
        assert_eq!(
            helper().deposit(&mut vault, &venue, &request).unwrap_err(),
            PeripheryError::InvalidSlippage(slippage)
        );
    }
}

#[test]
fn only_governance_collects_remains() {
    let (mut vault, venue) = mixed_vault();
    let helper = helper();
    let request = FlashDepositRequest::new(account("carol"), Amount::new(WAD), ninety_nine_percent());
    helper.deposit(&mut vault, &venue, &request).unwrap();

    let dust = vault.ledger().basket_of(helper.account());
    assert!(matches!(
        helper.collect_remains(&mut vault, &account("carol"), &dust, &account("carol")),
        Err(PeripheryError::Unauthorized { .. })
    ));

    helper
        .collect_remains(&mut vault, &account("governance"), &dust, &account("treasury"))
        .unwrap();
    assert!(vault.ledger().basket_of(helper.account()).is_empty());
    assert_eq!(vault.ledger().basket_of(&account("treasury")), dust);
}

#[test]
fn stored_dust_never_funds_a_user_deposit() {
    let (mut vault, _) = mixed_vault();
    let helper = helper();
    let dust = Basket::from_raw(WAD / 10, 0, 0);
    vault
        .ledger_setup(|ledger| ledger.mint_basket(helper.account(), &dust))
        .unwrap();
    let venue = OracleVenue::new(account("venue"), oracle(), 30).unwrap();
    let ledger = vault.ledger().clone();
    let snapshot = vault.snapshot();

    // With a fee and no slippage allowance the legs cost more than carol sent.
    let exact = FlashDepositRequest::new(account("carol"), Amount::new(WAD), Wad::ONE);
    let err = helper.deposit(&mut vault, &venue, &exact).unwrap_err();
    assert!(matches!(
        err,
        PeripheryError::Vault(VaultError::InsufficientFunds {
            asset: AssetId::Base,
            available,
            requested,
            ..
        }) if available == WAD && requested > WAD
    ));
    assert_eq!(vault.ledger(), &ledger);
    assert_eq!(vault.holdings(), &snapshot.holdings);

    let padded = FlashDepositRequest::new(account("carol"), Amount::new(WAD), ninety_nine_percent());
    let outcome = helper.deposit(&mut vault, &venue, &padded).unwrap();
    assert!(outcome.shares > 0);
    assert_eq!(
        vault.ledger().balance_of(helper.account(), AssetId::Base),
        WAD / 10
    );
}

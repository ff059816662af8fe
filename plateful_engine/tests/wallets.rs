//! Wallet ledger behaviour against a real SQLite database.
use plateful_common::Money;
use plateful_engine::{
    db_types::{AccountId, LedgerKey, RestaurantId},
    sqlite::db::wallets,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{WalletApiError, WalletLedger},
    SqliteDatabase,
};

async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

#[tokio::test]
async fn balance_queries_materialize_exactly_one_wallet() {
    let db = new_test_db().await;
    let key = LedgerKey::account(AccountId(1));
    assert_eq!(db.balance(&key).await.unwrap(), Money::from_lira(0));
    assert_eq!(db.balance(&key).await.unwrap(), Money::from_lira(0));
    db.credit(&key, Money::from_lira(5)).await.unwrap();
    let mut conn = db.pool().acquire().await.unwrap();
    assert_eq!(wallets::wallet_count(&key, &mut conn).await.unwrap(), 1);
}

#[tokio::test]
async fn account_and_restaurant_wallets_never_collide() {
    let db = new_test_db().await;
    let account = LedgerKey::account(AccountId(7));
    let restaurant = LedgerKey::restaurant(RestaurantId(7));
    db.credit(&account, Money::from_lira(10)).await.unwrap();
    assert_eq!(db.balance(&restaurant).await.unwrap(), Money::from_lira(0));
    assert_eq!(db.balance(&account).await.unwrap(), Money::from_lira(10));
}

#[tokio::test]
async fn debits_cannot_overdraw() {
    let db = new_test_db().await;
    let key = LedgerKey::account(AccountId(2));
    db.credit(&key, Money::from_lira(30)).await.unwrap();
    let err = db.debit(&key, Money::from_lira(31)).await.unwrap_err();
    match err {
        WalletApiError::InsufficientFunds { available, required } => {
            assert_eq!(available, Money::from_lira(30));
            assert_eq!(required, Money::from_lira(31));
        },
        other => panic!("Expected InsufficientFunds, got {other}"),
    }
    assert_eq!(db.debit(&key, Money::from_lira(30)).await.unwrap(), Money::from_lira(0));
}

#[tokio::test]
async fn non_positive_amounts_are_rejected() {
    let db = new_test_db().await;
    let key = LedgerKey::account(AccountId(3));
    assert!(matches!(db.credit(&key, Money::from_lira(0)).await, Err(WalletApiError::InvalidAmount(_))));
    assert!(matches!(db.credit(&key, Money::from_lira(-5)).await, Err(WalletApiError::InvalidAmount(_))));
    assert!(matches!(db.debit(&key, Money::from_lira(0)).await, Err(WalletApiError::InvalidAmount(_))));
}

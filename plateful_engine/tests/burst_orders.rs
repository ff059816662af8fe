//! Fires concurrent order placements against one wallet on a multi-connection pool.
//!
//! The wallet covers exactly one order, so however the writers interleave, exactly one placement may land: the
//! wallet must never be overdrawn and exactly one order row may exist afterwards. Losers are either refused with
//! `InsufficientFunds` (they reached the debit after the winner committed) or bounce off the write lock with a
//! database error; both leave no trace. The locked-writer outcome is SQLite refusing a deferred transaction's
//! upgrade to a write lock; retrying with immediate transactions would convert those into clean refusals.
use futures_util::future::join_all;
use log::*;
use plateful_common::Money;
use plateful_engine::{
    db_types::{AccountId, DeliveryInfo, OrderLineSpec, Principal},
    events::EventProducers,
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        seeds::{fund_account, seed_menu},
    },
    traits::{OrderGatewayError, WalletLedger},
    OrderFlowApi,
    SqliteDatabase,
};
use tokio::runtime::Runtime;

const ATTEMPTS: usize = 8;

#[test]
fn burst_orders() {
    info!("🚀️ Starting order burst test");
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, ATTEMPTS as u32).await.expect("Error creating database");
        let menu = seed_menu(&db).await;
        let customer = Principal::Customer(AccountId(1));
        // Funds for exactly one bowl of soup.
        let key = fund_account(&db, AccountId(1), Money::from_lira(15)).await;

        info!("🚀️ Injecting {ATTEMPTS} concurrent orders");
        let attempts = (0..ATTEMPTS).map(|i| {
            let api = OrderFlowApi::new(db.clone(), EventProducers::default());
            let restaurant_id = menu.restaurant.id;
            let soup_id = menu.soup.id;
            async move {
                let delivery = DeliveryInfo::new("Ayşe Yılmaz", "+90 555 123 4567", "Bağdat Cd. 42, Kadıköy");
                let result = api
                    .place_order(&customer, restaurant_id, delivery, vec![OrderLineSpec::for_item(soup_id, 1)])
                    .await;
                trace!("Attempt {i}: {:?}", result.as_ref().map(|p| p.order.order_number.clone()));
                result
            }
        });
        let results = join_all(attempts).await;

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(succeeded, 1, "the wallet funds exactly one order");
        for result in &results {
            if let Err(e) = result {
                assert!(
                    matches!(e, OrderGatewayError::InsufficientFunds { .. } | OrderGatewayError::DatabaseError(_)),
                    "losers must be refused or bounce off the write lock, got {e}"
                );
            }
        }
        assert_eq!(db.balance(&key).await.unwrap(), Money::from_lira(0));
        let admin = Principal::Admin(AccountId(100));
        let api = OrderFlowApi::new(db.clone(), EventProducers::default());
        let orders = api.search_orders(&admin, Default::default()).await.unwrap();
        assert_eq!(orders.len(), 1, "losing attempts must leave no order rows");
    });
    info!("🚀️ test complete");
}

//! End-to-end order lifecycle tests against a real SQLite database.
use log::*;
use plateful_common::Money;
use plateful_engine::{
    db_types::*,
    events::EventProducers,
    test_utils::{
        prepare_env::prepare_test_env,
        seeds::{fund_account, seed_menu, SeededMenu},
    },
    traits::{OrderGatewayError, WalletLedger},
    OrderFlowApi,
    SqliteDatabase,
};

async fn new_test_db() -> SqliteDatabase {
    let url = plateful_engine::test_utils::prepare_env::random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

fn delivery() -> DeliveryInfo {
    DeliveryInfo::new("Ayşe Yılmaz", "+90 555 123 4567", "Bağdat Cd. 42, Kadıköy")
}

#[tokio::test]
async fn order_total_is_exact_and_debited_once() {
    let db = new_test_db().await;
    let SeededMenu { restaurant, soup, .. } = seed_menu(&db).await;
    let customer = Principal::Customer(AccountId(1));
    let key = fund_account(&db, AccountId(1), Money::from_lira(45)).await;
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());

    // 3 × 15.00₺ must come to exactly 45.00₺, leaving the wallet at exactly zero.
    let placed = api
        .place_order(&customer, restaurant.id, delivery(), vec![OrderLineSpec::for_item(soup.id, 3)])
        .await
        .expect("Error placing order");
    assert_eq!(placed.order.total_price, Money::from_lira(45));
    assert_eq!(placed.order.status, OrderStatusType::Created);
    assert_eq!(placed.lines.len(), 1);
    assert_eq!(placed.lines[0].unit_price, Money::from_lira(15));
    assert_eq!(db.balance(&key).await.unwrap(), Money::from_lira(0));
    info!("Order {} placed at {}", placed.order.order_number, placed.order.total_price);
}

#[tokio::test]
async fn combo_prices_at_its_own_price_not_the_member_sum() {
    let db = new_test_db().await;
    let menu = seed_menu(&db).await;
    let customer = Principal::Customer(AccountId(2));
    let key = fund_account(&db, AccountId(2), Money::from_lira(100)).await;
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());

    // Members sum to 70.00₺ but the operator sells the combo at 60.00₺.
    let placed = api
        .place_order(&customer, menu.restaurant.id, delivery(), vec![OrderLineSpec::for_combo(menu.combo.id, 1)])
        .await
        .expect("Error placing order");
    assert_eq!(placed.order.total_price, Money::from_lira(60));
    assert_eq!(db.balance(&key).await.unwrap(), Money::from_lira(40));
}

#[tokio::test]
async fn insufficient_funds_leaves_no_trace() {
    let db = new_test_db().await;
    let menu = seed_menu(&db).await;
    let customer = Principal::Customer(AccountId(3));
    let key = fund_account(&db, AccountId(3), Money::from_lira(10)).await;
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());

    let err = api
        .place_order(&customer, menu.restaurant.id, delivery(), vec![OrderLineSpec::for_item(menu.kebab.id, 2)])
        .await
        .expect_err("Order should have been refused");
    match err {
        OrderGatewayError::InsufficientFunds { available, required } => {
            assert_eq!(available, Money::from_lira(10));
            assert_eq!(required, Money::from(85_00));
        },
        other => panic!("Expected InsufficientFunds, got {other}"),
    }
    // The wallet is untouched and no order row exists.
    assert_eq!(db.balance(&key).await.unwrap(), Money::from_lira(10));
    let orders = api
        .search_orders(&customer, Default::default())
        .await
        .expect("Error searching orders");
    assert!(orders.is_empty());
}

#[tokio::test]
async fn price_changes_do_not_rewrite_existing_orders() {
    let db = new_test_db().await;
    let menu = seed_menu(&db).await;
    let customer = Principal::Customer(AccountId(4));
    fund_account(&db, AccountId(4), Money::from_lira(50)).await;
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());

    let placed = api
        .place_order(&customer, menu.restaurant.id, delivery(), vec![OrderLineSpec::for_item(menu.soup.id, 2)])
        .await
        .expect("Error placing order");
    assert_eq!(placed.order.total_price, Money::from_lira(30));

    use plateful_engine::traits::CatalogManagement;
    let update = UpdateCatalogItem::default().with_price(Money::from_lira(99));
    db.update_item(menu.soup.id, update).await.expect("Error updating item");

    let fetched = api.order_with_lines(&customer, placed.order.id).await.expect("Error fetching order");
    assert_eq!(fetched.order.total_price, Money::from_lira(30));
    assert_eq!(fetched.lines[0].unit_price, Money::from_lira(15));
}

#[tokio::test]
async fn cancellation_refunds_the_full_total() {
    let db = new_test_db().await;
    let menu = seed_menu(&db).await;
    let customer = Principal::Customer(AccountId(5));
    let key = fund_account(&db, AccountId(5), Money::from_lira(60)).await;
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());

    let placed = api
        .place_order(&customer, menu.restaurant.id, delivery(), vec![OrderLineSpec::for_item(menu.baklava.id, 3)])
        .await
        .expect("Error placing order");
    assert_eq!(db.balance(&key).await.unwrap(), Money::from_lira(0));

    let cancelled = api.cancel_order(&customer, placed.order.id).await.expect("Error cancelling order");
    assert_eq!(cancelled.status, OrderStatusType::Cancelled);
    assert_eq!(db.balance(&key).await.unwrap(), Money::from_lira(60));

    // A second cancellation must not produce a second refund.
    let err = api.cancel_order(&customer, placed.order.id).await.expect_err("Double cancel should fail");
    assert!(matches!(err, OrderGatewayError::OrderNotCancellable(_)));
    assert_eq!(db.balance(&key).await.unwrap(), Money::from_lira(60));
}

#[tokio::test]
async fn delivered_orders_are_terminal() {
    let db = new_test_db().await;
    let menu = seed_menu(&db).await;
    let customer = Principal::Customer(AccountId(6));
    fund_account(&db, AccountId(6), Money::from_lira(100)).await;
    let operator = Principal::Operator(menu.restaurant.id);
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());

    let placed = api
        .place_order(&customer, menu.restaurant.id, delivery(), vec![OrderLineSpec::for_item(menu.ayran.id, 4)])
        .await
        .expect("Error placing order");
    let id = placed.order.id;
    for status in [OrderStatusType::Paid, OrderStatusType::Preparing, OrderStatusType::Delivering, OrderStatusType::Delivered] {
        let order = api.update_status(&operator, id, status).await.expect("Error progressing order");
        assert_eq!(order.status, status);
    }
    let err = api.update_status(&operator, id, OrderStatusType::Paid).await.expect_err("Backward move should fail");
    assert!(matches!(err, OrderGatewayError::InvalidStatusChange { .. }));
    let err = api.cancel_order(&customer, id).await.expect_err("Cancelling a delivered order should fail");
    assert!(matches!(err, OrderGatewayError::OrderNotCancellable(_)));
}

#[tokio::test]
async fn skipping_forward_is_allowed_but_backwards_is_not() {
    let db = new_test_db().await;
    let menu = seed_menu(&db).await;
    let customer = Principal::Customer(AccountId(7));
    fund_account(&db, AccountId(7), Money::from_lira(100)).await;
    let admin = Principal::Admin(AccountId(100));
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());

    let placed = api
        .place_order(&customer, menu.restaurant.id, delivery(), vec![OrderLineSpec::for_item(menu.soup.id, 1)])
        .await
        .expect("Error placing order");
    // Created straight to Delivering skips two stages, which is fine; going back to Paid is not.
    let order = api.update_status(&admin, placed.order.id, OrderStatusType::Delivering).await.unwrap();
    assert_eq!(order.status, OrderStatusType::Delivering);
    let err = api.update_status(&admin, placed.order.id, OrderStatusType::Paid).await.unwrap_err();
    assert!(matches!(err, OrderGatewayError::InvalidStatusChange { .. }));
}

#[tokio::test]
async fn foreign_menu_references_are_rejected() {
    let db = new_test_db().await;
    let menu = seed_menu(&db).await;
    // A second restaurant whose menu must not leak into the first one's orders.
    use plateful_engine::traits::CatalogManagement;
    let other = db.create_restaurant(NewRestaurant::new("Rival Bistro")).await.unwrap();
    let foreign_item = db
        .create_item(NewCatalogItem::new(other.id, "Foreign dish", Money::from_lira(5), ItemCategory::Food))
        .await
        .unwrap();

    let customer = Principal::Customer(AccountId(8));
    let key = fund_account(&db, AccountId(8), Money::from_lira(50)).await;
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());

    let err = api
        .place_order(&customer, menu.restaurant.id, delivery(), vec![
            OrderLineSpec::for_item(menu.soup.id, 1),
            OrderLineSpec::for_item(foreign_item.id, 1),
        ])
        .await
        .expect_err("Foreign item should be rejected");
    assert!(matches!(err, OrderGatewayError::InvalidReference(_)));
    // Nothing was debited for the partially-valid order.
    assert_eq!(db.balance(&key).await.unwrap(), Money::from_lira(50));
}

#[tokio::test]
async fn malformed_lines_are_rejected() {
    let db = new_test_db().await;
    let menu = seed_menu(&db).await;
    let customer = Principal::Customer(AccountId(9));
    fund_account(&db, AccountId(9), Money::from_lira(50)).await;
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());

    let both = OrderLineSpec { item_id: Some(menu.soup.id), combo_id: Some(menu.combo.id), quantity: 1 };
    let err = api.place_order(&customer, menu.restaurant.id, delivery(), vec![both]).await.unwrap_err();
    assert!(matches!(err, OrderGatewayError::MalformedLine(_)));

    let err = api.place_order(&customer, menu.restaurant.id, delivery(), vec![]).await.unwrap_err();
    assert!(matches!(err, OrderGatewayError::MalformedLine(_)));

    let zero = OrderLineSpec::for_item(menu.soup.id, 0);
    let err = api.place_order(&customer, menu.restaurant.id, delivery(), vec![zero]).await.unwrap_err();
    assert!(matches!(err, OrderGatewayError::MalformedLine(_)));

    let absurd = OrderLineSpec::for_item(menu.soup.id, plateful_engine::pricing::MAX_LINE_QUANTITY + 1);
    let err = api.place_order(&customer, menu.restaurant.id, delivery(), vec![absurd]).await.unwrap_err();
    assert!(matches!(err, OrderGatewayError::MalformedLine(_)));
}

#[tokio::test]
async fn only_owner_or_admin_may_cancel() {
    let db = new_test_db().await;
    let menu = seed_menu(&db).await;
    let owner = Principal::Customer(AccountId(10));
    fund_account(&db, AccountId(10), Money::from_lira(50)).await;
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());

    let placed = api
        .place_order(&owner, menu.restaurant.id, delivery(), vec![OrderLineSpec::for_item(menu.soup.id, 1)])
        .await
        .expect("Error placing order");

    let stranger = Principal::Customer(AccountId(11));
    let err = api.cancel_order(&stranger, placed.order.id).await.unwrap_err();
    assert!(matches!(err, OrderGatewayError::Forbidden(_)));
    let operator = Principal::Operator(menu.restaurant.id);
    let err = api.cancel_order(&operator, placed.order.id).await.unwrap_err();
    assert!(matches!(err, OrderGatewayError::Forbidden(_)));

    let admin = Principal::Admin(AccountId(100));
    let cancelled = api.cancel_order(&admin, placed.order.id).await.expect("Admin cancel should succeed");
    assert_eq!(cancelled.status, OrderStatusType::Cancelled);
}

#[tokio::test]
async fn operators_cannot_place_orders_or_touch_foreign_restaurants() {
    let db = new_test_db().await;
    let menu = seed_menu(&db).await;
    let customer = Principal::Customer(AccountId(12));
    fund_account(&db, AccountId(12), Money::from_lira(50)).await;
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());

    let operator = Principal::Operator(menu.restaurant.id);
    let err = api
        .place_order(&operator, menu.restaurant.id, delivery(), vec![OrderLineSpec::for_item(menu.soup.id, 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, OrderGatewayError::Forbidden(_)));

    let placed = api
        .place_order(&customer, menu.restaurant.id, delivery(), vec![OrderLineSpec::for_item(menu.soup.id, 1)])
        .await
        .unwrap();
    let rival = Principal::Operator(RestaurantId(999));
    let err = api.update_status(&rival, placed.order.id, OrderStatusType::Paid).await.unwrap_err();
    assert!(matches!(err, OrderGatewayError::Forbidden(_)));
}

#[tokio::test]
async fn search_can_filter_on_a_status_set() {
    let db = new_test_db().await;
    let menu = seed_menu(&db).await;
    let customer = Principal::Customer(AccountId(16));
    fund_account(&db, AccountId(16), Money::from_lira(100)).await;
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());

    let kept = api
        .place_order(&customer, menu.restaurant.id, delivery(), vec![OrderLineSpec::for_item(menu.soup.id, 1)])
        .await
        .unwrap();
    let dropped = api
        .place_order(&customer, menu.restaurant.id, delivery(), vec![OrderLineSpec::for_item(menu.ayran.id, 1)])
        .await
        .unwrap();
    api.cancel_order(&customer, dropped.order.id).await.unwrap();

    use plateful_engine::order_objects::OrderQueryFilter;
    let admin = Principal::Admin(AccountId(100));
    let open = OrderQueryFilter::default().with_status(OrderStatusType::Created).with_status(OrderStatusType::Paid);
    let found = api.search_orders(&admin, open).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, kept.order.id);

    let annulled = OrderQueryFilter::default().with_status(OrderStatusType::Cancelled);
    let found = api.search_orders(&admin, annulled).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, dropped.order.id);
}

#[tokio::test]
async fn inactive_restaurants_take_no_orders() {
    let db = new_test_db().await;
    let menu = seed_menu(&db).await;
    use plateful_engine::traits::CatalogManagement;
    let update = UpdateRestaurant { is_active: Some(false), ..Default::default() };
    db.update_restaurant(menu.restaurant.id, update).await.unwrap();

    let customer = Principal::Customer(AccountId(15));
    let key = fund_account(&db, AccountId(15), Money::from_lira(50)).await;
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());
    let err = api
        .place_order(&customer, menu.restaurant.id, delivery(), vec![OrderLineSpec::for_item(menu.soup.id, 1)])
        .await
        .unwrap_err();
    assert!(matches!(err, OrderGatewayError::RestaurantNotFound(_)));
    assert_eq!(db.balance(&key).await.unwrap(), Money::from_lira(50));

    let err = api.quote(menu.restaurant.id, &[OrderLineSpec::for_item(menu.soup.id, 1)]).await.unwrap_err();
    assert!(matches!(err, OrderGatewayError::RestaurantNotFound(_)));
}

#[tokio::test]
async fn quotes_price_without_spending() {
    let db = new_test_db().await;
    let menu = seed_menu(&db).await;
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());
    let (total, lines) = api
        .quote(menu.restaurant.id, &[
            OrderLineSpec::for_item(menu.soup.id, 2),
            OrderLineSpec::for_combo(menu.combo.id, 1),
        ])
        .await
        .expect("Error quoting order");
    assert_eq!(total, Money::from_lira(90));
    assert_eq!(lines.len(), 2);
}

#[tokio::test]
async fn search_is_scoped_to_the_caller() {
    let db = new_test_db().await;
    let menu = seed_menu(&db).await;
    let alice = Principal::Customer(AccountId(13));
    let bob = Principal::Customer(AccountId(14));
    fund_account(&db, AccountId(13), Money::from_lira(100)).await;
    fund_account(&db, AccountId(14), Money::from_lira(100)).await;
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());

    for who in [&alice, &bob] {
        api.place_order(who, menu.restaurant.id, delivery(), vec![OrderLineSpec::for_item(menu.ayran.id, 1)])
            .await
            .expect("Error placing order");
    }

    let mine = api.search_orders(&alice, Default::default()).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].account_id, AccountId(13));

    let operator = Principal::Operator(menu.restaurant.id);
    let for_restaurant = api.search_orders(&operator, Default::default()).await.unwrap();
    assert_eq!(for_restaurant.len(), 2);

    let admin = Principal::Admin(AccountId(100));
    let all = api.search_orders(&admin, Default::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    // Bob cannot peek at Alice's order even by filtering for it.
    use plateful_engine::order_objects::OrderQueryFilter;
    let sneaky = OrderQueryFilter::default().with_account_id(AccountId(13));
    let overridden = api.search_orders(&bob, sneaky).await.unwrap();
    assert_eq!(overridden.len(), 1);
    assert_eq!(overridden[0].account_id, AccountId(14));
}

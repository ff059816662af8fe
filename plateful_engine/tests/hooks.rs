//! Checks that the lifecycle hooks fire once per order event.
use std::{
    sync::{
        atomic::{AtomicI32, Ordering},
        Arc,
    },
    time::Duration,
};

use log::*;
use plateful_common::Money;
use plateful_engine::{
    db_types::{AccountId, DeliveryInfo, OrderLineSpec, OrderStatusType, Principal},
    events::{EventHandlers, EventHooks},
    test_utils::{
        prepare_env::{prepare_test_env, random_db_path},
        seeds::{fund_account, seed_menu},
    },
    OrderFlowApi,
    SqliteDatabase,
};
use tokio::runtime::Runtime;

#[derive(Default, Clone)]
struct HookCalled {
    called: Arc<AtomicI32>,
}

impl HookCalled {
    fn called(&self) {
        let _ = self.called.fetch_add(1, Ordering::Relaxed);
    }

    fn count(&self) -> i32 {
        self.called.load(Ordering::Relaxed)
    }
}

#[test]
fn lifecycle_hooks_fire() {
    let rt = Runtime::new().unwrap();
    let created = HookCalled::default();
    let annulled = HookCalled::default();
    let progressed = HookCalled::default();
    let (created_copy, annulled_copy, progressed_copy) = (created.clone(), annulled.clone(), progressed.clone());
    rt.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        let menu = seed_menu(&db).await;
        fund_account(&db, AccountId(1), Money::from_lira(200)).await;

        let mut hooks = EventHooks::default();
        hooks
            .on_order_created(move |ev| {
                info!("🪝️ Created: {}", ev.order.order_number);
                created_copy.called();
                Box::pin(async {})
            })
            .on_order_annulled(move |ev| {
                info!("🪝️ Annulled: {} ({} refunded)", ev.order.order_number, ev.refund);
                annulled_copy.called();
                Box::pin(async {})
            })
            .on_status_changed(move |ev| {
                info!("🪝️ {} moved from {} to {}", ev.order.order_number, ev.old_status, ev.order.status);
                progressed_copy.called();
                Box::pin(async {})
            });
        let handlers = EventHandlers::new(10, hooks);
        let api = OrderFlowApi::new(db, handlers.producers());
        handlers.start_handlers().await;

        let customer = Principal::Customer(AccountId(1));
        let operator = Principal::Operator(menu.restaurant.id);
        let delivery = DeliveryInfo::new("Ayşe Yılmaz", "+90 555 123 4567", "Bağdat Cd. 42, Kadıköy");
        let first = api
            .place_order(&customer, menu.restaurant.id, delivery.clone(), vec![OrderLineSpec::for_item(
                menu.soup.id,
                1,
            )])
            .await
            .expect("Error placing order");
        let second = api
            .place_order(&customer, menu.restaurant.id, delivery, vec![OrderLineSpec::for_item(menu.kebab.id, 1)])
            .await
            .expect("Error placing order");
        api.update_status(&operator, first.order.id, OrderStatusType::Paid).await.expect("Error progressing order");
        api.cancel_order(&customer, second.order.id).await.expect("Error cancelling order");

        // Give the spawned hook tasks a moment to drain.
        tokio::time::sleep(Duration::from_millis(250)).await;
    });
    assert_eq!(created.count(), 2);
    assert_eq!(progressed.count(), 1);
    assert_eq!(annulled.count(), 1);
    info!("🪝️ test complete");
}

use plateful_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatusType};

/// Fired after an order has been priced, paid for and persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Fired after an order has been cancelled and the wallet refunded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAnnulledEvent {
    pub order: Order,
    pub refund: Money,
}

impl OrderAnnulledEvent {
    pub fn new(order: Order) -> Self {
        let refund = order.total_price;
        Self { order, refund }
    }
}

/// Fired after an order has moved one step along the fulfilment pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub old_status: OrderStatusType,
    pub order: Order,
}

impl OrderStatusChangedEvent {
    pub fn new(old_status: OrderStatusType, order: Order) -> Self {
        Self { old_status, order }
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use plateful_common::Money;

    use super::*;
    use crate::db_types::{AccountId, OrderId, OrderNumber, RestaurantId};

    fn sample_order() -> Order {
        let now = Utc::now();
        Order {
            id: OrderId(1),
            order_number: OrderNumber::from("#1755900000-0042"),
            account_id: AccountId(1),
            restaurant_id: RestaurantId(1),
            customer_name: "Ayşe Yılmaz".to_string(),
            customer_phone: "+90 555 123 4567".to_string(),
            delivery_address: "Bağdat Cd. 42, Kadıköy".to_string(),
            total_price: Money::from_lira(60),
            status: OrderStatusType::Cancelled,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn events_compare_by_payload() {
        let order = sample_order();
        let annulled = OrderAnnulledEvent::new(order.clone());
        assert_eq!(annulled.refund, Money::from_lira(60));
        assert_eq!(annulled, OrderAnnulledEvent::new(order.clone()));
        assert_eq!(OrderCreatedEvent::new(order.clone()), OrderCreatedEvent::new(order));
    }
}

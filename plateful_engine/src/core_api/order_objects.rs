use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{AccountId, Order, OrderLine, OrderNumber, OrderStatusType, RestaurantId};

/// A filter to search for orders. All fields are optional; present fields combine conjunctively.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub account_id: Option<AccountId>,
    pub restaurant_id: Option<RestaurantId>,
    pub order_number: Option<OrderNumber>,
    pub status: Option<Vec<OrderStatusType>>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn is_empty(&self) -> bool {
        self.account_id.is_none() &&
            self.restaurant_id.is_none() &&
            self.order_number.is_none() &&
            self.status.as_ref().map(|s| s.is_empty()).unwrap_or(true) &&
            self.since.is_none() &&
            self.until.is_none()
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn with_account_id(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn with_restaurant_id(mut self, restaurant_id: RestaurantId) -> Self {
        self.restaurant_id = Some(restaurant_id);
        self
    }

    pub fn with_order_number(mut self, order_number: OrderNumber) -> Self {
        self.order_number = Some(order_number);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "All orders.");
        }
        write!(f, "Orders")?;
        if let Some(account_id) = self.account_id {
            write!(f, " for account {account_id}")?;
        }
        if let Some(restaurant_id) = self.restaurant_id {
            write!(f, " at restaurant {restaurant_id}")?;
        }
        if let Some(order_number) = &self.order_number {
            write!(f, " with number {order_number}")?;
        }
        if let Some(statuses) = &self.status {
            if !statuses.is_empty() {
                let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", ");
                write!(f, " with status in [{statuses}]")?;
            }
        }
        if let Some(since) = self.since {
            write!(f, " created after {since}")?;
        }
        if let Some(until) = self.until {
            write!(f, " created before {until}")?;
        }
        write!(f, ".")
    }
}

/// An order header together with its lines, as handed back from the creation and fetch paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithLines {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_filter_reads_as_all_orders() {
        let filter = OrderQueryFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.to_string(), "All orders.");
    }

    #[test]
    fn filter_display_lists_criteria() {
        let filter = OrderQueryFilter::default()
            .with_account_id(AccountId(42))
            .with_status(OrderStatusType::Paid)
            .with_status(OrderStatusType::Preparing);
        assert!(!filter.is_empty());
        assert_eq!(filter.to_string(), "Orders for account #42 with status in [Paid, Preparing].");
    }
}

use thiserror::Error;

use crate::{
    core_api::order_objects::OrderQueryFilter,
    db_types::{Order, OrderId, OrderLine},
};

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for OrderApiError {
    fn from(e: sqlx::Error) -> Self {
        OrderApiError::DatabaseError(e.to_string())
    }
}

/// Read-side queries over orders and their lines. The write path lives on
/// [`OrderGatewayDatabase`][crate::traits::OrderGatewayDatabase].
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, OrderApiError>;

    async fn fetch_order_lines(&self, id: OrderId) -> Result<Vec<OrderLine>, OrderApiError>;

    /// Fetches orders matching the filter, ordered by creation time, newest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError>;
}

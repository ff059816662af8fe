use plateful_common::Money;
use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderLine, OrderStatusType, RestaurantId},
    traits::{CatalogApiError, CatalogManagement, OrderApiError, OrderManagement, WalletApiError, WalletLedger},
};

/// This trait defines the transaction coordinator contract: the highest level of behaviour for backends supporting
/// the ordering engine.
///
/// The three mutating methods are the only places where wallet state and order state change together. Each one is a
/// single transaction boundary: either every effect lands, or none does. In particular
/// * a wallet is never debited without the corresponding order row existing afterwards, and vice versa;
/// * a refund is never skipped while the order still transitions to `Cancelled`.
#[allow(async_fn_in_trait)]
pub trait OrderGatewayDatabase: Clone + WalletLedger + CatalogManagement + OrderManagement {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Prices the requested lines against the live catalog, debits the buyer's wallet for the total, and persists the
    /// order header plus one line per spec, each line capturing the unit price in effect at this moment, all inside
    /// one transaction.
    async fn create_order(&self, order: NewOrder) -> Result<(Order, Vec<OrderLine>), OrderGatewayError>;

    /// Credits the order total back to the owner's wallet and sets the status to `Cancelled`, atomically. Does not
    /// authorize; callers check ownership first. Fails with [`OrderGatewayError::OrderNotCancellable`] when the order
    /// is in a terminal state, and with [`OrderGatewayError::RefundFailed`] (rolling everything back) when the
    /// credit cannot be applied.
    async fn cancel_order(&self, id: OrderId) -> Result<Order, OrderGatewayError>;

    /// A plain forward progression of the fulfilment status (`Created → Paid → Preparing → Delivering → Delivered`).
    /// `Cancelled` is rejected here; cancellation must go through [`cancel_order`][Self::cancel_order] so the refund
    /// cannot be skipped.
    async fn update_order_status(&self, id: OrderId, status: OrderStatusType) -> Result<Order, OrderGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), OrderGatewayError> {
        Ok(())
    }
}

/// The coarse classification of a failure, for boundary layers mapping errors onto user-facing statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Authorization,
    Conflict,
    Internal,
}

#[derive(Debug, Clone, Error)]
pub enum OrderGatewayError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested restaurant {0} does not exist")]
    RestaurantNotFound(RestaurantId),
    #[error("Invalid line reference: {0}")]
    InvalidReference(String),
    #[error("Malformed order line: {0}")]
    MalformedLine(String),
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Money),
    #[error("Insufficient funds. Available: {available}, required: {required}")]
    InsufficientFunds { available: Money, required: Money },
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("You do not have permission to perform this action. {0}")]
    Forbidden(String),
    #[error("Order {0} can no longer be cancelled")]
    OrderNotCancellable(OrderId),
    #[error("Refunding order {0} failed; the cancellation has been rolled back")]
    RefundFailed(OrderId),
    #[error("Order status cannot change from {from} to {to}")]
    InvalidStatusChange { from: OrderStatusType, to: OrderStatusType },
    #[error("{0}")]
    QueryError(String),
}

impl OrderGatewayError {
    pub fn kind(&self) -> ErrorKind {
        use OrderGatewayError::*;
        match self {
            RestaurantNotFound(_) | OrderNotFound(_) => ErrorKind::NotFound,
            InvalidReference(_) | MalformedLine(_) | InvalidAmount(_) | InvalidStatusChange { .. } |
            QueryError(_) => ErrorKind::Validation,
            Forbidden(_) => ErrorKind::Authorization,
            InsufficientFunds { .. } | OrderNotCancellable(_) | RefundFailed(_) => ErrorKind::Conflict,
            DatabaseError(_) => ErrorKind::Internal,
        }
    }
}

impl From<sqlx::Error> for OrderGatewayError {
    fn from(e: sqlx::Error) -> Self {
        OrderGatewayError::DatabaseError(e.to_string())
    }
}

impl From<WalletApiError> for OrderGatewayError {
    fn from(e: WalletApiError) -> Self {
        match e {
            WalletApiError::DatabaseError(msg) => OrderGatewayError::DatabaseError(msg),
            WalletApiError::InvalidAmount(amount) => OrderGatewayError::InvalidAmount(amount),
            WalletApiError::InsufficientFunds { available, required } => {
                OrderGatewayError::InsufficientFunds { available, required }
            },
            WalletApiError::Forbidden(msg) => OrderGatewayError::Forbidden(msg),
        }
    }
}

impl From<CatalogApiError> for OrderGatewayError {
    fn from(e: CatalogApiError) -> Self {
        match e {
            CatalogApiError::DatabaseError(msg) => OrderGatewayError::DatabaseError(msg),
            CatalogApiError::RestaurantNotFound(id) => OrderGatewayError::RestaurantNotFound(id),
            other => OrderGatewayError::InvalidReference(other.to_string()),
        }
    }
}

impl From<OrderApiError> for OrderGatewayError {
    fn from(e: OrderApiError) -> Self {
        match e {
            OrderApiError::DatabaseError(msg) => OrderGatewayError::DatabaseError(msg),
            OrderApiError::QueryError(msg) => OrderGatewayError::QueryError(msg),
        }
    }
}

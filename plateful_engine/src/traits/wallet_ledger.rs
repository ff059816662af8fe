use plateful_common::Money;
use thiserror::Error;

use crate::db_types::LedgerKey;

#[derive(Debug, Clone, Error)]
pub enum WalletApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Money),
    #[error("Insufficient funds. Available: {available}, required: {required}")]
    InsufficientFunds { available: Money, required: Money },
    #[error("You do not have permission to access this wallet. {0}")]
    Forbidden(String),
}

impl From<sqlx::Error> for WalletApiError {
    fn from(e: sqlx::Error) -> Self {
        WalletApiError::DatabaseError(e.to_string())
    }
}

/// The `WalletLedger` trait defines the funds store: one non-negative balance per [`LedgerKey`].
///
/// Every method must be atomic with respect to concurrent callers on the same key. In particular, two concurrent
/// debits may never both succeed when their sum exceeds the balance; this is the core correctness property of the
/// whole engine.
#[allow(async_fn_in_trait)]
pub trait WalletLedger {
    /// Returns the balance for the given key, materializing a zero-balance wallet if none exists yet. Idempotent.
    async fn balance(&self, key: &LedgerKey) -> Result<Money, WalletApiError>;

    /// Adds `amount` to the balance, creating the wallet if absent. Fails with [`WalletApiError::InvalidAmount`] if
    /// the amount is not positive. Returns the new balance.
    async fn credit(&self, key: &LedgerKey, amount: Money) -> Result<Money, WalletApiError>;

    /// Subtracts `amount` from the balance. Fails with [`WalletApiError::InvalidAmount`] if the amount is not
    /// positive, and with [`WalletApiError::InsufficientFunds`] (leaving the balance untouched) if the balance
    /// cannot cover it. Returns the new balance.
    async fn debit(&self, key: &LedgerKey, amount: Money) -> Result<Money, WalletApiError>;
}

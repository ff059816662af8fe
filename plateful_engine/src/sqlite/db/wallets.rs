use log::{debug, trace};
use plateful_common::Money;
use sqlx::SqliteConnection;

use crate::{db_types::LedgerKey, traits::WalletApiError};

/// Materializes a zero-balance wallet for the key if none exists yet. Idempotent; the UNIQUE constraint on
/// `ledger_key` guarantees at most one row per key even under concurrent callers.
async fn ensure_wallet(key: &LedgerKey, conn: &mut SqliteConnection) -> Result<(), WalletApiError> {
    let result = sqlx::query("INSERT OR IGNORE INTO wallets (ledger_key) VALUES ($1)")
        .bind(key.as_str())
        .execute(conn)
        .await?;
    if result.rows_affected() > 0 {
        debug!("💳️ Materialized zero-balance wallet for {key}");
    }
    Ok(())
}

/// Returns the balance for the key, creating the wallet at zero if it does not exist yet.
pub async fn balance(key: &LedgerKey, conn: &mut SqliteConnection) -> Result<Money, WalletApiError> {
    ensure_wallet(key, &mut *conn).await?;
    let balance: Money =
        sqlx::query_scalar("SELECT balance FROM wallets WHERE ledger_key = $1").bind(key.as_str()).fetch_one(conn).await?;
    Ok(balance)
}

/// Adds `amount` to the wallet (creating it if absent) and returns the new balance.
pub async fn credit(key: &LedgerKey, amount: Money, conn: &mut SqliteConnection) -> Result<Money, WalletApiError> {
    if !amount.is_positive() {
        return Err(WalletApiError::InvalidAmount(amount));
    }
    ensure_wallet(key, &mut *conn).await?;
    let new_balance: Money = sqlx::query_scalar(
        "UPDATE wallets SET balance = balance + $1, updated_at = CURRENT_TIMESTAMP WHERE ledger_key = $2 RETURNING \
         balance",
    )
    .bind(amount)
    .bind(key.as_str())
    .fetch_one(conn)
    .await?;
    trace!("💳️ Credited {amount} to {key}. New balance: {new_balance}");
    Ok(new_balance)
}

/// Subtracts `amount` from the wallet if, and only if, the balance covers it.
///
/// The sufficiency check and the subtraction are a single conditional UPDATE, so two racing debits can never jointly
/// overdraw the wallet: the second one simply matches no row and fails with `InsufficientFunds`.
pub async fn debit(key: &LedgerKey, amount: Money, conn: &mut SqliteConnection) -> Result<Money, WalletApiError> {
    if !amount.is_positive() {
        return Err(WalletApiError::InvalidAmount(amount));
    }
    ensure_wallet(key, &mut *conn).await?;
    let result: Option<Money> = sqlx::query_scalar(
        "UPDATE wallets SET balance = balance - $1, updated_at = CURRENT_TIMESTAMP WHERE ledger_key = $2 AND balance \
         >= $1 RETURNING balance",
    )
    .bind(amount)
    .bind(key.as_str())
    .fetch_optional(&mut *conn)
    .await?;
    match result {
        Some(new_balance) => {
            trace!("💳️ Debited {amount} from {key}. New balance: {new_balance}");
            Ok(new_balance)
        },
        None => {
            let available: Money = sqlx::query_scalar("SELECT balance FROM wallets WHERE ledger_key = $1")
                .bind(key.as_str())
                .fetch_one(conn)
                .await?;
            debug!("💳️ Debit of {amount} from {key} refused. Available: {available}");
            Err(WalletApiError::InsufficientFunds { available, required: amount })
        },
    }
}

/// The number of wallet rows stored for the key. Exists for the materialization tests.
pub async fn wallet_count(key: &LedgerKey, conn: &mut SqliteConnection) -> Result<i64, WalletApiError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM wallets WHERE ledger_key = $1")
        .bind(key.as_str())
        .fetch_one(conn)
        .await?;
    Ok(count)
}

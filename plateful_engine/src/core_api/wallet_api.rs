use std::fmt::Debug;

use log::*;
use plateful_common::Money;

use crate::{
    db_types::{LedgerKey, Principal},
    traits::{WalletApiError, WalletLedger},
};

/// The wallet surface: balance queries, top-ups and administrative adjustments.
///
/// Order-related debits and refunds never come through here; they happen inside the order transaction on
/// [`OrderGatewayDatabase`][crate::traits::OrderGatewayDatabase].
pub struct WalletApi<B> {
    db: B,
}

impl<B> Debug for WalletApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WalletApi")
    }
}

impl<B> WalletApi<B>
where B: WalletLedger
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The caller's own balance. Materializes a zero-balance wallet on first call.
    pub async fn my_balance(&self, who: &Principal) -> Result<Money, WalletApiError> {
        self.db.balance(&who.ledger_key()).await
    }

    /// The balance under `key`. Callers may read their own wallet; admins may read any.
    pub async fn balance_of(&self, who: &Principal, key: &LedgerKey) -> Result<Money, WalletApiError> {
        if !(who.is_admin() || who.ledger_key() == *key) {
            return Err(WalletApiError::Forbidden(format!("{who} may not read wallet {key}")));
        }
        self.db.balance(key).await
    }

    /// Tops up a wallet. Callers may credit their own wallet; admins may credit any. Returns the new balance.
    pub async fn credit(&self, who: &Principal, key: &LedgerKey, amount: Money) -> Result<Money, WalletApiError> {
        if !(who.is_admin() || who.ledger_key() == *key) {
            return Err(WalletApiError::Forbidden(format!("{who} may not credit wallet {key}")));
        }
        let balance = self.db.credit(key, amount).await?;
        info!("💳️ {who} credited {amount} to {key}. New balance: {balance}");
        Ok(balance)
    }

    /// An administrative debit, for corrections. Admin only; ordinary spending happens through order placement.
    pub async fn debit(&self, who: &Principal, key: &LedgerKey, amount: Money) -> Result<Money, WalletApiError> {
        if !who.is_admin() {
            return Err(WalletApiError::Forbidden(format!("{who} may not debit wallet {key}")));
        }
        let balance = self.db.debit(key, amount).await?;
        info!("💳️ {who} debited {amount} from {key}. New balance: {balance}");
        Ok(balance)
    }
}

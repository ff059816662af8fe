//! `SqliteDatabase` is the concrete SQLite implementation of the ordering engine backend.
//!
//! It implements all the traits defined in the [`crate::traits`] module. The low-level SQL lives in [`super::db`];
//! this layer owns the pool and draws the transaction boundaries.
use std::fmt::Debug;

use log::*;
use plateful_common::Money;
use sqlx::SqlitePool;

use super::db::{catalog, db_url, new_pool, orders, restaurants, wallets};
use crate::{
    core_api::{
        order_objects::OrderQueryFilter,
        pricing::{total_of, validate_line, LineRef, PricedLine},
    },
    db_types::{
        CatalogItem,
        ComboId,
        ComboMenu,
        ItemId,
        LedgerKey,
        NewCatalogItem,
        NewComboMenu,
        NewOrder,
        NewRestaurant,
        Order,
        OrderId,
        OrderLine,
        OrderStatusType,
        Restaurant,
        RestaurantId,
        UpdateCatalogItem,
        UpdateComboMenu,
        UpdateRestaurant,
    },
    helpers::new_order_number,
    traits::{
        CatalogApiError,
        CatalogManagement,
        OrderApiError,
        OrderGatewayDatabase,
        OrderGatewayError,
        OrderManagement,
        WalletApiError,
        WalletLedger,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new connection pool using the URL from the `PLATEFUL_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        debug!("🗃️ Connected to database {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl OrderGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Takes a new order request, and in a single atomic transaction,
    /// * confirms that the restaurant exists and is taking orders,
    /// * resolves every line against the live catalog, snapshotting each unit price,
    /// * debits the buyer's wallet for the exact total,
    /// * persists the order header and its lines.
    ///
    /// If any step fails (an invalid reference, an empty wallet) the transaction rolls back and no trace of the
    /// order remains.
    async fn create_order(&self, order: NewOrder) -> Result<(Order, Vec<OrderLine>), OrderGatewayError> {
        if order.lines.is_empty() {
            return Err(OrderGatewayError::MalformedLine("an order must contain at least one line".to_string()));
        }
        let mut tx = self.pool.begin().await?;
        if !restaurants::restaurant_is_active(order.restaurant_id, &mut tx).await? {
            return Err(OrderGatewayError::RestaurantNotFound(order.restaurant_id));
        }
        let mut priced = Vec::with_capacity(order.lines.len());
        for spec in &order.lines {
            let unit_price = match validate_line(spec)? {
                LineRef::Item(item_id) => catalog::resolve_item(order.restaurant_id, item_id, &mut tx)
                    .await?
                    .ok_or_else(|| {
                        OrderGatewayError::InvalidReference(format!(
                            "item {item_id} of restaurant {}",
                            order.restaurant_id
                        ))
                    })?,
                LineRef::Combo(combo_id) => {
                    catalog::resolve_combo(order.restaurant_id, combo_id, &mut tx)
                        .await?
                        .ok_or_else(|| {
                            OrderGatewayError::InvalidReference(format!(
                                "combo {combo_id} of restaurant {}",
                                order.restaurant_id
                            ))
                        })?
                        .0
                },
            };
            priced.push(PricedLine { spec: spec.clone(), unit_price });
        }
        let total = total_of(&priced);
        wallets::debit(&order.ledger_key, total, &mut tx).await?;
        let order_number = new_order_number();
        let (header, lines) = orders::insert_order(&order, order_number, total, &priced, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {} saved. {total} debited from {}", header.order_number, order.ledger_key);
        Ok((header, lines))
    }

    /// Cancels an order in a single atomic transaction: the order total is credited back to the owner's wallet and
    /// the status moves to `Cancelled`. If the refund cannot be applied, the whole transaction rolls back and the
    /// order keeps its current status.
    async fn cancel_order(&self, id: OrderId) -> Result<Order, OrderGatewayError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order(id, &mut tx).await?.ok_or(OrderGatewayError::OrderNotFound(id))?;
        if !order.status.is_cancellable() {
            return Err(OrderGatewayError::OrderNotCancellable(id));
        }
        let key = LedgerKey::account(order.account_id);
        wallets::credit(&key, order.total_price, &mut tx).await.map_err(|e| {
            warn!("🗃️ Refund of {} to {key} for order {id} failed: {e}", order.total_price);
            OrderGatewayError::RefundFailed(id)
        })?;
        let order = orders::update_order_status(id, OrderStatusType::Cancelled, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {} cancelled. {} refunded to {key}", order.order_number, order.total_price);
        Ok(order)
    }

    async fn update_order_status(&self, id: OrderId, status: OrderStatusType) -> Result<Order, OrderGatewayError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order(id, &mut tx).await?.ok_or(OrderGatewayError::OrderNotFound(id))?;
        if !order.status.can_progress_to(status) {
            return Err(OrderGatewayError::InvalidStatusChange { from: order.status, to: status });
        }
        let order = orders::update_order_status(id, status, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn close(&mut self) -> Result<(), OrderGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}

// Every mutating method below commits an explicit transaction before returning, so the write is visible to any other
// pool connection as soon as the caller gets its result back. Plain reads stay on acquired connections.
impl WalletLedger for SqliteDatabase {
    async fn balance(&self, key: &LedgerKey) -> Result<Money, WalletApiError> {
        // may materialize the wallet row, so it commits like a write
        let mut tx = self.pool.begin().await?;
        let balance = wallets::balance(key, &mut tx).await?;
        tx.commit().await?;
        Ok(balance)
    }

    async fn credit(&self, key: &LedgerKey, amount: Money) -> Result<Money, WalletApiError> {
        let mut tx = self.pool.begin().await?;
        let balance = wallets::credit(key, amount, &mut tx).await?;
        tx.commit().await?;
        Ok(balance)
    }

    async fn debit(&self, key: &LedgerKey, amount: Money) -> Result<Money, WalletApiError> {
        let mut tx = self.pool.begin().await?;
        let balance = wallets::debit(key, amount, &mut tx).await?;
        tx.commit().await?;
        Ok(balance)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn create_restaurant(&self, restaurant: NewRestaurant) -> Result<Restaurant, CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        let restaurant = restaurants::insert_restaurant(restaurant, &mut tx).await?;
        tx.commit().await?;
        Ok(restaurant)
    }

    async fn fetch_restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        restaurants::fetch_restaurant(id, &mut conn).await
    }

    async fn fetch_restaurants(&self) -> Result<Vec<Restaurant>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        restaurants::fetch_restaurants(&mut conn).await
    }

    async fn update_restaurant(
        &self,
        id: RestaurantId,
        update: UpdateRestaurant,
    ) -> Result<Restaurant, CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        let restaurant = restaurants::update_restaurant(id, update, &mut tx).await?;
        tx.commit().await?;
        Ok(restaurant)
    }

    async fn create_item(&self, item: NewCatalogItem) -> Result<CatalogItem, CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        if restaurants::fetch_restaurant(item.restaurant_id, &mut tx).await?.is_none() {
            return Err(CatalogApiError::RestaurantNotFound(item.restaurant_id));
        }
        let item = catalog::insert_item(item, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn fetch_item(&self, id: ItemId) -> Result<Option<CatalogItem>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        catalog::fetch_item(id, &mut conn).await
    }

    async fn fetch_items_for_restaurant(&self, id: RestaurantId) -> Result<Vec<CatalogItem>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        catalog::fetch_items_for_restaurant(id, &mut conn).await
    }

    async fn update_item(&self, id: ItemId, update: UpdateCatalogItem) -> Result<CatalogItem, CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        let item = catalog::update_item(id, update, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn delete_item(&self, id: ItemId) -> Result<(), CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        catalog::delete_item(id, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Combo creation touches the combo row and its member links; it runs in its own transaction.
    async fn create_combo(&self, combo: NewComboMenu) -> Result<ComboMenu, CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        if restaurants::fetch_restaurant(combo.restaurant_id, &mut tx).await?.is_none() {
            return Err(CatalogApiError::RestaurantNotFound(combo.restaurant_id));
        }
        let combo = catalog::insert_combo(combo, &mut tx).await?;
        tx.commit().await?;
        Ok(combo)
    }

    async fn fetch_combo(&self, id: ComboId) -> Result<Option<ComboMenu>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        catalog::fetch_combo(id, &mut conn).await
    }

    async fn fetch_combos_for_restaurant(&self, id: RestaurantId) -> Result<Vec<ComboMenu>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        catalog::fetch_combos_for_restaurant(id, &mut conn).await
    }

    async fn update_combo(&self, id: ComboId, update: UpdateComboMenu) -> Result<ComboMenu, CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        let combo = catalog::update_combo(id, update, &mut tx).await?;
        tx.commit().await?;
        Ok(combo)
    }

    async fn delete_combo(&self, id: ComboId) -> Result<(), CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        catalog::delete_combo(id, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn resolve_item(
        &self,
        restaurant_id: RestaurantId,
        item_id: ItemId,
    ) -> Result<Option<Money>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        catalog::resolve_item(restaurant_id, item_id, &mut conn).await
    }

    async fn resolve_combo(
        &self,
        restaurant_id: RestaurantId,
        combo_id: ComboId,
    ) -> Result<Option<(Money, Vec<ItemId>)>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        catalog::resolve_combo(restaurant_id, combo_id, &mut conn).await
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_lines(&self, id: OrderId) -> Result<Vec<OrderLine>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let lines = orders::fetch_order_lines(id, &mut conn).await?;
        Ok(lines)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }
}

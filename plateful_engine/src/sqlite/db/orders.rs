use log::{debug, trace};
use plateful_common::Money;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    core_api::{order_objects::OrderQueryFilter, pricing::PricedLine},
    db_types::{NewOrder, Order, OrderId, OrderLine, OrderNumber, OrderStatusType},
    traits::OrderGatewayError,
};

/// Inserts the order header and one line per priced spec. Not atomic on its own; the coordinator wraps this, the
/// wallet debit and the pricing reads in a single transaction.
pub async fn insert_order(
    order: &NewOrder,
    order_number: OrderNumber,
    total_price: Money,
    lines: &[PricedLine],
    conn: &mut SqliteConnection,
) -> Result<(Order, Vec<OrderLine>), OrderGatewayError> {
    let header: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                account_id,
                restaurant_id,
                customer_name,
                customer_phone,
                delivery_address,
                total_price
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(order_number)
    .bind(order.account_id)
    .bind(order.restaurant_id)
    .bind(&order.delivery.customer_name)
    .bind(&order.delivery.customer_phone)
    .bind(&order.delivery.delivery_address)
    .bind(total_price)
    .fetch_one(&mut *conn)
    .await?;
    let mut persisted = Vec::with_capacity(lines.len());
    for line in lines {
        let row: OrderLine = sqlx::query_as(
            "INSERT INTO order_lines (order_id, item_id, combo_id, quantity, unit_price) VALUES ($1, $2, $3, $4, $5) \
             RETURNING *",
        )
        .bind(header.id)
        .bind(line.spec.item_id)
        .bind(line.spec.combo_id)
        .bind(line.spec.quantity)
        .bind(line.unit_price)
        .fetch_one(&mut *conn)
        .await?;
        persisted.push(row);
    }
    debug!("📝️ Order {} inserted with id {} ({} lines, total {total_price})", header.order_number, header.id, persisted.len());
    Ok((header, persisted))
}

pub async fn fetch_order(id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_lines(id: OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderLine>, sqlx::Error> {
    let lines = sqlx::query_as("SELECT * FROM order_lines WHERE order_id = $1 ORDER BY id ASC")
        .bind(id)
        .fetch_all(conn)
        .await?;
    Ok(lines)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`.
///
/// Resulting orders are ordered by `created_at` in descending order.
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(account_id) = query.account_id {
        where_clause.push("account_id = ");
        where_clause.push_bind_unseparated(account_id);
    }
    if let Some(restaurant_id) = query.restaurant_id {
        where_clause.push("restaurant_id = ");
        where_clause.push_bind_unseparated(restaurant_id);
    }
    if let Some(order_number) = query.order_number {
        where_clause.push("order_number = ");
        where_clause.push_bind_unseparated(order_number.0);
    }
    if let Some(statuses) = query.status.as_ref().filter(|s| !s.is_empty()) {
        where_clause.push("status IN (");
        for (i, status) in statuses.iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status.to_string());
        }
        where_clause.push_unseparated(")");
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at DESC");
    trace!("📝️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("📝️ Result of search_orders: {} rows", orders.len());
    Ok(orders)
}

pub(crate) async fn update_order_status(
    id: OrderId,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderGatewayError> {
    let status = status.to_string();
    let result: Option<Order> =
        sqlx::query_as("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(status)
            .bind(id)
            .fetch_optional(conn)
            .await?;
    result.ok_or(OrderGatewayError::OrderNotFound(id))
}

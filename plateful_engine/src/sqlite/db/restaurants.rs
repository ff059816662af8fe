use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewRestaurant, Restaurant, RestaurantId, UpdateRestaurant},
    traits::CatalogApiError,
};

pub async fn insert_restaurant(
    restaurant: NewRestaurant,
    conn: &mut SqliteConnection,
) -> Result<Restaurant, CatalogApiError> {
    let restaurant: Restaurant =
        sqlx::query_as("INSERT INTO restaurants (name, address, phone) VALUES ($1, $2, $3) RETURNING *")
            .bind(restaurant.name)
            .bind(restaurant.address)
            .bind(restaurant.phone)
            .fetch_one(conn)
            .await?;
    debug!("🍽️ Restaurant '{}' registered with id {}", restaurant.name, restaurant.id);
    Ok(restaurant)
}

pub async fn fetch_restaurant(
    id: RestaurantId,
    conn: &mut SqliteConnection,
) -> Result<Option<Restaurant>, CatalogApiError> {
    let restaurant =
        sqlx::query_as("SELECT * FROM restaurants WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(restaurant)
}

pub async fn fetch_restaurants(conn: &mut SqliteConnection) -> Result<Vec<Restaurant>, CatalogApiError> {
    let restaurants = sqlx::query_as("SELECT * FROM restaurants ORDER BY name ASC").fetch_all(conn).await?;
    Ok(restaurants)
}

/// Whether the restaurant exists *and* is active. Inactive restaurants cannot take orders.
pub async fn restaurant_is_active(id: RestaurantId, conn: &mut SqliteConnection) -> Result<bool, CatalogApiError> {
    let active: Option<bool> =
        sqlx::query_scalar("SELECT is_active FROM restaurants WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(active.unwrap_or(false))
}

pub async fn update_restaurant(
    id: RestaurantId,
    update: UpdateRestaurant,
    conn: &mut SqliteConnection,
) -> Result<Restaurant, CatalogApiError> {
    if update.is_empty() {
        return Err(CatalogApiError::UpdateNoOp);
    }
    let mut builder = sqlx::QueryBuilder::new("UPDATE restaurants SET updated_at = CURRENT_TIMESTAMP, ");
    let mut set_clause = builder.separated(", ");
    if let Some(name) = update.name {
        set_clause.push("name = ");
        set_clause.push_bind_unseparated(name);
    }
    if let Some(address) = update.address {
        set_clause.push("address = ");
        set_clause.push_bind_unseparated(address);
    }
    if let Some(phone) = update.phone {
        set_clause.push("phone = ");
        set_clause.push_bind_unseparated(phone);
    }
    if let Some(is_active) = update.is_active {
        set_clause.push("is_active = ");
        set_clause.push_bind_unseparated(is_active);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");
    trace!("🍽️ Executing query: {}", builder.sql());
    let restaurant = builder
        .build_query_as::<Restaurant>()
        .fetch_optional(conn)
        .await?
        .ok_or(CatalogApiError::RestaurantNotFound(id))?;
    Ok(restaurant)
}

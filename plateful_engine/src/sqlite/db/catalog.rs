use chrono::{DateTime, Utc};
use log::{debug, trace};
use plateful_common::Money;
use sqlx::{FromRow, QueryBuilder, SqliteConnection};

use crate::{
    db_types::{
        CatalogItem,
        ComboId,
        ComboMenu,
        ItemId,
        NewCatalogItem,
        NewComboMenu,
        RestaurantId,
        UpdateCatalogItem,
        UpdateComboMenu,
    },
    traits::CatalogApiError,
};

//--------------------------------------       Items         ---------------------------------------------------------

pub async fn insert_item(item: NewCatalogItem, conn: &mut SqliteConnection) -> Result<CatalogItem, CatalogApiError> {
    let item: CatalogItem = sqlx::query_as(
        "INSERT INTO catalog_items (restaurant_id, name, description, price, category) VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(item.restaurant_id)
    .bind(item.name)
    .bind(item.description)
    .bind(item.price)
    .bind(item.category.to_string())
    .fetch_one(conn)
    .await?;
    debug!("🍜️ Item '{}' added to restaurant {} at {}", item.name, item.restaurant_id, item.price);
    Ok(item)
}

pub async fn fetch_item(id: ItemId, conn: &mut SqliteConnection) -> Result<Option<CatalogItem>, CatalogApiError> {
    let item = sqlx::query_as("SELECT * FROM catalog_items WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(item)
}

pub async fn fetch_items_for_restaurant(
    restaurant_id: RestaurantId,
    conn: &mut SqliteConnection,
) -> Result<Vec<CatalogItem>, CatalogApiError> {
    let items = sqlx::query_as("SELECT * FROM catalog_items WHERE restaurant_id = $1 ORDER BY name ASC")
        .bind(restaurant_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

pub async fn update_item(
    id: ItemId,
    update: UpdateCatalogItem,
    conn: &mut SqliteConnection,
) -> Result<CatalogItem, CatalogApiError> {
    if update.is_empty() {
        return Err(CatalogApiError::UpdateNoOp);
    }
    let mut builder = QueryBuilder::new("UPDATE catalog_items SET updated_at = CURRENT_TIMESTAMP, ");
    let mut set_clause = builder.separated(", ");
    if let Some(name) = update.name {
        set_clause.push("name = ");
        set_clause.push_bind_unseparated(name);
    }
    if let Some(description) = update.description {
        set_clause.push("description = ");
        set_clause.push_bind_unseparated(description);
    }
    if let Some(price) = update.price {
        set_clause.push("price = ");
        set_clause.push_bind_unseparated(price);
    }
    if let Some(category) = update.category {
        set_clause.push("category = ");
        set_clause.push_bind_unseparated(category.to_string());
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");
    trace!("🍜️ Executing query: {}", builder.sql());
    let item =
        builder.build_query_as::<CatalogItem>().fetch_optional(conn).await?.ok_or(CatalogApiError::ItemNotFound(id))?;
    Ok(item)
}

pub async fn delete_item(id: ItemId, conn: &mut SqliteConnection) -> Result<(), CatalogApiError> {
    let result = sqlx::query("DELETE FROM catalog_items WHERE id = $1").bind(id).execute(conn).await?;
    if result.rows_affected() == 0 {
        return Err(CatalogApiError::ItemNotFound(id));
    }
    debug!("🍜️ Item {id} deleted");
    Ok(())
}

/// Resolves an item reference to its unit price. Returns `None` when the item is missing or belongs to another
/// restaurant; the caller must treat both cases identically.
pub async fn resolve_item(
    restaurant_id: RestaurantId,
    item_id: ItemId,
    conn: &mut SqliteConnection,
) -> Result<Option<Money>, CatalogApiError> {
    let price: Option<Money> =
        sqlx::query_scalar("SELECT price FROM catalog_items WHERE id = $1 AND restaurant_id = $2")
            .bind(item_id)
            .bind(restaurant_id)
            .fetch_optional(conn)
            .await?;
    Ok(price)
}

//--------------------------------------       Combos        ---------------------------------------------------------

#[derive(Debug, Clone, FromRow)]
struct ComboRow {
    id: ComboId,
    restaurant_id: RestaurantId,
    name: String,
    description: Option<String>,
    price: Money,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ComboRow {
    fn into_combo(self, item_ids: Vec<ItemId>) -> ComboMenu {
        ComboMenu {
            id: self.id,
            restaurant_id: self.restaurant_id,
            name: self.name,
            description: self.description,
            price: self.price,
            item_ids,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Verifies that every id in `item_ids` names an existing item of `restaurant_id`. The first offending id is
/// reported; an empty member set is rejected outright.
async fn check_members(
    restaurant_id: RestaurantId,
    item_ids: &[ItemId],
    conn: &mut SqliteConnection,
) -> Result<(), CatalogApiError> {
    if item_ids.is_empty() {
        return Err(CatalogApiError::EmptyCombo);
    }
    for item_id in item_ids {
        let owned: Option<RestaurantId> =
            sqlx::query_scalar("SELECT restaurant_id FROM catalog_items WHERE id = $1")
                .bind(item_id)
                .fetch_optional(&mut *conn)
                .await?;
        match owned {
            None => return Err(CatalogApiError::ItemNotFound(*item_id)),
            Some(owner) if owner != restaurant_id => {
                return Err(CatalogApiError::ForeignItem { item_id: *item_id, restaurant_id })
            },
            Some(_) => {},
        }
    }
    Ok(())
}

async fn member_ids(combo_id: ComboId, conn: &mut SqliteConnection) -> Result<Vec<ItemId>, CatalogApiError> {
    let ids: Vec<ItemId> =
        sqlx::query_scalar("SELECT item_id FROM combo_menu_items WHERE combo_id = $1 ORDER BY item_id ASC")
            .bind(combo_id)
            .fetch_all(conn)
            .await?;
    Ok(ids)
}

async fn replace_members(
    combo_id: ComboId,
    item_ids: &[ItemId],
    conn: &mut SqliteConnection,
) -> Result<(), CatalogApiError> {
    sqlx::query("DELETE FROM combo_menu_items WHERE combo_id = $1").bind(combo_id).execute(&mut *conn).await?;
    for item_id in item_ids {
        sqlx::query("INSERT OR IGNORE INTO combo_menu_items (combo_id, item_id) VALUES ($1, $2)")
            .bind(combo_id)
            .bind(item_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Inserts a combo and its member links. Not atomic on its own; run it inside a transaction.
pub async fn insert_combo(combo: NewComboMenu, conn: &mut SqliteConnection) -> Result<ComboMenu, CatalogApiError> {
    check_members(combo.restaurant_id, &combo.item_ids, &mut *conn).await?;
    let row: ComboRow = sqlx::query_as(
        "INSERT INTO combo_menus (restaurant_id, name, description, price) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(combo.restaurant_id)
    .bind(combo.name)
    .bind(combo.description)
    .bind(combo.price)
    .fetch_one(&mut *conn)
    .await?;
    replace_members(row.id, &combo.item_ids, &mut *conn).await?;
    debug!("🍱️ Combo '{}' created for restaurant {} at {}", row.name, row.restaurant_id, row.price);
    let item_ids = member_ids(row.id, conn).await?;
    Ok(row.into_combo(item_ids))
}

pub async fn fetch_combo(id: ComboId, conn: &mut SqliteConnection) -> Result<Option<ComboMenu>, CatalogApiError> {
    let row: Option<ComboRow> =
        sqlx::query_as("SELECT * FROM combo_menus WHERE id = $1").bind(id).fetch_optional(&mut *conn).await?;
    match row {
        Some(row) => {
            let item_ids = member_ids(row.id, conn).await?;
            Ok(Some(row.into_combo(item_ids)))
        },
        None => Ok(None),
    }
}

pub async fn fetch_combos_for_restaurant(
    restaurant_id: RestaurantId,
    conn: &mut SqliteConnection,
) -> Result<Vec<ComboMenu>, CatalogApiError> {
    let rows: Vec<ComboRow> =
        sqlx::query_as("SELECT * FROM combo_menus WHERE restaurant_id = $1 ORDER BY name ASC")
            .bind(restaurant_id)
            .fetch_all(&mut *conn)
            .await?;
    let mut combos = Vec::with_capacity(rows.len());
    for row in rows {
        let item_ids = member_ids(row.id, &mut *conn).await?;
        combos.push(row.into_combo(item_ids));
    }
    Ok(combos)
}

/// Updates a combo. When `item_ids` is present, the member set is replaced wholesale, with the same invariants as on
/// creation. Not atomic on its own; run it inside a transaction.
pub async fn update_combo(
    id: ComboId,
    update: UpdateComboMenu,
    conn: &mut SqliteConnection,
) -> Result<ComboMenu, CatalogApiError> {
    if update.is_empty() {
        return Err(CatalogApiError::UpdateNoOp);
    }
    let row: Option<ComboRow> =
        sqlx::query_as("SELECT * FROM combo_menus WHERE id = $1").bind(id).fetch_optional(&mut *conn).await?;
    let row = row.ok_or(CatalogApiError::ComboNotFound(id))?;
    if let Some(item_ids) = &update.item_ids {
        check_members(row.restaurant_id, item_ids, &mut *conn).await?;
        replace_members(id, item_ids, &mut *conn).await?;
    }
    let has_field_updates =
        update.name.is_some() || update.description.is_some() || update.price.is_some();
    let row = if has_field_updates {
        let mut builder = QueryBuilder::new("UPDATE combo_menus SET updated_at = CURRENT_TIMESTAMP, ");
        let mut set_clause = builder.separated(", ");
        if let Some(name) = update.name {
            set_clause.push("name = ");
            set_clause.push_bind_unseparated(name);
        }
        if let Some(description) = update.description {
            set_clause.push("description = ");
            set_clause.push_bind_unseparated(description);
        }
        if let Some(price) = update.price {
            set_clause.push("price = ");
            set_clause.push_bind_unseparated(price);
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" RETURNING *");
        trace!("🍱️ Executing query: {}", builder.sql());
        builder.build_query_as::<ComboRow>().fetch_optional(&mut *conn).await?.ok_or(CatalogApiError::ComboNotFound(id))?
    } else {
        row
    };
    let item_ids = member_ids(id, conn).await?;
    Ok(row.into_combo(item_ids))
}

pub async fn delete_combo(id: ComboId, conn: &mut SqliteConnection) -> Result<(), CatalogApiError> {
    let result = sqlx::query("DELETE FROM combo_menus WHERE id = $1").bind(id).execute(conn).await?;
    if result.rows_affected() == 0 {
        return Err(CatalogApiError::ComboNotFound(id));
    }
    debug!("🍱️ Combo {id} deleted");
    Ok(())
}

/// Resolves a combo reference to its stored (operator-assigned) price and member ids, with the same ownership
/// semantics as [`resolve_item`].
pub async fn resolve_combo(
    restaurant_id: RestaurantId,
    combo_id: ComboId,
    conn: &mut SqliteConnection,
) -> Result<Option<(Money, Vec<ItemId>)>, CatalogApiError> {
    let price: Option<Money> = sqlx::query_scalar("SELECT price FROM combo_menus WHERE id = $1 AND restaurant_id = $2")
        .bind(combo_id)
        .bind(restaurant_id)
        .fetch_optional(&mut *conn)
        .await?;
    match price {
        Some(price) => {
            let items = member_ids(combo_id, conn).await?;
            Ok(Some((price, items)))
        },
        None => Ok(None),
    }
}

use plateful_common::Money;
use thiserror::Error;

use crate::db_types::{
    CatalogItem,
    ComboId,
    ComboMenu,
    ItemId,
    NewCatalogItem,
    NewComboMenu,
    NewRestaurant,
    Restaurant,
    RestaurantId,
    UpdateCatalogItem,
    UpdateComboMenu,
    UpdateRestaurant,
};

#[derive(Debug, Clone, Error)]
pub enum CatalogApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested restaurant {0} does not exist")]
    RestaurantNotFound(RestaurantId),
    #[error("The requested item {0} does not exist")]
    ItemNotFound(ItemId),
    #[error("The requested combo menu {0} does not exist")]
    ComboNotFound(ComboId),
    #[error("A combo menu must contain at least one item")]
    EmptyCombo,
    #[error("Item {item_id} does not belong to restaurant {restaurant_id}")]
    ForeignItem { item_id: ItemId, restaurant_id: RestaurantId },
    #[error("You do not have permission to manage this catalog. {0}")]
    Forbidden(String),
    #[error("The requested change would result in a no-op")]
    UpdateNoOp,
}

impl From<sqlx::Error> for CatalogApiError {
    fn from(e: sqlx::Error) -> Self {
        CatalogApiError::DatabaseError(e.to_string())
    }
}

/// The `CatalogManagement` trait defines the menu store: restaurants, their sellable items and their combo menus.
///
/// The order core only ever *reads* this data, via [`resolve_item`][CatalogManagement::resolve_item] and
/// [`resolve_combo`][CatalogManagement::resolve_combo]; the mutating methods exist for the restaurant-management
/// surface. Combo invariants (non-empty member set, members belong to the combo's restaurant) are enforced here, at
/// write time, so the pricing path can trust them.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn create_restaurant(&self, restaurant: NewRestaurant) -> Result<Restaurant, CatalogApiError>;

    async fn fetch_restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>, CatalogApiError>;

    async fn fetch_restaurants(&self) -> Result<Vec<Restaurant>, CatalogApiError>;

    async fn update_restaurant(&self, id: RestaurantId, update: UpdateRestaurant)
        -> Result<Restaurant, CatalogApiError>;

    async fn create_item(&self, item: NewCatalogItem) -> Result<CatalogItem, CatalogApiError>;

    async fn fetch_item(&self, id: ItemId) -> Result<Option<CatalogItem>, CatalogApiError>;

    async fn fetch_items_for_restaurant(&self, id: RestaurantId) -> Result<Vec<CatalogItem>, CatalogApiError>;

    async fn update_item(&self, id: ItemId, update: UpdateCatalogItem) -> Result<CatalogItem, CatalogApiError>;

    async fn delete_item(&self, id: ItemId) -> Result<(), CatalogApiError>;

    async fn create_combo(&self, combo: NewComboMenu) -> Result<ComboMenu, CatalogApiError>;

    async fn fetch_combo(&self, id: ComboId) -> Result<Option<ComboMenu>, CatalogApiError>;

    async fn fetch_combos_for_restaurant(&self, id: RestaurantId) -> Result<Vec<ComboMenu>, CatalogApiError>;

    async fn update_combo(&self, id: ComboId, update: UpdateComboMenu) -> Result<ComboMenu, CatalogApiError>;

    async fn delete_combo(&self, id: ComboId) -> Result<(), CatalogApiError>;

    /// Resolves an item reference to its current unit price, or `None` when the item does not exist *or* belongs to a
    /// different restaurant. Callers must not distinguish the two cases.
    async fn resolve_item(&self, restaurant_id: RestaurantId, item_id: ItemId)
        -> Result<Option<Money>, CatalogApiError>;

    /// Resolves a combo reference to its stored price and member item ids, with the same ownership semantics as
    /// [`resolve_item`][CatalogManagement::resolve_item]. The price is the operator-assigned combo price; it is never
    /// recomputed from the members.
    async fn resolve_combo(
        &self,
        restaurant_id: RestaurantId,
        combo_id: ComboId,
    ) -> Result<Option<(Money, Vec<ItemId>)>, CatalogApiError>;
}

use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{
        CatalogItem,
        ComboId,
        ComboMenu,
        ItemId,
        NewCatalogItem,
        NewComboMenu,
        NewRestaurant,
        Principal,
        Restaurant,
        RestaurantId,
        UpdateCatalogItem,
        UpdateComboMenu,
        UpdateRestaurant,
    },
    traits::{CatalogApiError, CatalogManagement},
};

/// The catalog surface: restaurants, menu items and combo menus.
///
/// Reads are open to everyone; browsing a menu needs no identity. Mutations require an admin, or the operator of the
/// restaurant being changed.
pub struct CatalogApi<B> {
    db: B,
}

impl<B> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi")
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    fn check_operator(who: &Principal, restaurant_id: RestaurantId) -> Result<(), CatalogApiError> {
        let runs_restaurant = who.restaurant_id().map(|r| r == restaurant_id).unwrap_or(false);
        if runs_restaurant || who.is_admin() {
            Ok(())
        } else {
            Err(CatalogApiError::Forbidden(format!("{who} may not manage restaurant {restaurant_id}")))
        }
    }

    //----------------------------------     Restaurants      --------------------------------------------------------

    /// Registers a new restaurant. Admin only.
    pub async fn create_restaurant(&self, who: &Principal, restaurant: NewRestaurant) -> Result<Restaurant, CatalogApiError> {
        if !who.is_admin() {
            return Err(CatalogApiError::Forbidden(format!("{who} may not register restaurants")));
        }
        self.db.create_restaurant(restaurant).await
    }

    pub async fn restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>, CatalogApiError> {
        self.db.fetch_restaurant(id).await
    }

    pub async fn restaurants(&self) -> Result<Vec<Restaurant>, CatalogApiError> {
        self.db.fetch_restaurants().await
    }

    pub async fn update_restaurant(
        &self,
        who: &Principal,
        id: RestaurantId,
        update: UpdateRestaurant,
    ) -> Result<Restaurant, CatalogApiError> {
        Self::check_operator(who, id)?;
        let restaurant = self.db.update_restaurant(id, update).await?;
        info!("🍽️ Restaurant {id} updated by {who}");
        Ok(restaurant)
    }

    //----------------------------------        Items         --------------------------------------------------------

    pub async fn create_item(&self, who: &Principal, item: NewCatalogItem) -> Result<CatalogItem, CatalogApiError> {
        Self::check_operator(who, item.restaurant_id)?;
        self.db.create_item(item).await
    }

    pub async fn item(&self, id: ItemId) -> Result<Option<CatalogItem>, CatalogApiError> {
        self.db.fetch_item(id).await
    }

    pub async fn items_for_restaurant(&self, id: RestaurantId) -> Result<Vec<CatalogItem>, CatalogApiError> {
        self.db.fetch_items_for_restaurant(id).await
    }

    /// Updates an item. Price changes take effect for *future* orders only; existing order lines keep the unit price
    /// they were created with.
    pub async fn update_item(
        &self,
        who: &Principal,
        id: ItemId,
        update: UpdateCatalogItem,
    ) -> Result<CatalogItem, CatalogApiError> {
        let item = self.db.fetch_item(id).await?.ok_or(CatalogApiError::ItemNotFound(id))?;
        Self::check_operator(who, item.restaurant_id)?;
        self.db.update_item(id, update).await
    }

    pub async fn delete_item(&self, who: &Principal, id: ItemId) -> Result<(), CatalogApiError> {
        let item = self.db.fetch_item(id).await?.ok_or(CatalogApiError::ItemNotFound(id))?;
        Self::check_operator(who, item.restaurant_id)?;
        self.db.delete_item(id).await
    }

    //----------------------------------        Combos        --------------------------------------------------------

    pub async fn create_combo(&self, who: &Principal, combo: NewComboMenu) -> Result<ComboMenu, CatalogApiError> {
        Self::check_operator(who, combo.restaurant_id)?;
        self.db.create_combo(combo).await
    }

    pub async fn combo(&self, id: ComboId) -> Result<Option<ComboMenu>, CatalogApiError> {
        self.db.fetch_combo(id).await
    }

    pub async fn combos_for_restaurant(&self, id: RestaurantId) -> Result<Vec<ComboMenu>, CatalogApiError> {
        self.db.fetch_combos_for_restaurant(id).await
    }

    pub async fn update_combo(
        &self,
        who: &Principal,
        id: ComboId,
        update: UpdateComboMenu,
    ) -> Result<ComboMenu, CatalogApiError> {
        let combo = self.db.fetch_combo(id).await?.ok_or(CatalogApiError::ComboNotFound(id))?;
        Self::check_operator(who, combo.restaurant_id)?;
        self.db.update_combo(id, update).await
    }

    pub async fn delete_combo(&self, who: &Principal, id: ComboId) -> Result<(), CatalogApiError> {
        let combo = self.db.fetch_combo(id).await?.ok_or(CatalogApiError::ComboNotFound(id))?;
        Self::check_operator(who, combo.restaurant_id)?;
        self.db.delete_combo(id).await
    }
}

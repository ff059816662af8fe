//! Seed data builders for integration tests: a restaurant with a small menu, plus funded wallets.
use plateful_common::Money;

use crate::{
    db_types::{
        AccountId,
        CatalogItem,
        ComboMenu,
        ItemCategory,
        LedgerKey,
        NewCatalogItem,
        NewComboMenu,
        NewRestaurant,
        Restaurant,
    },
    traits::{CatalogManagement, WalletLedger},
    SqliteDatabase,
};

pub struct SeededMenu {
    pub restaurant: Restaurant,
    pub soup: CatalogItem,
    pub kebab: CatalogItem,
    pub baklava: CatalogItem,
    pub ayran: CatalogItem,
    pub combo: ComboMenu,
}

/// Seeds one restaurant with four items and a combo priced below the sum of its members.
///
/// Prices: soup 15.00, kebab 42.50, baklava 20.00, ayran 7.50. Combo (kebab + ayran + baklava) at 60.00.
pub async fn seed_menu(db: &SqliteDatabase) -> SeededMenu {
    let restaurant = db
        .create_restaurant(NewRestaurant::new("Meze Palace"))
        .await
        .expect("Error creating restaurant");
    let rid = restaurant.id;
    let soup = db
        .create_item(NewCatalogItem::new(rid, "Lentil soup", Money::from_lira(15), ItemCategory::Food))
        .await
        .expect("Error creating item");
    let kebab = db
        .create_item(NewCatalogItem::new(rid, "Adana kebab", Money::from(42_50), ItemCategory::Food))
        .await
        .expect("Error creating item");
    let baklava = db
        .create_item(NewCatalogItem::new(rid, "Baklava", Money::from_lira(20), ItemCategory::Dessert))
        .await
        .expect("Error creating item");
    let ayran = db
        .create_item(NewCatalogItem::new(rid, "Ayran", Money::from(7_50), ItemCategory::Drink))
        .await
        .expect("Error creating item");
    let combo = db
        .create_combo(NewComboMenu::new(rid, "Kebab feast", Money::from_lira(60), vec![
            kebab.id, ayran.id, baklava.id,
        ]))
        .await
        .expect("Error creating combo");
    SeededMenu { restaurant, soup, kebab, baklava, ayran, combo }
}

/// Credits the account's wallet with the given amount and returns its ledger key.
pub async fn fund_account(db: &SqliteDatabase, account: AccountId, amount: Money) -> LedgerKey {
    let key = LedgerKey::account(account);
    db.credit(&key, amount).await.expect("Error funding wallet");
    key
}

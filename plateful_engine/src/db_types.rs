use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use plateful_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------     Identifiers     ---------------------------------------------------------

/// Internal id of an admin or customer account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct AccountId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct RestaurantId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct ItemId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct ComboId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub i64);

macro_rules! display_id {
    ($id:ident) => {
        impl Display for $id {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "#{}", self.0)
            }
        }

        impl From<i64> for $id {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

display_id!(AccountId);
display_id!(RestaurantId);
display_id!(ItemId);
display_id!(ComboId);
display_id!(OrderId);

//--------------------------------------     OrderNumber     ---------------------------------------------------------

/// The human-readable order number. Unique and time-derived. See [`crate::helpers::new_order_number`].
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderNumber(pub String);

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for OrderNumber {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------      Principal      ---------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Customer,
    Operator,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "Admin"),
            Role::Customer => write!(f, "Customer"),
            Role::Operator => write!(f, "Operator"),
        }
    }
}

/// The authenticated identity a caller presents to every engine operation.
///
/// A principal is immutable for the duration of a request. Restaurant operators are scoped to exactly one restaurant.
/// There is deliberately no numeric-offset trickery to squeeze restaurant accounts into the customer id space; the
/// two id schemes stay disjoint behind this tagged union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Principal {
    Admin(AccountId),
    Customer(AccountId),
    Operator(RestaurantId),
}

impl Principal {
    pub fn role(&self) -> Role {
        match self {
            Principal::Admin(_) => Role::Admin,
            Principal::Customer(_) => Role::Customer,
            Principal::Operator(_) => Role::Operator,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Principal::Admin(_))
    }

    /// The account id, for principals that have one (admins and customers).
    pub fn account_id(&self) -> Option<AccountId> {
        match self {
            Principal::Admin(id) | Principal::Customer(id) => Some(*id),
            Principal::Operator(_) => None,
        }
    }

    /// The restaurant this principal operates, if any.
    pub fn restaurant_id(&self) -> Option<RestaurantId> {
        match self {
            Principal::Operator(id) => Some(*id),
            _ => None,
        }
    }

    /// The wallet key this principal's funds live under.
    pub fn ledger_key(&self) -> LedgerKey {
        match self {
            Principal::Admin(id) | Principal::Customer(id) => LedgerKey::account(*id),
            Principal::Operator(id) => LedgerKey::restaurant(*id),
        }
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Principal::Admin(id) => write!(f, "admin {id}"),
            Principal::Customer(id) => write!(f, "customer {id}"),
            Principal::Operator(id) => write!(f, "operator of restaurant {id}"),
        }
    }
}

//--------------------------------------      LedgerKey      ---------------------------------------------------------

/// An opaque wallet key. One balance exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct LedgerKey(String);

impl LedgerKey {
    pub fn account(id: AccountId) -> Self {
        Self(format!("acct:{}", id.0))
    }

    pub fn restaurant(id: RestaurantId) -> Self {
        Self(format!("rest:{}", id.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for LedgerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for LedgerKey {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

//--------------------------------------     Restaurant      ---------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRestaurant {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl NewRestaurant {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into(), address: None, phone: None }
    }
}

/// Allow-listed restaurant update. Absent fields are left untouched; there is no free-form field map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRestaurant {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateRestaurant {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.address.is_none() && self.phone.is_none() && self.is_active.is_none()
    }
}

//--------------------------------------    ItemCategory     ---------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ItemCategory {
    Food,
    Drink,
    Dessert,
}

impl Display for ItemCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemCategory::Food => write!(f, "Food"),
            ItemCategory::Drink => write!(f, "Drink"),
            ItemCategory::Dessert => write!(f, "Dessert"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid item category: {0}")]
pub struct CategoryConversionError(String);

impl FromStr for ItemCategory {
    type Err = CategoryConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Food" => Ok(Self::Food),
            "Drink" => Ok(Self::Drink),
            "Dessert" => Ok(Self::Dessert),
            s => Err(CategoryConversionError(s.to_string())),
        }
    }
}

//--------------------------------------    CatalogItem      ---------------------------------------------------------

/// A single sellable item on a restaurant's menu. Referenced, never mutated, by the order core.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub category: ItemCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCatalogItem {
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub category: ItemCategory,
}

impl NewCatalogItem {
    pub fn new<S: Into<String>>(restaurant_id: RestaurantId, name: S, price: Money, category: ItemCategory) -> Self {
        Self { restaurant_id, name: name.into(), description: None, price, category }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCatalogItem {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub category: Option<ItemCategory>,
}

impl UpdateCatalogItem {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.price.is_none() && self.category.is_none()
    }

    pub fn with_price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }
}

//--------------------------------------     ComboMenu       ---------------------------------------------------------

/// A combo menu: a set of catalog items sold together at an operator-assigned price.
///
/// The price is *not* derived from the member items; undercutting the sum of the members is exactly how promotional
/// combos are expressed. Every member item must belong to the same restaurant as the combo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboMenu {
    pub id: ComboId,
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub item_ids: Vec<ItemId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComboMenu {
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub item_ids: Vec<ItemId>,
}

impl NewComboMenu {
    pub fn new<S: Into<String>>(restaurant_id: RestaurantId, name: S, price: Money, item_ids: Vec<ItemId>) -> Self {
        Self { restaurant_id, name: name.into(), description: None, price, item_ids }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateComboMenu {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    /// Replaces the member set wholesale when present.
    pub item_ids: Option<Vec<ItemId>>,
}

impl UpdateComboMenu {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.price.is_none() && self.item_ids.is_none()
    }
}

//--------------------------------------    WalletRecord     ---------------------------------------------------------

/// A wallet row. Created lazily on first balance query or credit. `balance` is never negative at any observable time.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WalletRecord {
    pub id: i64,
    pub ledger_key: LedgerKey,
    pub balance: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------   OrderStatusType   ---------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been created and the wallet debit for it has been taken.
    Created,
    /// Payment acknowledged by the restaurant.
    Paid,
    /// The restaurant is preparing the order.
    Preparing,
    /// The order is out for delivery.
    Delivering,
    /// The order has been delivered. Terminal; not even cancellation leaves this state.
    Delivered,
    /// The order was cancelled and the wallet refunded. Terminal.
    Cancelled,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Delivered | OrderStatusType::Cancelled)
    }

    /// Whether a cancellation is still allowed from this state.
    pub fn is_cancellable(&self) -> bool {
        !self.is_terminal()
    }

    fn rank(&self) -> u8 {
        match self {
            OrderStatusType::Created => 0,
            OrderStatusType::Paid => 1,
            OrderStatusType::Preparing => 2,
            OrderStatusType::Delivering => 3,
            OrderStatusType::Delivered => 4,
            // Cancelled sits outside the fulfilment progression
            OrderStatusType::Cancelled => u8::MAX,
        }
    }

    /// Whether the fulfilment flow may move an order from `self` to `to`.
    ///
    /// Progression is forward-only along Created → Paid → Preparing → Delivering → Delivered; terminal states admit
    /// nothing. `Cancelled` is never a valid *progression* target; cancellation goes through the refund flow.
    pub fn can_progress_to(&self, to: OrderStatusType) -> bool {
        if self.is_terminal() || to == OrderStatusType::Cancelled {
            return false;
        }
        to.rank() > self.rank() && to.rank() <= OrderStatusType::Delivered.rank()
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Created => write!(f, "Created"),
            OrderStatusType::Paid => write!(f, "Paid"),
            OrderStatusType::Preparing => write!(f, "Preparing"),
            OrderStatusType::Delivering => write!(f, "Delivering"),
            OrderStatusType::Delivered => write!(f, "Delivered"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct StatusConversionError(String);

impl FromStr for OrderStatusType {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(Self::Created),
            "Paid" => Ok(Self::Paid),
            "Preparing" => Ok(Self::Preparing),
            "Delivering" => Ok(Self::Delivering),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

//--------------------------------------    DeliveryInfo     ---------------------------------------------------------

/// Where and to whom an order should be delivered. All fields are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryInfo {
    pub customer_name: String,
    pub customer_phone: String,
    pub delivery_address: String,
}

impl DeliveryInfo {
    pub fn new<S: Into<String>>(name: S, phone: S, address: S) -> Self {
        Self { customer_name: name.into(), customer_phone: phone.into(), delivery_address: address.into() }
    }
}

//--------------------------------------    OrderLineSpec    ---------------------------------------------------------

/// A requested order line: a reference to either a catalog item or a combo menu (exactly one), plus a quantity.
///
/// This is request-time data; the persisted form is [`OrderLine`], which additionally snapshots the unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineSpec {
    pub item_id: Option<ItemId>,
    pub combo_id: Option<ComboId>,
    pub quantity: i64,
}

impl OrderLineSpec {
    pub fn for_item(item_id: ItemId, quantity: i64) -> Self {
        Self { item_id: Some(item_id), combo_id: None, quantity }
    }

    pub fn for_combo(combo_id: ComboId, quantity: i64) -> Self {
        Self { item_id: None, combo_id: Some(combo_id), quantity }
    }
}

//--------------------------------------       Order         ---------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub account_id: AccountId,
    pub restaurant_id: RestaurantId,
    pub customer_name: String,
    pub customer_phone: String,
    pub delivery_address: String,
    /// Computed at creation against the catalog; immutable thereafter.
    pub total_price: Money,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything the coordinator needs to create an order. The total is *not* part of this type; it is always computed
/// against the live catalog inside the creation transaction.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub account_id: AccountId,
    pub ledger_key: LedgerKey,
    pub restaurant_id: RestaurantId,
    pub delivery: DeliveryInfo,
    pub lines: Vec<OrderLineSpec>,
}

//--------------------------------------     OrderLine       ---------------------------------------------------------

/// A persisted order line. `unit_price` is the price snapshot captured at order creation; later catalog price
/// changes never rewrite it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: OrderId,
    pub item_id: Option<ItemId>,
    pub combo_id: Option<ComboId>,
    pub quantity: i64,
    pub unit_price: Money,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn progression_is_forward_only() {
        use OrderStatusType::*;
        assert!(Created.can_progress_to(Paid));
        assert!(Created.can_progress_to(Delivering));
        assert!(Paid.can_progress_to(Preparing));
        assert!(Delivering.can_progress_to(Delivered));
        assert!(!Paid.can_progress_to(Created));
        assert!(!Delivered.can_progress_to(Delivering));
        assert!(!Cancelled.can_progress_to(Paid));
        assert!(!Preparing.can_progress_to(Cancelled));
    }

    #[test]
    fn terminal_states_are_not_cancellable() {
        use OrderStatusType::*;
        assert!(Created.is_cancellable());
        assert!(Delivering.is_cancellable());
        assert!(!Delivered.is_cancellable());
        assert!(!Cancelled.is_cancellable());
    }

    #[test]
    fn ledger_keys_are_disjoint_per_principal_kind() {
        let a = Principal::Customer(AccountId(7)).ledger_key();
        let b = Principal::Operator(RestaurantId(7)).ledger_key();
        assert_ne!(a, b);
        assert_eq!(a, Principal::Admin(AccountId(7)).ledger_key());
    }
}

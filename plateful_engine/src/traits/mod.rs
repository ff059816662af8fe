//! # Database backend contracts
//!
//! This module defines the behaviour a storage backend must expose to support the ordering engine.
//!
//! ## Traits
//! * [`WalletLedger`]: one non-negative balance per ledger key; the single source of truth for funds.
//! * [`CatalogManagement`]: restaurants, menu items and combo menus, plus the `resolve_*` lookups that the pricing
//!   engine consumes.
//! * [`OrderManagement`]: read-side queries over orders and their lines.
//! * [`OrderGatewayDatabase`]: the transaction coordinator contract: price-debit-persist as one unit, and the atomic
//!   refund-and-cancel inverse.
mod catalog_management;
mod order_gateway_database;
mod order_management;
mod wallet_ledger;

pub use catalog_management::{CatalogApiError, CatalogManagement};
pub use order_gateway_database::{ErrorKind, OrderGatewayDatabase, OrderGatewayError};
pub use order_management::{OrderApiError, OrderManagement};
pub use wallet_ledger::{WalletApiError, WalletLedger};

//! Plateful ordering engine
//!
//! The ordering engine is the transactional heart of the Plateful restaurant platform: it prices orders against
//! restaurant catalogs, pays for them out of prepaid customer wallets and tracks them through fulfilment. This
//! library is delivery-mechanism agnostic; it contains no HTTP surface.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You should never need to
//!    access the database directly; use the public API instead. The exception is the data types used in the
//!    database, which are defined in the [`mod@db_types`] module and are public.
//! 2. The engine public API ([`mod@core_api`]). [`OrderFlowApi`] covers the order lifecycle, [`WalletApi`] the
//!    funds, [`CatalogApi`] the menus. A backend acts as storage for these APIs by implementing the traits in the
//!    [`mod@traits`] module; the key contract is [`traits::OrderGatewayDatabase`], whose implementations must make
//!    "debit the wallet and persist the order" a single atomic step.
//!
//! The engine also emits events at the order lifecycle's edges (created, cancelled, status changed). A simple actor
//! framework lets you hook into these and perform custom actions.
mod core_api;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use core_api::{order_objects, pricing, CatalogApi, OrderFlowApi, WalletApi};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub mod catalog_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod pricing;
pub mod wallet_api;

pub use catalog_api::CatalogApi;
pub use order_flow_api::OrderFlowApi;
pub use wallet_api::WalletApi;

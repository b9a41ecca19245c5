//! Shopify Admin GraphQL client used to read current product state and apply
//! bulk-edit inverse mutations.

pub mod admin;
pub mod api;
pub mod client;
pub mod error;
pub mod graphql;
pub mod rate_limit;
pub mod types;

pub use api::AdminApi;
pub use client::{ClientSettings, ShopifyAdminClient};
pub use error::ShopifyError;
pub use types::{
    to_gid, InventoryAdjustment, InventoryTarget, ProductContentUpdate, VariantPriceUpdate,
};

use async_trait::async_trait;

use crate::error::ShopifyError;
use crate::types::{InventoryAdjustment, InventoryTarget, ProductContentUpdate, VariantPriceUpdate};

/// The slice of the Shopify Admin API that bulk-edit reverts read and write.
///
/// Ids may be bare numeric ids or global ids; implementations normalise them.
/// [`crate::ShopifyAdminClient`] is the production implementation; revert
/// tests substitute an in-memory fake.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Writes price fields for variants of one product via
    /// `productVariantsBulkUpdate`.
    async fn update_variant_prices(
        &self,
        product_id: &str,
        updates: &[VariantPriceUpdate],
    ) -> Result<(), ShopifyError>;

    /// Resolves a variant's inventory item and its first stocked location.
    async fn inventory_target(&self, variant_id: &str) -> Result<InventoryTarget, ShopifyError>;

    /// Applies relative `available` quantity corrections.
    async fn adjust_inventory(
        &self,
        adjustments: &[InventoryAdjustment],
    ) -> Result<(), ShopifyError>;

    /// Current tag set of a product.
    async fn product_tags(&self, product_id: &str) -> Result<Vec<String>, ShopifyError>;

    /// Replaces a product's tag set.
    async fn set_product_tags(
        &self,
        product_id: &str,
        tags: &[String],
    ) -> Result<(), ShopifyError>;

    /// Global ids of every collection the product belongs to.
    async fn product_collection_ids(&self, product_id: &str) -> Result<Vec<String>, ShopifyError>;

    async fn add_product_to_collection(
        &self,
        collection_id: &str,
        product_id: &str,
    ) -> Result<(), ShopifyError>;

    async fn remove_product_from_collection(
        &self,
        collection_id: &str,
        product_id: &str,
    ) -> Result<(), ShopifyError>;

    /// Writes title and/or description via `productUpdate`.
    async fn update_product_content(
        &self,
        product_id: &str,
        update: &ProductContentUpdate,
    ) -> Result<(), ShopifyError>;
}

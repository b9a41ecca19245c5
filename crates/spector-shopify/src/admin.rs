//! [`AdminApi`] implementation for [`ShopifyAdminClient`].

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::api::AdminApi;
use crate::client::ShopifyAdminClient;
use crate::error::ShopifyError;
use crate::graphql::{check_user_errors, UserError};
use crate::rate_limit::Idempotency;
use crate::types::{
    to_gid, Connection, IdNode, InventoryAdjustment, InventoryTarget, ProductContentUpdate,
    VariantPriceUpdate,
};

/// Upper bound on `product.collections` pages (250 per page).
const MAX_COLLECTION_PAGES: usize = 20;

const VARIANTS_BULK_UPDATE: &str = r"
mutation RevertVariantPrices($productId: ID!, $variants: [ProductVariantsBulkInput!]!) {
  productVariantsBulkUpdate(productId: $productId, variants: $variants) {
    userErrors { field message }
  }
}";

const VARIANT_INVENTORY: &str = r"
query VariantInventory($id: ID!) {
  productVariant(id: $id) {
    inventoryItem {
      id
      inventoryLevels(first: 1) { nodes { location { id } } }
    }
  }
}";

const INVENTORY_ADJUST: &str = r"
mutation RevertInventory($input: InventoryAdjustQuantitiesInput!) {
  inventoryAdjustQuantities(input: $input) {
    userErrors { field message }
  }
}";

const PRODUCT_TAGS: &str = r"
query ProductTags($id: ID!) {
  product(id: $id) { tags }
}";

const PRODUCT_COLLECTIONS: &str = r"
query ProductCollections($id: ID!, $after: String) {
  product(id: $id) {
    collections(first: 250, after: $after) {
      nodes { id }
      pageInfo { hasNextPage endCursor }
    }
  }
}";

const PRODUCT_UPDATE: &str = r"
mutation RevertProduct($product: ProductUpdateInput!) {
  productUpdate(product: $product) {
    userErrors { field message }
  }
}";

const COLLECTION_ADD: &str = r"
mutation RevertCollectionRemoval($id: ID!, $productIds: [ID!]!) {
  collectionAddProducts(id: $id, productIds: $productIds) {
    userErrors { field message }
  }
}";

const COLLECTION_REMOVE: &str = r"
mutation RevertCollectionAddition($id: ID!, $productIds: [ID!]!) {
  collectionRemoveProducts(id: $id, productIds: $productIds) {
    userErrors { field message }
  }
}";

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MutationPayload {
    #[serde(rename = "userErrors", default)]
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
struct VariantsBulkUpdateData {
    #[serde(rename = "productVariantsBulkUpdate")]
    payload: Option<MutationPayload>,
}

#[derive(Debug, Deserialize)]
struct InventoryAdjustData {
    #[serde(rename = "inventoryAdjustQuantities")]
    payload: Option<MutationPayload>,
}

#[derive(Debug, Deserialize)]
struct ProductUpdateData {
    #[serde(rename = "productUpdate")]
    payload: Option<MutationPayload>,
}

#[derive(Debug, Deserialize)]
struct CollectionAddData {
    #[serde(rename = "collectionAddProducts")]
    payload: Option<MutationPayload>,
}

#[derive(Debug, Deserialize)]
struct CollectionRemoveData {
    #[serde(rename = "collectionRemoveProducts")]
    payload: Option<MutationPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantInventoryData {
    product_variant: Option<VariantInventoryNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantInventoryNode {
    inventory_item: Option<InventoryItemNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InventoryItemNode {
    id: String,
    inventory_levels: LevelNodes,
}

#[derive(Debug, Deserialize)]
struct LevelNodes {
    nodes: Vec<LevelNode>,
}

#[derive(Debug, Deserialize)]
struct LevelNode {
    location: IdNode,
}

#[derive(Debug, Deserialize)]
struct ProductTagsData {
    product: Option<TagsNode>,
}

#[derive(Debug, Deserialize)]
struct TagsNode {
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ProductCollectionsData {
    product: Option<CollectionsNode>,
}

#[derive(Debug, Deserialize)]
struct CollectionsNode {
    collections: Connection<IdNode>,
}

fn check_payload(mutation: &str, payload: Option<MutationPayload>) -> Result<(), ShopifyError> {
    let payload = payload.ok_or_else(|| ShopifyError::GraphQl {
        context: mutation.to_owned(),
        messages: vec!["mutation returned no payload".to_owned()],
    })?;
    check_user_errors(mutation, &payload.user_errors)
}

#[async_trait]
impl AdminApi for ShopifyAdminClient {
    async fn update_variant_prices(
        &self,
        product_id: &str,
        updates: &[VariantPriceUpdate],
    ) -> Result<(), ShopifyError> {
        let variants: Vec<_> = updates
            .iter()
            .filter(|u| !u.is_empty())
            .map(VariantPriceUpdate::to_input)
            .collect();
        if variants.is_empty() {
            return Ok(());
        }

        let data: VariantsBulkUpdateData = self
            .execute(
                "productVariantsBulkUpdate",
                VARIANTS_BULK_UPDATE,
                json!({ "productId": to_gid("Product", product_id), "variants": variants }),
                Idempotency::Write,
            )
            .await?;
        check_payload("productVariantsBulkUpdate", data.payload)
    }

    async fn inventory_target(&self, variant_id: &str) -> Result<InventoryTarget, ShopifyError> {
        let gid = to_gid("ProductVariant", variant_id);
        let data: VariantInventoryData = self
            .execute(
                "productVariant inventory",
                VARIANT_INVENTORY,
                json!({ "id": gid }),
                Idempotency::Read,
            )
            .await?;

        let missing = || ShopifyError::MissingResource {
            context: "productVariant inventory".to_owned(),
            id: gid.clone(),
        };
        let item = data
            .product_variant
            .and_then(|v| v.inventory_item)
            .ok_or_else(missing)?;
        let location = item
            .inventory_levels
            .nodes
            .into_iter()
            .next()
            .ok_or_else(missing)?;

        Ok(InventoryTarget {
            inventory_item_id: item.id,
            location_id: location.location.id,
        })
    }

    async fn adjust_inventory(
        &self,
        adjustments: &[InventoryAdjustment],
    ) -> Result<(), ShopifyError> {
        let changes: Vec<_> = adjustments
            .iter()
            .filter(|a| a.delta != 0)
            .map(|a| {
                json!({
                    "delta": a.delta,
                    "inventoryItemId": to_gid("InventoryItem", &a.inventory_item_id),
                    "locationId": to_gid("Location", &a.location_id),
                })
            })
            .collect();
        if changes.is_empty() {
            return Ok(());
        }

        let data: InventoryAdjustData = self
            .execute(
                "inventoryAdjustQuantities",
                INVENTORY_ADJUST,
                json!({
                    "input": {
                        "reason": "correction",
                        "name": "available",
                        "changes": changes,
                    }
                }),
                Idempotency::Write,
            )
            .await?;
        check_payload("inventoryAdjustQuantities", data.payload)
    }

    async fn product_tags(&self, product_id: &str) -> Result<Vec<String>, ShopifyError> {
        let gid = to_gid("Product", product_id);
        let data: ProductTagsData = self
            .execute(
                "product tags",
                PRODUCT_TAGS,
                json!({ "id": gid }),
                Idempotency::Read,
            )
            .await?;
        data.product
            .map(|p| p.tags)
            .ok_or(ShopifyError::MissingResource {
                context: "product tags".to_owned(),
                id: gid,
            })
    }

    async fn set_product_tags(
        &self,
        product_id: &str,
        tags: &[String],
    ) -> Result<(), ShopifyError> {
        let data: ProductUpdateData = self
            .execute(
                "productUpdate",
                PRODUCT_UPDATE,
                json!({ "product": { "id": to_gid("Product", product_id), "tags": tags } }),
                Idempotency::Write,
            )
            .await?;
        check_payload("productUpdate", data.payload)
    }

    async fn product_collection_ids(&self, product_id: &str) -> Result<Vec<String>, ShopifyError> {
        let gid = to_gid("Product", product_id);
        let mut ids = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_COLLECTION_PAGES {
            let data: ProductCollectionsData = self
                .execute(
                    "product collections",
                    PRODUCT_COLLECTIONS,
                    json!({ "id": gid, "after": cursor }),
                    Idempotency::Read,
                )
                .await?;
            let page = data
                .product
                .ok_or_else(|| ShopifyError::MissingResource {
                    context: "product collections".to_owned(),
                    id: gid.clone(),
                })?
                .collections;

            ids.extend(page.nodes.into_iter().map(|n| n.id));
            match page.page_info.end_cursor {
                Some(next) if page.page_info.has_next_page => cursor = Some(next),
                _ => return Ok(ids),
            }
        }

        Err(ShopifyError::PaginationLimit {
            context: format!("collections of {gid}"),
            max_pages: MAX_COLLECTION_PAGES,
        })
    }

    async fn add_product_to_collection(
        &self,
        collection_id: &str,
        product_id: &str,
    ) -> Result<(), ShopifyError> {
        let data: CollectionAddData = self
            .execute(
                "collectionAddProducts",
                COLLECTION_ADD,
                json!({
                    "id": to_gid("Collection", collection_id),
                    "productIds": [to_gid("Product", product_id)],
                }),
                Idempotency::Write,
            )
            .await?;
        check_payload("collectionAddProducts", data.payload)
    }

    async fn remove_product_from_collection(
        &self,
        collection_id: &str,
        product_id: &str,
    ) -> Result<(), ShopifyError> {
        let data: CollectionRemoveData = self
            .execute(
                "collectionRemoveProducts",
                COLLECTION_REMOVE,
                json!({
                    "id": to_gid("Collection", collection_id),
                    "productIds": [to_gid("Product", product_id)],
                }),
                Idempotency::Write,
            )
            .await?;
        check_payload("collectionRemoveProducts", data.payload)
    }

    async fn update_product_content(
        &self,
        product_id: &str,
        update: &ProductContentUpdate,
    ) -> Result<(), ShopifyError> {
        if update.is_empty() {
            return Ok(());
        }

        let mut product = serde_json::to_value(update).map_err(|source| {
            ShopifyError::Deserialize {
                context: "productUpdate input".to_owned(),
                source,
            }
        })?;
        if let Some(fields) = product.as_object_mut() {
            fields.insert("id".to_owned(), json!(to_gid("Product", product_id)));
        }

        let data: ProductUpdateData = self
            .execute(
                "productUpdate",
                PRODUCT_UPDATE,
                json!({ "product": product }),
                Idempotency::Write,
            )
            .await?;
        check_payload("productUpdate", data.payload)
    }
}

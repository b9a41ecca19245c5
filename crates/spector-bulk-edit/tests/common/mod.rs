//! In-memory doubles for the batch store and the Shopify Admin API.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use spector_bulk_edit::BatchStore;
use spector_core::{Batch, ChangeItem, NewBatch};
use spector_db::DbError;
use spector_shopify::{
    AdminApi, InventoryAdjustment, InventoryTarget, ProductContentUpdate, ShopifyError,
    VariantPriceUpdate,
};

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    batches: Mutex<Vec<Batch>>,
    pub mark_calls: Mutex<Vec<Uuid>>,
}

impl MemoryStore {
    pub fn batch(&self, id: Uuid) -> Batch {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .expect("batch exists")
    }

    /// Stores `batch` as-is, bypassing creation rules.
    pub fn insert(&self, batch: Batch) {
        self.batches.lock().unwrap().push(batch);
    }

    pub fn len(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

#[async_trait]
impl BatchStore for MemoryStore {
    async fn create(&self, new_batch: &NewBatch) -> Result<Batch, DbError> {
        let batch = Batch {
            id: Uuid::new_v4(),
            shop: new_batch.shop.clone(),
            operation_type: new_batch.operation_type,
            operation_name: new_batch.operation_name.clone(),
            description: new_batch.description.clone(),
            product_count: i32::try_from(new_batch.product_count()).unwrap(),
            variant_count: i32::try_from(new_batch.variant_count()).unwrap(),
            can_revert: new_batch.can_revert,
            is_reverted: false,
            reverted_at: None,
            created_at: Utc::now(),
            items: new_batch
                .changes
                .iter()
                .map(|c| ChangeItem {
                    id: Uuid::new_v4(),
                    product_id: c.product_id.clone(),
                    variant_id: c.variant_id.clone(),
                    product_title: c.product_title.clone(),
                    variant_title: c.variant_title.clone(),
                    field: c.field.clone(),
                    old_value: c.old_value.clone(),
                    new_value: c.new_value.clone(),
                    change_type: c.change_type,
                })
                .collect(),
        };
        self.batches.lock().unwrap().push(batch.clone());
        Ok(batch)
    }

    async fn list_recent(&self, shop: &str, limit: i64) -> Result<Vec<Batch>, DbError> {
        let batches = self.batches.lock().unwrap();
        Ok(batches
            .iter()
            .rev()
            .filter(|b| b.shop == shop)
            .take(usize::try_from(limit).unwrap())
            .cloned()
            .collect())
    }

    async fn get(&self, shop: &str, batch_id: Uuid) -> Result<Batch, DbError> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == batch_id && b.shop == shop)
            .cloned()
            .ok_or(DbError::NotFound)
    }

    async fn mark_reverted(&self, batch_id: Uuid) -> Result<DateTime<Utc>, DbError> {
        self.mark_calls.lock().unwrap().push(batch_id);
        let mut batches = self.batches.lock().unwrap();
        let batch = batches
            .iter_mut()
            .find(|b| b.id == batch_id && !b.is_reverted)
            .ok_or(DbError::InvalidBatchTransition { batch_id })?;
        let now = Utc::now();
        batch.is_reverted = true;
        batch.can_revert = false;
        batch.reverted_at = Some(now);
        Ok(now)
    }

    async fn erase_shop(&self, shop: &str) -> Result<u64, DbError> {
        let mut batches = self.batches.lock().unwrap();
        let before = batches.len();
        batches.retain(|b| b.shop != shop);
        Ok(u64::try_from(before - batches.len()).unwrap())
    }
}

// ---------------------------------------------------------------------------
// Admin API
// ---------------------------------------------------------------------------

/// Every write the fake received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Prices {
        product_id: String,
        updates: Vec<VariantPriceUpdate>,
    },
    Inventory(Vec<InventoryAdjustment>),
    Tags {
        product_id: String,
        tags: Vec<String>,
    },
    AddToCollection {
        collection_id: String,
        product_id: String,
    },
    RemoveFromCollection {
        collection_id: String,
        product_id: String,
    },
    Content {
        product_id: String,
        update: ProductContentUpdate,
    },
}

#[derive(Default)]
pub struct FakeAdminApi {
    pub writes: Mutex<Vec<Write>>,
    pub tags: HashMap<String, Vec<String>>,
    pub collections: HashMap<String, Vec<String>>,
    /// Product ids whose writes fail with a user error.
    pub failing_products: HashSet<String>,
}

impl FakeAdminApi {
    pub fn writes(&self) -> Vec<Write> {
        self.writes.lock().unwrap().clone()
    }

    fn write(&self, product_id: &str, write: Write) -> Result<(), ShopifyError> {
        if self.failing_products.contains(product_id) {
            return Err(ShopifyError::UserErrors {
                mutation: "fake".to_owned(),
                messages: vec![format!("{product_id} is locked")],
            });
        }
        self.writes.lock().unwrap().push(write);
        Ok(())
    }
}

#[async_trait]
impl AdminApi for FakeAdminApi {
    async fn update_variant_prices(
        &self,
        product_id: &str,
        updates: &[VariantPriceUpdate],
    ) -> Result<(), ShopifyError> {
        self.write(
            product_id,
            Write::Prices {
                product_id: product_id.to_owned(),
                updates: updates.to_vec(),
            },
        )
    }

    async fn inventory_target(&self, variant_id: &str) -> Result<InventoryTarget, ShopifyError> {
        Ok(InventoryTarget {
            inventory_item_id: format!("item-{variant_id}"),
            location_id: "loc-1".to_owned(),
        })
    }

    async fn adjust_inventory(
        &self,
        adjustments: &[InventoryAdjustment],
    ) -> Result<(), ShopifyError> {
        self.writes
            .lock()
            .unwrap()
            .push(Write::Inventory(adjustments.to_vec()));
        Ok(())
    }

    async fn product_tags(&self, product_id: &str) -> Result<Vec<String>, ShopifyError> {
        Ok(self.tags.get(product_id).cloned().unwrap_or_default())
    }

    async fn set_product_tags(
        &self,
        product_id: &str,
        tags: &[String],
    ) -> Result<(), ShopifyError> {
        self.write(
            product_id,
            Write::Tags {
                product_id: product_id.to_owned(),
                tags: tags.to_vec(),
            },
        )
    }

    async fn product_collection_ids(&self, product_id: &str) -> Result<Vec<String>, ShopifyError> {
        Ok(self
            .collections
            .get(product_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_product_to_collection(
        &self,
        collection_id: &str,
        product_id: &str,
    ) -> Result<(), ShopifyError> {
        self.write(
            product_id,
            Write::AddToCollection {
                collection_id: collection_id.to_owned(),
                product_id: product_id.to_owned(),
            },
        )
    }

    async fn remove_product_from_collection(
        &self,
        collection_id: &str,
        product_id: &str,
    ) -> Result<(), ShopifyError> {
        self.write(
            product_id,
            Write::RemoveFromCollection {
                collection_id: collection_id.to_owned(),
                product_id: product_id.to_owned(),
            },
        )
    }

    async fn update_product_content(
        &self,
        product_id: &str,
        update: &ProductContentUpdate,
    ) -> Result<(), ShopifyError> {
        self.write(
            product_id,
            Write::Content {
                product_id: product_id.to_owned(),
                update: update.clone(),
            },
        )
    }
}

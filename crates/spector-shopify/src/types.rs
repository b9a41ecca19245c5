//! Inputs and read models for the Admin GraphQL surface used by reverts.
//!
//! ### Resource ids
//! The Admin API addresses everything by global id
//! (`gid://shopify/ProductVariant/123`). Change items may carry either a gid
//! or the bare numeric id reported by the bulk-edit UI, so every id passes
//! through [`to_gid`] before it reaches a query.
//!
//! ### `compareAtPrice`
//! Writing JSON `null` clears the compare-at price; omitting the key leaves it
//! unchanged. [`VariantPriceUpdate::compare_at_price`] models that with a
//! nested `Option`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const GID_PREFIX: &str = "gid://shopify/";

/// Normalises `id` to a global id of the given resource `kind`.
///
/// Ids that already start with `gid://` are returned unchanged.
#[must_use]
pub fn to_gid(kind: &str, id: &str) -> String {
    let id = id.trim();
    if id.starts_with("gid://") {
        id.to_owned()
    } else {
        format!("{GID_PREFIX}{kind}/{id}")
    }
}

/// One variant's price fields to write in `productVariantsBulkUpdate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantPriceUpdate {
    pub variant_id: String,
    /// `None` leaves the price untouched.
    pub price: Option<Decimal>,
    /// `None` leaves the compare-at price untouched; `Some(None)` clears it.
    pub compare_at_price: Option<Option<Decimal>>,
}

impl VariantPriceUpdate {
    /// `true` when the update would not change anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.price.is_none() && self.compare_at_price.is_none()
    }

    pub(crate) fn to_input(&self) -> VariantPriceInput {
        VariantPriceInput {
            id: to_gid("ProductVariant", &self.variant_id),
            price: self.price.map(|p| p.to_string()),
            compare_at_price: self
                .compare_at_price
                .map(|value| value.map(|p| p.to_string())),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VariantPriceInput {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<Option<String>>,
}

/// The inventory item and location an inventory correction applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryTarget {
    pub inventory_item_id: String,
    pub location_id: String,
}

/// A relative `available` quantity change at one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryAdjustment {
    pub inventory_item_id: String,
    pub location_id: String,
    pub delta: i64,
}

/// Product fields written by `productUpdate`. `None` fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductContentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_html: Option<String>,
}

impl ProductContentUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description_html.is_none()
    }
}

/// A page of collection ids plus the cursor for the next page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Connection<T> {
    pub nodes: Vec<T>,
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IdNode {
    pub id: String,
}

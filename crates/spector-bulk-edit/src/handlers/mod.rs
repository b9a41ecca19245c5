//! Operation handlers: one per revertable operation type. Each computes the
//! inverse of a resource group's changes from the recorded values (and, for
//! tags and collections, the resource's current state) and writes it back.

mod collections;
mod content;
mod inventory;
mod pricing;
mod tags;

use async_trait::async_trait;

use spector_core::{ChangeItem, OperationType};
use spector_shopify::AdminApi;

use crate::HandlerError;

pub use collections::CollectionsHandler;
pub use content::ContentHandler;
pub use inventory::InventoryHandler;
pub use pricing::PricingHandler;
pub use tags::TagsHandler;

/// The items of one batch that target the same resource, in recorded order.
///
/// Keyed by `variant_id`, or `product_id` for product-level changes.
#[derive(Debug, Clone)]
pub struct ResourceGroup<'a> {
    pub key: &'a str,
    pub product_id: &'a str,
    pub variant_id: Option<&'a str>,
    pub product_title: &'a str,
    pub items: Vec<&'a ChangeItem>,
}

impl<'a> ResourceGroup<'a> {
    pub(crate) fn new(first: &'a ChangeItem) -> Self {
        Self {
            key: first.resource_id(),
            product_id: &first.product_id,
            variant_id: first.variant_id.as_deref(),
            product_title: &first.product_title,
            items: vec![first],
        }
    }
}

#[async_trait]
pub trait RevertHandler: Send + Sync {
    fn operation_type(&self) -> OperationType;

    /// Applies the inverse of every change in `group`.
    async fn revert_group(
        &self,
        api: &dyn AdminApi,
        group: &ResourceGroup<'_>,
    ) -> Result<(), HandlerError>;
}

/// The handler for `operation_type`, or `None` when reverting it is not
/// supported.
#[must_use]
pub fn handler_for(operation_type: OperationType) -> Option<&'static dyn RevertHandler> {
    match operation_type {
        OperationType::Pricing => Some(&PricingHandler),
        OperationType::Inventory => Some(&InventoryHandler),
        OperationType::Collections => Some(&CollectionsHandler),
        OperationType::Tags => Some(&TagsHandler),
        OperationType::Content => Some(&ContentHandler),
        OperationType::Variants => None,
    }
}

fn unknown_field(operation_type: OperationType, item: &ChangeItem) -> HandlerError {
    HandlerError::UnknownField {
        operation_type,
        field: item.field.clone(),
    }
}

fn invalid_value(item: &ChangeItem, reason: impl Into<String>) -> HandlerError {
    HandlerError::InvalidValue {
        field: item.field.clone(),
        reason: reason.into(),
    }
}

fn unsupported_change(item: &ChangeItem) -> HandlerError {
    HandlerError::UnsupportedChange {
        field: item.field.clone(),
        change_type: item.change_type.to_string(),
    }
}

/// Splits a recorded tag or collection value into its trimmed entries.
fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

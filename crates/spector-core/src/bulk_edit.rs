//! Bulk-edit batch model: operation and change vocabularies, creation input
//! validation, and the persisted batch/item shapes.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shop::normalize_shop_domain;
use crate::CoreError;

/// Stored in place of a null price so "cleared" survives the string column.
pub const NULL_SENTINEL: &str = "null";

const MAX_OPERATION_NAME_CHARS: usize = 200;

/// Category of bulk edit. Selects the inverse handler at revert time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Pricing,
    Inventory,
    Collections,
    Tags,
    Content,
    Variants,
}

impl OperationType {
    pub const ALL: [Self; 6] = [
        Self::Pricing,
        Self::Inventory,
        Self::Collections,
        Self::Tags,
        Self::Content,
        Self::Variants,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pricing => "pricing",
            Self::Inventory => "inventory",
            Self::Collections => "collections",
            Self::Tags => "tags",
            Self::Content => "content",
            Self::Variants => "variants",
        }
    }

    /// Whether batches of this type get a revert handler.
    ///
    /// Variant-level edits (SKU, weight, ...) are recorded for history only.
    #[must_use]
    pub const fn supports_revert(self) -> bool {
        !matches!(self, Self::Variants)
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| CoreError::InvalidOperationType(s.to_string()))
    }
}

/// How a field was touched. Interpretation depends on the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Add,
    Remove,
    Set,
}

impl ChangeType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Set => "set",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "remove" => Ok(Self::Remove),
            "set" => Ok(Self::Set),
            other => Err(CoreError::InvalidChangeType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Product,
    Variant,
}

/// One field-level change reported by a completed bulk operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDescriptor {
    pub product_id: String,
    #[serde(default)]
    pub variant_id: Option<String>,
    pub product_title: String,
    #[serde(default)]
    pub variant_title: Option<String>,
    pub field: String,
    #[serde(default)]
    pub old_value: Option<String>,
    #[serde(default)]
    pub new_value: Option<String>,
    pub change_type: ChangeType,
}

impl ChangeDescriptor {
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        if self.variant_id.is_some() {
            ResourceType::Variant
        } else {
            ResourceType::Product
        }
    }

    /// The variant id when the change targets a variant, else the product id.
    #[must_use]
    pub fn resource_id(&self) -> &str {
        self.variant_id.as_deref().unwrap_or(&self.product_id)
    }
}

/// Validated input for creating a batch. Construct with [`NewBatch::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBatch {
    pub shop: String,
    pub operation_type: OperationType,
    pub operation_name: String,
    pub description: Option<String>,
    pub can_revert: bool,
    pub changes: Vec<ChangeDescriptor>,
}

impl NewBatch {
    /// Validates and normalizes creation input.
    ///
    /// `can_revert` starts as [`OperationType::supports_revert`]; callers may
    /// only narrow it with [`NewBatch::without_revert`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for an empty change list, a blank or
    /// over-long operation name, or a change with a blank product id or field,
    /// and [`CoreError::InvalidShopDomain`] for a malformed shop.
    pub fn new(
        shop: &str,
        operation_type: OperationType,
        operation_name: &str,
        description: Option<&str>,
        changes: Vec<ChangeDescriptor>,
    ) -> Result<Self, CoreError> {
        let shop = normalize_shop_domain(shop)?;

        let operation_name = operation_name.trim().to_string();
        let name_chars = operation_name.chars().count();
        if name_chars == 0 || name_chars > MAX_OPERATION_NAME_CHARS {
            return Err(CoreError::Validation(format!(
                "operation name must be 1-{MAX_OPERATION_NAME_CHARS} characters"
            )));
        }

        if changes.is_empty() {
            return Err(CoreError::Validation(
                "a batch needs at least one change".to_string(),
            ));
        }

        let changes = changes
            .into_iter()
            .enumerate()
            .map(|(i, change)| normalize_change(i, change))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            shop,
            operation_type,
            operation_name,
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(ToOwned::to_owned),
            can_revert: operation_type.supports_revert(),
            changes,
        })
    }

    #[must_use]
    pub fn without_revert(mut self) -> Self {
        self.can_revert = false;
        self
    }

    #[must_use]
    pub fn product_count(&self) -> usize {
        self.changes
            .iter()
            .map(|c| c.product_id.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    #[must_use]
    pub fn variant_count(&self) -> usize {
        self.changes
            .iter()
            .filter_map(|c| c.variant_id.as_deref())
            .collect::<HashSet<_>>()
            .len()
    }
}

fn normalize_change(
    index: usize,
    mut change: ChangeDescriptor,
) -> Result<ChangeDescriptor, CoreError> {
    change.product_id = change.product_id.trim().to_string();
    change.field = change.field.trim().to_string();
    if change.product_id.is_empty() {
        return Err(CoreError::Validation(format!(
            "change {index}: product_id must not be blank"
        )));
    }
    if change.field.is_empty() {
        return Err(CoreError::Validation(format!(
            "change {index}: field must not be blank"
        )));
    }
    change.variant_id = change
        .variant_id
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    Ok(change)
}

/// A persisted bulk edit with its items in recorded order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Batch {
    pub id: Uuid,
    pub shop: String,
    pub operation_type: OperationType,
    pub operation_name: String,
    pub description: Option<String>,
    pub product_count: i32,
    pub variant_count: i32,
    pub can_revert: bool,
    pub is_reverted: bool,
    pub reverted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<ChangeItem>,
}

impl Batch {
    /// `true` while the batch is in the `active, can_revert` state.
    #[must_use]
    pub const fn is_revertable(&self) -> bool {
        self.can_revert && !self.is_reverted
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeItem {
    pub id: Uuid,
    pub product_id: String,
    pub variant_id: Option<String>,
    pub product_title: String,
    pub variant_title: Option<String>,
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub change_type: ChangeType,
}

impl ChangeItem {
    #[must_use]
    pub fn resource_id(&self) -> &str {
        self.variant_id.as_deref().unwrap_or(&self.product_id)
    }
}

/// Maps the stored null sentinel (and a missing value) to `None`.
#[must_use]
pub fn decode_nullable(value: Option<&str>) -> Option<&str> {
    value.filter(|v| *v != NULL_SENTINEL)
}

#[cfg(test)]
#[path = "bulk_edit_test.rs"]
mod tests;

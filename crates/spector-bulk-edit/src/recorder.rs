//! Change recorder: turns the loosely-typed payload a bulk operation reports
//! into a validated [`NewBatch`] and persists it.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use spector_core::{Batch, ChangeDescriptor, ChangeType, NewBatch, OperationType};

use crate::store::BatchStore;
use crate::RecordError;

/// Batch metadata as submitted by the bulk-edit UI.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationInput {
    #[serde(alias = "operation_type", alias = "type")]
    pub operation_type: String,
    #[serde(alias = "operation_name", alias = "name")]
    pub operation_name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// `Some(false)` opts the batch out of revert. `Some(true)` cannot
    /// enable revert for a type without a handler.
    #[serde(default, alias = "can_revert")]
    pub can_revert: Option<bool>,
}

/// One change as submitted. Values may arrive as JSON strings, numbers,
/// booleans or null; they are stored as opaque strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeInput {
    #[serde(alias = "product_id")]
    pub product_id: String,
    #[serde(default, alias = "variant_id")]
    pub variant_id: Option<String>,
    #[serde(default, alias = "product_title")]
    pub product_title: String,
    #[serde(default, alias = "variant_title")]
    pub variant_title: Option<String>,
    pub field: String,
    #[serde(default, alias = "old_value", deserialize_with = "opaque_value")]
    pub old_value: Option<String>,
    #[serde(default, alias = "new_value", deserialize_with = "opaque_value")]
    pub new_value: Option<String>,
    #[serde(alias = "change_type")]
    pub change_type: String,
}

fn opaque_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

impl ChangeInput {
    fn into_descriptor(self, index: usize) -> Result<ChangeDescriptor, RecordError> {
        let change_type: ChangeType = self
            .change_type
            .trim()
            .to_ascii_lowercase()
            .parse()
            .map_err(|e| RecordError::Validation(format!("change {index}: {e}")))?;

        Ok(ChangeDescriptor {
            product_id: self.product_id,
            variant_id: self.variant_id,
            product_title: self.product_title,
            variant_title: self.variant_title,
            field: self.field,
            old_value: self.old_value,
            new_value: self.new_value,
            change_type,
        })
    }
}

/// Validates `operation` and `changes` for `shop`, then persists the batch.
///
/// # Errors
///
/// Returns [`RecordError::Validation`] for an unknown operation or change
/// type, a blank or over-long name, an empty change list, a blank product id
/// or field, or a malformed shop domain; [`RecordError::Store`] if the
/// insert fails. Nothing is persisted on error.
pub async fn record_batch(
    store: &dyn BatchStore,
    shop: &str,
    operation: OperationInput,
    changes: Vec<ChangeInput>,
) -> Result<Batch, RecordError> {
    let new_batch = build_new_batch(shop, operation, changes)?;
    let batch = store.create(&new_batch).await?;

    tracing::info!(
        batch_id = %batch.id,
        shop = %batch.shop,
        operation_type = %batch.operation_type,
        products = batch.product_count,
        variants = batch.variant_count,
        can_revert = batch.can_revert,
        "recorded bulk edit"
    );
    Ok(batch)
}

pub(crate) fn build_new_batch(
    shop: &str,
    operation: OperationInput,
    changes: Vec<ChangeInput>,
) -> Result<NewBatch, RecordError> {
    let operation_type: OperationType = operation
        .operation_type
        .trim()
        .to_ascii_lowercase()
        .parse()?;

    let descriptors = changes
        .into_iter()
        .enumerate()
        .map(|(i, change)| change.into_descriptor(i))
        .collect::<Result<Vec<_>, _>>()?;

    let new_batch = NewBatch::new(
        shop,
        operation_type,
        &operation.operation_name,
        operation.description.as_deref(),
        descriptors,
    )?;

    Ok(if operation.can_revert == Some(false) {
        new_batch.without_revert()
    } else {
        new_batch
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn operation(operation_type: &str) -> OperationInput {
        OperationInput {
            operation_type: operation_type.to_string(),
            operation_name: "Spring sale".to_string(),
            description: None,
            can_revert: None,
        }
    }

    fn change(change_type: &str) -> ChangeInput {
        serde_json::from_value(json!({
            "productId": "p1",
            "variantId": "v1",
            "productTitle": "Hat",
            "field": "price",
            "oldValue": "10.00",
            "newValue": "12.00",
            "changeType": change_type,
        }))
        .unwrap()
    }

    #[test]
    fn builds_revertable_batch_for_supported_type() {
        let batch = build_new_batch("acme.myshopify.com", operation("pricing"), vec![change("set")])
            .unwrap();
        assert_eq!(batch.operation_type, OperationType::Pricing);
        assert!(batch.can_revert);
        assert_eq!(batch.changes[0].change_type, ChangeType::Set);
    }

    #[test]
    fn unknown_operation_type_is_validation_error() {
        let err = build_new_batch("acme.myshopify.com", operation("shipping"), vec![change("set")])
            .unwrap_err();
        assert!(matches!(err, RecordError::Validation(ref m) if m.contains("shipping")));
    }

    #[test]
    fn unknown_change_type_is_validation_error() {
        let err = build_new_batch("acme.myshopify.com", operation("tags"), vec![change("toggle")])
            .unwrap_err();
        assert!(matches!(err, RecordError::Validation(ref m) if m.starts_with("change 0")));
    }

    #[test]
    fn empty_change_list_is_validation_error() {
        let err = build_new_batch("acme.myshopify.com", operation("pricing"), vec![]).unwrap_err();
        assert!(matches!(err, RecordError::Validation(_)));
    }

    #[test]
    fn caller_can_opt_out_of_revert() {
        let mut op = operation("pricing");
        op.can_revert = Some(false);
        let batch = build_new_batch("acme.myshopify.com", op, vec![change("set")]).unwrap();
        assert!(!batch.can_revert);
    }

    #[test]
    fn caller_cannot_opt_variants_into_revert() {
        let mut op = operation("variants");
        op.can_revert = Some(true);
        let batch = build_new_batch("acme.myshopify.com", op, vec![change("set")]).unwrap();
        assert!(!batch.can_revert);
    }

    #[test]
    fn non_string_values_are_stored_as_text() {
        let input: ChangeInput = serde_json::from_value(json!({
            "product_id": "p1",
            "variant_id": "v1",
            "field": "inventoryQuantity",
            "old_value": 40,
            "new_value": null,
            "change_type": "set",
        }))
        .unwrap();
        assert_eq!(input.old_value.as_deref(), Some("40"));
        assert_eq!(input.new_value, None);
        assert_eq!(input.product_title, "");
    }

    #[test]
    fn operation_accepts_short_aliases() {
        let op: OperationInput =
            serde_json::from_value(json!({ "type": "Tags", "name": "Retag" })).unwrap();
        let batch = build_new_batch("acme.myshopify.com", op, vec![change("add")]).unwrap();
        assert_eq!(batch.operation_type, OperationType::Tags);
        assert_eq!(batch.operation_name, "Retag");
    }
}

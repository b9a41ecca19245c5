use async_trait::async_trait;

use spector_core::{decode_nullable, ChangeItem, OperationType};
use spector_shopify::{AdminApi, InventoryAdjustment};

use super::{invalid_value, unknown_field, ResourceGroup, RevertHandler};
use crate::HandlerError;

/// Undoes quantity changes with a relative correction, so stock movements
/// since the edit are preserved.
#[derive(Debug, Clone, Copy)]
pub struct InventoryHandler;

fn quantity(item: &ChangeItem, raw: Option<&str>, side: &str) -> Result<i64, HandlerError> {
    let raw = decode_nullable(raw)
        .ok_or_else(|| invalid_value(item, format!("{side} quantity is missing")))?;
    raw.trim()
        .parse::<i64>()
        .map_err(|e| invalid_value(item, format!("{side} quantity \"{raw}\": {e}")))
}

/// Sums `old - new` over the group. Zero means nothing to write.
pub(crate) fn plan_delta(group: &ResourceGroup<'_>) -> Result<i64, HandlerError> {
    group.items.iter().try_fold(0i64, |total, item| {
        match item.field.as_str() {
            "inventoryQuantity" | "inventory_quantity" => {}
            _ => return Err(unknown_field(OperationType::Inventory, item)),
        }
        let old = quantity(item, item.old_value.as_deref(), "old")?;
        let new = quantity(item, item.new_value.as_deref(), "new")?;
        old.checked_sub(new)
            .and_then(|d| total.checked_add(d))
            .ok_or_else(|| invalid_value(item, "quantity delta overflows"))
    })
}

#[async_trait]
impl RevertHandler for InventoryHandler {
    fn operation_type(&self) -> OperationType {
        OperationType::Inventory
    }

    async fn revert_group(
        &self,
        api: &dyn AdminApi,
        group: &ResourceGroup<'_>,
    ) -> Result<(), HandlerError> {
        let variant_id = group.variant_id.ok_or(HandlerError::MissingVariant {
            operation_type: OperationType::Inventory,
        })?;

        let delta = plan_delta(group)?;
        if delta == 0 {
            tracing::debug!(variant_id, "inventory already at recorded level, skipping");
            return Ok(());
        }

        let target = api.inventory_target(variant_id).await?;
        api.adjust_inventory(&[InventoryAdjustment {
            inventory_item_id: target.inventory_item_id,
            location_id: target.location_id,
            delta,
        }])
        .await?;
        Ok(())
    }
}

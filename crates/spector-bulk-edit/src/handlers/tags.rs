use async_trait::async_trait;

use spector_core::{ChangeType, OperationType};
use spector_shopify::AdminApi;

use super::{split_list, unknown_field, ResourceGroup, RevertHandler};
use crate::HandlerError;

/// Inverts tag additions and removals against the product's current tags.
#[derive(Debug, Clone, Copy)]
pub struct TagsHandler;

/// Computes the tag set to write, preserving the order of `current`.
///
/// - `add` → remove the added tags (from `new_value`).
/// - `remove` → add the removed tags back (from `old_value`).
/// - `set` → restore the recorded `old_value` list.
pub(crate) fn plan_tags(
    group: &ResourceGroup<'_>,
    current: &[String],
) -> Result<Vec<String>, HandlerError> {
    let mut target: Vec<String> = current.to_vec();

    for item in &group.items {
        if !matches!(item.field.as_str(), "tags" | "tag") {
            return Err(unknown_field(OperationType::Tags, item));
        }
        match item.change_type {
            ChangeType::Add => {
                let added = split_list(item.new_value.as_deref());
                target.retain(|tag| !added.contains(tag));
            }
            ChangeType::Remove => {
                for tag in split_list(item.old_value.as_deref()) {
                    if !target.contains(&tag) {
                        target.push(tag);
                    }
                }
            }
            ChangeType::Set => target = split_list(item.old_value.as_deref()),
        }
    }

    Ok(target)
}

fn same_set(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().all(|tag| b.contains(tag))
}

#[async_trait]
impl RevertHandler for TagsHandler {
    fn operation_type(&self) -> OperationType {
        OperationType::Tags
    }

    async fn revert_group(
        &self,
        api: &dyn AdminApi,
        group: &ResourceGroup<'_>,
    ) -> Result<(), HandlerError> {
        let current = api.product_tags(group.product_id).await?;
        let target = plan_tags(group, &current)?;

        if same_set(&current, &target) {
            tracing::debug!(product_id = group.product_id, "tags unchanged, skipping");
            return Ok(());
        }

        api.set_product_tags(group.product_id, &target).await?;
        Ok(())
    }
}

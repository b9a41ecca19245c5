//! Revert dispatcher: loads a batch, replays each resource group through its
//! operation handler, and marks the batch reverted.
//!
//! A crash between the last group write and `mark_reverted` leaves the batch
//! active, and a second revert re-applies every inverse.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use uuid::Uuid;

use spector_core::ChangeItem;
use spector_shopify::AdminApi;

use crate::handlers::{handler_for, ResourceGroup, RevertHandler};
use crate::store::BatchStore;
use crate::{HandlerError, RevertError};

/// Aggregate result of one revert. `errors` lists the groups that failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RevertOutcome {
    pub reverted_count: usize,
    pub errors: Vec<String>,
}

impl RevertOutcome {
    fn record(self, product_title: &str, result: &Result<(), HandlerError>) -> Self {
        match result {
            Ok(()) => Self {
                reverted_count: self.reverted_count + 1,
                ..self
            },
            Err(_) => {
                let mut errors = self.errors;
                errors.push(format!("Failed to revert {product_title}"));
                Self { errors, ..self }
            }
        }
    }

    /// `true` when every group reverted cleanly.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Groups items by `variant_id`, falling back to `product_id`, in
/// first-seen order.
#[must_use]
pub fn group_items(items: &[ChangeItem]) -> Vec<ResourceGroup<'_>> {
    let mut groups: Vec<ResourceGroup<'_>> = Vec::new();
    for item in items {
        match groups.iter_mut().find(|g| g.key == item.resource_id()) {
            Some(group) => group.items.push(item),
            None => groups.push(ResourceGroup::new(item)),
        }
    }
    groups
}

/// Reverts `batch_id` for `shop`.
///
/// Groups run sequentially; a failing group is logged and reported in the
/// outcome without stopping the rest. The batch is marked reverted once all
/// groups have run, even when some failed.
///
/// # Errors
///
/// - [`RevertError::NotFound`]: unknown id or another shop's batch.
/// - [`RevertError::NotRevertable`]: already reverted or not revertable;
///   nothing is written to Shopify.
/// - [`RevertError::UnsupportedOperation`]: no handler for the batch's type.
/// - [`RevertError::Store`]: the store failed to load or mark the batch.
pub async fn revert_batch(
    store: &dyn BatchStore,
    api: &dyn AdminApi,
    shop: &str,
    batch_id: Uuid,
) -> Result<RevertOutcome, RevertError> {
    let batch = store.get(shop, batch_id).await?;

    if !batch.is_revertable() {
        return Err(RevertError::NotRevertable { batch_id });
    }
    let handler = handler_for(batch.operation_type).ok_or(RevertError::UnsupportedOperation {
        operation_type: batch.operation_type,
    })?;

    let groups = group_items(&batch.items);
    tracing::info!(
        %batch_id,
        shop,
        operation_type = %batch.operation_type,
        groups = groups.len(),
        "reverting bulk edit"
    );

    let outcome = stream::iter(groups)
        .fold(RevertOutcome::default(), |outcome, group| async move {
            let result = revert_group(handler, api, &group).await;
            outcome.record(group.product_title, &result)
        })
        .await;

    store.mark_reverted(batch_id).await?;

    tracing::info!(
        %batch_id,
        reverted = outcome.reverted_count,
        failed = outcome.errors.len(),
        "bulk edit reverted"
    );
    Ok(outcome)
}

async fn revert_group(
    handler: &dyn RevertHandler,
    api: &dyn AdminApi,
    group: &ResourceGroup<'_>,
) -> Result<(), HandlerError> {
    let result = handler.revert_group(api, group).await;
    if let Err(ref error) = result {
        tracing::warn!(
            operation_type = %handler.operation_type(),
            resource = group.key,
            product_title = group.product_title,
            %error,
            "failed to revert resource group"
        );
    }
    result
}

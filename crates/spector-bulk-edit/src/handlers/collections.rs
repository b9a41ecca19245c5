use async_trait::async_trait;

use spector_core::{ChangeType, OperationType};
use spector_shopify::{to_gid, AdminApi};

use super::{
    invalid_value, split_list, unknown_field, unsupported_change, ResourceGroup, RevertHandler,
};
use crate::HandlerError;

/// Inverts collection membership changes for one product.
#[derive(Debug, Clone, Copy)]
pub struct CollectionsHandler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CollectionAction {
    Add(String),
    Remove(String),
}

/// Computes membership writes from recorded changes and `current` membership
/// (collection gids).
///
/// `add` → remove from the collection in `new_value` if still a member.
/// `remove` → add back to the collection in `old_value` if not a member.
pub(crate) fn plan_collections(
    group: &ResourceGroup<'_>,
    current: &[String],
) -> Result<Vec<CollectionAction>, HandlerError> {
    let mut members: Vec<String> = current.iter().map(|id| to_gid("Collection", id)).collect();
    let mut actions = Vec::new();

    for item in &group.items {
        if !matches!(
            item.field.as_str(),
            "collections" | "collection" | "collectionId" | "collection_id"
        ) {
            return Err(unknown_field(OperationType::Collections, item));
        }

        let (raw, adding_back) = match item.change_type {
            ChangeType::Add => (item.new_value.as_deref(), false),
            ChangeType::Remove => (item.old_value.as_deref(), true),
            ChangeType::Set => return Err(unsupported_change(item)),
        };
        let ids = split_list(raw);
        if ids.is_empty() {
            return Err(invalid_value(item, "collection id is missing"));
        }

        for id in ids.iter().map(|id| to_gid("Collection", id)) {
            let is_member = members.contains(&id);
            if adding_back && !is_member {
                members.push(id.clone());
                actions.push(CollectionAction::Add(id));
            } else if !adding_back && is_member {
                members.retain(|m| *m != id);
                actions.push(CollectionAction::Remove(id));
            }
        }
    }

    Ok(actions)
}

#[async_trait]
impl RevertHandler for CollectionsHandler {
    fn operation_type(&self) -> OperationType {
        OperationType::Collections
    }

    async fn revert_group(
        &self,
        api: &dyn AdminApi,
        group: &ResourceGroup<'_>,
    ) -> Result<(), HandlerError> {
        let current = api.product_collection_ids(group.product_id).await?;
        let actions = plan_collections(group, &current)?;

        for action in actions {
            match action {
                CollectionAction::Add(collection_id) => {
                    api.add_product_to_collection(&collection_id, group.product_id).await?;
                }
                CollectionAction::Remove(collection_id) => {
                    api.remove_product_from_collection(&collection_id, group.product_id).await?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{group, item};
    use spector_core::ChangeItem;

    const C1: &str = "gid://shopify/Collection/1";
    const C2: &str = "gid://shopify/Collection/2";

    fn membership(change_type: ChangeType, old: Option<&str>, new: Option<&str>) -> ChangeItem {
        item("p1", None, "collections", old, new, change_type)
    }

    #[test]
    fn added_collection_is_removed_when_member() {
        let items = [membership(ChangeType::Add, None, Some("1"))];
        let actions = plan_collections(&group(&items), &[C1.to_owned()]).unwrap();
        assert_eq!(actions, vec![CollectionAction::Remove(C1.to_owned())]);
    }

    #[test]
    fn added_collection_is_skipped_when_no_longer_member() {
        let items = [membership(ChangeType::Add, None, Some(C1))];
        let actions = plan_collections(&group(&items), &[C2.to_owned()]).unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn removed_collection_is_added_back_when_absent() {
        let items = [membership(ChangeType::Remove, Some(C2), None)];
        let actions = plan_collections(&group(&items), &[C1.to_owned()]).unwrap();
        assert_eq!(actions, vec![CollectionAction::Add(C2.to_owned())]);
    }

    #[test]
    fn removed_collection_is_skipped_when_already_member() {
        let items = [membership(ChangeType::Remove, Some("2"), None)];
        let actions = plan_collections(&group(&items), &[C2.to_owned()]).unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn duplicate_items_act_once() {
        let items = [
            membership(ChangeType::Remove, Some(C2), None),
            membership(ChangeType::Remove, Some(C2), None),
        ];
        let actions = plan_collections(&group(&items), &[]).unwrap();
        assert_eq!(actions, vec![CollectionAction::Add(C2.to_owned())]);
    }

    #[test]
    fn set_change_has_no_inverse() {
        let items = [membership(ChangeType::Set, Some(C1), Some(C2))];
        assert!(matches!(
            plan_collections(&group(&items), &[]).unwrap_err(),
            HandlerError::UnsupportedChange { .. }
        ));
    }

    #[test]
    fn missing_collection_id_is_rejected() {
        let items = [membership(ChangeType::Add, None, None)];
        assert!(matches!(
            plan_collections(&group(&items), &[]).unwrap_err(),
            HandlerError::InvalidValue { .. }
        ));
    }
}

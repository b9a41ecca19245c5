//! End-to-end recorder → dispatcher tests against in-memory doubles.

mod common;

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use spector_bulk_edit::{record_batch, revert_batch, ChangeInput, OperationInput, RevertError};
use spector_core::{Batch, OperationType};
use spector_shopify::{InventoryAdjustment, VariantPriceUpdate};

use common::{FakeAdminApi, MemoryStore, Write};

const SHOP: &str = "acme.myshopify.com";

fn operation(operation_type: &str) -> OperationInput {
    serde_json::from_value(json!({
        "operationType": operation_type,
        "operationName": format!("{operation_type} edit"),
    }))
    .unwrap()
}

fn change(value: serde_json::Value) -> ChangeInput {
    serde_json::from_value(value).unwrap()
}

async fn record(store: &MemoryStore, operation_type: &str, changes: Vec<ChangeInput>) -> Batch {
    record_batch(store, SHOP, operation(operation_type), changes)
        .await
        .expect("record_batch failed")
}

// ---------------------------------------------------------------------------
// Section 1: Pricing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pricing_revert_writes_old_price_and_marks_batch() {
    let store = MemoryStore::default();
    let api = FakeAdminApi::default();
    let batch = record(
        &store,
        "pricing",
        vec![change(json!({
            "productId": "p1", "variantId": "v1", "productTitle": "Hat",
            "field": "price", "oldValue": "10.00", "newValue": "12.00", "changeType": "set"
        }))],
    )
    .await;

    let outcome = revert_batch(&store, &api, SHOP, batch.id)
        .await
        .expect("revert failed");

    assert_eq!(outcome.reverted_count, 1);
    assert!(outcome.errors.is_empty());
    assert_eq!(
        api.writes(),
        vec![Write::Prices {
            product_id: "p1".to_owned(),
            updates: vec![VariantPriceUpdate {
                variant_id: "v1".to_owned(),
                price: Some(Decimal::from_str("10.00").unwrap()),
                compare_at_price: None,
            }],
        }]
    );
    let stored = store.batch(batch.id);
    assert!(stored.is_reverted);
    assert!(!stored.can_revert);
    assert!(stored.reverted_at.is_some());
}

#[tokio::test]
async fn pricing_revert_clears_compare_at_from_null_sentinel() {
    let store = MemoryStore::default();
    let api = FakeAdminApi::default();
    let batch = record(
        &store,
        "pricing",
        vec![
            change(json!({
                "productId": "p1", "variantId": "v1", "productTitle": "Hat",
                "field": "price", "oldValue": "19.99", "newValue": "15.99", "changeType": "set"
            })),
            change(json!({
                "productId": "p1", "variantId": "v1", "productTitle": "Hat",
                "field": "compareAtPrice", "oldValue": "null", "newValue": "19.99",
                "changeType": "set"
            })),
        ],
    )
    .await;

    revert_batch(&store, &api, SHOP, batch.id)
        .await
        .expect("revert failed");

    let writes = api.writes();
    assert_eq!(writes.len(), 1, "one write per variant group");
    match &writes[0] {
        Write::Prices { updates, .. } => {
            assert_eq!(updates[0].price, Some(Decimal::from_str("19.99").unwrap()));
            assert_eq!(updates[0].compare_at_price, Some(None));
        }
        other => panic!("expected price write, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Section 2: Inventory, tags, collections, content
// ---------------------------------------------------------------------------

#[tokio::test]
async fn inventory_revert_adjusts_by_old_minus_new() {
    let store = MemoryStore::default();
    let api = FakeAdminApi::default();
    let batch = record(
        &store,
        "inventory",
        vec![change(json!({
            "productId": "p1", "variantId": "v1", "productTitle": "Hat",
            "field": "inventoryQuantity", "oldValue": 40, "newValue": 25, "changeType": "set"
        }))],
    )
    .await;

    revert_batch(&store, &api, SHOP, batch.id)
        .await
        .expect("revert failed");

    assert_eq!(
        api.writes(),
        vec![Write::Inventory(vec![InventoryAdjustment {
            inventory_item_id: "item-v1".to_owned(),
            location_id: "loc-1".to_owned(),
            delta: 15,
        }])]
    );
}

#[tokio::test]
async fn tags_revert_removes_added_tag_from_current_set() {
    let store = MemoryStore::default();
    let mut api = FakeAdminApi::default();
    api.tags
        .insert("p1".to_owned(), vec!["sale".to_owned(), "new".to_owned()]);
    let batch = record(
        &store,
        "tags",
        vec![change(json!({
            "productId": "p1", "productTitle": "Hat",
            "field": "tags", "newValue": "sale", "changeType": "add"
        }))],
    )
    .await;

    revert_batch(&store, &api, SHOP, batch.id)
        .await
        .expect("revert failed");

    assert_eq!(
        api.writes(),
        vec![Write::Tags {
            product_id: "p1".to_owned(),
            tags: vec!["new".to_owned()],
        }]
    );
}

#[tokio::test]
async fn tags_revert_skips_write_when_nothing_changes() {
    let store = MemoryStore::default();
    let mut api = FakeAdminApi::default();
    api.tags.insert("p1".to_owned(), vec!["new".to_owned()]);
    let batch = record(
        &store,
        "tags",
        vec![change(json!({
            "productId": "p1", "productTitle": "Hat",
            "field": "tags", "newValue": "sale", "changeType": "add"
        }))],
    )
    .await;

    let outcome = revert_batch(&store, &api, SHOP, batch.id)
        .await
        .expect("revert failed");

    assert_eq!(outcome.reverted_count, 1);
    assert!(api.writes().is_empty());
}

#[tokio::test]
async fn collections_revert_uses_current_membership() {
    let store = MemoryStore::default();
    let mut api = FakeAdminApi::default();
    api.collections.insert(
        "p1".to_owned(),
        vec!["gid://shopify/Collection/10".to_owned()],
    );
    let batch = record(
        &store,
        "collections",
        vec![
            change(json!({
                "productId": "p1", "productTitle": "Hat",
                "field": "collections", "newValue": "10", "changeType": "add"
            })),
            change(json!({
                "productId": "p1", "productTitle": "Hat",
                "field": "collections", "oldValue": "20", "changeType": "remove"
            })),
        ],
    )
    .await;

    revert_batch(&store, &api, SHOP, batch.id)
        .await
        .expect("revert failed");

    assert_eq!(
        api.writes(),
        vec![
            Write::RemoveFromCollection {
                collection_id: "gid://shopify/Collection/10".to_owned(),
                product_id: "p1".to_owned(),
            },
            Write::AddToCollection {
                collection_id: "gid://shopify/Collection/20".to_owned(),
                product_id: "p1".to_owned(),
            },
        ]
    );
}

#[tokio::test]
async fn content_revert_restores_title() {
    let store = MemoryStore::default();
    let api = FakeAdminApi::default();
    let batch = record(
        &store,
        "content",
        vec![change(json!({
            "productId": "p1", "productTitle": "New Hat",
            "field": "title", "oldValue": "Old Hat", "newValue": "New Hat", "changeType": "set"
        }))],
    )
    .await;

    revert_batch(&store, &api, SHOP, batch.id)
        .await
        .expect("revert failed");

    match &api.writes()[..] {
        [Write::Content { product_id, update }] => {
            assert_eq!(product_id, "p1");
            assert_eq!(update.title.as_deref(), Some("Old Hat"));
        }
        other => panic!("expected one content write, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Section 3: Partial failure and state
// ---------------------------------------------------------------------------

#[tokio::test]
async fn partial_failure_reports_errors_and_still_marks_reverted() {
    let store = MemoryStore::default();
    let mut api = FakeAdminApi::default();
    api.failing_products.insert("p2".to_owned());

    let changes = ["p1", "p2", "p3"]
        .iter()
        .map(|p| {
            change(json!({
                "productId": p, "productTitle": format!("Product {p}"),
                "field": "title", "oldValue": "Before", "newValue": "After", "changeType": "set"
            }))
        })
        .collect();
    let batch = record(&store, "content", changes).await;

    let outcome = revert_batch(&store, &api, SHOP, batch.id)
        .await
        .expect("revert should run");

    assert_eq!(outcome.reverted_count, 2);
    assert_eq!(outcome.errors, vec!["Failed to revert Product p2".to_owned()]);
    assert_eq!(api.writes().len(), 2);
    assert!(store.batch(batch.id).is_reverted);
}

#[tokio::test]
async fn unknown_field_fails_only_its_group() {
    let store = MemoryStore::default();
    let api = FakeAdminApi::default();
    let batch = record(
        &store,
        "pricing",
        vec![
            change(json!({
                "productId": "p1", "variantId": "v1", "productTitle": "Hat",
                "field": "cost", "oldValue": "1", "newValue": "2", "changeType": "set"
            })),
            change(json!({
                "productId": "p2", "variantId": "v2", "productTitle": "Scarf",
                "field": "price", "oldValue": "5.00", "newValue": "6.00", "changeType": "set"
            })),
        ],
    )
    .await;

    let outcome = revert_batch(&store, &api, SHOP, batch.id)
        .await
        .expect("revert should run");

    assert_eq!(outcome.reverted_count, 1);
    assert_eq!(outcome.errors, vec!["Failed to revert Hat".to_owned()]);
}

#[tokio::test]
async fn second_revert_is_not_revertable_and_writes_nothing() {
    let store = MemoryStore::default();
    let api = FakeAdminApi::default();
    let batch = record(
        &store,
        "pricing",
        vec![change(json!({
            "productId": "p1", "variantId": "v1", "productTitle": "Hat",
            "field": "price", "oldValue": "10.00", "newValue": "12.00", "changeType": "set"
        }))],
    )
    .await;

    revert_batch(&store, &api, SHOP, batch.id)
        .await
        .expect("first revert failed");
    let writes_after_first = api.writes().len();

    let err = revert_batch(&store, &api, SHOP, batch.id)
        .await
        .expect_err("second revert must fail");

    assert!(matches!(err, RevertError::NotRevertable { batch_id } if batch_id == batch.id));
    assert_eq!(api.writes().len(), writes_after_first);
    assert_eq!(store.mark_calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn opted_out_batch_is_not_revertable() {
    let store = MemoryStore::default();
    let api = FakeAdminApi::default();
    let mut op = operation("pricing");
    op.can_revert = Some(false);
    let batch = record_batch(
        &store,
        SHOP,
        op,
        vec![change(json!({
            "productId": "p1", "variantId": "v1", "productTitle": "Hat",
            "field": "price", "oldValue": "10.00", "newValue": "12.00", "changeType": "set"
        }))],
    )
    .await
    .expect("record failed");

    let err = revert_batch(&store, &api, SHOP, batch.id)
        .await
        .expect_err("opted-out batch must not revert");
    assert!(matches!(err, RevertError::NotRevertable { .. }));
    assert!(api.writes().is_empty());
    assert!(store.mark_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn variants_batch_is_recorded_but_not_revertable() {
    let store = MemoryStore::default();
    let api = FakeAdminApi::default();
    let batch = record(
        &store,
        "variants",
        vec![change(json!({
            "productId": "p1", "variantId": "v1", "productTitle": "Hat",
            "field": "sku", "oldValue": "HAT-1", "newValue": "HAT-2", "changeType": "set"
        }))],
    )
    .await;
    assert!(!batch.can_revert);

    let err = revert_batch(&store, &api, SHOP, batch.id)
        .await
        .expect_err("variants batch must not revert");
    assert!(matches!(err, RevertError::NotRevertable { .. }));
    assert!(api.writes().is_empty());
}

#[tokio::test]
async fn revertable_variants_batch_is_unsupported() {
    let store = MemoryStore::default();
    let api = FakeAdminApi::default();
    let mut batch = record(
        &store,
        "variants",
        vec![change(json!({
            "productId": "p1", "variantId": "v1", "productTitle": "Hat",
            "field": "weight", "oldValue": "1.0", "newValue": "2.0", "changeType": "set"
        }))],
    )
    .await;
    batch.id = Uuid::new_v4();
    batch.can_revert = true;
    store.insert(batch.clone());

    let err = revert_batch(&store, &api, SHOP, batch.id)
        .await
        .expect_err("variants have no handler");
    assert!(matches!(
        err,
        RevertError::UnsupportedOperation {
            operation_type: OperationType::Variants
        }
    ));
    assert!(api.writes().is_empty());
    assert!(!store.batch(batch.id).is_reverted);
}

#[tokio::test]
async fn other_shops_batch_is_not_found() {
    let store = MemoryStore::default();
    let api = FakeAdminApi::default();
    let batch = record(
        &store,
        "content",
        vec![change(json!({
            "productId": "p1", "productTitle": "Hat",
            "field": "title", "oldValue": "A", "newValue": "B", "changeType": "set"
        }))],
    )
    .await;

    let err = revert_batch(&store, &api, "other.myshopify.com", batch.id)
        .await
        .expect_err("other tenant must not see the batch");
    assert!(matches!(err, RevertError::NotFound));

    let err = revert_batch(&store, &api, SHOP, Uuid::new_v4())
        .await
        .expect_err("unknown id");
    assert!(matches!(err, RevertError::NotFound));
}

#[tokio::test]
async fn invalid_creation_input_persists_nothing() {
    let store = MemoryStore::default();
    let err = record_batch(&store, SHOP, operation("pricing"), vec![])
        .await
        .expect_err("empty change list must fail");
    assert!(matches!(err, spector_bulk_edit::RecordError::Validation(_)));
    assert_eq!(store.len(), 0);
}

//! Database operations for `bulk_edit_batches` and `bulk_edit_items`.
//!
//! Every read is filtered by `shop`; callers never see another tenant's rows.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use spector_core::{Batch, ChangeItem, NewBatch};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const BATCH_COLUMNS: &str = "id, public_id, shop, operation_type, operation_name, description, \
     product_count, variant_count, can_revert, is_reverted, reverted_at, created_at";

const ITEM_COLUMNS: &str = "id, public_id, batch_id, position, product_id, variant_id, \
     product_title, variant_title, field, old_value, new_value, change_type, created_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `bulk_edit_batches` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BatchRow {
    pub id: i64,
    pub public_id: Uuid,
    pub shop: String,
    pub operation_type: String,
    pub operation_name: String,
    pub description: Option<String>,
    pub product_count: i32,
    pub variant_count: i32,
    pub can_revert: bool,
    pub is_reverted: bool,
    pub reverted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A row from the `bulk_edit_items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChangeItemRow {
    pub id: i64,
    pub public_id: Uuid,
    pub batch_id: i64,
    /// Zero-based order the change was reported in.
    pub position: i32,
    pub product_id: String,
    pub variant_id: Option<String>,
    pub product_title: String,
    pub variant_title: Option<String>,
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub change_type: String,
    pub created_at: DateTime<Utc>,
}

impl BatchRow {
    /// Assembles the domain batch, parsing the stored enum columns.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidColumn`] if `operation_type` or an item's
    /// `change_type` holds a value outside the known vocabulary.
    pub fn into_batch(self, items: Vec<ChangeItemRow>) -> Result<Batch, DbError> {
        let operation_type = self
            .operation_type
            .parse()
            .map_err(|_| DbError::InvalidColumn {
                column: "bulk_edit_batches.operation_type",
                value: self.operation_type.clone(),
            })?;

        let items = items
            .into_iter()
            .map(ChangeItemRow::into_item)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Batch {
            id: self.public_id,
            shop: self.shop,
            operation_type,
            operation_name: self.operation_name,
            description: self.description,
            product_count: self.product_count,
            variant_count: self.variant_count,
            can_revert: self.can_revert,
            is_reverted: self.is_reverted,
            reverted_at: self.reverted_at,
            created_at: self.created_at,
            items,
        })
    }
}

impl ChangeItemRow {
    fn into_item(self) -> Result<ChangeItem, DbError> {
        let change_type = self
            .change_type
            .parse()
            .map_err(|_| DbError::InvalidColumn {
                column: "bulk_edit_items.change_type",
                value: self.change_type.clone(),
            })?;

        Ok(ChangeItem {
            id: self.public_id,
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

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts a batch and all of its items in one transaction.
///
/// Either the batch row and every item row commit together or nothing is
/// written; a failure on any item rolls back the batch.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails (the transaction is rolled
/// back on drop).
pub async fn insert_batch(pool: &PgPool, new_batch: &NewBatch) -> Result<Batch, DbError> {
    let product_count = i32::try_from(new_batch.product_count()).unwrap_or(i32::MAX);
    let variant_count = i32::try_from(new_batch.variant_count()).unwrap_or(i32::MAX);

    let mut tx = pool.begin().await?;

    let batch_row = sqlx::query_as::<_, BatchRow>(&format!(
        "INSERT INTO bulk_edit_batches \
             (public_id, shop, operation_type, operation_name, description, \
              product_count, variant_count, can_revert) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {BATCH_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(&new_batch.shop)
    .bind(new_batch.operation_type.as_str())
    .bind(&new_batch.operation_name)
    .bind(&new_batch.description)
    .bind(product_count)
    .bind(variant_count)
    .bind(new_batch.can_revert)
    .fetch_one(&mut *tx)
    .await?;

    let mut items = Vec::with_capacity(new_batch.changes.len());
    for (position, change) in new_batch.changes.iter().enumerate() {
        let position = i32::try_from(position).unwrap_or(i32::MAX);
        let item = sqlx::query_as::<_, ChangeItemRow>(&format!(
            "INSERT INTO bulk_edit_items \
                 (public_id, batch_id, position, product_id, variant_id, product_title, \
                  variant_title, field, old_value, new_value, change_type) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(batch_row.id)
        .bind(position)
        .bind(&change.product_id)
        .bind(&change.variant_id)
        .bind(&change.product_title)
        .bind(&change.variant_title)
        .bind(&change.field)
        .bind(&change.old_value)
        .bind(&change.new_value)
        .bind(change.change_type.as_str())
        .fetch_one(&mut *tx)
        .await?;
        items.push(item);
    }

    tx.commit().await?;

    tracing::info!(
        batch_id = %batch_row.public_id,
        shop = %batch_row.shop,
        operation_type = %batch_row.operation_type,
        items = items.len(),
        "bulk edit batch recorded"
    );

    batch_row.into_batch(items)
}

/// Flips a batch to the terminal reverted state and stamps `reverted_at`.
///
/// Guarded by `is_reverted = false`, so a batch is marked at most once.
///
/// # Errors
///
/// Returns [`DbError::InvalidBatchTransition`] if no unreverted batch with
/// that id exists, or [`DbError::Sqlx`] if the update fails.
pub async fn mark_batch_reverted(
    pool: &PgPool,
    batch_id: Uuid,
) -> Result<DateTime<Utc>, DbError> {
    sqlx::query_scalar::<_, DateTime<Utc>>(
        "UPDATE bulk_edit_batches \
         SET is_reverted = true, can_revert = false, reverted_at = NOW() \
         WHERE public_id = $1 AND is_reverted = false \
         RETURNING reverted_at",
    )
    .bind(batch_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::InvalidBatchTransition { batch_id })
}

/// Deletes every batch (items cascade) belonging to `shop`.
///
/// Returns the number of batches removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_shop_batches(pool: &PgPool, shop: &str) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM bulk_edit_batches WHERE shop = $1")
        .bind(shop)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Fetches one batch with its items, scoped to `shop`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the id is unknown or belongs to another
/// shop, or [`DbError::Sqlx`] if a query fails.
pub async fn get_batch(pool: &PgPool, shop: &str, batch_id: Uuid) -> Result<Batch, DbError> {
    let row = sqlx::query_as::<_, BatchRow>(&format!(
        "SELECT {BATCH_COLUMNS} \
         FROM bulk_edit_batches \
         WHERE public_id = $1 AND shop = $2"
    ))
    .bind(batch_id)
    .bind(shop)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    let items = sqlx::query_as::<_, ChangeItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} \
         FROM bulk_edit_items \
         WHERE batch_id = $1 \
         ORDER BY position"
    ))
    .bind(row.id)
    .fetch_all(pool)
    .await?;

    row.into_batch(items)
}

/// Returns the most recent `limit` batches for `shop`, newest first, each
/// with its items.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails, or [`DbError::InvalidColumn`]
/// if a stored enum column cannot be parsed.
pub async fn list_recent_batches(
    pool: &PgPool,
    shop: &str,
    limit: i64,
) -> Result<Vec<Batch>, DbError> {
    let rows = sqlx::query_as::<_, BatchRow>(&format!(
        "SELECT {BATCH_COLUMNS} \
         FROM bulk_edit_batches \
         WHERE shop = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2"
    ))
    .bind(shop)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let batch_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let item_rows = sqlx::query_as::<_, ChangeItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} \
         FROM bulk_edit_items \
         WHERE batch_id = ANY($1) \
         ORDER BY batch_id, position"
    ))
    .bind(&batch_ids)
    .fetch_all(pool)
    .await?;

    let mut items_by_batch: HashMap<i64, Vec<ChangeItemRow>> = HashMap::new();
    for item in item_rows {
        items_by_batch.entry(item.batch_id).or_default().push(item);
    }

    rows.into_iter()
        .map(|row| {
            let items = items_by_batch.remove(&row.id).unwrap_or_default();
            row.into_batch(items)
        })
        .collect()
}

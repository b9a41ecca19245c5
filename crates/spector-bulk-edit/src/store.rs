//! Batch persistence seam. The recorder and dispatcher take `&dyn BatchStore`
//! so the hosting binary owns the pool and tests can substitute memory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use spector_core::{Batch, NewBatch};
use spector_db::DbError;

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 200;

/// Applies the listing default and clamps to `1..=MAX_LIST_LIMIT`.
#[must_use]
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT)
}

#[async_trait]
pub trait BatchStore: Send + Sync {
    /// Persists a batch and all its items atomically.
    async fn create(&self, batch: &NewBatch) -> Result<Batch, DbError>;

    /// Newest-first batches for `shop`. `limit` is already clamped.
    async fn list_recent(&self, shop: &str, limit: i64) -> Result<Vec<Batch>, DbError>;

    /// One batch with its items; [`DbError::NotFound`] for other tenants.
    async fn get(&self, shop: &str, batch_id: Uuid) -> Result<Batch, DbError>;

    /// One-way flip to the reverted state.
    async fn mark_reverted(&self, batch_id: Uuid) -> Result<DateTime<Utc>, DbError>;

    /// Deletes every batch belonging to `shop`, returning how many.
    async fn erase_shop(&self, shop: &str) -> Result<u64, DbError>;
}

/// Postgres-backed store delegating to `spector_db`.
#[derive(Debug, Clone)]
pub struct PgBatchStore {
    pool: PgPool,
}

impl PgBatchStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BatchStore for PgBatchStore {
    async fn create(&self, batch: &NewBatch) -> Result<Batch, DbError> {
        spector_db::insert_batch(&self.pool, batch).await
    }

    async fn list_recent(&self, shop: &str, limit: i64) -> Result<Vec<Batch>, DbError> {
        spector_db::list_recent_batches(&self.pool, shop, limit).await
    }

    async fn get(&self, shop: &str, batch_id: Uuid) -> Result<Batch, DbError> {
        spector_db::get_batch(&self.pool, shop, batch_id).await
    }

    async fn mark_reverted(&self, batch_id: Uuid) -> Result<DateTime<Utc>, DbError> {
        spector_db::mark_batch_reverted(&self.pool, batch_id).await
    }

    async fn erase_shop(&self, shop: &str) -> Result<u64, DbError> {
        spector_db::delete_shop_batches(&self.pool, shop).await
    }
}

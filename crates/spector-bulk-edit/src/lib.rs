//! Bulk-edit history engine: records batches of field-level changes and
//! replays their inverses against the Shopify Admin API.

pub mod handlers;
pub mod recorder;
pub mod revert;
pub mod store;

use thiserror::Error;
use uuid::Uuid;

use spector_core::{CoreError, OperationType};
use spector_db::DbError;
use spector_shopify::ShopifyError;

pub use handlers::{handler_for, ResourceGroup, RevertHandler};
pub use recorder::{record_batch, ChangeInput, OperationInput};
pub use revert::{group_items, revert_batch, RevertOutcome};
pub use store::{clamp_limit, BatchStore, PgBatchStore, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};

/// Creation input was rejected; nothing was persisted.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] DbError),
}

impl From<CoreError> for RecordError {
    fn from(err: CoreError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// A revert that could not start. Per-group failures are not errors; they
/// are reported in [`RevertOutcome::errors`].
#[derive(Debug, Error)]
pub enum RevertError {
    #[error("batch not found")]
    NotFound,
    #[error("batch {batch_id} cannot be reverted")]
    NotRevertable { batch_id: Uuid },
    #[error("revert is not supported for {operation_type} batches")]
    UnsupportedOperation { operation_type: OperationType },
    #[error(transparent)]
    Store(DbError),
}

impl From<DbError> for RevertError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => Self::NotFound,
            DbError::InvalidBatchTransition { batch_id } => Self::NotRevertable { batch_id },
            other => Self::Store(other),
        }
    }
}

/// Why one resource group could not be reverted.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("field \"{field}\" cannot be reverted by the {operation_type} handler")]
    UnknownField {
        operation_type: OperationType,
        field: String,
    },
    #[error("change type \"{change_type}\" on \"{field}\" has no inverse")]
    UnsupportedChange { field: String, change_type: String },
    #[error("invalid value for \"{field}\": {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("{operation_type} changes must target a variant")]
    MissingVariant { operation_type: OperationType },
    #[error(transparent)]
    Platform(#[from] ShopifyError),
}

use axum::{
    extract::{FromRequest, Path, Query, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Extension, Form, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spector_bulk_edit::{
    clamp_limit, record_batch, revert_batch, BatchStore, ChangeInput, OperationInput, RecordError,
    RevertError, RevertOutcome,
};
use spector_core::Batch;

use super::{map_db_error, tenant::ShopContext, ApiError, ApiResponse, AppState};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct BulkEditQuery {
    pub limit: Option<i64>,
}

/// Body of `POST /api/v1/bulk-edits`, discriminated by `action`.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(super) enum BulkEditAction {
    Create {
        operation: OperationInput,
        #[serde(default)]
        changes: Vec<ChangeInput>,
    },
    Revert {
        #[serde(alias = "batchId")]
        batch_id: Uuid,
    },
}

/// Form-encoded variant of [`BulkEditAction`]: `operation` and `changes`
/// arrive as JSON strings.
#[derive(Debug, Deserialize)]
struct ActionForm {
    action: String,
    #[serde(default)]
    operation: Option<String>,
    #[serde(default)]
    changes: Option<String>,
    #[serde(default, alias = "batchId")]
    batch_id: Option<String>,
}

impl ActionForm {
    fn into_action(self) -> Result<BulkEditAction, String> {
        match self.action.trim() {
            "create" => {
                let raw = self.operation.ok_or("missing operation")?;
                let operation: OperationInput =
                    serde_json::from_str(&raw).map_err(|e| format!("invalid operation: {e}"))?;
                let changes = match self.changes {
                    Some(raw) => serde_json::from_str(&raw)
                        .map_err(|e| format!("invalid changes: {e}"))?,
                    None => Vec::new(),
                };
                Ok(BulkEditAction::Create { operation, changes })
            }
            "revert" => {
                let raw = self.batch_id.ok_or("missing batch_id")?;
                let batch_id =
                    Uuid::parse_str(raw.trim()).map_err(|e| format!("invalid batch_id: {e}"))?;
                Ok(BulkEditAction::Revert { batch_id })
            }
            other => Err(format!("unknown action: {other}")),
        }
    }
}

/// Revert result as returned to the bulk-edit UI. `errors` is `null` when
/// every resource group reverted.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct RevertResponse {
    pub success: bool,
    pub reverted_count: usize,
    pub errors: Option<Vec<String>>,
}

impl From<RevertOutcome> for RevertResponse {
    fn from(outcome: RevertOutcome) -> Self {
        Self {
            success: true,
            reverted_count: outcome.reverted_count,
            errors: (!outcome.errors.is_empty()).then_some(outcome.errors),
        }
    }
}

fn map_record_error(request_id: String, error: RecordError) -> ApiError {
    match error {
        RecordError::Validation(message) => ApiError::new(request_id, "validation_error", message),
        RecordError::Store(e) => map_db_error(request_id, &e),
    }
}

fn map_revert_error(request_id: String, error: RevertError) -> ApiError {
    match error {
        RevertError::NotFound => ApiError::new(request_id, "not_found", "bulk edit not found"),
        e @ RevertError::NotRevertable { .. } => {
            ApiError::new(request_id, "not_revertable", e.to_string())
        }
        e @ RevertError::UnsupportedOperation { .. } => {
            ApiError::new(request_id, "unsupported_operation", e.to_string())
        }
        RevertError::Store(e) => map_db_error(request_id, &e),
    }
}

pub(super) async fn list_bulk_edits(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    tenant: ShopContext,
    Query(params): Query<BulkEditQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = clamp_limit(params.limit);
    let batches = state
        .store
        .list_recent(&tenant.shop, limit)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, batches)))
}

pub(super) async fn get_bulk_edit(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    tenant: ShopContext,
    Path(batch_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let batch = state
        .store
        .get(&tenant.shop, batch_id)
        .await
        .map_err(|e| match e {
            spector_db::DbError::NotFound => {
                ApiError::new(req_id.0.clone(), "not_found", "bulk edit not found")
            }
            other => map_db_error(req_id.0.clone(), &other),
        })?;

    Ok(Json(ApiResponse::new(req_id.0, batch)))
}

pub(super) async fn revert_bulk_edit(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    tenant: ShopContext,
    Path(batch_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let response = run_revert(&state, req_id.0.clone(), &tenant, batch_id).await?;
    Ok(Json(ApiResponse::new(req_id.0, response)))
}

/// Action endpoint for the bulk-edit page: `create` records a batch,
/// `revert` replays one. Accepts JSON or form-encoded bodies.
pub(super) async fn bulk_edit_action(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    tenant: ShopContext,
    req: Request,
) -> Result<Response, ApiError> {
    match parse_action(req, &req_id.0).await? {
        BulkEditAction::Create { operation, changes } => {
            let batch = create(&state, req_id.0.clone(), &tenant, operation, changes).await?;
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::new(req_id.0, batch)),
            )
                .into_response())
        }
        BulkEditAction::Revert { batch_id } => {
            let response = run_revert(&state, req_id.0.clone(), &tenant, batch_id).await?;
            Ok(Json(ApiResponse::new(req_id.0, response)).into_response())
        }
    }
}

async fn parse_action(req: Request, request_id: &str) -> Result<BulkEditAction, ApiError> {
    let is_form = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        let Form(form) = Form::<ActionForm>::from_request(req, &())
            .await
            .map_err(|e| ApiError::new(request_id, "bad_request", e.body_text()))?;
        form.into_action()
            .map_err(|message| ApiError::new(request_id, "validation_error", message))
    } else {
        let Json(action) = Json::<BulkEditAction>::from_request(req, &())
            .await
            .map_err(|e| ApiError::new(request_id, "validation_error", e.body_text()))?;
        Ok(action)
    }
}

async fn create(
    state: &AppState,
    request_id: String,
    tenant: &ShopContext,
    operation: OperationInput,
    changes: Vec<ChangeInput>,
) -> Result<Batch, ApiError> {
    record_batch(&state.store, &tenant.shop, operation, changes)
        .await
        .map_err(|e| map_record_error(request_id, e))
}

async fn run_revert(
    state: &AppState,
    request_id: String,
    tenant: &ShopContext,
    batch_id: Uuid,
) -> Result<RevertResponse, ApiError> {
    let token = tenant.access_token(&request_id)?;
    let client = state.admin_client(&tenant.shop, token).map_err(|e| {
        tracing::error!(shop = %tenant.shop, error = %e, "failed to build admin client");
        ApiError::new(request_id.clone(), "platform_error", e.to_string())
    })?;

    let outcome = revert_batch(&state.store, &client, &tenant.shop, batch_id)
        .await
        .map_err(|e| map_revert_error(request_id, e))?;

    Ok(outcome.into())
}

#[cfg(test)]
#[path = "bulk_edits_test.rs"]
mod tests;

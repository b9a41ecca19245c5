use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Serialize;

use spector_bulk_edit::BatchStore;

use super::{map_db_error, tenant::ShopContext, ApiError, ApiResponse, AppState};
use crate::middleware::RequestId;

/// Mandatory privacy topics, as they appear in the route path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComplianceTopic {
    CustomersDataRequest,
    CustomersRedact,
    ShopRedact,
}

impl ComplianceTopic {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('/', "-").as_str() {
            "customers-data-request" => Some(Self::CustomersDataRequest),
            "customers-redact" => Some(Self::CustomersRedact),
            "shop-redact" => Some(Self::ShopRedact),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::CustomersDataRequest => "customers-data-request",
            Self::CustomersRedact => "customers-redact",
            Self::ShopRedact => "shop-redact",
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ComplianceAck {
    topic: &'static str,
    erased_batches: u64,
}

/// Acknowledges a privacy webhook. Batches hold no customer data, so only
/// `shop-redact` touches the store: it erases every batch of the shop.
pub(super) async fn compliance_webhook(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    tenant: ShopContext,
    Path(topic): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let topic = ComplianceTopic::parse(&topic).ok_or_else(|| {
        ApiError::new(
            req_id.0.clone(),
            "not_found",
            format!("unknown compliance topic: {topic}"),
        )
    })?;

    let erased_batches = match topic {
        ComplianceTopic::ShopRedact => state
            .store
            .erase_shop(&tenant.shop)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?,
        ComplianceTopic::CustomersDataRequest | ComplianceTopic::CustomersRedact => 0,
    };

    tracing::info!(
        shop = %tenant.shop,
        topic = topic.as_str(),
        erased_batches,
        "compliance webhook handled"
    );

    Ok(Json(ApiResponse::new(
        req_id.0,
        ComplianceAck {
            topic: topic.as_str(),
            erased_batches,
        },
    )))
}

mod bulk_edits;
mod tenant;
mod webhooks;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use spector_bulk_edit::PgBatchStore;
use spector_shopify::{ClientSettings, ShopifyAdminClient, ShopifyError};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub store: PgBatchStore,
    /// Shared connection pool for every per-shop Admin API client.
    pub http: reqwest::Client,
    pub shopify: Arc<ClientSettings>,
}

impl AppState {
    /// # Errors
    ///
    /// Returns [`ShopifyError::Http`] if the shared HTTP client cannot be built.
    pub fn new(pool: PgPool, shopify: ClientSettings) -> Result<Self, ShopifyError> {
        let http = ShopifyAdminClient::build_http_client(&shopify)?;
        Ok(Self {
            store: PgBatchStore::new(pool.clone()),
            pool,
            http,
            shopify: Arc::new(shopify),
        })
    }

    pub(super) fn admin_client(
        &self,
        shop: &str,
        access_token: &str,
    ) -> Result<ShopifyAdminClient, ShopifyError> {
        ShopifyAdminClient::with_http_client(self.http.clone(), &self.shopify, shop, access_token)
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(request_id: String, data: T) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "not_revertable" => StatusCode::CONFLICT,
            "unsupported_operation" => StatusCode::UNPROCESSABLE_ENTITY,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "platform_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &spector_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static(tenant::SHOP_DOMAIN_HEADER),
            HeaderName::from_static(tenant::ACCESS_TOKEN_HEADER),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/bulk-edits",
            get(bulk_edits::list_bulk_edits).post(bulk_edits::bulk_edit_action),
        )
        .route(
            "/api/v1/bulk-edits/{batch_id}",
            get(bulk_edits::get_bulk_edit),
        )
        .route(
            "/api/v1/bulk-edits/{batch_id}/revert",
            post(bulk_edits::revert_bulk_edit),
        )
        .route(
            "/api/v1/webhooks/compliance/{topic}",
            post(webhooks::compliance_webhook),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    match spector_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::new(
                req_id.0,
                HealthData {
                    status: "ok",
                    database: "ok",
                },
            )),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::new(
                    req_id.0,
                    HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                )),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}


#[cfg(test)]
mod tests {
    use super::test_support::{body_json, test_app};
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[test]
    fn api_error_codes_map_to_statuses() {
        let cases = [
            ("validation_error", StatusCode::BAD_REQUEST),
            ("bad_request", StatusCode::BAD_REQUEST),
            ("unauthorized", StatusCode::UNAUTHORIZED),
            ("not_found", StatusCode::NOT_FOUND),
            ("not_revertable", StatusCode::CONFLICT),
            ("unsupported_operation", StatusCode::UNPROCESSABLE_ENTITY),
            ("rate_limited", StatusCode::TOO_MANY_REQUESTS),
            ("platform_error", StatusCode::BAD_GATEWAY),
            ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, status) in cases {
            let response = ApiError::new("req-1", code, "message").into_response();
            assert_eq!(response.status(), status, "code {code}");
        }
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn health_reports_ok_with_database(pool: PgPool) {
        let app = test_app(pool, ClientSettings::default());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header("x-request-id", "req-health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("x-request-id").map(|v| v.as_bytes()),
            Some(&b"req-health"[..])
        );
        let json = body_json(response).await;
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["meta"]["request_id"], "req-health");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn protected_routes_require_bearer_token_when_enabled(pool: PgPool) {
        let auth = AuthState::from_keys("secret-key", false).expect("auth");
        let state = AppState::new(pool, ClientSettings::default()).expect("state");
        let app = build_app(state, auth, default_rate_limit_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/bulk-edits")
                    .header(tenant::SHOP_DOMAIN_HEADER, "demo.myshopify.com")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

use axum::{extract::FromRequestParts, http::request::Parts};

use spector_core::normalize_shop_domain;

use super::ApiError;
use crate::middleware::RequestId;

pub(super) const SHOP_DOMAIN_HEADER: &str = "x-shopify-shop-domain";
pub(super) const ACCESS_TOKEN_HEADER: &str = "x-shopify-access-token";

/// Tenant identity resolved from the embedding app's session headers.
#[derive(Debug, Clone)]
pub(super) struct ShopContext {
    /// Normalized shop domain; every store query is scoped to it.
    pub shop: String,
    access_token: Option<String>,
}

impl ShopContext {
    /// Admin API token, required only by routes that write to Shopify.
    pub fn access_token(&self, request_id: &str) -> Result<&str, ApiError> {
        self.access_token.as_deref().ok_or_else(|| {
            ApiError::new(
                request_id,
                "unauthorized",
                format!("missing {ACCESS_TOKEN_HEADER} header"),
            )
        })
    }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl<S: Send + Sync> FromRequestParts<S> for ShopContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .extensions
            .get::<RequestId>()
            .map(|id| id.0.clone())
            .unwrap_or_default();

        let raw_shop = header_str(parts, SHOP_DOMAIN_HEADER).ok_or_else(|| {
            ApiError::new(
                request_id.clone(),
                "bad_request",
                format!("missing {SHOP_DOMAIN_HEADER} header"),
            )
        })?;
        let shop = normalize_shop_domain(raw_shop)
            .map_err(|e| ApiError::new(request_id.clone(), "validation_error", e.to_string()))?;

        Ok(Self {
            shop,
            access_token: header_str(parts, ACCESS_TOKEN_HEADER).map(ToOwned::to_owned),
        })
    }
}

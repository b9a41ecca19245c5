use std::fmt;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::ShopifyError;
use crate::graphql::{decode_response, GraphqlRequest};
use crate::rate_limit::{retry_with_backoff, Idempotency};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";
const USER_AGENT: &str = concat!("spector/", env!("CARGO_PKG_VERSION"));

/// Connection and retry policy shared by every per-shop client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Admin API version segment, e.g. `2025-01`.
    pub api_version: String,
    pub timeout_secs: u64,
    /// Additional attempts after the first failure for retriable errors.
    pub max_retries: u32,
    /// Base delay for exponential backoff: `backoff_base_secs * 2^attempt`.
    pub backoff_base_secs: u64,
    /// Replaces `https://{shop}` as the API origin. Used for local mocks.
    pub admin_base_url: Option<String>,
}

impl ClientSettings {
    #[must_use]
    pub fn from_app_config(config: &spector_core::AppConfig) -> Self {
        Self {
            api_version: config.shopify_api_version.clone(),
            timeout_secs: config.shopify_request_timeout_secs,
            max_retries: config.shopify_max_retries,
            backoff_base_secs: config.shopify_retry_backoff_base_secs,
            admin_base_url: config.shopify_admin_base_url.clone(),
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_version: "2025-01".to_owned(),
            timeout_secs: 30,
            max_retries: 3,
            backoff_base_secs: 1,
            admin_base_url: None,
        }
    }
}

/// Admin GraphQL client bound to one shop and access token.
///
/// Cheap to construct: the underlying `reqwest::Client` is shared, so servers
/// build one of these per request from the tenant headers.
///
/// Transient errors (429, GraphQL `THROTTLED`, and network failures on reads)
/// are retried with exponential backoff up to `max_retries` additional
/// attempts.
#[derive(Clone)]
pub struct ShopifyAdminClient {
    http: Client,
    shop: String,
    endpoint: String,
    access_token: String,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl fmt::Debug for ShopifyAdminClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShopifyAdminClient")
            .field("shop", &self.shop)
            .field("endpoint", &self.endpoint)
            .field("access_token", &"[redacted]")
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl ShopifyAdminClient {
    /// Builds the shared HTTP client with the configured timeout and
    /// `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::Http`] if the `reqwest::Client` cannot be
    /// constructed (e.g., invalid TLS config).
    pub fn build_http_client(settings: &ClientSettings) -> Result<Client, ShopifyError> {
        Ok(Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?)
    }

    /// Creates a client with its own HTTP connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::Http`] if the HTTP client cannot be built, or
    /// [`ShopifyError::InvalidShopUrl`] if the endpoint cannot be derived from
    /// `shop`.
    pub fn new(
        settings: &ClientSettings,
        shop: &str,
        access_token: &str,
    ) -> Result<Self, ShopifyError> {
        let http = Self::build_http_client(settings)?;
        Self::with_http_client(http, settings, shop, access_token)
    }

    /// Creates a client that reuses an existing HTTP connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::InvalidShopUrl`] if the endpoint cannot be
    /// derived from `shop`.
    pub fn with_http_client(
        http: Client,
        settings: &ClientSettings,
        shop: &str,
        access_token: &str,
    ) -> Result<Self, ShopifyError> {
        let endpoint = graphql_endpoint(settings, shop)?;
        Ok(Self {
            http,
            shop: shop.to_owned(),
            endpoint,
            access_token: access_token.to_owned(),
            max_retries: settings.max_retries,
            backoff_base_secs: settings.backoff_base_secs,
        })
    }

    #[must_use]
    pub fn shop(&self) -> &str {
        &self.shop
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Posts one GraphQL document and decodes its `data` payload as `T`.
    ///
    /// # Errors
    ///
    /// - [`ShopifyError::RateLimited`]: HTTP 429 after all retries exhausted.
    /// - [`ShopifyError::Throttled`]: `THROTTLED` after all retries exhausted.
    /// - [`ShopifyError::Unauthorized`]: HTTP 401/403 (not retried).
    /// - [`ShopifyError::UnexpectedStatus`]: any other non-2xx status.
    /// - [`ShopifyError::Http`]: network or TLS failure.
    /// - [`ShopifyError::GraphQl`] / [`ShopifyError::Deserialize`]: bad
    ///   payloads (not retried).
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        context: &str,
        query: &str,
        variables: serde_json::Value,
        idempotency: Idempotency,
    ) -> Result<T, ShopifyError> {
        let request = GraphqlRequest { query, variables };
        let request = &request;

        retry_with_backoff(
            self.max_retries,
            self.backoff_base_secs,
            idempotency,
            move || async move {
                tracing::debug!(shop = %self.shop, context, "sending Admin GraphQL request");
                let response = self
                    .http
                    .post(&self.endpoint)
                    .header(ACCESS_TOKEN_HEADER, &self.access_token)
                    .json(request)
                    .send()
                    .await?;
                let status = response.status();

                if status == StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(parse_retry_after)
                        .unwrap_or(2);
                    return Err(ShopifyError::RateLimited {
                        shop: self.shop.clone(),
                        retry_after_secs,
                    });
                }

                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                    return Err(ShopifyError::Unauthorized {
                        shop: self.shop.clone(),
                    });
                }

                if !status.is_success() {
                    return Err(ShopifyError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: self.endpoint.clone(),
                    });
                }

                let body = response.text().await?;
                decode_response(&self.shop, context, &body)
            },
        )
        .await
    }
}

/// Shopify sends `Retry-After` as a decimal number of seconds (`"2.0"`).
fn parse_retry_after(raw: &str) -> Option<u64> {
    let secs = raw.trim().parse::<f64>().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(secs.ceil() as u64)
}

/// Derives `{origin}/admin/api/{version}/graphql.json` for `shop`.
///
/// The origin is `https://{shop}` unless `admin_base_url` overrides it.
pub(crate) fn graphql_endpoint(
    settings: &ClientSettings,
    shop: &str,
) -> Result<String, ShopifyError> {
    let shop = shop.trim();
    if shop.is_empty() || shop.contains('/') {
        return Err(ShopifyError::InvalidShopUrl {
            shop: shop.to_owned(),
            reason: "expected a bare shop domain".to_owned(),
        });
    }

    let origin = settings.admin_base_url.as_deref().map_or_else(
        || format!("https://{shop}"),
        |base| base.trim_end_matches('/').to_owned(),
    );

    let url = reqwest::Url::parse(&format!(
        "{origin}/admin/api/{}/graphql.json",
        settings.api_version
    ))
    .map_err(|e| ShopifyError::InvalidShopUrl {
        shop: shop.to_owned(),
        reason: e.to_string(),
    })?;

    Ok(url.to_string())
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;

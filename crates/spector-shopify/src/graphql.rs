//! Typed envelopes for Admin GraphQL responses.
//!
//! Every response is checked at this boundary: top-level `errors` become
//! [`ShopifyError::GraphQl`] (or [`ShopifyError::Throttled`] when Shopify
//! reports cost exhaustion) and mutation `userErrors` become
//! [`ShopifyError::UserErrors`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ShopifyError;

const THROTTLED_CODE: &str = "THROTTLED";

/// Request body posted to `graphql.json`.
#[derive(Debug, Serialize)]
pub(crate) struct GraphqlRequest<'a> {
    pub query: &'a str,
    pub variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GraphqlError {
    pub message: String,
    #[serde(default)]
    pub extensions: Option<GraphqlErrorExtensions>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GraphqlErrorExtensions {
    pub code: Option<String>,
}

impl GraphqlError {
    fn is_throttled(&self) -> bool {
        self.extensions
            .as_ref()
            .and_then(|e| e.code.as_deref())
            .is_some_and(|code| code == THROTTLED_CODE)
    }
}

/// A `userErrors` entry returned by a mutation payload.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

impl UserError {
    fn describe(&self) -> String {
        match self.field.as_deref() {
            Some(path) if !path.is_empty() => format!("{}: {}", path.join("."), self.message),
            _ => self.message.clone(),
        }
    }
}

/// Fails with [`ShopifyError::UserErrors`] if `errors` is non-empty.
pub(crate) fn check_user_errors(mutation: &str, errors: &[UserError]) -> Result<(), ShopifyError> {
    if errors.is_empty() {
        return Ok(());
    }
    Err(ShopifyError::UserErrors {
        mutation: mutation.to_owned(),
        messages: errors.iter().map(UserError::describe).collect(),
    })
}

/// Decodes a raw response body and unwraps its `data` payload.
///
/// # Errors
///
/// - [`ShopifyError::Deserialize`] when the body does not match `T`.
/// - [`ShopifyError::Throttled`] when any top-level error carries the
///   `THROTTLED` code.
/// - [`ShopifyError::GraphQl`] for other top-level errors, or when `data`
///   is absent.
pub(crate) fn decode_response<T: DeserializeOwned>(
    shop: &str,
    context: &str,
    body: &str,
) -> Result<T, ShopifyError> {
    let envelope: GraphqlResponse<T> =
        serde_json::from_str(body).map_err(|source| ShopifyError::Deserialize {
            context: context.to_owned(),
            source,
        })?;
    envelope.into_result(shop, context)
}

impl<T> GraphqlResponse<T> {
    pub(crate) fn into_result(self, shop: &str, context: &str) -> Result<T, ShopifyError> {
        if self.errors.iter().any(GraphqlError::is_throttled) {
            return Err(ShopifyError::Throttled {
                shop: shop.to_owned(),
            });
        }
        if !self.errors.is_empty() {
            return Err(ShopifyError::GraphQl {
                context: context.to_owned(),
                messages: self.errors.into_iter().map(|e| e.message).collect(),
            });
        }
        self.data.ok_or_else(|| ShopifyError::GraphQl {
            context: context.to_owned(),
            messages: vec!["response contained no data".to_owned()],
        })
    }
}

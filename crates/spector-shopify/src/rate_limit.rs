//! Retry utilities for the Admin API client.
//!
//! Shopify signals back-pressure two ways: HTTP 429 for REST-style bucket
//! exhaustion and a `THROTTLED` GraphQL error (HTTP 200) when the query cost
//! bucket is empty. Both mean the request was not executed, so they are safe
//! to retry for mutations too. Network failures are ambiguous for mutations
//! (the write may have landed) and are only retried for reads.

use std::future::Future;
use std::time::Duration;

use crate::error::ShopifyError;

/// Whether an operation may be replayed after an ambiguous failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idempotency {
    /// Reads: any transient failure is retried.
    Read,
    /// Writes: only retried when Shopify confirms it did not execute.
    Write,
}

/// Returns `true` if `err` is a transient condition worth retrying.
///
/// Retriable:
/// - [`ShopifyError::RateLimited`] and [`ShopifyError::Throttled`]: always.
/// - [`ShopifyError::Http`]: only for [`Idempotency::Read`].
///
/// Everything else (auth failures, user errors, bad payloads) is returned
/// immediately.
pub(crate) fn is_retriable(err: &ShopifyError, idempotency: Idempotency) -> bool {
    match err {
        ShopifyError::RateLimited { .. } | ShopifyError::Throttled { .. } => true,
        ShopifyError::Http(_) => idempotency == Idempotency::Read,
        _ => false,
    }
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// Sleeps `backoff_base_secs * 2^attempt` seconds (±25 % jitter) between
/// attempts, up to `max_retries` additional attempts after the first try.
/// With `max_retries = 3` the operation is attempted at most 4 times total.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    idempotency: Idempotency,
    mut operation: F,
) -> Result<T, ShopifyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ShopifyError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err, idempotency) || attempt >= max_retries {
            return Err(err);
        }

        let base_ms = backoff_base_secs
            .saturating_mul(1_000)
            .saturating_mul(1u64 << attempt.min(20));
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let delay_ms = (base_ms as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
        tracing::warn!(
            attempt,
            max_retries,
            delay_ms,
            error = %err,
            "transient Shopify error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        attempt += 1;
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShopifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {shop} (retry after {retry_after_secs}s)")]
    RateLimited { shop: String, retry_after_secs: u64 },

    #[error("GraphQL query cost throttled by {shop}")]
    Throttled { shop: String },

    #[error("access token rejected by {shop}")]
    Unauthorized { shop: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("GraphQL errors in {context}: {}", messages.join("; "))]
    GraphQl {
        context: String,
        messages: Vec<String>,
    },

    #[error("{mutation} rejected: {}", messages.join("; "))]
    UserErrors {
        mutation: String,
        messages: Vec<String>,
    },

    #[error("{context} returned no data for {id}")]
    MissingResource { context: String, id: String },

    #[error("invalid shop URL \"{shop}\": {reason}")]
    InvalidShopUrl { shop: String, reason: String },

    #[error("pagination limit reached for {context}: exceeded {max_pages} pages")]
    PaginationLimit { context: String, max_pages: usize },
}

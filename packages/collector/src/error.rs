//! Typed errors for the collection library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can occur during a collection run.
#[derive(Debug, Error)]
pub enum CollectError {
    /// Search provider failed after retries
    #[error("search provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Page or document fetch failed
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Every credential in the pool has been rejected
    #[error("all search credentials exhausted")]
    AllCredentialsExhausted,

    /// Operation was cancelled before any useful data was collected
    #[error("operation cancelled")]
    Cancelled,

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Errors returned by a search provider.
///
/// The distinction matters: `Transient` failures are retried with
/// backoff, `Rejected` triggers credential rotation instead.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Timeout, connection reset, 5xx. Safe to retry
    #[error("transient provider failure: {reason}")]
    Transient { reason: String },

    /// Definitive rejection of the credential (HTTP 400)
    #[error("credential rejected by provider")]
    Rejected,

    /// Provider returned a body that could not be decoded
    #[error("malformed provider response: {0}")]
    MalformedResponse(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors that can occur fetching a page or document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Connection timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Non-success status from the server
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Document body could not be decoded (e.g., corrupt PDF)
    #[error("unreadable document {url}: {reason}")]
    UnreadableDocument { url: String, reason: String },
}

/// Result type alias for collection operations.
pub type Result<T> = std::result::Result<T, CollectError>;

/// Result type alias for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

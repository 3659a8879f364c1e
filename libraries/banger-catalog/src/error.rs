//! Error types for the catalog client.

use thiserror::Error;

/// Errors that can occur when talking to the catalog API.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned a non-success HTTP status
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// HTTP 200 with a failure status in the response headers block
    #[error("Catalog API error ({code}): {message}")]
    Api { code: i64, message: String },

    /// Invalid base URL
    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(String),

    /// No client id configured
    #[error("Catalog client id is required")]
    MissingClientId,

    /// Failed to parse response body
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Catalog is offline or unreachable
    #[error("Catalog unreachable: {0}")]
    ServerUnreachable(String),

    /// Rate limited by the catalog
    #[error("Rate limited, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

impl From<CatalogError> for banger_core::BangerError {
    fn from(err: CatalogError) -> Self {
        banger_core::BangerError::catalog(err.to_string())
    }
}

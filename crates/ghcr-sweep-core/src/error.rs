//! Error types for sweep operations

use thiserror::Error;

/// Sweep operation errors
#[derive(Debug, Error)]
pub enum SweepError {
    // ============ Configuration Errors ============
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Invalid keep pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    // ============ Network Errors ============
    #[error("HTTP error: {status} from {url} - {message}")]
    HttpError {
        status: u16,
        url: String,
        message: String,
    },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Request timeout")]
    Timeout,

    // ============ Inventory Errors ============
    #[error("Inventory aborted at page {page}: HTTP {status} - {message}")]
    InventoryPage {
        page: usize,
        status: u16,
        message: String,
    },

    // ============ Registry Errors ============
    #[error("Manifest fetch failed for {reference}: HTTP {status}")]
    ManifestFetch { reference: String, status: u16 },

    #[error("Invalid manifest for {reference}: {message}")]
    InvalidManifest { reference: String, message: String },

    #[error("Registry response for {reference} carries no Docker-Content-Digest header")]
    MissingDigestHeader { reference: String },

    // ============ Collection Errors ============
    #[error("Delete failed for version {id}: HTTP {status} - {message}")]
    DeleteFailed {
        id: u64,
        status: u16,
        message: String,
    },

    #[error("Refusing to delete: {failures} live tag(s) could not be resolved")]
    UnsafeToCollect { failures: usize },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

impl From<reqwest::Error> for SweepError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SweepError::Timeout
        } else if e.is_connect() {
            SweepError::NetworkError {
                message: format!("Connection failed: {}", e),
            }
        } else if let Some(status) = e.status() {
            SweepError::HttpError {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
                message: e.to_string(),
            }
        } else {
            SweepError::NetworkError {
                message: e.to_string(),
            }
        }
    }
}

impl From<serde_yaml::Error> for SweepError {
    fn from(e: serde_yaml::Error) -> Self {
        SweepError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for SweepError {
    fn from(e: serde_json::Error) -> Self {
        SweepError::Serialization(e.to_string())
    }
}

impl From<url::ParseError> for SweepError {
    fn from(e: url::ParseError) -> Self {
        SweepError::InvalidUrl {
            url: String::new(),
            reason: e.to_string(),
        }
    }
}

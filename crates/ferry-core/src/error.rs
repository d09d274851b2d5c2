//! Error types for migration operations.

use thiserror::Error;

/// Migration-specific errors.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Failed to authenticate with a repository host.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Repository could not be resolved on its host.
    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    /// API request failed.
    #[error("API request failed: {0}")]
    ApiError(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, retry after {0} seconds")]
    RateLimitExceeded(u64),

    /// Network error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The destination host rejected creation of an item. Fatal to the run:
    /// skipping a number would shift the destination auto-increment and
    /// misalign every subsequent item.
    #[error("Failed to create destination item #{number}: {reason}")]
    CreationFailed { number: u64, reason: String },

    /// A created item came back with a different number than the source
    /// item it replicates. Fatal: numbering is no longer aligned.
    #[error("Number alignment broken: expected #{expected}, destination assigned #{actual}")]
    AlignmentBroken { expected: u64, actual: u64 },

    /// An asset download or upload failed. Recoverable per asset.
    #[error("Asset transfer failed: {0}")]
    TransferFailed(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrationError>;

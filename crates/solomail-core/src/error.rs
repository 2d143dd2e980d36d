//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// OAuth operation failed.
    #[error("OAuth error: {0}")]
    OAuth(#[from] solomail_oauth::Error),

    /// Graph API operation failed.
    #[error("Graph error: {0}")]
    Graph(#[from] solomail_graph::Error),

    /// Session storage error.
    #[error("Session store error: {0}")]
    Store(#[from] crate::auth::StoreError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for wisp-core

use thiserror::Error;

/// Result type alias using wisp-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in wisp-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Site, page, or backing node missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Site has no space binding
    #[error("Site is not bound to a wiki space: {0}")]
    Unbound(String),

    /// Remote wiki API returned an error or a malformed response
    #[error("Remote API error: {0}")]
    RemoteApi(String),

    /// No stored credential, or the provider could not refresh one
    #[error("Credential error: {0}")]
    Credential(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

//! Error types for Backchat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Backchat operations
///
/// This enum encompasses all possible errors that can occur while
/// serving chat-history pages, reconciling visibility edits, loading
/// configuration, and talking to the persistent chat store.
#[derive(Error, Debug)]
pub enum BackchatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid request parameters (e.g. conflicting pagination cursors)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid session (no authenticated caller)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A referenced chat does not exist or is not owned by the caller
    #[error("Not found: {0}")]
    NotFound(String),

    /// Persisting a visibility edit failed; the optimistic value is rolled back
    #[error("Visibility write failed: {0}")]
    WriteFailure(String),

    /// Chat storage errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Backchat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

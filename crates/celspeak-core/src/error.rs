//! Core error types for celspeak-core.
//!
//! Every concern gets its own thiserror enum; [`CoreError`] gathers them for
//! callers that only want one error type.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for celspeak-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Durable store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Catalog and input validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Model-answer generation errors
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Image attachment errors
    #[error("Attachment error: {0}")]
    Attachment(#[from] AttachmentError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Async work started outside a tokio runtime
    #[error("Runtime error: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),
}

/// Durable key-value store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Store query failed: {0}")]
    QueryFailed(String),

    #[error("Store is locked")]
    Locked,

    #[error("Could not resolve data directory: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Could not resolve data directory: {0}")]
    DataDir(String),
}

/// Validation errors for externally supplied data (catalog files, indices).
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    #[error("Duplicate task id {0}")]
    DuplicateTaskId(u32),

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("Failed to parse catalog: {0}")]
    ParseFailed(String),
}

/// Errors from the external generation service.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("API key not configured (set {env_var})")]
    MissingApiKey { env_var: String },

    #[error("Generation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Generation service returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Generation service returned no text")]
    EmptyResponse,

    #[error("Invalid generation endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Notification sink errors. Always swallowed by the caller.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Audio output unavailable: {0}")]
    Unavailable(String),
}

/// Image attachment errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AttachmentError {
    #[error("Not a base64 data URL")]
    NotDataUrl,

    #[error("Attachment payload is empty")]
    Empty,

    #[error("Failed to read image: {0}")]
    Read(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg)
                if inner.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                StoreError::Locked
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

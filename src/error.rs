//! Error types for BucketSync
//!
//! Thrown errors abort the operation that raised them. Backend errors are
//! the exception: the transfer layer turns them into failed log entries so
//! bulk operations keep going.

use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by an object-storage backend call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} failed: {message}")]
pub struct BackendError {
    /// Backend operation that failed (e.g. `put_object`)
    pub operation: String,
    /// Vendor error message
    pub message: String,
}

impl BackendError {
    /// Create a backend error for the given operation
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Main error type for BucketSync operations
#[derive(Error, Debug)]
pub enum BucketSyncError {
    /// A required input was missing or empty
    #[error("Invalid input: {0}")]
    Validation(String),

    /// I/O error during local file operations
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Object storage backend error
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Connector could not be built for the given parameters
    #[error("Connection error to '{endpoint}': {message}")]
    Connection { endpoint: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid glob pattern
    #[error("Invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },
}

impl BucketSyncError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a connection error
    pub fn connection(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a pattern error
    pub fn pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Check if this error came from input validation
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result type alias for BucketSync operations
pub type Result<T> = std::result::Result<T, BucketSyncError>;

impl From<serde_json::Error> for BucketSyncError {
    fn from(err: serde_json::Error) -> Self {
        BucketSyncError::Config(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| BucketSyncError::io(path, e))
    }
}

/// Reject an empty (or whitespace-only) required input
pub fn require_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BucketSyncError::validation(format!("{} is empty", name)));
    }
    Ok(())
}

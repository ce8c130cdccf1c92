//! Error types for the persistence adapter.

use thiserror::Error;

/// Errors a [`SceneSink`](crate::SceneSink) can report for one write.
#[derive(Debug, Error)]
pub enum SinkError {
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The sink refused the write.
    #[error("Write rejected: {0}")]
    Rejected(String),
}

/// Errors from talking to the adapter task.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    /// The adapter task has stopped.
    #[error("Persistence adapter is closed")]
    Closed,
}

/// Result type for adapter handle operations.
pub type SyncResult<T> = Result<T, SyncError>;

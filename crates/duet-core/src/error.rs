//! Error types for duet-core

use thiserror::Error;

/// Result type alias using duet-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in duet-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot storage error
    #[error("Snapshot storage error: {0}")]
    Storage(String),
}

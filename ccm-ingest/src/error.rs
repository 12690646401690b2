//! Error types for ccm-ingest
//!
//! Both pipeline stages fail their single operation outright; there is no
//! partial-success result type.

use std::path::PathBuf;
use thiserror::Error;

/// Ingest error type
#[derive(Debug, Error)]
pub enum IngestError {
    /// Archive path does not exist
    #[error("Archive not found: {0}")]
    ArchiveNotFound(PathBuf),

    /// Archive exists but is not a readable ZIP container
    #[error("Cannot open archive {path}: {source}")]
    ArchiveOpen {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Archive became unreadable partway through enumeration
    #[error("Archive {path} unreadable at entry {index}: {source}")]
    ArchiveRead {
        path: PathBuf,
        index: usize,
        #[source]
        source: zip::result::ZipError,
    },

    /// Registry snapshot could not be loaded or parsed
    #[error("Registry error: {0}")]
    Registry(String),

    /// Confirmed mapping does not fit the proposal
    #[error("Invalid decision: {0}")]
    InvalidDecision(String),

    /// Ingest settings out of range
    #[error("Configuration error: {0}")]
    Config(String),

    /// Background task panicked or was cancelled
    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl From<tokio::task::JoinError> for IngestError {
    fn from(err: tokio::task::JoinError) -> Self {
        IngestError::TaskFailed(err.to_string())
    }
}

/// Result type for ingest operations
pub type IngestResult<T> = Result<T, IngestError>;

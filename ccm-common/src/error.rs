//! Common error types for CCM

use thiserror::Error;

/// Common result type for CCM operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across CCM crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

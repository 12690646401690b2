//! # CCM Common Library
//!
//! Shared code for the custom-content manager crates:
//! - Error type
//! - Configuration loading (TOML bootstrap file)
//! - Event types (IngestEvent enum) and EventBus

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
pub use events::{EventBus, IngestEvent};

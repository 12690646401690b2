//! Test Helper Utilities
//!
//! Shared utilities for testing ccm-ingest

#![allow(dead_code, unused_imports)]

pub mod archive_builder;

pub use archive_builder::{corrupt_first, corrupt_nth, rename_entries, ArchiveBuilder};

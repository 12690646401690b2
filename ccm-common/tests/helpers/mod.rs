//! Test Helper Utilities
//!
//! Shared utilities for testing ccm-common

#![allow(dead_code)]

pub mod log_capture;

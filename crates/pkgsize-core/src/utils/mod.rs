//! Utility functions and helpers.
//!
//! Common functionality used across multiple pkgsize crates.

pub mod size;

// Re-export commonly used utilities
pub use size::{bytes_to_megabytes, format_bytes, format_megabytes};

//! Core data types for pkgsize.
//!
//! This module provides the fundamental types produced and consumed by a traversal:
//! - PackageRecord, one parsed registry document
//! - DiscoverySet, the finalized name -> size mapping

pub mod discovery;
pub mod package;

// Re-export all public types
pub use discovery::DiscoverySet;
pub use package::PackageRecord;

//! Dependency graph traversal engine for pkgsize
//!
//! This crate crawls the transitive dependency graph of a root package: one fetch
//! per distinct package name, fanned out concurrently, deduplicated through a
//! per-traversal ledger and joined through a counter of outstanding branches.

pub mod traverse;

// Re-export main types
pub use traverse::{Traversal, TraversalConfig, TraversalEvent, TraversalOutcome};

use pkgsize_core::error::PkgSizeError;

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, PkgSizeError>;

//! npm registry client for pkgsize
//!
//! This crate fetches package metadata documents from an npm-compatible registry
//! and reduces them to `PackageRecord`s, with connection pooling, retry logic and
//! an optional TTL cache. The `PackageSource` trait is the seam the traversal
//! engine consumes, so the engine can also run against an in-memory registry.

pub mod api;
pub mod cache;
pub mod client;
pub mod source;

// Re-export main types
pub use api::{DistInfo, PackageMetadataResponse, VersionMetadata};
pub use cache::{CacheEntry, CacheStats, MetadataCache};
pub use client::{AuthConfig, ClientOptions, RegistryClient, RetryConfig, DEFAULT_REGISTRY};
pub use source::{MemorySource, PackageSource};

use pkgsize_core::error::PkgSizeError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, PkgSizeError>;

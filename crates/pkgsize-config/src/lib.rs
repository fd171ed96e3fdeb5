//! Configuration parsing for pkgsize
//!
//! This crate handles parsing and validation of pkgsize.toml files and layers
//! them with environment variables and command-line flags into the settings the
//! registry client and traversal engine are built from.

pub mod merge;
pub mod toml;

// Re-export main types
pub use merge::{CliOverrides, ConfigLayering, ConfigLoader, ConfigSource, Settings};
pub use self::toml::{CacheSection, PkgSizeToml, RegistrySection, RetrySection, TraversalSection};

use pkgsize_core::error::PkgSizeError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, PkgSizeError>;

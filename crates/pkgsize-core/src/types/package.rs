//! Package record type.
//!
//! A PackageRecord is the part of a registry metadata document a traversal cares
//! about: the latest tagged version, its installed size and its dependency names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Parsed view of one package's latest tagged version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Package name as confirmed by the registry
    pub name: String,
    /// Version the "latest" tag points at (empty when the tag is missing)
    pub version: String,
    /// Unpacked size of that version in bytes
    pub installed_size: u64,
    /// Names of the dependencies declared by that version
    pub dependencies: BTreeSet<String>,
}

impl PackageRecord {
    /// Create a record with no dependencies
    pub fn new(name: impl Into<String>, version: impl Into<String>, installed_size: u64) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            installed_size,
            dependencies: BTreeSet::new(),
        }
    }

    /// Zero-size, zero-dependency record used when the latest version cannot be located
    pub fn empty(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::new(name, version, 0)
    }

    /// Add a dependency name
    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        self.dependencies.insert(name.into());
        self
    }

    /// Add several dependency names
    pub fn with_dependencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(names.into_iter().map(Into::into));
        self
    }

    /// Check if this record declares no dependencies
    pub fn is_leaf(&self) -> bool {
        self.dependencies.is_empty()
    }
}

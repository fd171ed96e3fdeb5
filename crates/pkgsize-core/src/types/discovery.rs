//! Finalized discovery set.
//!
//! The traversal engine builds this once its join counter reaches zero. After that
//! it is read-only: the renderer and the aggregate only ever borrow it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from every resolved package name to its installed size in bytes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiscoverySet {
    entries: BTreeMap<String, u64>,
}

impl DiscoverySet {
    /// Create an empty discovery set
    pub fn new() -> Self {
        Self::default()
    }

    /// Installed size of a package, if it was resolved
    pub fn get(&self, name: &str) -> Option<u64> {
        self.entries.get(name).copied()
    }

    /// Check if a package was resolved
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of resolved packages
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing was resolved
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.entries.iter().map(|(name, size)| (name.as_str(), *size))
    }

    /// Resolved package names in name order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Sum of all installed sizes
    pub fn total_bytes(&self) -> u64 {
        self.entries.values().sum()
    }
}

impl FromIterator<(String, u64)> for DiscoverySet {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a DiscoverySet {
    type Item = (&'a String, &'a u64);
    type IntoIter = std::collections::btree_map::Iter<'a, String, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

//! npm registry API response types

use std::collections::HashMap;

use pkgsize_core::types::PackageRecord;
use serde::{Deserialize, Serialize};

/// Marker the registry puts in the `error` field of a missing package's document
pub const NOT_FOUND_MARKER: &str = "Not found";

/// Tag naming the version a traversal measures
pub const LATEST_TAG: &str = "latest";

/// Package metadata response from npm registry
///
/// Every field is defaulted: a not-found document carries only `error`, and
/// unpublished packages may lack `dist-tags` or `versions` entirely.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PackageMetadataResponse {
    /// Package name
    #[serde(default)]
    pub name: Option<String>,
    /// Tag -> version mapping
    #[serde(rename = "dist-tags", default)]
    pub dist_tags: HashMap<String, String>,
    /// All versions metadata, left raw so one malformed historical version
    /// cannot fail the whole document
    #[serde(default)]
    pub versions: HashMap<String, serde_json::Value>,
    /// Error message set by the registry instead of metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Metadata for a specific package version
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VersionMetadata {
    /// Dependencies, name -> range. Kept untyped: some very old documents
    /// publish this field as an array or with non-string ranges.
    #[serde(default)]
    pub dependencies: Option<serde_json::Value>,
    /// Distribution information
    #[serde(default)]
    pub dist: Option<DistInfo>,
}

/// Distribution information for package tarball
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DistInfo {
    /// Tarball download URL
    #[serde(default)]
    pub tarball: Option<String>,
    /// Unpacked size in bytes
    #[serde(rename = "unpackedSize", default)]
    pub unpacked_size: Option<u64>,
    /// File count
    #[serde(rename = "fileCount", default)]
    pub file_count: Option<u32>,
}

impl PackageMetadataResponse {
    /// Check if the registry answered with its not-found marker
    pub fn is_not_found(&self) -> bool {
        self.error.as_deref() == Some(NOT_FOUND_MARKER)
    }

    /// Version the "latest" tag points at
    pub fn latest_version(&self) -> Option<&str> {
        self.dist_tags.get(LATEST_TAG).map(String::as_str)
    }

    /// Metadata of the latest tagged version, if the tag resolves to a
    /// well-formed version entry
    pub fn latest_metadata(&self) -> Option<VersionMetadata> {
        let raw = self.versions.get(self.latest_version()?)?;
        VersionMetadata::deserialize(raw).ok()
    }

    /// Reduce the document to the record of its latest version.
    ///
    /// A latest tag that is missing or names an absent version yields a
    /// zero-size, zero-dependency record.
    pub fn into_record(self, requested_name: &str) -> PackageRecord {
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| requested_name.to_string());
        let version = self.latest_version().unwrap_or_default().to_string();

        match self.latest_metadata() {
            Some(metadata) => PackageRecord::new(name, version, metadata.unpacked_size())
                .with_dependencies(metadata.dependency_names()),
            None => PackageRecord::empty(name, version),
        }
    }
}

impl VersionMetadata {
    /// Unpacked size in bytes, 0 when the registry did not publish it
    pub fn unpacked_size(&self) -> u64 {
        self.dist
            .as_ref()
            .and_then(|dist| dist.unpacked_size)
            .unwrap_or(0)
    }

    /// Declared dependency names
    pub fn dependency_names(&self) -> Vec<String> {
        match &self.dependencies {
            Some(serde_json::Value::Object(map)) => map.keys().cloned().collect(),
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}

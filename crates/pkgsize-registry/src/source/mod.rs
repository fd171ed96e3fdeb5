//! Package sources consumed by the traversal engine.
//!
//! `RegistryClient` is the production source. `MemorySource` serves records from
//! memory, counts lookups per name and can inject latency or failures; tests and
//! benchmarks run the engine against it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use pkgsize_core::error::PkgSizeError;
use pkgsize_core::types::PackageRecord;

use crate::client::RegistryClient;
use crate::RegistryResult;

/// Anything that can resolve a package name to its latest record
#[async_trait]
pub trait PackageSource: Send + Sync {
    /// Fetch the record of a package's latest tagged version.
    ///
    /// Returns `PkgSizeError::PackageNotFound` when the package does not exist;
    /// any other error is a transport or parsing failure.
    async fn fetch_package(&self, name: &str) -> RegistryResult<PackageRecord>;
}

#[async_trait]
impl PackageSource for RegistryClient {
    async fn fetch_package(&self, name: &str) -> RegistryResult<PackageRecord> {
        RegistryClient::fetch_package(self, name).await
    }
}

#[derive(Debug, Clone)]
enum MemoryEntry {
    Record(PackageRecord),
    Failure(String),
}

/// In-memory registry
#[derive(Debug, Default)]
pub struct MemorySource {
    packages: HashMap<String, MemoryEntry>,
    latency: Option<Duration>,
    fetches: DashMap<String, usize>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MemorySource {
    /// Create an empty in-memory registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a package record under its own name
    pub fn with_package(mut self, record: PackageRecord) -> Self {
        self.packages
            .insert(record.name.clone(), MemoryEntry::Record(record));
        self
    }

    /// Shorthand for publishing `name` with `size` bytes and the given dependencies
    pub fn with(self, name: &str, size: u64, dependencies: &[&str]) -> Self {
        self.with_package(
            PackageRecord::new(name, "1.0.0", size).with_dependencies(dependencies.iter().copied()),
        )
    }

    /// Make lookups of `name` fail with a network error
    pub fn with_failure(mut self, name: &str, message: &str) -> Self {
        self.packages
            .insert(name.to_string(), MemoryEntry::Failure(message.to_string()));
        self
    }

    /// Delay every lookup by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of lookups made for `name`
    pub fn fetch_count(&self, name: &str) -> usize {
        self.fetches.get(name).map(|count| *count).unwrap_or(0)
    }

    /// Number of lookups made for all names
    pub fn total_fetches(&self) -> usize {
        self.fetches.iter().map(|entry| *entry.value()).sum()
    }

    /// Highest number of lookups that were in progress at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Number of published packages
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }
}

#[async_trait]
impl PackageSource for MemorySource {
    async fn fetch_package(&self, name: &str) -> RegistryResult<PackageRecord> {
        *self.fetches.entry(name.to_string()).or_insert(0) += 1;

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        } else {
            tokio::task::yield_now().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.packages.get(name) {
            Some(MemoryEntry::Record(record)) => Ok(record.clone()),
            Some(MemoryEntry::Failure(message)) => Err(PkgSizeError::Network {
                message: message.clone(),
                source: None,
            }),
            None => Err(PkgSizeError::PackageNotFound {
                name: name.to_string(),
            }),
        }
    }
}

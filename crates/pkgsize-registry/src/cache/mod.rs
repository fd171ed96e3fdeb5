//! Record caching with TTL support
//!
//! Only successful lookups are cached; a package that was not found or failed
//! to load is asked for again on the next traversal.

use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use pkgsize_core::types::PackageRecord;

/// Default time-to-live of a cache entry
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Cache entry with TTL
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Cached record
    pub record: PackageRecord,
    /// When the entry was stored
    pub stored_at: SystemTime,
    /// Time-to-live duration
    pub ttl: Duration,
}

impl CacheEntry {
    /// Create new cache entry with default TTL (1 hour)
    pub fn new(record: PackageRecord) -> Self {
        Self::with_ttl(record, DEFAULT_TTL)
    }

    /// Create cache entry with custom TTL
    pub fn with_ttl(record: PackageRecord, ttl: Duration) -> Self {
        Self {
            record,
            stored_at: SystemTime::now(),
            ttl,
        }
    }

    /// Check if cache entry is still fresh
    pub fn is_fresh(&self) -> bool {
        match self.stored_at.elapsed() {
            Ok(elapsed) => elapsed < self.ttl,
            Err(_) => false, // Clock went backwards, consider stale
        }
    }

    /// Get age of cache entry
    pub fn age(&self) -> Option<Duration> {
        self.stored_at.elapsed().ok()
    }
}

/// In-memory record cache with TTL
#[derive(Debug)]
pub struct MetadataCache {
    /// Cache storage
    cache: DashMap<String, CacheEntry>,
    /// TTL applied by `insert`
    ttl: Duration,
}

impl MetadataCache {
    /// Create new cache with the default TTL
    pub fn new() -> Self {
        Self::with_default_ttl(DEFAULT_TTL)
    }

    /// Create new cache whose `insert` uses the given TTL
    pub fn with_default_ttl(ttl: Duration) -> Self {
        Self {
            cache: DashMap::new(),
            ttl,
        }
    }
}

impl MetadataCache {
    /// Get cached record if fresh
    pub fn get(&self, package_name: &str) -> Option<PackageRecord> {
        let fresh = {
            let entry = self.cache.get(package_name)?;
            entry.is_fresh().then(|| entry.record.clone())
        };

        if fresh.is_none() {
            // Remove stale entry; the read guard above must be gone first
            self.cache.remove(package_name);
        }
        fresh
    }

    /// Store record with the cache's TTL
    pub fn insert(&self, package_name: String, record: PackageRecord) {
        let entry = CacheEntry::with_ttl(record, self.ttl);
        self.cache.insert(package_name, entry);
    }

    /// Store record with custom TTL
    pub fn insert_with_ttl(&self, package_name: String, record: PackageRecord, ttl: Duration) {
        let entry = CacheEntry::with_ttl(record, ttl);
        self.cache.insert(package_name, entry);
    }

    /// Check if package is cached and fresh
    pub fn contains_fresh(&self, package_name: &str) -> bool {
        self.cache
            .get(package_name)
            .map(|entry| entry.is_fresh())
            .unwrap_or(false)
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let mut fresh_count = 0;
        let mut stale_count = 0;

        for entry in self.cache.iter() {
            if entry.is_fresh() {
                fresh_count += 1;
            } else {
                stale_count += 1;
            }
        }

        CacheStats {
            total_entries: self.cache.len(),
            fresh_entries: fresh_count,
            stale_entries: stale_count,
        }
    }

    /// Clear all cached entries
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Remove stale entries
    pub fn cleanup(&self) -> usize {
        let mut removed = 0;
        self.cache.retain(|_, entry| {
            if entry.is_fresh() {
                true
            } else {
                removed += 1;
                false
            }
        });
        removed
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    /// Total number of entries
    pub total_entries: usize,
    /// Number of fresh entries
    pub fresh_entries: usize,
    /// Number of stale entries
    pub stale_entries: usize,
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new()
    }
}

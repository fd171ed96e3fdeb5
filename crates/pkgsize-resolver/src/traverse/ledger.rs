//! Per-traversal deduplication ledger.

use std::collections::{BTreeMap, BTreeSet};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use pkgsize_core::types::DiscoverySet;

/// State of one claimed package name
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Claim {
    /// Fetch started, no answer yet
    Pending,
    /// Latest version resolved to this many bytes
    Resolved(u64),
    /// Registry has no such package
    NotFound,
    /// Fetch failed with this message
    Failed(String),
}

/// Finalized contents of a ledger
#[derive(Debug, Default)]
pub(crate) struct LedgerSummary {
    pub(crate) discovered: DiscoverySet,
    pub(crate) not_found: BTreeSet<String>,
    pub(crate) failures: BTreeMap<String, String>,
}

/// Every package name claimed by one traversal.
///
/// A claim is inserted under the map's shard lock, so of several branches racing
/// for the same name exactly one gets to fetch it.
#[derive(Debug, Default)]
pub(crate) struct DiscoveryLedger {
    claims: DashMap<String, Claim>,
}

impl DiscoveryLedger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Claim `name` for fetching; false if another branch already did
    pub(crate) fn claim(&self, name: &str) -> bool {
        match self.claims.entry(name.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Claim::Pending);
                true
            }
        }
    }

    /// Record the answer for a claimed name
    pub(crate) fn settle(&self, name: &str, claim: Claim) {
        self.claims.insert(name.to_string(), claim);
    }

    /// Number of names claimed so far
    pub(crate) fn claimed(&self) -> usize {
        self.claims.len()
    }

    /// Split the ledger into resolved sizes, not-found names and failures.
    ///
    /// Only called once the join counter is zero; a claim still pending at that
    /// point belongs to a branch that vanished and is reported as a failure.
    pub(crate) fn summarize(&self) -> LedgerSummary {
        let mut discovered = Vec::new();
        let mut summary = LedgerSummary::default();

        for entry in self.claims.iter() {
            let name = entry.key().clone();
            match entry.value() {
                Claim::Resolved(size) => discovered.push((name, *size)),
                Claim::NotFound => {
                    summary.not_found.insert(name);
                }
                Claim::Failed(message) => {
                    summary.failures.insert(name, message.clone());
                }
                Claim::Pending => {
                    summary
                        .failures
                        .insert(name, "fetch did not complete".to_string());
                }
            }
        }

        summary.discovered = discovered.into_iter().collect();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_claim_once() {
        let ledger = DiscoveryLedger::new();

        assert!(ledger.claim("lodash"));
        assert!(!ledger.claim("lodash"));
        assert!(ledger.claim("express"));
        assert_eq!(ledger.claimed(), 2);
    }

    #[test]
    fn test_settled_names_stay_claimed() {
        let ledger = DiscoveryLedger::new();
        ledger.claim("ghost");
        ledger.settle("ghost", Claim::NotFound);

        assert!(!ledger.claim("ghost"));
    }

    #[test]
    fn test_summarize() {
        let ledger = DiscoveryLedger::new();
        for name in ["app", "lib", "ghost", "flaky", "stuck"] {
            ledger.claim(name);
        }
        ledger.settle("app", Claim::Resolved(2048));
        ledger.settle("lib", Claim::Resolved(4096));
        ledger.settle("ghost", Claim::NotFound);
        ledger.settle("flaky", Claim::Failed("connection reset".to_string()));

        let summary = ledger.summarize();
        assert_eq!(summary.discovered.len(), 2);
        assert_eq!(summary.discovered.total_bytes(), 6144);
        assert!(summary.not_found.contains("ghost"));
        assert_eq!(summary.failures.get("flaky").map(String::as_str), Some("connection reset"));
        assert_eq!(
            summary.failures.get("stuck").map(String::as_str),
            Some("fetch did not complete")
        );
    }

    #[test]
    fn test_concurrent_claims_admit_one() {
        let ledger = Arc::new(DiscoveryLedger::new());

        let winners: usize = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                std::thread::spawn(move || ledger.claim("shared") as usize)
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .sum();

        assert_eq!(winners, 1);
    }
}

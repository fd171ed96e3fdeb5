//! Concurrent traversal of a package's transitive dependency graph
//!
//! Every newly discovered package name becomes its own tokio task ("branch").
//! A branch claims its name in the traversal's ledger before it is spawned, so a
//! name reachable through many edges, or through a cycle, is fetched once. The
//! caller waits on a join counter that every branch registers with before its
//! parent finishes; when it drops to zero the graph is fully explored.
//!
//! Branch failures stay local: a missing package or a failed fetch is recorded
//! against its name and its siblings carry on.

mod join;
mod ledger;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use pkgsize_core::error::PkgSizeError;
use pkgsize_core::report::{aggregate, SizeReport};
use pkgsize_core::types::{DiscoverySet, PackageRecord};
use pkgsize_registry::{PackageSource, RegistryResult};

use crate::ResolverResult;
use join::JoinCounter;
use ledger::{Claim, DiscoveryLedger};

/// Default cap on concurrent registry fetches
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 16;

/// Traversal tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalConfig {
    /// Maximum number of fetches in flight at once (at least 1)
    pub max_concurrent_fetches: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }
}

/// Progress notifications emitted while a traversal runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraversalEvent {
    /// A package resolved and its dependencies were scheduled
    Resolved {
        name: String,
        version: String,
        size: u64,
        dependencies: usize,
    },
    /// The registry has no package with this name
    NotFound { name: String },
    /// Fetching this package failed
    Failed { name: String, error: String },
}

/// Finalized result of one traversal
#[derive(Debug, Clone, Serialize)]
pub struct TraversalOutcome {
    /// Root package name as submitted
    pub root: String,
    /// Every resolved package and its installed size
    pub discovered: DiscoverySet,
    /// Names the registry reported as missing
    pub not_found: BTreeSet<String>,
    /// Names whose fetch failed, with the error message
    pub failures: BTreeMap<String, String>,
    /// Number of distinct names fetched
    pub fetch_count: usize,
    /// Wall-clock duration of the traversal
    #[serde(serialize_with = "serialize_millis", rename = "elapsed_ms")]
    pub elapsed: Duration,
}

impl TraversalOutcome {
    /// Check if the root package itself resolved
    pub fn root_found(&self) -> bool {
        self.discovered.contains(&self.root)
    }

    /// Check if every claimed package either resolved or was reported missing
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Per-package sizes and total
    pub fn report(&self) -> SizeReport {
        aggregate(&self.discovered)
    }
}

fn serialize_millis<S: serde::Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}

/// Dependency graph crawler over a package source
///
/// The engine itself holds no per-traversal state, so one instance can run
/// several traversals, sequentially or at the same time.
#[derive(Clone)]
pub struct Traversal {
    source: Arc<dyn PackageSource>,
    config: TraversalConfig,
}

impl Traversal {
    /// Create a traversal engine with default configuration
    pub fn new(source: Arc<dyn PackageSource>) -> Self {
        Self::with_config(source, TraversalConfig::default())
    }

    /// Create a traversal engine with custom configuration
    pub fn with_config(source: Arc<dyn PackageSource>, config: TraversalConfig) -> Self {
        Self { source, config }
    }

    /// Current configuration
    pub fn config(&self) -> &TraversalConfig {
        &self.config
    }

    /// Crawl the dependency graph of `root` and return the finalized result
    pub async fn traverse(&self, root: &str) -> ResolverResult<TraversalOutcome> {
        self.traverse_with_events(root, None).await
    }

    /// Crawl the dependency graph of `root`, reporting progress on `events`
    pub async fn traverse_with_events(
        &self,
        root: &str,
        events: Option<UnboundedSender<TraversalEvent>>,
    ) -> ResolverResult<TraversalOutcome> {
        if root.trim().is_empty() {
            return Err(PkgSizeError::EmptyInput);
        }

        let start_time = Instant::now();
        info!("Resolving dependency graph of {}", root);

        let state = Arc::new(TraversalState::new(self.source.clone(), &self.config, events));
        TraversalState::spawn_branch(&state, root.to_string());
        state.join.wait().await;

        let summary = state.ledger.summarize();
        let outcome = TraversalOutcome {
            root: root.to_string(),
            fetch_count: state.ledger.claimed(),
            discovered: summary.discovered,
            not_found: summary.not_found,
            failures: summary.failures,
            elapsed: start_time.elapsed(),
        };

        info!(
            "Resolved {} packages for {} in {}ms ({} not found, {} failed)",
            outcome.discovered.len(),
            root,
            outcome.elapsed.as_millis(),
            outcome.not_found.len(),
            outcome.failures.len()
        );

        Ok(outcome)
    }
}

/// State shared by every branch of one traversal
struct TraversalState {
    source: Arc<dyn PackageSource>,
    ledger: DiscoveryLedger,
    join: JoinCounter,
    permits: Semaphore,
    events: Option<UnboundedSender<TraversalEvent>>,
}

impl TraversalState {
    fn new(
        source: Arc<dyn PackageSource>,
        config: &TraversalConfig,
        events: Option<UnboundedSender<TraversalEvent>>,
    ) -> Self {
        Self {
            source,
            ledger: DiscoveryLedger::new(),
            join: JoinCounter::new(),
            permits: Semaphore::new(config.max_concurrent_fetches.max(1)),
            events,
        }
    }

    /// Claim `name` and spawn a branch for it, unless it is already claimed
    fn spawn_branch(state: &Arc<Self>, name: String) {
        if !state.ledger.claim(&name) {
            debug!("Skipping {}: already claimed", name);
            return;
        }

        // Registered here, inside the discovering branch, before that branch completes
        state.join.register();
        let branch = Branch {
            state: Arc::clone(state),
            name,
            settled: false,
        };
        tokio::spawn(branch.run());
    }

    fn emit(&self, event: TraversalEvent) {
        if let Some(events) = &self.events {
            // Receiver gone means nobody is watching progress
            let _ = events.send(event);
        }
    }
}

/// One in-flight fetch. Dropping it completes the branch in the join counter.
struct Branch {
    state: Arc<TraversalState>,
    name: String,
    settled: bool,
}

impl Branch {
    async fn run(mut self) {
        match self.fetch().await {
            Ok(record) => self.resolved(record),
            Err(error) if error.is_not_found() => {
                warn!("Package {} not found", self.name);
                self.state.ledger.settle(&self.name, Claim::NotFound);
                self.state.emit(TraversalEvent::NotFound {
                    name: self.name.clone(),
                });
            }
            Err(error) => {
                warn!("Failed to fetch {}: {}", self.name, error);
                self.state
                    .ledger
                    .settle(&self.name, Claim::Failed(error.to_string()));
                self.state.emit(TraversalEvent::Failed {
                    name: self.name.clone(),
                    error: error.to_string(),
                });
            }
        }
        self.settled = true;
    }

    async fn fetch(&self) -> RegistryResult<PackageRecord> {
        // Permit covers the fetch only, not the fan-out that follows
        let _permit = self
            .state
            .permits
            .acquire()
            .await
            .map_err(|e| PkgSizeError::network("Fetch limiter closed".to_string(), e))?;

        self.state.source.fetch_package(&self.name).await
    }

    fn resolved(&self, record: PackageRecord) {
        if record.name != self.name {
            debug!("{} resolved as {}", self.name, record.name);
        }

        self.state
            .ledger
            .settle(&self.name, Claim::Resolved(record.installed_size));
        self.state.emit(TraversalEvent::Resolved {
            name: self.name.clone(),
            version: record.version.clone(),
            size: record.installed_size,
            dependencies: record.dependencies.len(),
        });

        for dependency in record.dependencies {
            if dependency.trim().is_empty() {
                debug!("Ignoring blank dependency name declared by {}", self.name);
                continue;
            }
            TraversalState::spawn_branch(&self.state, dependency);
        }
    }
}

impl Drop for Branch {
    fn drop(&mut self) {
        if !self.settled {
            // The task panicked or was cancelled mid-fetch
            self.state.ledger.settle(
                &self.name,
                Claim::Failed("fetch task ended before completing".to_string()),
            );
        }
        self.state.join.complete();
    }
}

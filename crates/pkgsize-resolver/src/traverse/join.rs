//! Join counter for outstanding traversal branches.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

/// Counts spawned-but-unfinished branches and wakes the waiter when none remain.
///
/// A branch must `register` every child before calling `complete` for itself,
/// otherwise the count can touch zero while work is still being discovered.
#[derive(Debug, Default)]
pub(crate) struct JoinCounter {
    outstanding: AtomicUsize,
    idle: Notify,
}

impl JoinCounter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Account for one more branch
    pub(crate) fn register(&self) {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
    }

    /// Mark one branch as finished
    pub(crate) fn complete(&self) {
        let previous = self.outstanding.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "join counter completed more branches than registered");
        if previous == 1 {
            // notify_one stores a permit if the waiter is not parked yet
            self.idle.notify_one();
        }
    }

    /// Number of branches still running
    pub(crate) fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Wait until every registered branch has completed
    pub(crate) async fn wait(&self) {
        while self.outstanding() > 0 {
            self.idle.notified().await;
        }
    }
}

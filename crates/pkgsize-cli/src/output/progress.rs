//! Live progress line for a running traversal.
//!
//! Counts the engine's events and redraws a single stderr line, at most every
//! 100ms. Disabled when stderr is not a terminal.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use pkgsize_core::utils::size::format_bytes;
use pkgsize_resolver::TraversalEvent;
use tokio::sync::mpsc::UnboundedReceiver;

const REDRAW_INTERVAL: Duration = Duration::from_millis(100);

/// Progress counters for one traversal
pub struct ProgressLine {
    root: String,
    enabled: bool,
    resolved: usize,
    missing: usize,
    failed: usize,
    bytes: u64,
    last_update: Option<Instant>,
}

impl ProgressLine {
    /// Create a progress line for the traversal of `root`
    pub fn new(root: &str, enabled: bool) -> Self {
        Self {
            root: root.to_string(),
            enabled,
            resolved: 0,
            missing: 0,
            failed: 0,
            bytes: 0,
            last_update: None,
        }
    }

    /// Consume events until the traversal drops its sender
    pub async fn drive(mut self, mut events: UnboundedReceiver<TraversalEvent>) -> Self {
        while let Some(event) = events.recv().await {
            self.record(&event);
            self.redraw();
        }
        self
    }

    /// Update counters from one event
    pub fn record(&mut self, event: &TraversalEvent) {
        match event {
            TraversalEvent::Resolved { size, .. } => {
                self.resolved += 1;
                self.bytes = self.bytes.saturating_add(*size);
            }
            TraversalEvent::NotFound { .. } => self.missing += 1,
            TraversalEvent::Failed { .. } => self.failed += 1,
        }
    }

    /// Current text of the line
    pub fn line(&self) -> String {
        let mut line = format!(
            "Resolving {}: {} packages, {}",
            self.root,
            self.resolved,
            format_bytes(self.bytes)
        );
        if self.missing > 0 {
            line.push_str(&format!(", {} not found", self.missing));
        }
        if self.failed > 0 {
            line.push_str(&format!(", {} failed", self.failed));
        }
        line
    }

    /// Erase the line so the report starts on a clean row
    pub fn finish(&self) {
        if self.enabled && self.last_update.is_some() {
            let mut stderr = io::stderr().lock();
            // Progress is cosmetic; a closed stderr is not worth failing over
            let _ = write!(stderr, "\r\x1b[2K");
            let _ = stderr.flush();
        }
    }

    fn redraw(&mut self) {
        if !self.enabled {
            return;
        }

        let now = Instant::now();
        if let Some(last) = self.last_update {
            if now.duration_since(last) < REDRAW_INTERVAL {
                return;
            }
        }
        self.last_update = Some(now);

        let mut stderr = io::stderr().lock();
        let _ = write!(stderr, "\r\x1b[2K{}", self.line());
        let _ = stderr.flush();
    }
}

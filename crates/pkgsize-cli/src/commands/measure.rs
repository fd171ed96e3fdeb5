//! Measure packages and print their reports.

use pkgsize_core::error::{PkgSizeError, PkgSizeResult};
use pkgsize_resolver::TraversalOutcome;
use tokio::sync::mpsc;

use super::{CommandContext, Session};
use crate::output::progress::ProgressLine;
use crate::output::render::{render, ReportFormat};

/// Traverse `name` with a live progress line and return the outcome
pub async fn measure(
    session: &Session,
    name: &str,
    ctx: &CommandContext,
) -> PkgSizeResult<TraversalOutcome> {
    let root = name.trim();
    session.evict_stale();

    let show_progress = ctx.output.progress_enabled() && session.format == ReportFormat::Text;

    let (sender, receiver) = mpsc::unbounded_channel();
    let watcher = tokio::spawn(ProgressLine::new(root, show_progress).drive(receiver));

    let result = session.traversal.traverse_with_events(root, Some(sender)).await;

    // The channel closes once the last branch lets go of its sender
    if let Ok(progress) = watcher.await {
        progress.finish();
    }

    result
}

/// Measure `name` and print its report; returns the outcome for exit status checks
pub async fn measure_and_print(
    session: &Session,
    name: &str,
    ctx: &CommandContext,
) -> PkgSizeResult<TraversalOutcome> {
    let outcome = measure(session, name, ctx).await?;
    ctx.output
        .print(&render(&outcome, session.format, ctx.output.colors())?);
    Ok(outcome)
}

/// Measure every package named on the command line.
///
/// Returns false when any root was blank or did not resolve.
pub async fn execute_all(
    session: &Session,
    packages: &[String],
    ctx: &CommandContext,
) -> PkgSizeResult<bool> {
    let mut all_found = true;

    for name in packages {
        match measure_and_print(session, name, ctx).await {
            Ok(outcome) => all_found &= outcome.root_found(),
            Err(PkgSizeError::EmptyInput) => {
                ctx.output.warn("Skipping empty package name");
                all_found = false;
            }
            Err(err) => return Err(err),
        }
    }

    Ok(all_found)
}

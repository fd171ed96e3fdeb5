//! Report rendering for the terminal and for JSON consumers.

use serde::Serialize;

use pkgsize_core::error::{PkgSizeError, PkgSizeResult};
use pkgsize_core::report::ReportLine;
use pkgsize_resolver::TraversalOutcome;

use super::colors::ColorSupport;

/// How reports are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Human-readable table
    Text,
    /// One JSON document per report
    Json,
}

/// Shown instead of a table when the root package does not exist
pub const ROOT_NOT_FOUND: &str = "Package Not Found. Please try with a different name";

/// Render an outcome as a terminal report
pub fn render_text(outcome: &TraversalOutcome, colors: &ColorSupport) -> String {
    let mut output = String::new();

    if outcome.not_found.contains(&outcome.root) {
        output.push_str(&colors.yellow(ROOT_NOT_FOUND));
        output.push('\n');
        return output;
    }
    if let Some(message) = outcome.failures.get(&outcome.root) {
        output.push_str(&colors.red(&format!("Failed to fetch {}: {}", outcome.root, message)));
        output.push('\n');
        return output;
    }

    let report = outcome.report();

    output.push('\n');
    output.push_str("List of all the dependant packages and their size\n");
    for line in &report.lines {
        output.push_str(&format!("{} : {}\n", line.name, line.size));
    }
    output.push('\n');
    output.push_str(&colors.bold(&format!(
        "Estimated Total Size: {}",
        report.total_display()
    )));
    output.push('\n');

    if !outcome.not_found.is_empty() {
        output.push('\n');
        output.push_str(&colors.yellow("Not found in the registry:"));
        output.push('\n');
        for name in &outcome.not_found {
            output.push_str(&format!("  {}\n", name));
        }
    }

    if !outcome.failures.is_empty() {
        output.push('\n');
        output.push_str(&colors.red("Could not be fetched (not counted in the total):"));
        output.push('\n');
        for (name, message) in &outcome.failures {
            output.push_str(&format!("  {} {}\n", name, colors.dim(&format!("({})", message))));
        }
    }

    output.push('\n');
    output
}

/// JSON shape of one report
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    root: &'a str,
    found: bool,
    packages: Vec<ReportLine>,
    total_bytes: u64,
    total_megabytes: f64,
    not_found: Vec<&'a str>,
    failures: Vec<JsonFailure<'a>>,
    fetch_count: usize,
    elapsed_ms: u64,
}

#[derive(Debug, Serialize)]
struct JsonFailure<'a> {
    name: &'a str,
    error: &'a str,
}

/// Render an outcome as a single-line JSON document
pub fn render_json(outcome: &TraversalOutcome) -> PkgSizeResult<String> {
    let report = outcome.report();
    let document = JsonReport {
        root: &outcome.root,
        found: outcome.root_found(),
        total_bytes: report.total_bytes,
        total_megabytes: report.total_megabytes(),
        packages: report.lines,
        not_found: outcome.not_found.iter().map(String::as_str).collect(),
        failures: outcome
            .failures
            .iter()
            .map(|(name, error)| JsonFailure { name, error })
            .collect(),
        fetch_count: outcome.fetch_count,
        elapsed_ms: outcome.elapsed.as_millis() as u64,
    };

    serde_json::to_string(&document)
        .map_err(|e| PkgSizeError::io("Failed to encode report as JSON".to_string(), e.into()))
}

/// Render an outcome in the requested format
pub fn render(outcome: &TraversalOutcome, format: ReportFormat, colors: &ColorSupport) -> PkgSizeResult<String> {
    match format {
        ReportFormat::Text => Ok(render_text(outcome, colors)),
        ReportFormat::Json => render_json(outcome).map(|mut json| {
            json.push('\n');
            json
        }),
    }
}

//! Terminal output formatting and utilities.
//!
//! Reports go to stdout; status, warnings, errors and the progress line go to
//! stderr so piped output stays clean.

pub mod colors;
pub mod errors;
pub mod progress;
pub mod render;

use std::io::{self, IsTerminal, Write};

use pkgsize_core::error::PkgSizeError;

use colors::ColorSupport;
use errors::ErrorFormatter;

/// Output handler for consistent terminal formatting
pub struct OutputHandler {
    colors: ColorSupport,
    progress: bool,
}

impl OutputHandler {
    /// Create a new output handler
    pub fn new() -> Self {
        Self {
            colors: ColorSupport::detect(),
            progress: io::stderr().is_terminal(),
        }
    }

    /// Output handler without colors or progress
    #[cfg(test)]
    pub fn plain() -> Self {
        Self {
            colors: ColorSupport::disabled(),
            progress: false,
        }
    }

    /// Color support in use
    pub fn colors(&self) -> &ColorSupport {
        &self.colors
    }

    /// Whether a live progress line may be drawn
    pub fn progress_enabled(&self) -> bool {
        self.progress
    }

    /// Print rendered report text to stdout
    pub fn print(&self, text: &str) {
        let mut stdout = io::stdout().lock();
        // Nothing useful to do if stdout went away
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        eprintln!("{}", self.colors.dim(message));
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", self.colors.yellow("warning:"), message);
    }

    /// Print a formatted error with its causes and suggestion
    pub fn error(&self, error: &PkgSizeError) {
        eprint!("{}", ErrorFormatter::with_colors(self.colors).format_error(error));
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}

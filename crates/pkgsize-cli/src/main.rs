//! # pkgsize
//!
//! Estimates how much disk space an npm package occupies once installed, by
//! walking its whole dependency graph against the registry and adding up the
//! unpacked size of every package's latest version.
//!
//! This is the entry point: it parses flags, sets up logging and the panic
//! hook, and hands over to the command layer on a tokio runtime.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use pkgsize_core::error::{PkgSizeError, PkgSizeResult};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built ",
    env!("PKGSIZE_BUILD_DATE"),
    " with ",
    env!("PKGSIZE_RUSTC_VERSION"),
    ")"
);

/// Estimate the installed size of npm packages and all of their dependencies
#[derive(Parser, Debug)]
#[command(name = "pkgsize", version, long_version = LONG_VERSION, about)]
pub struct Cli {
    /// Packages to measure; prompts interactively when none are given
    #[arg(value_name = "PACKAGE")]
    pub packages: Vec<String>,

    /// Registry base URL
    #[arg(long, value_name = "URL")]
    pub registry: Option<String>,

    /// Maximum number of registry requests in flight
    #[arg(long = "max-concurrent", value_name = "N")]
    pub max_concurrent: Option<usize>,

    /// Do not reuse package metadata between lookups
    #[arg(long)]
    pub no_cache: bool,

    /// Print reports as JSON
    #[arg(long)]
    pub json: bool,

    /// Read configuration from this file instead of pkgsize.toml
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose);
    setup_panic_handler();

    info!("Starting pkgsize v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(code) => code,
        Err(err) => {
            eprint!("{}", ErrorFormatter::new().format_error(&err));
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> PkgSizeResult<ExitCode> {
    // Create Tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| PkgSizeError::io("Failed to create async runtime".to_string(), e))?;

    rt.block_on(async {
        let ctx = CommandContext::new()?;
        commands::execute(cli, &ctx).await
    })
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "pkgsize={level},pkgsize_config={level},pkgsize_registry={level},pkgsize_resolver={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("pkgsize encountered an unexpected error: {}", panic_info);
        eprintln!("pkgsize crashed! This is a bug.");
        eprintln!("Please report this at: https://github.com/pkgsize/pkgsize/issues");
        eprintln!("Error: {}", panic_info);
    }));
}

//! Command implementations and dispatch logic.
//!
//! Settings are resolved once per process; the registry client built from them,
//! and with it the record cache, is shared by every package measured in that
//! process.

use std::process::ExitCode;
use std::sync::Arc;

use camino::Utf8PathBuf;
use pkgsize_config::{CliOverrides, ConfigLoader, Settings};
use pkgsize_core::error::{PkgSizeError, PkgSizeResult};
use pkgsize_registry::{MetadataCache, PackageSource, RegistryClient};
use pkgsize_resolver::Traversal;
use tracing::debug;

pub mod measure;
pub mod prompt;

#[cfg(test)]
mod tests;

use crate::output::render::ReportFormat;
use crate::output::OutputHandler;
use crate::Cli;

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub output: OutputHandler,
}

impl CommandContext {
    /// Create a new command context
    pub fn new() -> PkgSizeResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| PkgSizeError::io("Failed to get current directory".to_string(), e))?;
        let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| {
            PkgSizeError::io(
                "Current directory is not valid UTF-8".to_string(),
                e.into_io_error(),
            )
        })?;

        Ok(Self {
            cwd,
            output: OutputHandler::new(),
        })
    }
}

/// Engine and output settings for one process
pub struct Session {
    pub traversal: Traversal,
    pub format: ReportFormat,
    pub registry_url: String,
    /// Record cache shared with the registry client, if enabled
    pub cache: Option<Arc<MetadataCache>>,
}

impl Session {
    /// Build the registry client and traversal engine from resolved settings
    pub fn from_settings(settings: &Settings, format: ReportFormat) -> PkgSizeResult<Self> {
        let options = settings.client_options();
        let cache = options.cache.clone();
        let client = RegistryClient::with_options(options)?;

        let mut session = Self::with_source(Arc::new(client), settings, format);
        session.cache = cache;
        Ok(session)
    }

    /// Session over any package source
    pub fn with_source(
        source: Arc<dyn PackageSource>,
        settings: &Settings,
        format: ReportFormat,
    ) -> Self {
        Self {
            traversal: Traversal::with_config(source, settings.traversal_config()),
            format,
            registry_url: settings.registry_url.clone(),
            cache: None,
        }
    }

    /// Drop cached records whose TTL has run out
    pub fn evict_stale(&self) -> usize {
        let removed = self.cache.as_ref().map(|cache| cache.cleanup()).unwrap_or(0);
        if removed > 0 {
            debug!("Evicted {} stale cache entries", removed);
        }
        removed
    }
}

/// Resolve configuration and run either the one-shot or the interactive mode
pub async fn execute(cli: Cli, ctx: &CommandContext) -> PkgSizeResult<ExitCode> {
    let settings = load_settings(&cli, ctx).await?;
    let format = if cli.json {
        ReportFormat::Json
    } else {
        ReportFormat::Text
    };
    let session = Session::from_settings(&settings, format)?;

    if cli.packages.is_empty() {
        prompt::execute(&session, ctx).await?;
        Ok(ExitCode::SUCCESS)
    } else {
        let all_found = measure::execute_all(&session, &cli.packages, ctx).await?;
        Ok(if all_found {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }
}

async fn load_settings(cli: &Cli, ctx: &CommandContext) -> PkgSizeResult<Settings> {
    let explicit = cli
        .config
        .clone()
        .map(Utf8PathBuf::try_from)
        .transpose()
        .map_err(|e| PkgSizeError::config("config", format!("path is not valid UTF-8: {}", e)))?;

    let overrides = CliOverrides {
        registry: cli.registry.clone(),
        max_concurrent_fetches: cli.max_concurrent,
        no_cache: cli.no_cache,
    };

    let loader = ConfigLoader::new(ctx.cwd.clone());
    let (settings, sources) = loader.load(explicit.as_deref(), &overrides).await?;
    debug!("Configuration sources: {:?}", sources);
    debug!(
        "Resolved settings: registry {}, {} concurrent fetches, cache {}",
        settings.registry_url,
        settings.max_concurrent_fetches,
        if settings.cache_enabled { "on" } else { "off" }
    );

    Ok(settings)
}

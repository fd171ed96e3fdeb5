//! pkgsize.toml configuration parsing and validation
//!
//! Every key is optional so a file only has to mention what it changes; the
//! layering in `merge` fills in the rest.

use serde::Deserialize;
use pkgsize_core::error::PkgSizeError;
use crate::ConfigResult;

/// Complete pkgsize.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PkgSizeToml {
    /// Registry location and credentials
    pub registry: RegistrySection,

    /// Traversal tuning
    pub traversal: TraversalSection,

    /// Retry behaviour of registry requests
    pub retry: RetrySection,

    /// Record cache
    pub cache: CacheSection,
}

/// Registry section
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct RegistrySection {
    /// Registry base URL
    pub url: Option<String>,

    /// Bearer token
    pub token: Option<String>,

    /// Basic auth username
    pub username: Option<String>,

    /// Basic auth password
    pub password: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Traversal section
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct TraversalSection {
    /// Cap on concurrent registry fetches
    pub max_concurrent_fetches: Option<usize>,
}

/// Retry section
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct RetrySection {
    /// Maximum retry attempts after the first request
    pub max_retries: Option<u32>,

    /// Delay before the first retry, in milliseconds
    pub initial_delay_ms: Option<u64>,

    /// Upper bound on the delay between retries, in milliseconds
    pub max_delay_ms: Option<u64>,

    /// Backoff multiplier
    pub multiplier: Option<f64>,
}

/// Cache section
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct CacheSection {
    /// Whether fetched records are reused across traversals
    pub enabled: Option<bool>,

    /// Time-to-live of a cached record, in seconds
    pub ttl_secs: Option<u64>,
}

/// Parse TOML string to PkgSizeToml configuration
///
/// `file` only labels error messages.
pub fn parse_pkgsize_toml(content: &str, file: &str) -> ConfigResult<PkgSizeToml> {
    // First try with toml_edit for better error reporting
    content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| parse_error(file, content, e.message(), e.span()))?;

    // Then parse with serde for type safety
    let config: PkgSizeToml = ::toml::from_str(content)
        .map_err(|e| parse_error(file, content, e.message(), e.span()))?;

    validate_config(&config)?;

    Ok(config)
}

/// Validate values that are wrong regardless of which layer they come from
pub fn validate_config(config: &PkgSizeToml) -> ConfigResult<()> {
    if let Some(url) = &config.registry.url {
        validate_registry_url(url)?;
    }

    if config.traversal.max_concurrent_fetches == Some(0) {
        return Err(PkgSizeError::config(
            "traversal.max-concurrent-fetches",
            "must be at least 1",
        ));
    }

    if config.registry.timeout_secs == Some(0) {
        return Err(PkgSizeError::config("registry.timeout-secs", "must be at least 1"));
    }

    if let Some(multiplier) = config.retry.multiplier {
        if !(multiplier >= 1.0) {
            return Err(PkgSizeError::config(
                "retry.multiplier",
                format!("must be at least 1.0, got {}", multiplier),
            ));
        }
    }

    Ok(())
}

/// Check a registry URL parses and uses http(s)
pub fn validate_registry_url(raw: &str) -> ConfigResult<()> {
    let url = url::Url::parse(raw)
        .map_err(|e| PkgSizeError::config("registry.url", format!("'{}' is not a valid URL: {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(PkgSizeError::config(
            "registry.url",
            format!("unsupported scheme '{}', expected http or https", url.scheme()),
        ));
    }

    Ok(())
}

/// Load and parse pkgsize.toml from file path
pub async fn load_from_file(path: &camino::Utf8Path) -> ConfigResult<PkgSizeToml> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PkgSizeError::io(format!("Failed to read {}", path), e))?;

    parse_pkgsize_toml(&content, path.as_str())
}

fn parse_error(
    file: &str,
    content: &str,
    message: &str,
    span: Option<std::ops::Range<usize>>,
) -> PkgSizeError {
    let (line, column) = span
        .map(|span| line_column(content, span.start))
        .unwrap_or((0, 0));

    PkgSizeError::TomlParse {
        file: file.to_string(),
        message: message.trim().to_string(),
        line,
        column,
    }
}

/// 1-based line and column of a byte offset
fn line_column(content: &str, offset: usize) -> (usize, usize) {
    let before = &content[..offset.min(content.len())];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rsplit('\n')
        .next()
        .map(|last| last.chars().count() + 1)
        .unwrap_or(1);
    (line, column)
}

//! Configuration layering, fallback logic, and environment overrides
//!
//! Layers apply lowest to highest: built-in defaults, the global file, the
//! project file, environment variables, then command-line flags.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use pkgsize_core::error::PkgSizeError;
use pkgsize_registry::{AuthConfig, ClientOptions, MetadataCache, RetryConfig, DEFAULT_REGISTRY};
use pkgsize_resolver::TraversalConfig;

use crate::toml::{validate_registry_url, PkgSizeToml};
use crate::ConfigResult;

/// Project configuration file name
pub const PROJECT_CONFIG_FILE: &str = "pkgsize.toml";

/// Environment variable overriding the registry URL
pub const ENV_REGISTRY: &str = "PKGSIZE_REGISTRY";
/// Environment variable overriding the bearer token
pub const ENV_TOKEN: &str = "PKGSIZE_TOKEN";
/// Environment variable overriding the fetch concurrency cap
pub const ENV_MAX_CONCURRENT_FETCHES: &str = "PKGSIZE_MAX_CONCURRENT_FETCHES";

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
}

/// Configuration source tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Global config file
    Global(Utf8PathBuf),
    /// Project pkgsize.toml file
    Project(Utf8PathBuf),
    /// File named with --config
    Explicit(Utf8PathBuf),
    /// Environment variable
    Environment(String),
    /// CLI flag
    CommandLine,
}

/// Values given on the command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    /// --registry
    pub registry: Option<String>,
    /// --max-concurrent
    pub max_concurrent_fetches: Option<usize>,
    /// --no-cache
    pub no_cache: bool,
}

impl CliOverrides {
    fn is_empty(&self) -> bool {
        self.registry.is_none() && self.max_concurrent_fetches.is_none() && !self.no_cache
    }
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Registry base URL
    pub registry_url: String,
    /// Registry credentials
    pub auth: AuthConfig,
    /// Per-request timeout
    pub timeout: Duration,
    /// Cap on concurrent registry fetches
    pub max_concurrent_fetches: usize,
    /// Retry behaviour
    pub retry: RetryConfig,
    /// Whether records are cached across traversals
    pub cache_enabled: bool,
    /// Time-to-live of cached records
    pub cache_ttl: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        let client = ClientOptions::default();
        Self {
            registry_url: DEFAULT_REGISTRY.to_string(),
            auth: AuthConfig::default(),
            timeout: client.timeout,
            max_concurrent_fetches: TraversalConfig::default().max_concurrent_fetches,
            retry: RetryConfig::default(),
            cache_enabled: true,
            cache_ttl: pkgsize_registry::cache::DEFAULT_TTL,
        }
    }
}

impl Settings {
    /// Options for building a registry client from these settings
    pub fn client_options(&self) -> ClientOptions {
        let auth = if self.auth == AuthConfig::default() {
            None
        } else {
            Some(self.auth.clone())
        };

        ClientOptions {
            base_url: self.registry_url.clone(),
            auth,
            retry: self.retry.clone(),
            timeout: self.timeout,
            cache: self
                .cache_enabled
                .then(|| Arc::new(MetadataCache::with_default_ttl(self.cache_ttl))),
        }
    }

    /// Traversal configuration for these settings
    pub fn traversal_config(&self) -> TraversalConfig {
        TraversalConfig {
            max_concurrent_fetches: self.max_concurrent_fetches,
        }
    }

    /// Check the combined result of every layer
    pub fn validate(&self) -> ConfigResult<()> {
        validate_registry_url(&self.registry_url)?;

        if self.max_concurrent_fetches == 0 {
            return Err(PkgSizeError::config(
                "traversal.max-concurrent-fetches",
                "must be at least 1",
            ));
        }
        if self.timeout < Duration::from_secs(1) {
            return Err(PkgSizeError::config("registry.timeout-secs", "must be at least 1"));
        }
        if !(self.retry.multiplier >= 1.0) {
            return Err(PkgSizeError::config(
                "retry.multiplier",
                format!("must be at least 1.0, got {}", self.retry.multiplier),
            ));
        }
        if self.auth.username.is_some() != self.auth.password.is_some() {
            return Err(PkgSizeError::config(
                "registry.username",
                "username and password must be set together",
            ));
        }

        Ok(())
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self { cwd }
    }

    /// Resolve settings from every layer.
    ///
    /// `explicit` replaces the project file lookup when set. Returns the
    /// settings and the sources that contributed to them.
    pub async fn load(
        &self,
        explicit: Option<&Utf8Path>,
        cli: &CliOverrides,
    ) -> ConfigResult<(Settings, Vec<ConfigSource>)> {
        let mut sources = Vec::new();

        let global = match Self::global_config_path() {
            Some(path) if path.exists() => {
                let config = crate::toml::load_from_file(&path).await?;
                sources.push(ConfigSource::Global(path));
                Some(config)
            }
            _ => None,
        };

        let project = match explicit {
            Some(path) => {
                let config = crate::toml::load_from_file(path).await?;
                sources.push(ConfigSource::Explicit(path.to_path_buf()));
                Some(config)
            }
            None => match self.find_project_config() {
                Some(path) => {
                    let config = crate::toml::load_from_file(&path).await?;
                    sources.push(ConfigSource::Project(path));
                    Some(config)
                }
                None => None,
            },
        };

        let env = ConfigLayering::collect_env_overrides();
        sources.extend(env.keys().cloned().map(ConfigSource::Environment));
        if !cli.is_empty() {
            sources.push(ConfigSource::CommandLine);
        }

        let settings = ConfigLayering::merge_configs(global.as_ref(), project.as_ref(), &env, cli)?;
        Ok((settings, sources))
    }

    /// Find pkgsize.toml in the working directory or its ancestors
    pub fn find_project_config(&self) -> Option<Utf8PathBuf> {
        self.cwd
            .ancestors()
            .map(|dir| dir.join(PROJECT_CONFIG_FILE))
            .find(|path| path.is_file())
    }

    /// Location of the global configuration file, ~/.pkgsize/config.toml
    pub fn global_config_path() -> Option<Utf8PathBuf> {
        let home_dir = dirs::home_dir()?;
        let home_dir = Utf8PathBuf::try_from(home_dir).ok()?;
        Some(home_dir.join(".pkgsize").join("config.toml"))
    }
}

/// Configuration layering and merging
pub struct ConfigLayering;

impl ConfigLayering {
    /// Merge every layer over the built-in defaults
    pub fn merge_configs(
        global_config: Option<&PkgSizeToml>,
        project_config: Option<&PkgSizeToml>,
        env_overrides: &HashMap<String, String>,
        cli_overrides: &CliOverrides,
    ) -> ConfigResult<Settings> {
        let mut settings = Settings::default();

        for file in [global_config, project_config].into_iter().flatten() {
            Self::apply_file(&mut settings, file);
        }

        Self::apply_env_overrides(&mut settings, env_overrides)?;
        Self::apply_cli_overrides(&mut settings, cli_overrides);

        settings.validate()?;
        Ok(settings)
    }

    /// Apply the keys a file sets, leaving the rest untouched
    fn apply_file(settings: &mut Settings, file: &PkgSizeToml) {
        let registry = &file.registry;
        if let Some(url) = &registry.url {
            settings.registry_url = url.clone();
        }
        if let Some(token) = &registry.token {
            settings.auth.token = Some(token.clone());
        }
        if let Some(username) = &registry.username {
            settings.auth.username = Some(username.clone());
        }
        if let Some(password) = &registry.password {
            settings.auth.password = Some(password.clone());
        }
        if let Some(timeout) = registry.timeout_secs {
            settings.timeout = Duration::from_secs(timeout);
        }

        if let Some(limit) = file.traversal.max_concurrent_fetches {
            settings.max_concurrent_fetches = limit;
        }

        let retry = &file.retry;
        if let Some(max_retries) = retry.max_retries {
            settings.retry.max_retries = max_retries;
        }
        if let Some(delay) = retry.initial_delay_ms {
            settings.retry.initial_delay = Duration::from_millis(delay);
        }
        if let Some(delay) = retry.max_delay_ms {
            settings.retry.max_delay = Duration::from_millis(delay);
        }
        if let Some(multiplier) = retry.multiplier {
            settings.retry.multiplier = multiplier;
        }

        if let Some(enabled) = file.cache.enabled {
            settings.cache_enabled = enabled;
        }
        if let Some(ttl) = file.cache.ttl_secs {
            settings.cache_ttl = Duration::from_secs(ttl);
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(
        settings: &mut Settings,
        overrides: &HashMap<String, String>,
    ) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                ENV_REGISTRY => {
                    settings.registry_url = value.clone();
                }
                ENV_TOKEN => {
                    settings.auth.token = Some(value.clone());
                }
                ENV_MAX_CONCURRENT_FETCHES => {
                    settings.max_concurrent_fetches = value.trim().parse().map_err(|e| {
                        PkgSizeError::config(
                            ENV_MAX_CONCURRENT_FETCHES,
                            format!("'{}' is not a positive integer: {}", value, e),
                        )
                    })?;
                }
                _ => {
                    // Unknown environment variable, ignore
                }
            }
        }

        Ok(())
    }

    /// Apply CLI flag overrides
    fn apply_cli_overrides(settings: &mut Settings, overrides: &CliOverrides) {
        if let Some(registry) = &overrides.registry {
            settings.registry_url = registry.clone();
        }
        if let Some(limit) = overrides.max_concurrent_fetches {
            settings.max_concurrent_fetches = limit;
        }
        if overrides.no_cache {
            settings.cache_enabled = false;
        }
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, value)| {
                matches!(
                    key.as_str(),
                    ENV_REGISTRY | ENV_TOKEN | ENV_MAX_CONCURRENT_FETCHES
                ) && !value.is_empty()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toml::parse_pkgsize_toml;
    use tempfile::TempDir;

    fn temp_root() -> (TempDir, Utf8PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        (temp_dir, path)
    }

    #[test]
    fn test_defaults() {
        let settings =
            ConfigLayering::merge_configs(None, None, &HashMap::new(), &CliOverrides::default())
                .unwrap();

        assert_eq!(settings.registry_url, "https://registry.npmjs.org");
        assert_eq!(settings.max_concurrent_fetches, 16);
        assert_eq!(settings.retry.max_retries, 3);
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert!(settings.cache_enabled);
        assert!(settings.client_options().auth.is_none());
    }

    #[test]
    fn test_layer_precedence() {
        let global = parse_pkgsize_toml(
            "[registry]\nurl = \"https://global.example.com\"\ntoken = \"global-token\"\n\n[traversal]\nmax-concurrent-fetches = 4\n",
            "config.toml",
        )
        .unwrap();
        let project = parse_pkgsize_toml(
            "[registry]\nurl = \"https://project.example.com\"\n\n[retry]\nmax-retries = 1\n",
            "pkgsize.toml",
        )
        .unwrap();
        let env = HashMap::from([(
            ENV_MAX_CONCURRENT_FETCHES.to_string(),
            "8".to_string(),
        )]);
        let cli = CliOverrides {
            registry: Some("https://cli.example.com".to_string()),
            max_concurrent_fetches: None,
            no_cache: true,
        };

        let settings =
            ConfigLayering::merge_configs(Some(&global), Some(&project), &env, &cli).unwrap();

        // CLI beats project beats global
        assert_eq!(settings.registry_url, "https://cli.example.com");
        // Global value survives when no higher layer sets it
        assert_eq!(settings.auth.token.as_deref(), Some("global-token"));
        // Environment beats global
        assert_eq!(settings.max_concurrent_fetches, 8);
        assert_eq!(settings.retry.max_retries, 1);
        assert!(!settings.cache_enabled);
        assert!(settings.client_options().cache.is_none());
    }

    #[test]
    fn test_invalid_env_override() {
        let env = HashMap::from([(
            ENV_MAX_CONCURRENT_FETCHES.to_string(),
            "lots".to_string(),
        )]);

        let err =
            ConfigLayering::merge_configs(None, None, &env, &CliOverrides::default()).unwrap_err();
        assert!(matches!(err, PkgSizeError::ConfigValidation { .. }));
    }

    #[test]
    fn test_cli_zero_concurrency_rejected() {
        let cli = CliOverrides {
            max_concurrent_fetches: Some(0),
            ..CliOverrides::default()
        };

        let err = ConfigLayering::merge_configs(None, None, &HashMap::new(), &cli).unwrap_err();
        assert!(matches!(err, PkgSizeError::ConfigValidation { .. }));
    }

    #[test]
    fn test_bad_registry_scheme_rejected() {
        let env = HashMap::from([(
            ENV_REGISTRY.to_string(),
            "ftp://registry.example.com".to_string(),
        )]);

        let err =
            ConfigLayering::merge_configs(None, None, &env, &CliOverrides::default()).unwrap_err();
        assert!(matches!(err, PkgSizeError::ConfigValidation { .. }));
    }

    #[test]
    fn test_username_requires_password() {
        let project = parse_pkgsize_toml("[registry]\nusername = \"ci\"\n", "pkgsize.toml").unwrap();

        let err = ConfigLayering::merge_configs(
            None,
            Some(&project),
            &HashMap::new(),
            &CliOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PkgSizeError::ConfigValidation { .. }));
    }

    #[test]
    fn test_find_project_config_walks_up() {
        let (_guard, root) = temp_root();
        std::fs::write(root.join(PROJECT_CONFIG_FILE), "").unwrap();
        let nested = root.join("packages").join("web");
        std::fs::create_dir_all(&nested).unwrap();

        let loader = ConfigLoader::new(nested);
        assert_eq!(loader.find_project_config(), Some(root.join(PROJECT_CONFIG_FILE)));
    }

    #[tokio::test]
    async fn test_load_explicit_file() {
        let (_guard, root) = temp_root();
        let path = root.join("custom.toml");
        tokio::fs::write(&path, "[traversal]\nmax-concurrent-fetches = 2\n")
            .await
            .unwrap();

        let loader = ConfigLoader::new(root);
        let (settings, sources) = loader
            .load(Some(&path), &CliOverrides::default())
            .await
            .unwrap();

        assert_eq!(settings.max_concurrent_fetches, 2);
        assert!(sources.contains(&ConfigSource::Explicit(path)));
    }

    #[tokio::test]
    async fn test_load_reports_parse_errors() {
        let (_guard, root) = temp_root();
        tokio::fs::write(root.join(PROJECT_CONFIG_FILE), "[registry\n")
            .await
            .unwrap();

        let loader = ConfigLoader::new(root);
        let err = loader.load(None, &CliOverrides::default()).await.unwrap_err();

        assert!(matches!(err, PkgSizeError::TomlParse { .. }));
    }

    #[tokio::test]
    async fn test_load_missing_explicit_file() {
        let (_guard, root) = temp_root();

        let loader = ConfigLoader::new(root.clone());
        let err = loader
            .load(Some(&root.join("absent.toml")), &CliOverrides::default())
            .await
            .unwrap_err();

        assert!(matches!(err, PkgSizeError::Io { .. }));
    }
}

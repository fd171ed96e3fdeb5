//! HTTP client implementation with connection pooling and retry logic

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, ClientBuilder, StatusCode};
use tracing::{debug, warn};
use url::Url;

use pkgsize_core::error::PkgSizeError;
use pkgsize_core::types::PackageRecord;

use crate::api::PackageMetadataResponse;
use crate::cache::MetadataCache;
use crate::RegistryResult;

/// Default npm registry URL
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";

/// Configuration for exponential backoff retry logic
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Retry configuration that gives up after the first attempt
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay to wait after a failed attempt that waited `delay` before it
    fn next_delay(&self, delay: Duration) -> Duration {
        std::cmp::min(
            Duration::from_millis((delay.as_millis() as f64 * self.multiplier) as u64),
            self.max_delay,
        )
    }
}

/// Authentication configuration for registry access
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthConfig {
    /// Bearer token for authentication
    pub token: Option<String>,
    /// Basic auth username
    pub username: Option<String>,
    /// Basic auth password
    pub password: Option<String>,
}

impl AuthConfig {
    /// Value for the Authorization header, if any credentials are set
    fn header_value(&self) -> Option<String> {
        if let Some(token) = &self.token {
            return Some(format!("Bearer {}", token));
        }
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            use base64::{engine::general_purpose, Engine as _};
            let encoded = general_purpose::STANDARD.encode(format!("{}:{}", username, password));
            return Some(format!("Basic {}", encoded));
        }
        None
    }
}

/// Everything needed to build a registry client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Registry base URL
    pub base_url: String,
    /// Optional credentials
    pub auth: Option<AuthConfig>,
    /// Retry behaviour
    pub retry: RetryConfig,
    /// Per-request timeout
    pub timeout: Duration,
    /// Optional record cache shared across traversals
    pub cache: Option<Arc<MetadataCache>>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REGISTRY.to_string(),
            auth: None,
            retry: RetryConfig::default(),
            timeout: Duration::from_secs(30),
            cache: None,
        }
    }
}

/// Main HTTP client for npm registry operations
#[derive(Debug, Clone)]
pub struct RegistryClient {
    /// Underlying HTTP client with connection pooling
    client: Client,
    /// Retry configuration
    retry_config: RetryConfig,
    /// Base registry URL, without trailing slash
    base_url: String,
    /// Parsed records of previously fetched packages
    cache: Option<Arc<MetadataCache>>,
}

impl RegistryClient {
    /// Create new registry client for the public npm registry
    pub fn new() -> RegistryResult<Self> {
        Self::with_options(ClientOptions::default())
    }

    /// Create registry client with authentication
    pub fn with_auth(auth: AuthConfig) -> RegistryResult<Self> {
        Self::with_options(ClientOptions {
            auth: Some(auth),
            ..ClientOptions::default()
        })
    }

    /// Create registry client with custom configuration
    pub fn with_options(options: ClientOptions) -> RegistryResult<Self> {
        let base_url = Self::validate_base_url(&options.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(auth_value) = options.auth.as_ref().and_then(AuthConfig::header_value) {
            let value = HeaderValue::from_str(&auth_value)
                .map_err(|e| PkgSizeError::config("registry.token", format!("invalid credentials: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = ClientBuilder::new()
            // Connection pooling configuration
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            // Request timeout
            .timeout(options.timeout)
            // Enable gzip compression
            .gzip(true)
            .default_headers(headers)
            .user_agent(concat!("pkgsize/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PkgSizeError::network("Failed to create HTTP client".to_string(), e))?;

        Ok(Self {
            client,
            retry_config: options.retry,
            base_url,
            cache: options.cache,
        })
    }

    /// Base registry URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check the base URL parses and uses http(s); returns it without trailing slash
    fn validate_base_url(raw: &str) -> RegistryResult<String> {
        let url = Url::parse(raw)
            .map_err(|e| PkgSizeError::config("registry.url", format!("'{}' is not a valid URL: {}", raw, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(PkgSizeError::config(
                "registry.url",
                format!("unsupported scheme '{}', expected http or https", url.scheme()),
            ));
        }

        Ok(raw.trim_end_matches('/').to_string())
    }

    /// Execute HTTP request with exponential backoff retry logic
    async fn with_retry<F, Fut, T>(&self, operation: F) -> RegistryResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = RegistryResult<T>>,
    {
        let mut delay = self.retry_config.initial_delay;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    // Not-found, client errors and malformed answers won't change on retry
                    if attempt >= self.retry_config.max_retries || !error.is_recoverable() {
                        return Err(error);
                    }

                    attempt += 1;
                    warn!(
                        "Registry request failed ({}), retry {}/{} in {:?}",
                        error, attempt, self.retry_config.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = self.retry_config.next_delay(delay);
                }
            }
        }
    }

    /// Fetch the raw metadata document of a package, with retry logic
    pub async fn fetch_metadata(&self, package_name: &str) -> RegistryResult<PackageMetadataResponse> {
        let url = format!("{}/{}", self.base_url, self.encode_package_name(package_name));

        self.with_retry(|| async {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| PkgSizeError::network(format!("Failed to fetch metadata for '{}'", package_name), e))?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Err(PkgSizeError::PackageNotFound {
                    name: package_name.to_string(),
                });
            }
            if !status.is_success() {
                return Err(PkgSizeError::RegistryStatus {
                    package: package_name.to_string(),
                    status: status.as_u16(),
                });
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| PkgSizeError::network(format!("Failed to read metadata for '{}'", package_name), e))?;

            let metadata: PackageMetadataResponse =
                serde_json::from_slice(&body).map_err(|e| PkgSizeError::MalformedResponse {
                    package: package_name.to_string(),
                    message: e.to_string(),
                })?;

            if metadata.is_not_found() {
                return Err(PkgSizeError::PackageNotFound {
                    name: package_name.to_string(),
                });
            }

            Ok(metadata)
        })
        .await
    }

    /// Fetch a package and reduce it to the record of its latest version
    pub async fn fetch_package(&self, package_name: &str) -> RegistryResult<PackageRecord> {
        if let Some(cache) = &self.cache {
            if let Some(record) = cache.get(package_name) {
                debug!("Using cached metadata for {}", package_name);
                return Ok(record);
            }
        }

        let record = self.fetch_metadata(package_name).await?.into_record(package_name);
        debug!(
            "Fetched {}@{} ({} bytes, {} dependencies)",
            record.name,
            record.version,
            record.installed_size,
            record.dependencies.len()
        );

        if let Some(cache) = &self.cache {
            cache.insert(package_name.to_string(), record.clone());
        }

        Ok(record)
    }

    /// Encode package name for URL (handle scoped packages)
    fn encode_package_name(&self, name: &str) -> String {
        if name.starts_with('@') {
            // Scoped package: @org/pkg -> @org%2fpkg
            name.replace('/', "%2f")
        } else {
            name.to_string()
        }
    }
}

#[cfg(test)]
mod tests;

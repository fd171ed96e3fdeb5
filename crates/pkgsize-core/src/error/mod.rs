//! Error types and result aliases for pkgsize operations.
//!
//! Provides a unified error type that covers every failure a traversal, the
//! registry client, configuration loading or the CLI can run into.

use thiserror::Error;

/// Unified error type for all pkgsize operations
#[derive(Error, Debug)]
pub enum PkgSizeError {
    // Config errors
    #[error("Failed to parse {file}: {message} at line {line}, column {column}")]
    TomlParse {
        file: String,
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // Input errors
    #[error("Package name must not be empty")]
    EmptyInput,

    // Registry errors
    #[error("Package '{name}' not found in registry")]
    PackageNotFound { name: String },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Registry returned status {status} for '{package}'")]
    RegistryStatus { package: String, status: u16 },

    #[error("Malformed registry response for '{package}': {message}")]
    MalformedResponse { package: String, message: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for pkgsize operations
pub type PkgSizeResult<T> = Result<T, PkgSizeError>;

impl PkgSizeError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Create a configuration validation error
    pub fn config(field: &str, reason: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Check if retrying the operation could succeed.
    ///
    /// Client errors are final except request timeout (408) and rate limiting (429).
    pub fn is_recoverable(&self) -> bool {
        match self {
            PkgSizeError::Network { .. } | PkgSizeError::Io { .. } => true,
            PkgSizeError::RegistryStatus { status, .. } => {
                matches!(*status, 408 | 429) || *status >= 500
            }
            _ => false,
        }
    }

    /// Check if this error means the registry has no such package
    pub fn is_not_found(&self) -> bool {
        matches!(self, PkgSizeError::PackageNotFound { .. })
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            PkgSizeError::PackageNotFound { .. } => {
                Some("Check the package name spelling or try with a different name")
            },
            PkgSizeError::Network { .. } => Some("Check your internet connection and try again"),
            PkgSizeError::RegistryStatus { status: 401 | 403, .. } => {
                Some("Check the registry token or username/password in pkgsize.toml or PKGSIZE_TOKEN")
            },
            PkgSizeError::RegistryStatus { .. } => Some("Check the registry URL and try again"),
            PkgSizeError::MalformedResponse { .. } => {
                Some("Check that the configured registry URL points at an npm-compatible registry")
            },
            PkgSizeError::TomlParse { .. } | PkgSizeError::ConfigValidation { .. } => {
                Some("Fix pkgsize.toml or the overriding environment variable / flag")
            },
            PkgSizeError::EmptyInput => Some("Enter the name of a package, e.g. 'express'"),
            PkgSizeError::Io { .. } => None,
        }
    }
}

//! Error types for the objgate core.

use std::path::PathBuf;

/// Errors raised while loading or validating the gateway configuration.
///
/// Every variant is fatal at startup: the server refuses to start with a
/// configuration it cannot fully trust.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path of the file that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`GatewayConfig`](crate::GatewayConfig).
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A `s3://` URL could not be parsed.
    #[error("invalid S3 URL: {0} (expected s3://bucket/prefix)")]
    InvalidS3Url(String),

    /// A configured HTTP method name is not a valid method token.
    #[error("invalid HTTP method in allow-list: {0}")]
    InvalidMethod(String),

    /// Any other semantic validation failure.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Convenience result type for configuration handling.
pub type ConfigResult<T> = Result<T, ConfigError>;

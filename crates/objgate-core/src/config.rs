//! Gateway configuration.
//!
//! A [`GatewayConfig`] is assembled once at startup from three layers, lowest
//! precedence first:
//!
//! 1. Built-in defaults ([`GatewayConfig::default`]).
//! 2. A TOML file, either given explicitly or found at `config/<env>.toml`.
//! 3. Command-line flags and environment variables, applied by the binary.
//!
//! After [`GatewayConfig::validate`] succeeds the value is immutable and is
//! handed to each component's constructor by reference.
//!
//! # Example file
//!
//! ```toml
//! listen = "0.0.0.0:8080"
//! environment = "qa"
//! use_x_forwarded_for = true
//!
//! [storage]
//! region = "eu-west-1"
//! bucket_name = "moon-bi"
//! bucket_path = "exports/"
//!
//! [encoders]
//! csv_crlf = true
//! xml_indent = false
//! ```

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::{ConfigError, ConfigResult, S3Url};

/// Directory searched for per-environment configuration files.
pub const CONFIG_DIR: &str = "config";

/// Top-level gateway configuration.
///
/// # Examples
///
/// ```
/// use objgate_core::GatewayConfig;
///
/// let config = GatewayConfig::default();
/// assert_eq!(config.listen, "0.0.0.0:8080");
/// assert_eq!(config.allowed_methods, vec!["GET", "HEAD"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address in `ip:port` form to listen on.
    #[builder(default = String::from("0.0.0.0:8080"))]
    pub listen: String,

    /// X.509 certificate file (PEM). TLS is enabled when both this and
    /// [`key_file`](Self::key_file) are set.
    #[builder(default, setter(strip_option))]
    pub cert_file: Option<PathBuf>,

    /// Private key file (PEM) matching [`cert_file`](Self::cert_file).
    #[builder(default, setter(strip_option))]
    pub key_file: Option<PathBuf>,

    /// Directory served at `/` for paths no format route claims.
    #[builder(default, setter(strip_option))]
    pub public_dir: Option<PathBuf>,

    /// Use the first `X-Forwarded-For` entry as the client address.
    #[builder(default = false)]
    pub use_x_forwarded_for: bool,

    /// Disable the access log.
    #[builder(default = false)]
    pub silent: bool,

    /// HTTP methods allowed through the CORS layer (`OPTIONS` is implicit).
    #[builder(default = vec![String::from("GET"), String::from("HEAD")])]
    pub allowed_methods: Vec<String>,

    /// Deployment environment tag (`dev`, `qa`, `staging`, ...).
    #[builder(default = String::from("dev"))]
    pub environment: String,

    /// Object storage settings.
    #[builder(default)]
    pub storage: StorageConfig,

    /// Per-format encoder options.
    #[builder(default)]
    pub encoders: EncoderOptions,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GatewayConfig {
    /// Parse a configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML configuration file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load the file layer of the configuration.
    ///
    /// An explicit path must exist. Without one, `config/<environment>.toml`
    /// under `base_dir` is used when present, otherwise the defaults.
    pub fn load(explicit: Option<&Path>, base_dir: &Path, environment: &str) -> ConfigResult<Self> {
        if let Some(path) = explicit {
            debug!(path = %path.display(), "loading explicit config file");
            return Self::from_file(path);
        }

        let candidate = Self::environment_file(base_dir, environment);
        if candidate.is_file() {
            debug!(path = %candidate.display(), "loading environment config file");
            return Self::from_file(&candidate);
        }

        debug!(path = %candidate.display(), "no config file found, using defaults");
        Ok(Self::builder().environment(environment.to_owned()).build())
    }

    /// Path of the per-environment configuration file under `base_dir`.
    #[must_use]
    pub fn environment_file(base_dir: &Path, environment: &str) -> PathBuf {
        base_dir.join(CONFIG_DIR).join(format!("{environment}.toml"))
    }

    /// Check the configuration for values the gateway cannot start with.
    pub fn validate(&self) -> ConfigResult<()> {
        self.listen_addr()?;

        match (&self.cert_file, &self.key_file) {
            (Some(_), None) => {
                return Err(ConfigError::Invalid(
                    "cert_file is set but key_file is missing".to_owned(),
                ));
            }
            (None, Some(_)) => {
                return Err(ConfigError::Invalid(
                    "key_file is set but cert_file is missing".to_owned(),
                ));
            }
            _ => {}
        }

        if self.allowed_methods.is_empty() {
            return Err(ConfigError::Invalid(
                "allowed_methods must list at least one method".to_owned(),
            ));
        }
        for method in &self.allowed_methods {
            parse_method(method)?;
        }

        let (bucket, _) = self.storage.location()?;
        if bucket.is_empty() {
            return Err(ConfigError::Invalid(
                "storage.bucket_name (or storage.bucket_url) is required".to_owned(),
            ));
        }

        if self.storage.file_content_type.parse::<http::HeaderValue>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "storage.file_content_type is not a valid header value: {}",
                self.storage.file_content_type
            )));
        }

        Ok(())
    }

    /// The parsed listen address.
    pub fn listen_addr(&self) -> ConfigResult<SocketAddr> {
        self.listen
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid listen address: {}", self.listen)))
    }

    /// The certificate and key paths when TLS is configured.
    #[must_use]
    pub fn tls_files(&self) -> Option<(&Path, &Path)> {
        match (&self.cert_file, &self.key_file) {
            (Some(cert), Some(key)) => Some((cert.as_path(), key.as_path())),
            _ => None,
        }
    }
}

/// Parse a configured method name, ignoring surrounding whitespace and case.
pub fn parse_method(name: &str) -> ConfigResult<http::Method> {
    let name = name.trim();
    http::Method::from_bytes(name.to_ascii_uppercase().as_bytes())
        .map_err(|_| ConfigError::InvalidMethod(name.to_owned()))
}

/// Object storage settings.
#[derive(Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(default)]
pub struct StorageConfig {
    /// Static access key. When unset the default AWS credential chain is used.
    #[builder(default, setter(strip_option, into))]
    pub access_key: Option<String>,

    /// Static secret key paired with [`access_key`](Self::access_key).
    #[builder(default, setter(strip_option, into))]
    pub secret_key: Option<String>,

    /// Optional session token for temporary credentials.
    #[builder(default, setter(strip_option, into))]
    pub session_token: Option<String>,

    /// Storage region.
    #[builder(default = String::from("us-east-1"), setter(into))]
    pub region: String,

    /// Custom endpoint URL for S3-compatible stores.
    #[builder(default, setter(strip_option, into))]
    pub endpoint: Option<String>,

    /// Use path-style addressing (`endpoint/bucket/key`).
    #[builder(default = false)]
    pub force_path_style: bool,

    /// Bucket holding the served objects.
    #[builder(default, setter(into))]
    pub bucket_name: String,

    /// Key prefix prepended to every requested file name.
    #[builder(default, setter(into))]
    pub bucket_path: String,

    /// `s3://bucket/prefix` shorthand that overrides
    /// [`bucket_name`](Self::bucket_name) and [`bucket_path`](Self::bucket_path).
    #[builder(default, setter(strip_option, into))]
    pub bucket_url: Option<String>,

    /// Content type used when serving objects unchanged.
    #[builder(default = String::from("application/octet-stream"), setter(into))]
    pub file_content_type: String,

    /// Upper bound for a single object fetch in seconds; `0` disables it.
    #[builder(default = 30)]
    pub fetch_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "***"))
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("force_path_style", &self.force_path_style)
            .field("bucket_name", &self.bucket_name)
            .field("bucket_path", &self.bucket_path)
            .field("bucket_url", &self.bucket_url)
            .field("file_content_type", &self.file_content_type)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .finish()
    }
}

impl StorageConfig {
    /// Resolve the effective `(bucket, key prefix)` pair.
    pub fn location(&self) -> ConfigResult<(String, String)> {
        match &self.bucket_url {
            Some(url) => {
                let url: S3Url = url.parse()?;
                Ok((url.bucket().to_owned(), url.key().to_owned()))
            }
            None => Ok((self.bucket_name.clone(), self.bucket_path.clone())),
        }
    }

    /// The fetch timeout, or `None` when disabled.
    #[must_use]
    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.fetch_timeout_secs > 0).then(|| Duration::from_secs(self.fetch_timeout_secs))
    }
}

/// Per-format encoder options.
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(default)]
pub struct EncoderOptions {
    /// Terminate CSV records with `\r\n` instead of `\n`.
    #[builder(default = true)]
    pub csv_crlf: bool,

    /// Pretty-print XML output.
    #[builder(default = true)]
    pub xml_indent: bool,

    /// Pretty-print JSON output.
    #[builder(default = false)]
    pub json_indent: bool,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

//! Command-line flags and their merge into the file configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use objgate_core::GatewayConfig;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// objgate: serve bucket objects as CSV, XML, JSON or JSONP.
///
/// Flags override values from the configuration file, which override the
/// built-in defaults.
#[derive(Debug, Parser)]
#[command(name = "objgate-server", version, about)]
pub struct Cli {
    /// Configuration file. Defaults to `config/<env>.toml` when present.
    #[arg(long, env = "OBJGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Environment tag, also selecting the default configuration file.
    #[arg(long = "env", env = "OBJGATE_ENV", default_value = "dev")]
    pub environment: String,

    /// Listen address, e.g. `0.0.0.0:8080`.
    #[arg(long, env = "OBJGATE_ADDR")]
    pub addr: Option<String>,

    /// TLS certificate chain (PEM).
    #[arg(long, env = "OBJGATE_CERT", requires = "key")]
    pub cert: Option<PathBuf>,

    /// TLS private key (PEM).
    #[arg(long, env = "OBJGATE_KEY", requires = "cert")]
    pub key: Option<PathBuf>,

    /// Directory served for paths no format route claims.
    #[arg(long, env = "OBJGATE_PUBLIC")]
    pub public: Option<PathBuf>,

    /// Attribute requests to the first `X-Forwarded-For` entry.
    #[arg(long, env = "OBJGATE_USE_X_FORWARDED_FOR")]
    pub use_x_forwarded_for: bool,

    /// Disable access logging.
    #[arg(long, env = "OBJGATE_SILENT")]
    pub silent: bool,

    /// Static access key for the object store.
    #[arg(long, env = "OBJGATE_AWS_KEY")]
    pub aws_key: Option<String>,

    /// Static secret key for the object store.
    #[arg(long, env = "OBJGATE_AWS_SECRET", hide_env_values = true)]
    pub aws_secret: Option<String>,

    /// Object store region.
    #[arg(long, env = "OBJGATE_AWS_REGION")]
    pub aws_region: Option<String>,

    /// Custom endpoint for S3-compatible stores.
    #[arg(long, env = "OBJGATE_AWS_ENDPOINT")]
    pub aws_endpoint: Option<String>,

    /// Bucket holding the served objects.
    #[arg(long, env = "OBJGATE_BUCKET_NAME")]
    pub bucket_name: Option<String>,

    /// Key prefix prepended to every requested file name.
    #[arg(long, env = "OBJGATE_BUCKET_PATH")]
    pub bucket_path: Option<String>,

    /// Content type for objects served from `/raw/`.
    #[arg(long, env = "OBJGATE_FILE_CONTENT_TYPE")]
    pub file_content_type: Option<String>,

    /// Log level filter; `RUST_LOG` takes precedence.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log line format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Probe the running server's health endpoint and exit.
    #[arg(long)]
    pub health_check: bool,
}

impl Cli {
    /// Load the file layer from `base_dir` and apply the flag layer on top.
    pub fn load_config(&self, base_dir: &Path) -> Result<GatewayConfig> {
        let mut config = GatewayConfig::load(self.config.as_deref(), base_dir, &self.environment)
            .context("failed to load configuration")?;
        self.apply(&mut config);
        Ok(config)
    }

    /// Overwrite every configuration value the command line sets.
    pub fn apply(&self, config: &mut GatewayConfig) {
        config.environment.clone_from(&self.environment);

        if let Some(addr) = &self.addr {
            config.listen.clone_from(addr);
        }
        if let Some(cert) = &self.cert {
            config.cert_file = Some(cert.clone());
        }
        if let Some(key) = &self.key {
            config.key_file = Some(key.clone());
        }
        if let Some(public) = &self.public {
            config.public_dir = Some(public.clone());
        }
        if self.use_x_forwarded_for {
            config.use_x_forwarded_for = true;
        }
        if self.silent {
            config.silent = true;
        }

        let storage = &mut config.storage;
        if let Some(key) = &self.aws_key {
            storage.access_key = Some(key.clone());
        }
        if let Some(secret) = &self.aws_secret {
            storage.secret_key = Some(secret.clone());
        }
        if let Some(region) = &self.aws_region {
            storage.region.clone_from(region);
        }
        if let Some(endpoint) = &self.aws_endpoint {
            storage.endpoint = Some(endpoint.clone());
        }
        if let Some(bucket) = &self.bucket_name {
            storage.bucket_name.clone_from(bucket);
            storage.bucket_url = None;
        }
        if let Some(path) = &self.bucket_path {
            storage.bucket_path.clone_from(path);
        }
        if let Some(content_type) = &self.file_content_type {
            storage.file_content_type.clone_from(content_type);
        }
    }
}

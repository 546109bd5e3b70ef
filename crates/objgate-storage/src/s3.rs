//! S3 backend built on `aws-sdk-s3`.

use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_smithy_types::error::display::DisplayErrorContext;
use objgate_core::StorageConfig;
use tracing::{debug, info};

use crate::{FetchFuture, ObjectStore, StorageError};

/// Provider name attached to credentials taken from the gateway config.
const CONFIG_CREDENTIALS_PROVIDER: &str = "objgate-config";

/// An [`ObjectStore`] that reads objects with `GetObject`.
///
/// Works against AWS S3 and any S3-compatible endpoint. The whole object body
/// is collected into memory before it is returned.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    /// Wrap an already configured S3 client.
    #[must_use]
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Build a client from the storage section of the gateway config.
    ///
    /// Static credentials are used when both access and secret key are
    /// configured; otherwise the default AWS provider chain applies.
    pub async fn from_config(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            info!(access_key = %access_key, "using static storage credentials from config");
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                config.session_token.clone(),
                None,
                CONFIG_CREDENTIALS_PROVIDER,
            ));
        }

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let shared = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.force_path_style)
            .build();

        Self::new(aws_sdk_s3::Client::from_conf(s3_config))
    }
}

impl ObjectStore for S3ObjectStore {
    fn get_object<'a>(&'a self, bucket: &'a str, key: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            debug!(bucket, key, "GetObject");

            let output = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| StorageError::new(bucket, key, DisplayErrorContext(&e)))?;

            let body = output
                .body
                .collect()
                .await
                .map_err(|e| StorageError::new(bucket, key, e))?;

            Ok(body.into_bytes())
        })
    }
}

//! Integration tests for the objgate server.
//!
//! These tests need two running processes:
//!
//! - an S3-compatible store at `OBJGATE_S3_ENDPOINT` (default
//!   `http://localhost:4566`) holding the bucket `OBJGATE_TEST_BUCKET`
//!   (default `objgate-test`);
//! - objgate at `OBJGATE_URL` (default `http://localhost:8080`) serving that
//!   bucket with an empty key prefix and `--use-x-forwarded-for`.
//!
//! They are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p objgate-integration -- --ignored
//! ```

use std::sync::Once;

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Base URL of the gateway under test.
#[must_use]
pub fn gateway_url() -> String {
    std::env::var("OBJGATE_URL").unwrap_or_else(|_| "http://localhost:8080".to_owned())
}

/// Endpoint of the backing object store.
fn store_endpoint() -> String {
    std::env::var("OBJGATE_S3_ENDPOINT").unwrap_or_else(|_| "http://localhost:4566".to_owned())
}

/// Bucket the gateway serves.
#[must_use]
pub fn test_bucket() -> String {
    std::env::var("OBJGATE_TEST_BUCKET").unwrap_or_else(|_| "objgate-test".to_owned())
}

/// HTTP client for requests against the gateway.
#[must_use]
pub fn http_client() -> reqwest::Client {
    init_tracing();
    reqwest::Client::new()
}

/// Create a configured S3 client pointing at the backing store.
#[must_use]
pub fn s3_client() -> aws_sdk_s3::Client {
    init_tracing();

    let creds = Credentials::new("test", "test", None, None, "integration-test");

    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(creds)
        .endpoint_url(store_endpoint())
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

/// Generate a unique object name for a test.
#[must_use]
pub fn test_file_name(prefix: &str, extension: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("{prefix}-{id}.{extension}")
}

/// Upload `body` under `name` to the served bucket, creating the bucket if needed.
pub async fn seed_object(client: &aws_sdk_s3::Client, name: &str, body: &[u8]) {
    let bucket = test_bucket();
    let _ = client.create_bucket().bucket(&bucket).send().await;
    client
        .put_object()
        .bucket(&bucket)
        .key(name)
        .body(body.to_vec().into())
        .send()
        .await
        .unwrap_or_else(|e| panic!("failed to seed {name}: {e}"));
}

/// Remove a seeded object.
pub async fn remove_object(client: &aws_sdk_s3::Client, name: &str) {
    let _ = client
        .delete_object()
        .bucket(test_bucket())
        .key(name)
        .send()
        .await;
}

mod test_cors;
mod test_errors;
mod test_formats;

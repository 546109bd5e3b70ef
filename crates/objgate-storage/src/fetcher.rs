//! File name to object resolution.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use objgate_core::{ConfigResult, StorageConfig};
use tracing::debug;

use crate::{ObjectStore, StorageError};

/// Resolves requested file names to object keys and fetches them.
///
/// A file name maps to exactly one key: the configured prefix followed by the
/// file name, inside the configured bucket. Fetches are attempted once; a
/// failure is returned to the caller without retrying.
#[derive(Clone)]
pub struct Fetcher {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    prefix: String,
    timeout: Option<Duration>,
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    /// Create a fetcher for `bucket`, prepending `prefix` to every file name.
    #[must_use]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            prefix: prefix.into(),
            timeout: None,
        }
    }

    /// Create a fetcher from the storage configuration.
    pub fn from_config(store: Arc<dyn ObjectStore>, config: &StorageConfig) -> ConfigResult<Self> {
        let (bucket, prefix) = config.location()?;
        Ok(Self::new(store, bucket, prefix).with_timeout(config.fetch_timeout()))
    }

    /// Bound every fetch by `timeout`; `None` waits indefinitely.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The bucket objects are read from.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The object key for `file_name`.
    #[must_use]
    pub fn resolve_key(&self, file_name: &str) -> String {
        format!("{}{}", self.prefix, file_name)
    }

    /// Fetch the object behind `file_name`.
    pub async fn fetch(&self, file_name: &str) -> Result<Bytes, StorageError> {
        let key = self.resolve_key(file_name);
        debug!(bucket = %self.bucket, key = %key, "fetching object");

        let fetch = self.store.get_object(&self.bucket, &key);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fetch).await.map_err(|_| {
                StorageError::new(&self.bucket, &key, format!("timed out after {limit:?}"))
            })?,
            None => fetch.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FetchFuture, MemoryObjectStore};

    /// A store that never answers.
    struct HangingStore;

    impl ObjectStore for HangingStore {
        fn get_object<'a>(&'a self, _bucket: &'a str, _key: &'a str) -> FetchFuture<'a> {
            Box::pin(std::future::pending())
        }
    }

    #[test]
    fn test_should_prepend_prefix_to_file_name() {
        let fetcher = Fetcher::new(Arc::new(MemoryObjectStore::new()), "moon-bi", "exports/daily/");
        assert_eq!(fetcher.resolve_key("report.csv"), "exports/daily/report.csv");
        assert_eq!(fetcher.bucket(), "moon-bi");
    }

    #[tokio::test]
    async fn test_should_fetch_under_prefix() {
        let store = MemoryObjectStore::new().with_object("moon-bi", "exports/a.csv", "x,y\n");
        let fetcher = Fetcher::new(Arc::new(store), "moon-bi", "exports/");
        let bytes = fetcher.fetch("a.csv").await.unwrap();
        assert_eq!(&bytes[..], b"x,y\n");
    }

    #[tokio::test]
    async fn test_should_report_resolved_key_on_failure() {
        let fetcher = Fetcher::new(Arc::new(MemoryObjectStore::new()), "moon-bi", "exports/");
        let err = fetcher.fetch("missing.csv").await.unwrap_err();
        assert_eq!(err.bucket, "moon-bi");
        assert_eq!(err.key, "exports/missing.csv");
    }

    #[tokio::test(start_paused = true)]
    async fn test_should_time_out_slow_fetch() {
        let fetcher = Fetcher::new(Arc::new(HangingStore), "moon-bi", "")
            .with_timeout(Some(Duration::from_secs(5)));
        let err = fetcher.fetch("slow.csv").await.unwrap_err();
        assert!(err.reason.contains("timed out"));
    }

    #[test]
    fn test_should_build_from_bucket_url_config() {
        let config = StorageConfig::builder()
            .bucket_url("s3://reports/daily/")
            .fetch_timeout_secs(0)
            .build();
        let fetcher = Fetcher::from_config(Arc::new(MemoryObjectStore::new()), &config).unwrap();
        assert_eq!(fetcher.bucket(), "reports");
        assert_eq!(fetcher.resolve_key("a.csv"), "daily/a.csv");
        assert!(fetcher.timeout.is_none());
    }
}

//! In-memory object store.
//!
//! Holds a fixed set of objects supplied up front. Useful for local runs
//! without a bucket and as the storage double in tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;

use crate::{FetchFuture, ObjectStore, StorageError};

/// An [`ObjectStore`] backed by a map of `(bucket, key)` to bytes.
///
/// The object set is fixed at construction; only the request counter changes
/// afterwards.
///
/// # Examples
///
/// ```
/// use objgate_storage::{MemoryObjectStore, ObjectStore};
///
/// # tokio_test::block_on(async {
/// let store = MemoryObjectStore::new().with_object("moon-bi", "exports/a.csv", "a,b\n");
/// let bytes = store.get_object("moon-bi", "exports/a.csv").await.unwrap();
/// assert_eq!(&bytes[..], b"a,b\n");
/// assert_eq!(store.request_count(), 1);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: HashMap<(String, String), Bytes>,
    requests: AtomicUsize,
}

impl MemoryObjectStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object, returning the store.
    #[must_use]
    pub fn with_object(
        mut self,
        bucket: impl Into<String>,
        key: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.objects.insert((bucket.into(), key.into()), data.into());
        self
    }

    /// Number of `get_object` calls served so far, successful or not.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get_object<'a>(&'a self, bucket: &'a str, key: &'a str) -> FetchFuture<'a> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let result = self
            .objects
            .get(&(bucket.to_owned(), key.to_owned()))
            .cloned()
            .ok_or_else(|| StorageError::new(bucket, key, "NoSuchKey"));
        Box::pin(async move { result })
    }
}

//! The backend trait every object source implements.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

use crate::StorageError;

/// Boxed future returned by [`ObjectStore::get_object`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Bytes, StorageError>> + Send + 'a>>;

/// A source of object bytes addressed by bucket and key.
///
/// This is the boundary between the gateway and the storage service.
/// Implementations must be safe to share across connections; the gateway
/// holds a single instance behind an `Arc` for the whole process lifetime.
///
/// # Object Safety
///
/// The method returns a boxed future so the trait can be used as
/// `Arc<dyn ObjectStore>`.
pub trait ObjectStore: Send + Sync + 'static {
    /// Retrieve the complete contents of `bucket/key`.
    fn get_object<'a>(&'a self, bucket: &'a str, key: &'a str) -> FetchFuture<'a>;
}

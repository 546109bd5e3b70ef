//! Object storage access for objgate.
//!
//! The gateway reads objects through two layers:
//!
//! - An [`ObjectStore`] backend that knows how to get the bytes of
//!   `bucket/key` from somewhere: [`S3ObjectStore`] talks to S3 (or any
//!   S3-compatible endpoint) through `aws-sdk-s3`, and [`MemoryObjectStore`]
//!   serves a fixed set of objects held in memory.
//!
//! - The [`Fetcher`], which owns the configured bucket and key prefix, turns
//!   a requested file name into a key and enforces the fetch timeout.
//!
//! Every failure, whatever its cause, surfaces as a single [`StorageError`].
//! Callers are not expected to tell a missing object from an unreachable
//! backend.

mod error;
mod fetcher;
mod memory;
mod s3;
mod store;

pub use error::StorageError;
pub use fetcher::Fetcher;
pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;
pub use store::{FetchFuture, ObjectStore};

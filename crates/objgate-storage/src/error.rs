//! Storage error type.

use std::fmt;

/// The single failure mode of an object fetch.
///
/// Missing objects, denied access, network failures, and timeouts are all
/// reported through this one type. The `reason` is for operators (logs); it
/// is never shown to HTTP clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("object s3://{bucket}/{key} unavailable: {reason}")]
pub struct StorageError {
    /// Bucket the fetch targeted.
    pub bucket: String,
    /// Fully resolved object key.
    pub key: String,
    /// Human-readable cause.
    pub reason: String,
}

impl StorageError {
    /// Create a storage error for `bucket/key`.
    #[must_use]
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
        reason: impl fmt::Display,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

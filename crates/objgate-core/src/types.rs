//! Shared value types.

use std::fmt;
use std::str::FromStr;

use crate::ConfigError;

/// A parsed `s3://bucket/key` location.
///
/// Used as a shorthand for pointing the gateway at a bucket and key prefix in
/// one value, e.g. `s3://reports/daily/` resolves to bucket `reports` and key
/// prefix `daily/`.
///
/// # Examples
///
/// ```
/// use objgate_core::S3Url;
///
/// let url: S3Url = "s3://reports/daily/2024/".parse().unwrap();
/// assert_eq!(url.bucket(), "reports");
/// assert_eq!(url.key(), "daily/2024/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct S3Url {
    bucket: String,
    key: String,
}

impl S3Url {
    /// URL scheme prefix.
    pub const SCHEME: &str = "s3://";

    /// Returns `true` if the string carries the `s3://` scheme.
    #[must_use]
    pub fn is_s3_url(s: &str) -> bool {
        s.starts_with(Self::SCHEME)
    }

    /// The bucket component.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The key (path inside the bucket), without a leading slash.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl FromStr for S3Url {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(Self::SCHEME)
            .ok_or_else(|| ConfigError::InvalidS3Url(s.to_owned()))?;

        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(ConfigError::InvalidS3Url(s.to_owned()));
        }

        Ok(Self {
            bucket: bucket.to_owned(),
            key: key.trim_start_matches('/').to_owned(),
        })
    }
}

impl fmt::Display for S3Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", Self::SCHEME, self.bucket, self.key)
    }
}

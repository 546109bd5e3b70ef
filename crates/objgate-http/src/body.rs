//! Response body type supporting buffered and empty modes.
//!
//! Every response the gateway produces is fully assembled before it is
//! returned, so the body is either a single buffered chunk or nothing at all.
//! A known, exact size is what lets the access log report bytes written
//! without intercepting the connection.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body_util::Full;

/// Response body used throughout the gateway.
///
/// Implements [`http_body::Body`] so it can be used directly with hyper.
#[derive(Debug, Default)]
pub enum GatewayBody {
    /// A complete in-memory body.
    Buffered(Full<Bytes>),
    /// No body: preflight answers, HEAD-only responses.
    #[default]
    Empty,
}

impl GatewayBody {
    /// Create a buffered body from bytes.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::Buffered(Full::new(data.into()))
    }

    /// Create an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }

    /// Create a buffered body from a UTF-8 string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self::Buffered(Full::new(Bytes::from(s.into())))
    }

    /// Exact length of the body in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        http_body::Body::size_hint(self).exact().unwrap_or_default()
    }

    /// Whether the body carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl http_body::Body for GatewayBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Empty => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Buffered(full) => full.is_end_stream(),
            Self::Empty => true,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Buffered(full) => full.size_hint(),
            Self::Empty => http_body::SizeHint::with_exact(0),
        }
    }
}

/// Collect a body into bytes. Test helper.
#[cfg(test)]
pub(crate) async fn collect(body: GatewayBody) -> Bytes {
    use http_body_util::BodyExt;

    body.collect()
        .await
        .expect("buffered body cannot fail")
        .to_bytes()
}

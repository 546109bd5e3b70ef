//! Per-request values carried in request and response extensions.
//!
//! Layers of the pipeline exchange information only through these explicit
//! values: the transport address travels inward on the request, annotations
//! for the access log travel outward on the response.

use std::fmt;
use std::net::SocketAddr;

/// The remote address a request is attributed to.
///
/// Inserted into request extensions by the connection acceptor. The proxy
/// layer may replace it, for the inner call only, with the client named in
/// `X-Forwarded-For`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAddr(String);

impl RemoteAddr {
    /// Create a remote address from any textual form (`ip`, `ip:port`).
    #[must_use]
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    /// The address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<SocketAddr> for RemoteAddr {
    fn from(addr: SocketAddr) -> Self {
        Self(addr.to_string())
    }
}

impl fmt::Display for RemoteAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client address taken from `X-Forwarded-For`, reported on the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedClient(pub RemoteAddr);

/// The client a format handler attributed its response to.
///
/// Set by the handler from the [`RemoteAddr`] it received, so outer layers
/// can report who the object was served for after any proxy rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedClient(pub RemoteAddr);

/// Free-form context attached to a response for the access log line.
///
/// Handlers use it to record why a request failed (the storage error, the
/// encoder error) without exposing the detail to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogAnnotation(pub String);

impl LogAnnotation {
    /// Attach `note` to `response`, replacing any previous annotation.
    pub fn attach<B>(response: &mut http::Response<B>, note: impl Into<String>) {
        response.extensions_mut().insert(Self(note.into()));
    }

    /// Read the annotation attached to `response`, if any.
    #[must_use]
    pub fn of<B>(response: &http::Response<B>) -> Option<&str> {
        response
            .extensions()
            .get::<Self>()
            .map(|note| note.0.as_str())
    }
}

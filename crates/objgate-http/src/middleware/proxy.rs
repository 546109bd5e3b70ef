//! Client address normalization behind a reverse proxy.

use std::convert::Infallible;

use http::HeaderMap;
use hyper::service::Service;

use crate::body::GatewayBody;
use crate::context::{ForwardedClient, RemoteAddr};
use crate::service::ResponseFuture;

/// Header carrying the client chain from reverse proxies.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// The first entry of `X-Forwarded-For`, if present and non-empty.
#[must_use]
pub fn forwarded_client(headers: &HeaderMap) -> Option<RemoteAddr> {
    let value = headers.get(X_FORWARDED_FOR)?.to_str().ok()?;
    let first = value.split(',').next()?.trim();
    (!first.is_empty()).then(|| RemoteAddr::new(first))
}

/// Rewrites the request's [`RemoteAddr`] from `X-Forwarded-For`.
///
/// The rewritten address lives only in the request handed to the inner
/// service. Layers outside keep whatever they read before the call; the
/// forwarded client is reported back on the response as a
/// [`ForwardedClient`].
#[derive(Debug, Clone)]
pub struct ProxyIp<S> {
    inner: S,
}

impl<S> ProxyIp<S> {
    /// Wrap `inner`.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S, B> Service<http::Request<B>> for ProxyIp<S>
where
    S: Service<http::Request<B>, Response = http::Response<GatewayBody>, Error = Infallible>,
    S::Future: Send + 'static,
{
    type Response = http::Response<GatewayBody>;
    type Error = Infallible;
    type Future = ResponseFuture;

    fn call(&self, mut req: http::Request<B>) -> Self::Future {
        let forwarded = forwarded_client(req.headers());
        if let Some(client) = &forwarded {
            req.extensions_mut().insert(client.clone());
        }

        let fut = self.inner.call(req);
        Box::pin(async move {
            let mut resp = fut.await?;
            if let Some(client) = forwarded {
                resp.extensions_mut().insert(ForwardedClient(client));
            }
            Ok(resp)
        })
    }
}

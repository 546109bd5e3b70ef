//! Access logging, the outermost layer.

use std::convert::Infallible;
use std::time::{Duration, Instant};

use http::header::USER_AGENT;
use http::{Method, StatusCode};
use hyper::service::Service;
use tracing::info;

use crate::body::GatewayBody;
use crate::context::{ForwardedClient, LogAnnotation, RemoteAddr, ServedClient};
use crate::service::ResponseFuture;

/// Request facts captured before the request moves inward.
#[derive(Debug, Clone)]
pub struct AccessRecord {
    proto: String,
    method: Method,
    path: String,
    user_agent: Option<String>,
    remote_addr: Option<RemoteAddr>,
    started: Instant,
}

impl AccessRecord {
    /// Capture the request line, user agent and transport address.
    #[must_use]
    pub fn begin<B>(req: &http::Request<B>) -> Self {
        Self {
            proto: format!("{:?}", req.version()),
            method: req.method().clone(),
            path: req
                .uri()
                .path_and_query()
                .map_or_else(|| req.uri().path().to_owned(), ToString::to_string),
            user_agent: req
                .headers()
                .get(USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
            remote_addr: req.extensions().get::<RemoteAddr>().cloned(),
            started: Instant::now(),
        }
    }

    /// Complete the record with the final response.
    #[must_use]
    pub fn finish(self, resp: &http::Response<GatewayBody>) -> AccessEntry {
        AccessEntry {
            status: resp.status(),
            bytes: resp.body().len(),
            elapsed: self.started.elapsed(),
            extra: LogAnnotation::of(resp).map(str::to_owned),
            forwarded_for: resp
                .extensions()
                .get::<ForwardedClient>()
                .map(|c| c.0.clone()),
            served_for: resp.extensions().get::<ServedClient>().map(|c| c.0.clone()),
            record: self,
        }
    }
}

/// One finished request, ready to be logged.
#[derive(Debug, Clone)]
pub struct AccessEntry {
    record: AccessRecord,
    /// Final status code.
    pub status: StatusCode,
    /// Body bytes sent.
    pub bytes: u64,
    /// Time from receipt to a complete response.
    pub elapsed: Duration,
    /// Annotation attached by inner layers.
    pub extra: Option<String>,
    /// Client named by `X-Forwarded-For`, when rewritten.
    pub forwarded_for: Option<RemoteAddr>,
    /// Client the format handler served, when a handler answered.
    pub served_for: Option<RemoteAddr>,
}

impl AccessEntry {
    /// The transport address the request arrived from.
    #[must_use]
    pub fn remote_addr(&self) -> Option<&RemoteAddr> {
        self.record.remote_addr.as_ref()
    }

    /// Request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.record.method
    }

    /// Request path and query.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.record.path
    }

    /// Write the entry as an `objgate::access` event.
    pub fn emit(&self) {
        let r = &self.record;
        info!(
            target: "objgate::access",
            proto = %r.proto,
            status = self.status.as_u16(),
            method = %r.method,
            path = %r.path,
            user_agent = r.user_agent.as_deref().unwrap_or("-"),
            bytes = self.bytes,
            elapsed = ?self.elapsed,
            remote_addr = r.remote_addr.as_ref().map_or("-", RemoteAddr::as_str),
            forwarded_for = self.forwarded_for.as_ref().map_or("-", RemoteAddr::as_str),
            served_for = self.served_for.as_ref().map_or("-", RemoteAddr::as_str),
            extra = self.extra.as_deref().unwrap_or(""),
            "request completed"
        );
    }
}

/// Logs one line per request after the inner service has answered.
#[derive(Debug, Clone)]
pub struct AccessLog<S> {
    inner: S,
}

impl<S> AccessLog<S> {
    /// Wrap `inner`.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S, B> Service<http::Request<B>> for AccessLog<S>
where
    S: Service<http::Request<B>, Response = http::Response<GatewayBody>, Error = Infallible>,
    S::Future: Send + 'static,
{
    type Response = http::Response<GatewayBody>;
    type Error = Infallible;
    type Future = ResponseFuture;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let record = AccessRecord::begin(&req);
        let fut = self.inner.call(req);
        Box::pin(async move {
            let resp = fut.await?;
            record.finish(&resp).emit();
            Ok(resp)
        })
    }
}

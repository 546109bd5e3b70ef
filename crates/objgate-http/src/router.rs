//! Path-prefix routing to format handlers.

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Method, StatusCode};
use hyper::service::Service;
use objgate_core::EncoderOptions;
use objgate_storage::Fetcher;
use tracing::debug;

use crate::body::GatewayBody;
use crate::context::RemoteAddr;
use crate::encoder::Encoder;
use crate::handler::FormatHandler;
use crate::response;
use crate::service::ResponseFuture;
use crate::static_files::StaticFiles;

/// Path answered with the gateway's own status.
pub const HEALTH_PATH: &str = "/health";

/// A URL prefix bound to a handler.
#[derive(Debug, Clone)]
pub struct Route {
    prefix: String,
    handler: Arc<FormatHandler>,
}

impl Route {
    /// The prefix this route claims, e.g. `/csv/`.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The handler serving this route.
    #[must_use]
    pub fn handler(&self) -> &FormatHandler {
        &self.handler
    }
}

/// Maps path prefixes to handlers, falling back to static files.
///
/// The route table is fixed once the router is built. When several prefixes
/// match, the longest wins.
#[derive(Debug, Clone)]
pub struct Router {
    routes: Arc<Vec<Route>>,
    fallback: Option<Arc<StaticFiles>>,
    health: Bytes,
}

impl Router {
    /// An empty router reporting `environment` on the health endpoint.
    #[must_use]
    pub fn new(environment: &str) -> Self {
        let health = serde_json::json!({ "status": "running", "environment": environment });
        Self {
            routes: Arc::new(Vec::new()),
            fallback: None,
            health: Bytes::from(health.to_string()),
        }
    }

    /// Register `handler` under `prefix`.
    #[must_use]
    pub fn route(mut self, prefix: impl Into<String>, handler: FormatHandler) -> Self {
        Arc::make_mut(&mut self.routes).push(Route {
            prefix: prefix.into(),
            handler: Arc::new(handler),
        });
        self
    }

    /// Register every standard format route against `fetcher`.
    #[must_use]
    pub fn with_formats(
        mut self,
        options: &EncoderOptions,
        file_content_type: &str,
        fetcher: &Arc<Fetcher>,
    ) -> Self {
        for (prefix, encoder) in Encoder::standard_set(options, file_content_type) {
            self = self.route(prefix, FormatHandler::new(encoder, Arc::clone(fetcher)));
        }
        self
    }

    /// Serve unmatched paths from `files` instead of answering `404`.
    #[must_use]
    pub fn with_fallback(mut self, files: StaticFiles) -> Self {
        self.fallback = Some(Arc::new(files));
        self
    }

    /// Registered routes, in registration order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// The route claiming `path`, if any.
    #[must_use]
    pub fn match_route(&self, path: &str) -> Option<&Route> {
        self.routes
            .iter()
            .filter(|r| path.starts_with(r.prefix.as_str()))
            .max_by_key(|r| r.prefix.len())
    }

    /// Produce the response for a request already admitted by CORS, attributed
    /// to `client`.
    pub async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        query: Option<&str>,
        client: Option<&RemoteAddr>,
    ) -> http::Response<GatewayBody> {
        if path == HEALTH_PATH && (*method == Method::GET || *method == Method::HEAD) {
            return self.health();
        }

        if let Some(route) = self.match_route(path) {
            debug!(prefix = %route.prefix, path, "routing to format handler");
            return route.handler.serve(path, query, client).await;
        }

        match &self.fallback {
            Some(files) => files.serve(path).await,
            None => response::not_found(),
        }
    }

    fn health(&self) -> http::Response<GatewayBody> {
        let mut resp = http::Response::new(GatewayBody::from_bytes(self.health.clone()));
        *resp.status_mut() = StatusCode::OK;
        resp.headers_mut().insert(
            CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        resp
    }
}

impl<B> Service<http::Request<B>> for Router {
    type Response = http::Response<GatewayBody>;
    type Error = Infallible;
    type Future = ResponseFuture;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let router = self.clone();
        let (parts, _) = req.into_parts();
        let client = parts.extensions.get::<RemoteAddr>().cloned();
        Box::pin(async move {
            let uri = parts.uri;
            Ok(router
                .dispatch(&parts.method, uri.path(), uri.query(), client.as_ref())
                .await)
        })
    }
}

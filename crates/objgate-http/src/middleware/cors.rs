//! CORS enforcement, the innermost layer.

use std::convert::Infallible;
use std::sync::Arc;

use http::header::{ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW, HeaderValue};
use http::{Method, StatusCode};
use hyper::service::Service;
use objgate_core::ConfigResult;
use objgate_core::config::parse_method;

use crate::body::GatewayBody;
use crate::response;
use crate::service::ResponseFuture;

/// What the CORS layer does with a request, decided by its method alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorsDecision {
    /// `OPTIONS`: answered here with `200` and an empty body.
    Preflight,
    /// Method outside the allow-list: answered here with `405`.
    Rejected,
    /// Allowed method: passed to the inner service.
    Dispatch,
}

/// The method allow-list and the header values derived from it.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed: Vec<Method>,
    methods: HeaderValue,
}

impl CorsPolicy {
    /// Build a policy allowing `allowed` plus `OPTIONS`.
    #[must_use]
    pub fn new(allowed: impl IntoIterator<Item = Method>) -> Self {
        let mut methods: Vec<Method> = Vec::new();
        for method in allowed.into_iter().chain([Method::OPTIONS]) {
            if !methods.contains(&method) {
                methods.push(method);
            }
        }
        let listed = methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let methods_value =
            HeaderValue::from_str(&listed).unwrap_or_else(|_| HeaderValue::from_static("OPTIONS"));
        methods.retain(|m| *m != Method::OPTIONS);
        Self {
            allowed: methods,
            methods: methods_value,
        }
    }

    /// Build a policy from configured method names.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> ConfigResult<Self> {
        let methods = names
            .iter()
            .map(|name| parse_method(name.as_ref()))
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(Self::new(methods))
    }

    /// Methods that reach the router.
    #[must_use]
    pub fn allowed(&self) -> &[Method] {
        &self.allowed
    }

    /// Classify a request method.
    #[must_use]
    pub fn decide(&self, method: &Method) -> CorsDecision {
        if *method == Method::OPTIONS {
            CorsDecision::Preflight
        } else if self.allowed.contains(method) {
            CorsDecision::Dispatch
        } else {
            CorsDecision::Rejected
        }
    }

    /// Add the CORS headers every response carries.
    pub fn apply(&self, response: &mut http::Response<GatewayBody>) {
        let headers = response.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.methods.clone());
    }

    fn preflight(&self) -> http::Response<GatewayBody> {
        let mut resp = http::Response::new(GatewayBody::empty());
        self.apply(&mut resp);
        resp
    }

    fn rejected(&self) -> http::Response<GatewayBody> {
        let mut resp = response::plain_text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
        resp.headers_mut().insert(ALLOW, self.methods.clone());
        self.apply(&mut resp);
        resp
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::new([Method::GET, Method::HEAD])
    }
}

/// Applies a [`CorsPolicy`] in front of `S`.
#[derive(Debug, Clone)]
pub struct Cors<S> {
    inner: S,
    policy: Arc<CorsPolicy>,
}

impl<S> Cors<S> {
    /// Wrap `inner` with `policy`.
    pub fn new(inner: S, policy: CorsPolicy) -> Self {
        Self {
            inner,
            policy: Arc::new(policy),
        }
    }
}

impl<S, B> Service<http::Request<B>> for Cors<S>
where
    S: Service<http::Request<B>, Response = http::Response<GatewayBody>, Error = Infallible>,
    S::Future: Send + 'static,
{
    type Response = http::Response<GatewayBody>;
    type Error = Infallible;
    type Future = ResponseFuture;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        match self.policy.decide(req.method()) {
            CorsDecision::Preflight => {
                let resp = self.policy.preflight();
                Box::pin(async move { Ok(resp) })
            }
            CorsDecision::Rejected => {
                tracing::debug!(method = %req.method(), "method not allowed");
                let resp = self.policy.rejected();
                Box::pin(async move { Ok(resp) })
            }
            CorsDecision::Dispatch => {
                let policy = Arc::clone(&self.policy);
                let fut = self.inner.call(req);
                Box::pin(async move {
                    let mut resp = fut.await?;
                    policy.apply(&mut resp);
                    Ok(resp)
                })
            }
        }
    }
}

//! Request decorators composed around the router.
//!
//! From the outside in: [`AccessLog`] wraps [`ProxyIp`], which wraps
//! [`Cors`], which wraps the router. Each layer is a hyper
//! [`Service`](hyper::service::Service) over `http::Request<B>` producing
//! [`ResponseFuture`](crate::service::ResponseFuture).

mod access_log;
mod cors;
mod proxy;

pub use access_log::{AccessEntry, AccessLog, AccessRecord};
pub use cors::{Cors, CorsDecision, CorsPolicy};
pub use proxy::{ProxyIp, X_FORWARDED_FOR, forwarded_client};

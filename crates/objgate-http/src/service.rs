//! Pipeline assembly and the hyper-facing service.
//!
//! [`GatewayService`] is built once from the [`GatewayConfig`] and shared by
//! every connection; [`PeerService`] binds it to one connection's transport
//! address.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use hyper::body::Incoming;
use hyper::service::Service;
use objgate_core::{ConfigResult, GatewayConfig};
use objgate_storage::{Fetcher, ObjectStore};
use tracing::info;

use crate::body::GatewayBody;
use crate::context::RemoteAddr;
use crate::middleware::{AccessLog, Cors, CorsPolicy, ProxyIp};
use crate::router::Router;
use crate::static_files::StaticFiles;

/// Future returned by every layer of the pipeline.
pub type ResponseFuture =
    Pin<Box<dyn Future<Output = Result<http::Response<GatewayBody>, Infallible>> + Send>>;

type SharedService<B> = Arc<
    dyn Service<
            http::Request<B>,
            Response = http::Response<GatewayBody>,
            Error = Infallible,
            Future = ResponseFuture,
        > + Send
        + Sync,
>;

/// The assembled middleware chain around the router.
pub struct GatewayService<B = Incoming> {
    inner: SharedService<B>,
    layers: &'static str,
}

impl<B> fmt::Debug for GatewayService<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayService")
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}

impl<B> Clone for GatewayService<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            layers: self.layers,
        }
    }
}

impl<B: 'static> GatewayService<B> {
    /// Compose the chain: access log (unless `silent`), then proxy IP
    /// normalization (when `use_x_forwarded_for`), then CORS, then `router`.
    #[must_use]
    pub fn new(
        router: Router,
        policy: CorsPolicy,
        use_x_forwarded_for: bool,
        silent: bool,
    ) -> Self {
        let cors = Cors::new(router, policy);
        let (inner, layers): (SharedService<B>, _) = match (use_x_forwarded_for, silent) {
            (true, false) => (
                Arc::new(AccessLog::new(ProxyIp::new(cors))),
                "access-log > proxy-ip > cors",
            ),
            (true, true) => (Arc::new(ProxyIp::new(cors)), "proxy-ip > cors"),
            (false, false) => (Arc::new(AccessLog::new(cors)), "access-log > cors"),
            (false, true) => (Arc::new(cors), "cors"),
        };
        Self { inner, layers }
    }

    /// Build the full pipeline from configuration over `store`.
    pub fn from_config(config: &GatewayConfig, store: Arc<dyn ObjectStore>) -> ConfigResult<Self> {
        config.validate()?;

        let fetcher = Arc::new(Fetcher::from_config(store, &config.storage)?);
        let mut router = Router::new(&config.environment).with_formats(
            &config.encoders,
            &config.storage.file_content_type,
            &fetcher,
        );
        if let Some(dir) = &config.public_dir {
            router = router.with_fallback(StaticFiles::new(dir));
        }
        let policy = CorsPolicy::from_names(&config.allowed_methods)?;

        let service = Self::new(router, policy, config.use_x_forwarded_for, config.silent);
        info!(
            bucket = fetcher.bucket(),
            layers = service.layers,
            public_dir = ?config.public_dir,
            "gateway pipeline ready"
        );
        Ok(service)
    }

    /// Bind the service to a connection from `addr`.
    #[must_use]
    pub fn with_peer(&self, addr: SocketAddr) -> PeerService<B> {
        PeerService {
            inner: Arc::clone(&self.inner),
            remote: RemoteAddr::from(addr),
        }
    }
}

impl<B> Service<http::Request<B>> for GatewayService<B> {
    type Response = http::Response<GatewayBody>;
    type Error = Infallible;
    type Future = ResponseFuture;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        self.inner.call(req)
    }
}

/// [`GatewayService`] for one connection: tags every request with the
/// connection's transport address.
pub struct PeerService<B = Incoming> {
    inner: SharedService<B>,
    remote: RemoteAddr,
}

impl<B> fmt::Debug for PeerService<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerService")
            .field("remote", &self.remote)
            .finish_non_exhaustive()
    }
}

impl<B> Clone for PeerService<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            remote: self.remote.clone(),
        }
    }
}

impl<B> Service<http::Request<B>> for PeerService<B> {
    type Response = http::Response<GatewayBody>;
    type Error = Infallible;
    type Future = ResponseFuture;

    fn call(&self, mut req: http::Request<B>) -> Self::Future {
        req.extensions_mut().insert(self.remote.clone());
        self.inner.call(req)
    }
}

#[cfg(test)]
mod tests {
    use http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW, CONTENT_TYPE};
    use http::{Method, StatusCode};
    use objgate_core::StorageConfig;
    use objgate_storage::MemoryObjectStore;

    use super::*;
    use crate::body::collect;
    use crate::context::{ForwardedClient, ServedClient};
    use crate::middleware::{AccessRecord, X_FORWARDED_FOR};

    fn config() -> GatewayConfig {
        GatewayConfig::builder()
            .use_x_forwarded_for(true)
            .storage(
                StorageConfig::builder()
                    .bucket_name("moon-bi")
                    .bucket_path("exports/")
                    .build(),
            )
            .build()
    }

    fn store() -> Arc<MemoryObjectStore> {
        Arc::new(
            MemoryObjectStore::new()
                .with_object("moon-bi", "exports/foo", "hello")
                .with_object("moon-bi", "exports/report.csv", "a,b\n1,2\n"),
        )
    }

    fn gateway(store: &Arc<MemoryObjectStore>) -> PeerService<()> {
        let store: Arc<dyn ObjectStore> = store.clone();
        GatewayService::from_config(&config(), store)
            .unwrap()
            .with_peer("10.0.0.9:5000".parse().unwrap())
    }

    fn request(method: Method, uri: &str) -> http::Request<()> {
        http::Request::builder().method(method).uri(uri).body(()).unwrap()
    }

    #[tokio::test]
    async fn test_should_serve_preflight_without_fetching() {
        let store = store();
        let resp = gateway(&store)
            .call(request(Method::OPTIONS, "/csv/report.csv"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).and_then(|v| v.to_str().ok()),
            Some("*")
        );
        assert!(collect(resp.into_body()).await.is_empty());
        assert_eq!(store.request_count(), 0);
    }

    #[tokio::test]
    async fn test_should_reject_delete() {
        let store = store();
        let resp = gateway(&store)
            .call(request(Method::DELETE, "/json/foo"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            resp.headers().get(ALLOW).and_then(|v| v.to_str().ok()),
            Some("GET, HEAD, OPTIONS")
        );
        assert_eq!(store.request_count(), 0);
    }

    #[tokio::test]
    async fn test_should_serve_identical_json_twice() {
        let store = store();
        let gateway = gateway(&store);
        let first = gateway.call(request(Method::GET, "/json/foo")).await.unwrap();
        let second = gateway.call(request(Method::GET, "/json/foo")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(collect(first.into_body()).await, collect(second.into_body()).await);
    }

    #[tokio::test]
    async fn test_should_serve_csv_with_cors_headers() {
        let store = store();
        let resp = gateway(&store)
            .call(request(Method::GET, "/csv/report.csv"))
            .await
            .unwrap();
        assert_eq!(
            resp.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("text/csv")
        );
        assert_eq!(resp.headers().get_all(CONTENT_TYPE).iter().count(), 1);
        assert_eq!(
            resp.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).and_then(|v| v.to_str().ok()),
            Some("*")
        );
        assert_eq!(&collect(resp.into_body()).await[..], b"a,b\r\n1,2\r\n");
    }

    #[tokio::test]
    async fn test_should_answer_503_on_missing_object() {
        let store = store();
        let resp = gateway(&store)
            .call(request(Method::GET, "/xml/missing.xml"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(&collect(resp.into_body()).await[..], b"Try again later.");
    }

    #[tokio::test]
    async fn test_should_serve_forwarded_client_and_log_transport_address() {
        let store: Arc<dyn ObjectStore> = store();
        let gateway = GatewayService::<()>::from_config(&config(), store).unwrap();
        let mut req = http::Request::builder()
            .uri("/json/foo")
            .header(X_FORWARDED_FOR, "1.2.3.4, 5.6.7.8")
            .body(())
            .unwrap();
        req.extensions_mut().insert(RemoteAddr::new("10.0.0.9:5000"));

        let record = AccessRecord::begin(&req);
        let resp = gateway.call(req).await.unwrap();
        let client = RemoteAddr::new("1.2.3.4");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.extensions().get::<ServedClient>(),
            Some(&ServedClient(client.clone()))
        );
        assert_eq!(
            resp.extensions().get::<ForwardedClient>(),
            Some(&ForwardedClient(client.clone()))
        );

        let entry = record.finish(&resp);
        assert_eq!(entry.remote_addr(), Some(&RemoteAddr::new("10.0.0.9:5000")));
        assert_eq!(entry.served_for, Some(client));
    }

    #[tokio::test]
    async fn test_should_serve_transport_address_without_forwarding_header() {
        let store = store();
        let resp = gateway(&store)
            .call(request(Method::GET, "/raw/foo"))
            .await
            .unwrap();
        assert_eq!(
            resp.extensions().get::<ServedClient>(),
            Some(&ServedClient(RemoteAddr::new("10.0.0.9:5000")))
        );
    }

    #[test]
    fn test_should_refuse_invalid_config() {
        let config = GatewayConfig::default();
        let store: Arc<dyn ObjectStore> = Arc::new(MemoryObjectStore::new());
        assert!(GatewayService::<()>::from_config(&config, store).is_err());
    }

    #[test]
    fn test_should_compose_layers_from_flags() {
        let router = Router::new("dev");
        let quiet = GatewayService::<()>::new(router.clone(), CorsPolicy::default(), false, true);
        assert_eq!(quiet.layers, "cors");
        let full = GatewayService::<()>::new(router, CorsPolicy::default(), true, false);
        assert_eq!(full.layers, "access-log > proxy-ip > cors");
    }
}

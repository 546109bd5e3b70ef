//! objgate server: an HTTP gateway in front of an object store.
//!
//! Objects are addressed by file name under a route prefix that selects the
//! wire format:
//!
//! ```text
//! GET /csv/report.csv          -> text/csv attachment
//! GET /xml/report.csv          -> application/xml
//! GET /json/report.csv         -> application/json
//! GET /json/report.csv?callback=cb -> application/javascript (JSONP)
//! GET /raw/report.csv          -> bytes as stored
//! ```
//!
//! # Usage
//!
//! ```text
//! objgate-server --env prod --bucket-name reports --bucket-path exports/
//! ```
//!
//! Configuration is layered: built-in defaults, then `config/<env>.toml` (or
//! `--config PATH`), then flags and their environment variables. Run with
//! `--help` for the full list.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OBJGATE_ENV` | `dev` | Environment tag and config file selector |
//! | `OBJGATE_ADDR` | `0.0.0.0:8080` | Bind address |
//! | `OBJGATE_BUCKET_NAME` | *(required)* | Bucket holding the served objects |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod cli;
mod tls;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use objgate_core::GatewayConfig;
use objgate_http::GatewayService;
use objgate_storage::S3ObjectStore;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, LogFormat};

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to `log_level`.
fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(
    listener: TcpListener,
    service: GatewayService,
    tls: Option<TlsAcceptor>,
) -> Result<()> {
    let graceful = GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.with_peer(peer_addr);
                let http = http.clone();
                let watcher = graceful.watcher();

                match tls.clone() {
                    Some(acceptor) => {
                        tokio::spawn(async move {
                            let stream = match acceptor.accept(stream).await {
                                Ok(stream) => stream,
                                Err(e) => {
                                    debug!(
                                        peer_addr = %peer_addr,
                                        error = %e,
                                        "TLS handshake failed"
                                    );
                                    return;
                                }
                            };
                            let conn = http.serve_connection(TokioIo::new(stream), svc);
                            if let Err(e) = watcher.watch(conn.into_owned()).await {
                                error!(peer_addr = %peer_addr, error = %e, "connection error");
                            }
                        });
                    }
                    None => {
                        tokio::spawn(async move {
                            let conn = http.serve_connection(TokioIo::new(stream), svc);
                            if let Err(e) = watcher.watch(conn.into_owned()).await {
                                error!(peer_addr = %peer_addr, error = %e, "connection error");
                            }
                        });
                    }
                }
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Address to probe for a server bound to `listen`.
///
/// A wildcard bind is reached through loopback.
fn probe_addr(listen: SocketAddr) -> SocketAddr {
    let mut addr = listen;
    if addr.ip().is_unspecified() {
        let loopback = if addr.is_ipv4() {
            std::net::Ipv4Addr::LOCALHOST.into()
        } else {
            std::net::Ipv6Addr::LOCALHOST.into()
        };
        addr.set_ip(loopback);
    }
    addr
}

/// Perform a health check by connecting to the gateway and requesting the health endpoint.
///
/// Succeeds if the response is 200 OK and reports the gateway as running.
/// The probe speaks plain HTTP.
async fn run_health_check(addr: SocketAddr) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let base_dir = std::env::current_dir().context("cannot determine working directory")?;
    let config: GatewayConfig = cli.load_config(&base_dir)?;

    // Handle --health-check flag for container health checks.
    if cli.health_check {
        let addr = probe_addr(config.listen_addr().context("invalid listen address")?);
        let healthy = run_health_check(addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&cli.log_level, cli.log_format)?;

    config.validate().context("invalid configuration")?;
    debug!(?config, "configuration loaded");

    let store = S3ObjectStore::from_config(&config.storage).await;
    let service = GatewayService::from_config(&config, Arc::new(store))
        .context("failed to build request pipeline")?;

    let tls = match config.tls_files() {
        Some((cert, key)) => Some(tls::acceptor(cert, key).context("failed to set up TLS")?),
        None => None,
    };

    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        %addr,
        environment = %config.environment,
        tls = tls.is_some(),
        version = VERSION,
        "starting objgate server",
    );

    serve(listener, service, tls).await
}

//! HTTP request pipeline for objgate.
//!
//! A request travels through the layers in [`middleware`] (access log, proxy
//! IP normalization, CORS) to the [`Router`], which hands it to the
//! [`FormatHandler`] registered for its path prefix. The handler fetches the
//! object through the storage [`Fetcher`](objgate_storage::Fetcher) and lets
//! its [`Encoder`] build the response.
//!
//! | Prefix   | Encoder | Content type                                 |
//! |----------|---------|----------------------------------------------|
//! | `/csv/`  | CSV     | `text/csv`, sent as an attachment            |
//! | `/xml/`  | XML     | `application/xml`                            |
//! | `/json/` | JSON    | `application/json` (`application/javascript` with `?callback=`) |
//! | `/raw/`  | Raw     | configured `file_content_type`               |

pub mod body;
pub mod context;
pub mod encoder;
pub mod handler;
pub mod middleware;
pub mod params;
pub mod response;
pub mod router;
pub mod service;
pub mod static_files;

pub use body::GatewayBody;
pub use context::{ForwardedClient, LogAnnotation, RemoteAddr, ServedClient};
pub use encoder::{Encode, EncodeError, Encoder};
pub use handler::FormatHandler;
pub use params::QueryParams;
pub use router::Router;
pub use service::{GatewayService, PeerService, ResponseFuture};
pub use static_files::StaticFiles;

//! Per-prefix request handling: fetch, then encode.

use std::borrow::Cow;
use std::sync::Arc;

use objgate_storage::Fetcher;
use percent_encoding::percent_decode_str;
use tracing::{debug, error, warn};

use crate::body::GatewayBody;
use crate::context::{LogAnnotation, RemoteAddr, ServedClient};
use crate::encoder::{Encode, Encoder};
use crate::params::QueryParams;
use crate::response;

/// Binds one [`Encoder`] to the shared [`Fetcher`].
///
/// Created once per route prefix at startup. Holds no per-request state, so a
/// single instance serves all requests concurrently.
#[derive(Debug)]
pub struct FormatHandler {
    encoder: Encoder,
    fetcher: Arc<Fetcher>,
}

impl FormatHandler {
    /// Create a handler encoding fetched objects with `encoder`.
    #[must_use]
    pub fn new(encoder: Encoder, fetcher: Arc<Fetcher>) -> Self {
        Self { encoder, fetcher }
    }

    /// The bound encoder.
    #[must_use]
    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    /// Serve the object named by the last segment of `path` for `client`.
    ///
    /// Produces exactly one of: the encoder's response, `503` when the fetch
    /// fails, `500` when encoding fails. Failure details go to the log and
    /// into a [`LogAnnotation`], never to the client. The response carries
    /// `client` as a [`ServedClient`].
    pub async fn serve(
        &self,
        path: &str,
        query: Option<&str>,
        client: Option<&RemoteAddr>,
    ) -> http::Response<GatewayBody> {
        let mut resp = self.respond(path, query, client).await;
        if let Some(client) = client {
            resp.extensions_mut().insert(ServedClient(client.clone()));
        }
        resp
    }

    async fn respond(
        &self,
        path: &str,
        query: Option<&str>,
        client: Option<&RemoteAddr>,
    ) -> http::Response<GatewayBody> {
        let name = file_name(path);
        let format = self.encoder.name();
        let client = client.map_or("-", RemoteAddr::as_str);

        let payload = match self.fetcher.fetch(&name).await {
            Ok(payload) => payload,
            Err(err) => {
                warn!(format, file = %name, client, error = %err, "object fetch failed");
                let mut resp = response::service_unavailable();
                LogAnnotation::attach(&mut resp, err.to_string());
                return resp;
            }
        };

        debug!(format, file = %name, client, size = payload.len(), "encoding object");
        let params = QueryParams::parse(query);
        match self.encoder.encode(payload, &params, &name) {
            Ok(resp) => resp,
            Err(err) => {
                error!(format, file = %name, client, error = %err, "encoding failed");
                let mut resp = response::internal_error();
                LogAnnotation::attach(&mut resp, format!("{format} encoder: {err}"));
                resp
            }
        }
    }
}

/// The requested file name: the final `/`-delimited segment of the decoded
/// path.
///
/// Decoding happens first, so an escaped `%2F` splits segments like a literal
/// `/` and never ends up inside the name.
#[must_use]
pub fn file_name(path: &str) -> Cow<'_, str> {
    match percent_decode_str(path).decode_utf8_lossy() {
        Cow::Borrowed(decoded) => Cow::Borrowed(last_segment(decoded)),
        Cow::Owned(decoded) => Cow::Owned(last_segment(&decoded).to_owned()),
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

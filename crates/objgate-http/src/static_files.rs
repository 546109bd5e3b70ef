//! Static file fallback for paths no format route claims.

use std::io;
use std::path::{Path, PathBuf};

use http::StatusCode;
use http::header::{CONTENT_TYPE, HeaderValue};
use mime::Mime;
use percent_encoding::percent_decode_str;
use tracing::{debug, warn};

use crate::body::GatewayBody;
use crate::response;

/// Serves files from a directory on disk.
///
/// Only paths that stay inside the root are served; anything that tries to
/// climb out with `..` is answered with `404`. Directory paths map to their
/// `index.html`.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    /// Default document for directory paths.
    pub const INDEX: &'static str = "index.html";

    /// Serve files under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory being served.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a request path to a file under the root.
    ///
    /// Returns `None` for paths that are not valid UTF-8 after decoding or
    /// that contain `..`, backslashes or NUL bytes.
    #[must_use]
    pub fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let decoded = percent_decode_str(request_path).decode_utf8().ok()?;
        let mut path = self.root.clone();
        for segment in decoded.split('/') {
            match segment {
                "" | "." => {}
                ".." => return None,
                s if s.contains('\\') || s.contains('\0') => return None,
                s => path.push(s),
            }
        }
        if decoded.ends_with('/') || decoded.is_empty() {
            path.push(Self::INDEX);
        }
        Some(path)
    }

    /// Serve `request_path`, answering `404` for anything not found.
    pub async fn serve(&self, request_path: &str) -> http::Response<GatewayBody> {
        let Some(mut path) = self.resolve(request_path) else {
            debug!(path = request_path, "rejected static path");
            return response::not_found();
        };

        if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
            path.push(Self::INDEX);
        }

        match tokio::fs::read(&path).await {
            Ok(contents) => {
                let mut resp = http::Response::new(GatewayBody::from_bytes(contents));
                *resp.status_mut() = StatusCode::OK;
                if let Ok(value) = HeaderValue::from_str(content_type(&path).as_ref()) {
                    resp.headers_mut().insert(CONTENT_TYPE, value);
                }
                resp
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => response::not_found(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read static file");
                response::not_found()
            }
        }
    }
}

/// Guess a content type from the file extension.
fn content_type(path: &Path) -> Mime {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html" | "htm") => mime::TEXT_HTML_UTF_8,
        Some("css") => mime::TEXT_CSS_UTF_8,
        Some("js" | "mjs") => mime::APPLICATION_JAVASCRIPT_UTF_8,
        Some("json") => mime::APPLICATION_JSON,
        Some("txt") => mime::TEXT_PLAIN_UTF_8,
        Some("csv") => mime::TEXT_CSV_UTF_8,
        Some("xml") => mime::TEXT_XML,
        Some("svg") => mime::IMAGE_SVG,
        Some("png") => mime::IMAGE_PNG,
        Some("jpg" | "jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("woff") => mime::FONT_WOFF,
        Some("woff2") => mime::FONT_WOFF2,
        Some("pdf") => mime::APPLICATION_PDF,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

//! Plain-text responses for the terminal error outcomes.

use http::StatusCode;
use http::header::{CONTENT_TYPE, HeaderValue};

use crate::body::GatewayBody;

/// Client-facing message for storage failures.
pub const TRY_AGAIN_LATER: &str = "Try again later.";

/// Client-facing message for encoder failures.
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred.";

/// Build a `text/plain` response with the given status and message.
///
/// Carries `X-Content-Type-Options: nosniff` so browsers never reinterpret
/// the message as markup.
#[must_use]
pub fn plain_text(status: StatusCode, message: &str) -> http::Response<GatewayBody> {
    let mut response = http::Response::new(GatewayBody::from_string(message));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    response
}

/// `503 Service Unavailable` for any storage failure.
#[must_use]
pub fn service_unavailable() -> http::Response<GatewayBody> {
    plain_text(StatusCode::SERVICE_UNAVAILABLE, TRY_AGAIN_LATER)
}

/// `500 Internal Server Error` for any encoder failure.
#[must_use]
pub fn internal_error() -> http::Response<GatewayBody> {
    plain_text(StatusCode::INTERNAL_SERVER_ERROR, UNEXPECTED_ERROR)
}

/// `404 Not Found` for unrouted paths.
#[must_use]
pub fn not_found() -> http::Response<GatewayBody> {
    plain_text(StatusCode::NOT_FOUND, "404 page not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_build_plain_text_response() {
        let resp = plain_text(StatusCode::IM_A_TEAPOT, "short and stout");
        assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(
            resp.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
            Some("text/plain; charset=utf-8"),
        );
        assert_eq!(resp.body().len(), 15);
    }

    #[test]
    fn test_should_map_terminal_errors_to_statuses() {
        assert_eq!(service_unavailable().status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(internal_error().status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(not_found().status(), StatusCode::NOT_FOUND);
    }
}

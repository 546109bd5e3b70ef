//! CORS and method policy integration tests.

#[cfg(test)]
mod tests {
    use reqwest::Method;

    use crate::{gateway_url, http_client};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_preflight_with_empty_body() {
        let resp = http_client()
            .request(Method::OPTIONS, format!("{}/csv/anything.csv", gateway_url()))
            .header("Origin", "https://example.com")
            .send()
            .await
            .expect("OPTIONS");

        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        assert_eq!(
            resp.headers()["access-control-allow-methods"],
            "GET, HEAD, OPTIONS"
        );
        assert!(resp.bytes().await.expect("body").is_empty());
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_delete_with_allow_header() {
        let resp = http_client()
            .delete(format!("{}/json/foo", gateway_url()))
            .send()
            .await
            .expect("DELETE");

        assert_eq!(resp.status(), 405);
        assert_eq!(resp.headers()["allow"], "GET, HEAD, OPTIONS");
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_add_cors_headers_to_errors() {
        let resp = http_client()
            .get(format!("{}/json/does-not-exist", gateway_url()))
            .header("X-Forwarded-For", "1.2.3.4, 5.6.7.8")
            .send()
            .await
            .expect("GET");

        assert_eq!(resp.status(), 503);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    }
}

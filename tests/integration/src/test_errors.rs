//! Error response integration tests.

#[cfg(test)]
mod tests {
    use crate::{gateway_url, http_client};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_503_for_missing_object() {
        for prefix in ["csv", "xml", "json", "raw"] {
            let resp = http_client()
                .get(format!("{}/{prefix}/missing-object.csv", gateway_url()))
                .send()
                .await
                .expect("GET");
            assert_eq!(resp.status(), 503, "{prefix}");
            assert_eq!(resp.text().await.expect("body"), "Try again later.");
        }
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_answer_404_for_unrouted_path() {
        let resp = http_client()
            .get(format!("{}/unknown/foo", gateway_url()))
            .send()
            .await
            .expect("GET");
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_health() {
        let resp = http_client()
            .get(format!("{}/health", gateway_url()))
            .send()
            .await
            .expect("GET /health");
        assert_eq!(resp.status(), 200);
        let value: serde_json::Value = resp.json().await.expect("json");
        assert_eq!(value["status"], "running");
    }
}

//! Format route integration tests.

#[cfg(test)]
mod tests {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;

    use crate::{gateway_url, http_client, remove_object, s3_client, seed_object, test_file_name};

    const CSV: &[u8] = b"id,name\n1,moon\n2,\"multi\nline\"\n";

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_csv_attachment_with_crlf() {
        let s3 = s3_client();
        let name = test_file_name("report", "csv");
        seed_object(&s3, &name, CSV).await;

        let resp = http_client()
            .get(format!("{}/csv/{name}", gateway_url()))
            .send()
            .await
            .expect("GET /csv");

        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "text/csv");
        assert_eq!(
            resp.headers()["content-disposition"],
            format!("attachment;filename={name}").as_str()
        );
        let body = resp.bytes().await.expect("body");
        assert_eq!(&body[..], b"id,name\r\n1,moon\r\n2,\"multi\nline\"\r\n");

        remove_object(&s3, &name).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_xml_document() {
        let s3 = s3_client();
        let name = test_file_name("doc", "txt");
        seed_object(&s3, &name, b"hello").await;

        let resp = http_client()
            .get(format!("{}/xml/{name}", gateway_url()))
            .send()
            .await
            .expect("GET /xml");

        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "application/xml");
        let text = resp.text().await.expect("body");
        assert!(text.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(text.contains(&format!("<Key>{name}</Key>")));
        assert!(text.contains(&STANDARD.encode(b"hello")));

        remove_object(&s3, &name).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_json_and_jsonp() {
        let s3 = s3_client();
        let name = test_file_name("blob", "bin");
        seed_object(&s3, &name, b"\x00\x01payload").await;
        let client = http_client();

        let json = client
            .get(format!("{}/json/{name}", gateway_url()))
            .send()
            .await
            .expect("GET /json");
        assert_eq!(json.headers()["content-type"], "application/json");
        let value: serde_json::Value = json.json().await.expect("json body");
        assert_eq!(value, serde_json::Value::String(STANDARD.encode(b"\x00\x01payload")));

        let jsonp = client
            .get(format!("{}/json/{name}?callback=render", gateway_url()))
            .send()
            .await
            .expect("GET /json?callback");
        assert_eq!(jsonp.headers()["content-type"], "application/javascript");
        let text = jsonp.text().await.expect("body");
        assert_eq!(text, format!("render(\"{}\");", STANDARD.encode(b"\x00\x01payload")));

        remove_object(&s3, &name).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_identical_json_for_repeated_requests() {
        let s3 = s3_client();
        let name = test_file_name("stable", "csv");
        seed_object(&s3, &name, CSV).await;
        let client = http_client();
        let url = format!("{}/json/{name}", gateway_url());

        let first = client.get(&url).send().await.expect("first").bytes().await.expect("body");
        let second = client.get(&url).send().await.expect("second").bytes().await.expect("body");
        assert_eq!(first, second);

        remove_object(&s3, &name).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_raw_bytes() {
        let s3 = s3_client();
        let name = test_file_name("raw", "bin");
        seed_object(&s3, &name, b"\xff\xfe raw").await;

        let resp = http_client()
            .get(format!("{}/raw/{name}", gateway_url()))
            .send()
            .await
            .expect("GET /raw");
        assert_eq!(resp.status(), 200);
        assert_eq!(&resp.bytes().await.expect("body")[..], b"\xff\xfe raw");

        remove_object(&s3, &name).await;
    }
}

//! Request signature enforcement over real HTTP.

#[cfg(test)]
mod tests {
    use acp_core::AcpConfig;
    use chrono::{TimeDelta, Utc};

    use crate::{TestServer, http_client, sign, status_and_json};

    const SECRET: &str = "secret";

    fn signed_config(require: bool) -> AcpConfig {
        AcpConfig {
            signing_secret: Some(SECRET.to_owned()),
            require_signed_requests: require,
            ..AcpConfig::default()
        }
    }

    #[tokio::test]
    async fn test_should_accept_signed_request() {
        let server = TestServer::start(signed_config(true)).await;
        let body = br#"{"items":[{"id":"latte","quantity":1}]}"#;
        let (signature, timestamp) = sign(SECRET.as_bytes(), body, Utc::now());

        let resp = http_client()
            .post(server.url("/checkout_sessions"))
            .header("Content-Type", "application/json")
            .header("Signature", signature)
            .header("Timestamp", timestamp)
            .body(body.to_vec())
            .send()
            .await
            .unwrap();
        let (status, json) = status_and_json(resp).await;
        assert_eq!(status, http::StatusCode::CREATED, "body: {json}");
    }

    #[tokio::test]
    async fn test_should_verify_over_canonical_body() {
        let server = TestServer::start(signed_config(true)).await;
        let canonical = br#"{"items":[{"id":"latte","quantity":1}]}"#;
        let (signature, timestamp) = sign(SECRET.as_bytes(), canonical, Utc::now());

        // Same document with different key order and whitespace.
        let sent = "{ \"items\": [ { \"quantity\": 1, \"id\": \"latte\" } ] }";
        let resp = http_client()
            .post(server.url("/checkout_sessions"))
            .header("Signature", signature)
            .header("Timestamp", timestamp)
            .body(sent)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), http::StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_should_reject_bogus_signature() {
        let server = TestServer::start(signed_config(true)).await;
        let (_, timestamp) = sign(SECRET.as_bytes(), b"{}", Utc::now());

        let resp = http_client()
            .post(server.url("/checkout_sessions"))
            .header("Signature", "bogus")
            .header("Timestamp", timestamp)
            .body(r#"{"items":[{"id":"latte","quantity":1}]}"#)
            .send()
            .await
            .unwrap();
        let (status, err) = status_and_json(resp).await;
        assert_eq!(status, http::StatusCode::UNAUTHORIZED);
        assert_eq!(err["type"], "invalid_request");
        assert_eq!(err["code"], "invalid_signature");
    }

    #[tokio::test]
    async fn test_should_require_signature_when_configured() {
        let server = TestServer::start(signed_config(true)).await;
        let resp = http_client()
            .post(server.url("/checkout_sessions"))
            .body(r#"{"items":[{"id":"latte","quantity":1}]}"#)
            .send()
            .await
            .unwrap();
        let (status, err) = status_and_json(resp).await;
        assert_eq!(status, http::StatusCode::UNAUTHORIZED);
        assert_eq!(err["code"], "signature_required");
    }

    #[tokio::test]
    async fn test_should_allow_unsigned_request_when_optional() {
        let server = TestServer::start(signed_config(false)).await;
        let resp = http_client()
            .post(server.url("/checkout_sessions"))
            .body(r#"{"items":[{"id":"latte","quantity":1}]}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), http::StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_should_reject_stale_timestamp() {
        let server = TestServer::start(signed_config(true)).await;
        let body = br#"{"items":[{"id":"latte","quantity":1}]}"#;
        let (signature, timestamp) =
            sign(SECRET.as_bytes(), body, Utc::now() - TimeDelta::minutes(10));

        let resp = http_client()
            .post(server.url("/checkout_sessions"))
            .header("Signature", signature)
            .header("Timestamp", timestamp)
            .body(body.to_vec())
            .send()
            .await
            .unwrap();
        let (status, err) = status_and_json(resp).await;
        assert_eq!(status, http::StatusCode::UNAUTHORIZED);
        assert_eq!(err["code"], "stale_timestamp");
    }
}

//! Bearer API key enforcement over real HTTP.

#[cfg(test)]
mod tests {
    use acp_core::AcpConfig;

    use crate::{TestServer, http_client, status_and_json};

    fn config() -> AcpConfig {
        AcpConfig {
            api_keys: vec!["key_live_1".to_owned(), "key_live_2".to_owned()],
            ..AcpConfig::default()
        }
    }

    #[tokio::test]
    async fn test_should_reject_missing_authorization() {
        let server = TestServer::start(config()).await;
        let resp = http_client()
            .get(server.url("/checkout_sessions/cs_000001"))
            .send()
            .await
            .unwrap();
        let (status, err) = status_and_json(resp).await;
        assert_eq!(status, http::StatusCode::UNAUTHORIZED);
        assert_eq!(err["code"], "missing_authorization");
    }

    #[tokio::test]
    async fn test_should_reject_unknown_key() {
        let server = TestServer::start(config()).await;
        let resp = http_client()
            .get(server.url("/checkout_sessions/cs_000001"))
            .bearer_auth("key_stolen")
            .send()
            .await
            .unwrap();
        let (status, err) = status_and_json(resp).await;
        assert_eq!(status, http::StatusCode::UNAUTHORIZED);
        assert_eq!(err["code"], "invalid_authorization");
    }

    #[tokio::test]
    async fn test_should_accept_any_configured_key() {
        let server = TestServer::start(config()).await;
        for key in ["key_live_1", "key_live_2"] {
            let resp = http_client()
                .post(server.url("/checkout_sessions"))
                .bearer_auth(key)
                .body(r#"{"items":[{"id":"mug","quantity":1}]}"#)
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), http::StatusCode::CREATED, "key: {key}");
        }
    }

    #[tokio::test]
    async fn test_should_guard_delegated_payment_too() {
        let server = TestServer::start(config()).await;
        let resp = http_client()
            .post(server.url("/agentic_commerce/delegate_payment"))
            .body("{}")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_should_leave_health_open() {
        let server = TestServer::start(config()).await;
        let resp = http_client().get(server.url("/health")).send().await.unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);
    }
}

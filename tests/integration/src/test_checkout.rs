//! Checkout session lifecycle tests.

#[cfg(test)]
mod tests {
    use acp_core::AcpConfig;
    use serde_json::json;

    use crate::{TestServer, http_client, status_and_json};

    #[tokio::test]
    async fn test_should_report_health() {
        let server = TestServer::start(AcpConfig::default()).await;
        let resp = http_client().get(server.url("/health")).send().await.unwrap();
        let (status, json) = status_and_json(resp).await;
        assert_eq!(status, http::StatusCode::OK);
        assert_eq!(json, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_should_run_full_checkout_lifecycle() {
        let server = TestServer::start(AcpConfig::default()).await;
        let client = http_client();

        // Create.
        let resp = client
            .post(server.url("/checkout_sessions"))
            .json(&json!({"items": [{"id": "latte", "quantity": 2}]}))
            .send()
            .await
            .unwrap();
        let (status, session) = status_and_json(resp).await;
        assert_eq!(status, http::StatusCode::CREATED, "body: {session}");
        let id = session["id"].as_str().unwrap().to_owned();
        assert_eq!(id, "cs_000001");
        assert_eq!(session["status"], "ready_for_payment");
        assert_eq!(session["currency"], "usd");
        let totals = session["totals"].as_array().unwrap();
        let amount = |kind: &str| {
            totals
                .iter()
                .find(|t| t["type"] == kind)
                .map(|t| t["amount"].as_i64().unwrap())
        };
        assert_eq!(amount("items_base_amount"), Some(1300));
        assert_eq!(amount("tax"), Some(91));
        assert_eq!(amount("total"), Some(1391));

        // Retrieve.
        let resp = client
            .get(server.url(&format!("/checkout_sessions/{id}")))
            .send()
            .await
            .unwrap();
        let (status, fetched) = status_and_json(resp).await;
        assert_eq!(status, http::StatusCode::OK);
        assert_eq!(fetched["id"], id.as_str());

        // Update.
        let resp = client
            .post(server.url(&format!("/checkout_sessions/{id}")))
            .json(&json!({"items": [{"id": "beans", "quantity": 1}]}))
            .send()
            .await
            .unwrap();
        let (status, updated) = status_and_json(resp).await;
        assert_eq!(status, http::StatusCode::OK, "body: {updated}");
        assert_eq!(updated["line_items"].as_array().unwrap().len(), 1);
        assert_eq!(updated["line_items"][0]["item"]["id"], "beans");

        // Complete.
        let resp = client
            .post(server.url(&format!("/checkout_sessions/{id}/complete")))
            .json(&json!({"payment_data": {"token": "vt_000001", "provider": "stripe"}}))
            .send()
            .await
            .unwrap();
        let (status, completed) = status_and_json(resp).await;
        assert_eq!(status, http::StatusCode::OK, "body: {completed}");
        assert_eq!(completed["status"], "completed");
        assert_eq!(completed["order"]["id"], "ord_000001");
        assert_eq!(completed["order"]["checkout_session_id"], id.as_str());

        // Cancel after completion conflicts.
        let resp = client
            .post(server.url(&format!("/checkout_sessions/{id}/cancel")))
            .send()
            .await
            .unwrap();
        let (status, err) = status_and_json(resp).await;
        assert_eq!(status, http::StatusCode::CONFLICT);
        assert_eq!(err["type"], "invalid_request");
    }

    #[tokio::test]
    async fn test_should_cancel_open_session() {
        let server = TestServer::start(AcpConfig::default()).await;
        let client = http_client();

        let resp = client
            .post(server.url("/checkout_sessions"))
            .json(&json!({"items": [{"id": "mug", "quantity": 1}]}))
            .send()
            .await
            .unwrap();
        let (_, session) = status_and_json(resp).await;
        let id = session["id"].as_str().unwrap();

        let resp = client
            .post(server.url(&format!("/checkout_sessions/{id}/cancel")))
            .send()
            .await
            .unwrap();
        let (status, canceled) = status_and_json(resp).await;
        assert_eq!(status, http::StatusCode::OK);
        assert_eq!(canceled["status"], "canceled");
    }

    #[tokio::test]
    async fn test_should_return_structured_validation_error() {
        let server = TestServer::start(AcpConfig::default()).await;
        let resp = http_client()
            .post(server.url("/checkout_sessions"))
            .json(&json!({"items": []}))
            .send()
            .await
            .unwrap();
        let (status, err) = status_and_json(resp).await;
        assert_eq!(status, http::StatusCode::BAD_REQUEST);
        assert_eq!(err["type"], "invalid_request");
        assert_eq!(err["param"], "$.items");
    }

    #[tokio::test]
    async fn test_should_return_not_found_for_unknown_session() {
        let server = TestServer::start(AcpConfig::default()).await;
        let resp = http_client()
            .get(server.url("/checkout_sessions/cs_missing"))
            .send()
            .await
            .unwrap();
        let (status, err) = status_and_json(resp).await;
        assert_eq!(status, http::StatusCode::NOT_FOUND);
        assert_eq!(err["code"], "not_found");
    }

    #[tokio::test]
    async fn test_should_echo_request_id() {
        let server = TestServer::start(AcpConfig::default()).await;
        let resp = http_client()
            .get(server.url("/checkout_sessions/cs_missing"))
            .header("Request-Id", "req_integration_1")
            .send()
            .await
            .unwrap();
        assert_eq!(
            resp.headers().get("request-id").unwrap(),
            "req_integration_1"
        );

        let resp = http_client()
            .get(server.url("/checkout_sessions/cs_missing"))
            .send()
            .await
            .unwrap();
        assert!(!resp.headers().get("request-id").unwrap().is_empty());
    }
}

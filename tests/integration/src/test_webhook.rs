//! Order webhook delivery tests.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use acp_core::{AcpConfig, WebhookSettings};
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;

    use crate::{TestServer, WebhookReceiver, http_client, status_and_json};

    const WEBHOOK_SECRET: &str = "whsec_integration";

    #[tokio::test]
    async fn test_should_deliver_signed_order_created_event() {
        let mut receiver = WebhookReceiver::start().await;
        let server = TestServer::start(AcpConfig {
            webhook: Some(WebhookSettings {
                endpoint: receiver.endpoint().to_owned(),
                header_name: "Merchant-Signature".to_owned(),
                secret: WEBHOOK_SECRET.to_owned(),
                timeout: Duration::from_secs(5),
            }),
            ..AcpConfig::default()
        })
        .await;
        let client = http_client();

        let resp = client
            .post(server.url("/checkout_sessions"))
            .json(&json!({"items": [{"id": "beans", "quantity": 1}]}))
            .send()
            .await
            .unwrap();
        let (_, session) = status_and_json(resp).await;
        let id = session["id"].as_str().unwrap().to_owned();

        let resp = client
            .post(server.url(&format!("/checkout_sessions/{id}/complete")))
            .json(&json!({"payment_data": {"token": "vt_000001", "provider": "stripe"}}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);

        let delivery = receiver.next().await;
        let event: serde_json::Value = serde_json::from_slice(&delivery.body).unwrap();
        assert_eq!(event["type"], "order_created");
        assert_eq!(event["data"]["type"], "order");
        assert_eq!(event["data"]["checkout_session_id"], id.as_str());
        assert_eq!(event["data"]["status"], "created");

        let expected = URL_SAFE_NO_PAD.encode(acp_auth::signing::hmac_sha256(
            WEBHOOK_SECRET.as_bytes(),
            &delivery.body,
        ));
        assert_eq!(delivery.headers["merchant-signature"], expected.as_str());
        assert_eq!(delivery.headers["content-type"], "application/json");
    }

    #[tokio::test]
    async fn test_should_complete_even_if_webhook_endpoint_is_down() {
        // Nothing listens on port 9 locally; delivery fails and is only logged.
        let server = TestServer::start(AcpConfig {
            webhook: Some(WebhookSettings {
                endpoint: "http://127.0.0.1:9/webhooks".to_owned(),
                header_name: "Merchant-Signature".to_owned(),
                secret: WEBHOOK_SECRET.to_owned(),
                timeout: Duration::from_secs(1),
            }),
            ..AcpConfig::default()
        })
        .await;
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
            .post(server.url(&format!("/checkout_sessions/{id}/complete")))
            .json(&json!({"payment_data": {"token": "vt_000001", "provider": "stripe"}}))
            .send()
            .await
            .unwrap();
        let (status, completed) = status_and_json(resp).await;
        assert_eq!(status, http::StatusCode::OK);
        assert_eq!(completed["order"]["id"], "ord_000001");
    }
}

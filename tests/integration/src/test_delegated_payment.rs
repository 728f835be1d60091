//! Delegated payment tests.

#[cfg(test)]
mod tests {
    use acp_core::AcpConfig;
    use serde_json::{Value, json};

    use crate::{TestServer, http_client, status_and_json};

    fn payment_request(checkout_session_id: &str) -> Value {
        json!({
            "payment_method": {
                "type": "card",
                "card_number_type": "fpan",
                "number": "4242424242424242",
                "exp_month": "11",
                "exp_year": "2026",
                "display_card_funding_type": "credit",
                "display_last4": "4242",
                "metadata": {}
            },
            "allowance": {
                "reason": "one_time",
                "max_amount": 2000,
                "currency": "usd",
                "checkout_session_id": checkout_session_id,
                "merchant_id": "acme",
                "expires_at": "2030-10-09T07:20:50.52Z"
            },
            "risk_signals": [{"type": "card_testing", "score": 10, "action": "manual_review"}],
            "metadata": {"source": "agent"}
        })
    }

    #[tokio::test]
    async fn test_should_issue_vault_token() {
        let server = TestServer::start(AcpConfig::default()).await;
        let resp = http_client()
            .post(server.url("/agentic_commerce/delegate_payment"))
            .json(&payment_request("cs_000001"))
            .send()
            .await
            .unwrap();
        let (status, token) = status_and_json(resp).await;
        assert_eq!(status, http::StatusCode::CREATED, "body: {token}");
        assert_eq!(token["id"], "vt_000001");
        assert_eq!(token["metadata"]["source"], "agent");
        assert_eq!(token["metadata"]["merchant_id"], "acme");
        assert_eq!(token["metadata"]["checkout_session_id"], "cs_000001");
        assert!(token["created"].is_string());
    }

    #[tokio::test]
    async fn test_should_reuse_token_for_same_session() {
        let server = TestServer::start(AcpConfig::default()).await;
        let client = http_client();
        let mut ids = Vec::new();
        for session in ["cs_000001", "cs_000001", "cs_000002"] {
            let resp = client
                .post(server.url("/agentic_commerce/delegate_payment"))
                .json(&payment_request(session))
                .send()
                .await
                .unwrap();
            let (_, token) = status_and_json(resp).await;
            ids.push(token["id"].as_str().unwrap().to_owned());
        }
        assert_eq!(ids, ["vt_000001", "vt_000001", "vt_000002"]);
    }

    #[tokio::test]
    async fn test_should_reject_invalid_allowance() {
        let server = TestServer::start(AcpConfig::default()).await;
        let mut body = payment_request("cs_000001");
        body["allowance"]["currency"] = json!("USD");

        let resp = http_client()
            .post(server.url("/agentic_commerce/delegate_payment"))
            .json(&body)
            .send()
            .await
            .unwrap();
        let (status, err) = status_and_json(resp).await;
        assert_eq!(status, http::StatusCode::BAD_REQUEST);
        assert_eq!(err["param"], "$.allowance.currency");
    }

    #[tokio::test]
    async fn test_should_reject_malformed_json() {
        let server = TestServer::start(AcpConfig::default()).await;
        let resp = http_client()
            .post(server.url("/agentic_commerce/delegate_payment"))
            .body("{not json")
            .send()
            .await
            .unwrap();
        let (status, err) = status_and_json(resp).await;
        assert_eq!(status, http::StatusCode::BAD_REQUEST);
        assert_eq!(err["type"], "invalid_request");
    }
}

//! Order webhook events sent from the merchant to the agent platform.

use serde::{Deserialize, Serialize};

/// Order state reported in webhook events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Created,
    ManualReview,
    Confirmed,
    Canceled,
    Shipped,
    Fulfilled,
}

/// Source of refunded funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundType {
    StoreCredit,
    OriginalPayment,
}

/// A refund applied to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refund {
    #[serde(rename = "type")]
    pub refund_type: RefundType,
    /// Amount in minor units.
    pub amount: i64,
}

/// Label of the event payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventDataType {
    #[default]
    Order,
}

/// Order snapshot carried by an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEventData {
    #[serde(rename = "type", default)]
    pub data_type: EventDataType,
    pub checkout_session_id: String,
    pub permalink_url: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub refunds: Vec<Refund>,
}

impl OrderEventData {
    /// Snapshot for `checkout_session_id` with no refunds.
    #[must_use]
    pub fn new(
        checkout_session_id: impl Into<String>,
        permalink_url: impl Into<String>,
        status: OrderStatus,
    ) -> Self {
        Self {
            data_type: EventDataType::Order,
            checkout_session_id: checkout_session_id.into(),
            permalink_url: permalink_url.into(),
            status,
            refunds: Vec::new(),
        }
    }
}

/// A webhook envelope, serialized as `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum WebhookEvent {
    /// Emitted once the order exists.
    OrderCreated(OrderEventData),
    /// Emitted whenever the order status changes.
    OrderUpdated(OrderEventData),
}

impl WebhookEvent {
    /// Wire name of the event type.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::OrderCreated(_) => "order_created",
            Self::OrderUpdated(_) => "order_updated",
        }
    }

    /// The order snapshot.
    #[must_use]
    pub fn data(&self) -> &OrderEventData {
        match self {
            Self::OrderCreated(data) | Self::OrderUpdated(data) => data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_serialize_envelope() {
        let mut data = OrderEventData::new(
            "cs_000001",
            "https://shop.example.com/orders/ord_000001",
            OrderStatus::Shipped,
        );
        data.refunds.push(Refund {
            refund_type: RefundType::StoreCredit,
            amount: 250,
        });
        let event = WebhookEvent::OrderUpdated(data);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "order_updated",
                "data": {
                    "type": "order",
                    "checkout_session_id": "cs_000001",
                    "permalink_url": "https://shop.example.com/orders/ord_000001",
                    "status": "shipped",
                    "refunds": [{"type": "store_credit", "amount": 250}]
                }
            })
        );
        assert_eq!(event.event_type(), "order_updated");
    }

    #[test]
    fn test_should_parse_envelope() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{"type":"order_created","data":{"type":"order","checkout_session_id":"cs_1","permalink_url":"u","status":"created","refunds":[]}}"#,
        )
        .unwrap();
        assert_eq!(event.event_type(), "order_created");
        assert_eq!(event.data().status, OrderStatus::Created);
    }
}

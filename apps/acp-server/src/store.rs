//! In-memory checkout provider.
//!
//! Sessions live in a [`DashMap`] and are lost on restart. Prices come from a
//! fixed catalog, and completing a session creates an order and emits an
//! `order_created` webhook when a sender is configured.
//!
//! ```
//! use std::sync::Arc;
//!
//! use acp_core::{RequestContext, SystemClock};
//! use acp_http::CheckoutProvider;
//! use acp_model::checkout::{CheckoutSessionCreateRequest, Item};
//! use acp_server::store::InMemoryCheckout;
//!
//! # tokio_test::block_on(async {
//! let store = InMemoryCheckout::new(Arc::new(SystemClock), None);
//! let req = CheckoutSessionCreateRequest {
//!     items: vec![Item { id: "latte".to_owned(), quantity: 2 }],
//!     ..Default::default()
//! };
//! let session = store.create_session(&RequestContext::default(), req).await.unwrap();
//! assert_eq!(session.id, "cs_000001");
//! # });
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use acp_core::{AcpError, Clock, ErrorCode, RequestContext};
use acp_http::{CheckoutProvider, ServiceResult, WebhookSender};
use acp_model::checkout::{
    CheckoutSession, CheckoutSessionCompleteRequest, CheckoutSessionCreateRequest,
    CheckoutSessionStatus, CheckoutSessionUpdateRequest, ContentType, FulfillmentOption,
    FulfillmentOptionDigital, FulfillmentOptionShipping, Item, LineItem, Link, LinkType, Message,
    MessageInfo, Order, PaymentProvider, SessionWithOrder, SupportedPaymentMethod, Total,
    TotalType,
};
use acp_model::webhook::{OrderEventData, OrderStatus, WebhookEvent};
use async_trait::async_trait;
use chrono::TimeDelta;
use dashmap::DashMap;
use dashmap::mapref::one::RefMut;
use tracing::{debug, info, warn};

const CURRENCY: &str = "usd";
const MERCHANT_URL: &str = "https://merchant.example";
const PAYMENT_PROVIDER: &str = "stripe";

/// A product sold by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Item id used in requests.
    pub sku: &'static str,
    /// Display name.
    pub title: &'static str,
    /// Unit price in minor units.
    pub price: i64,
    /// Tax rate in basis points.
    pub tax_bps: i64,
}

/// The default catalog.
#[must_use]
pub fn default_catalog() -> Vec<Product> {
    vec![
        Product {
            sku: "latte",
            title: "Oat Milk Latte",
            price: 650,
            tax_bps: 700,
        },
        Product {
            sku: "beans",
            title: "Espresso Beans (1kg)",
            price: 2400,
            tax_bps: 0,
        },
        Product {
            sku: "mug",
            title: "Stoneware Mug",
            price: 1500,
            tax_bps: 700,
        },
    ]
}

#[derive(Debug, Clone)]
struct SessionState {
    session: CheckoutSession,
    order: Option<Order>,
}

/// Checkout provider backed by process memory.
#[derive(Debug)]
pub struct InMemoryCheckout {
    catalog: HashMap<&'static str, Product>,
    sessions: DashMap<String, SessionState>,
    session_seq: AtomicU64,
    order_seq: AtomicU64,
    clock: Arc<dyn Clock>,
    webhook: Option<WebhookSender>,
}

impl InMemoryCheckout {
    /// Create a store selling the [`default_catalog`].
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, webhook: Option<WebhookSender>) -> Self {
        Self::with_catalog(default_catalog(), clock, webhook)
    }

    /// Create a store selling `catalog`.
    #[must_use]
    pub fn with_catalog(
        catalog: Vec<Product>,
        clock: Arc<dyn Clock>,
        webhook: Option<WebhookSender>,
    ) -> Self {
        Self {
            catalog: catalog.into_iter().map(|p| (p.sku, p)).collect(),
            sessions: DashMap::new(),
            session_seq: AtomicU64::new(0),
            order_seq: AtomicU64::new(0),
            clock,
            webhook,
        }
    }

    fn next_session_id(&self) -> String {
        format!("cs_{:06}", self.session_seq.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn next_order_id(&self) -> String {
        format!("ord_{:06}", self.order_seq.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn build_line_items(&self, items: &[Item]) -> Result<Vec<LineItem>, AcpError> {
        if items.is_empty() {
            return Err(AcpError::invalid_request(
                ErrorCode::InvalidRequest,
                "items cannot be empty",
            )
            .with_param("$.items"));
        }

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let product = self.catalog.get(item.id.as_str()).ok_or_else(|| {
                    AcpError::invalid_request(
                        ErrorCode::Custom("unknown_item".to_owned()),
                        format!("{:?} is not sold by this merchant", item.id),
                    )
                    .with_param(format!("$.items[{i}].id"))
                })?;
                let base = product.price.saturating_mul(item.quantity);
                let discount = 0;
                let subtotal = base - discount;
                let tax = (subtotal.saturating_mul(product.tax_bps) + 5_000) / 10_000;
                Ok(LineItem {
                    id: format!("li_{}_{i}", item.id),
                    item: item.clone(),
                    base_amount: base,
                    discount,
                    subtotal,
                    tax,
                    total: subtotal + tax,
                })
            })
            .collect()
    }

    fn fulfillment_options(&self) -> Vec<FulfillmentOption> {
        let earliest = self.clock.now() + TimeDelta::hours(48);
        vec![
            FulfillmentOption::Shipping(FulfillmentOptionShipping {
                id: "ship_standard".to_owned(),
                title: "Standard Shipping".to_owned(),
                subtitle: Some("2-4 business days".to_owned()),
                carrier: None,
                earliest_delivery_time: Some(earliest),
                latest_delivery_time: Some(earliest + TimeDelta::hours(24)),
                subtotal: format_money(500),
                tax: format_money(0),
                total: format_money(500),
            }),
            FulfillmentOption::Digital(FulfillmentOptionDigital {
                id: "pickup".to_owned(),
                title: "In-store pickup".to_owned(),
                subtitle: Some("Collect in person".to_owned()),
                subtotal: format_money(0),
                tax: format_money(0),
                total: format_money(0),
            }),
        ]
    }

    fn lookup(&self, id: &str) -> Result<RefMut<'_, String, SessionState>, AcpError> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| AcpError::not_found("checkout session not found"))
    }

    async fn notify(&self, event: WebhookEvent) {
        let Some(sender) = &self.webhook else {
            return;
        };
        match sender.send(&event).await {
            Ok(()) => debug!(
                event_type = event.event_type(),
                checkout_session_id = %event.data().checkout_session_id,
                "webhook delivered"
            ),
            Err(e) => warn!(
                event_type = event.event_type(),
                checkout_session_id = %event.data().checkout_session_id,
                error = %e,
                "webhook delivery failed"
            ),
        }
    }
}

fn rebuild_financials(session: &mut CheckoutSession, lines: Vec<LineItem>) {
    session.totals = build_totals(&lines);
    session.line_items = lines;
    session.messages = default_messages();
}

fn derive_status(session: &CheckoutSession) -> CheckoutSessionStatus {
    if session.status.is_terminal() {
        session.status
    } else if session.line_items.is_empty() {
        CheckoutSessionStatus::InProgress
    } else if session.payment_provider.is_some() {
        CheckoutSessionStatus::ReadyForPayment
    } else {
        CheckoutSessionStatus::NotReadyForPayment
    }
}

fn build_totals(lines: &[LineItem]) -> Vec<Total> {
    let base: i64 = lines.iter().map(|l| l.base_amount).sum();
    let tax: i64 = lines.iter().map(|l| l.tax).sum();
    let total: i64 = lines.iter().map(|l| l.total).sum();

    let mut totals = vec![total_line(TotalType::ItemsBaseAmount, base)];
    if tax > 0 {
        totals.push(total_line(TotalType::Tax, tax));
    }
    totals.push(total_line(TotalType::Total, total));
    totals
}

fn total_line(total_type: TotalType, amount: i64) -> Total {
    Total {
        total_type,
        display_text: format_money(amount),
        amount,
    }
}

/// Render minor units as e.g. `USD 6.50`.
fn format_money(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{} {sign}{}.{:02}", CURRENCY.to_uppercase(), abs / 100, abs % 100)
}

fn default_messages() -> Vec<Message> {
    vec![Message::Info(MessageInfo {
        content_type: ContentType::Plain,
        content: "Sessions are kept in memory and disappear when the server restarts.".to_owned(),
        param: None,
    })]
}

fn conflict(code: &str, message: &str) -> AcpError {
    AcpError::invalid_request(ErrorCode::Custom(code.to_owned()), message)
        .with_status(http::StatusCode::CONFLICT)
}

#[async_trait]
impl CheckoutProvider for InMemoryCheckout {
    async fn create_session(
        &self,
        _ctx: &RequestContext,
        req: CheckoutSessionCreateRequest,
    ) -> ServiceResult<CheckoutSession> {
        let lines = self.build_line_items(&req.items)?;

        let mut session = CheckoutSession {
            id: self.next_session_id(),
            buyer: req.buyer,
            payment_provider: Some(PaymentProvider {
                provider: PAYMENT_PROVIDER.to_owned(),
                supported_payment_methods: vec![SupportedPaymentMethod::Card],
            }),
            status: CheckoutSessionStatus::InProgress,
            currency: CURRENCY.to_owned(),
            line_items: Vec::new(),
            fulfillment_address: req.fulfillment_address,
            fulfillment_options: self.fulfillment_options(),
            fulfillment_option_id: None,
            totals: Vec::new(),
            messages: Vec::new(),
            links: vec![
                Link {
                    link_type: LinkType::PrivacyPolicy,
                    url: format!("{MERCHANT_URL}/privacy"),
                },
                Link {
                    link_type: LinkType::TermsOfUse,
                    url: format!("{MERCHANT_URL}/terms"),
                },
            ],
        };
        rebuild_financials(&mut session, lines);
        session.status = derive_status(&session);

        info!(checkout_session_id = %session.id, "checkout session created");
        self.sessions.insert(
            session.id.clone(),
            SessionState {
                session: session.clone(),
                order: None,
            },
        );
        Ok(session)
    }

    async fn update_session(
        &self,
        _ctx: &RequestContext,
        id: &str,
        req: CheckoutSessionUpdateRequest,
    ) -> ServiceResult<CheckoutSession> {
        let lines = req
            .items
            .as_deref()
            .map(|items| self.build_line_items(items))
            .transpose()?;

        let mut state = self.lookup(id)?;
        let session = &mut state.session;
        if session.status.is_terminal() {
            return Err(
                conflict("session_closed", "checkout session can no longer be updated").into(),
            );
        }
        if let Some(option_id) = &req.fulfillment_option_id {
            if !session.fulfillment_options.iter().any(|o| o.id() == option_id) {
                return Err(AcpError::invalid_request(
                    ErrorCode::InvalidRequest,
                    format!("unknown fulfillment option {option_id:?}"),
                )
                .with_param("$.fulfillment_option_id")
                .into());
            }
        }

        if let Some(buyer) = req.buyer {
            session.buyer = Some(buyer);
        }
        if let Some(address) = req.fulfillment_address {
            session.fulfillment_address = Some(address);
        }
        if let Some(option_id) = req.fulfillment_option_id {
            session.fulfillment_option_id = Some(option_id);
        }
        if let Some(lines) = lines {
            rebuild_financials(session, lines);
        }
        session.status = derive_status(session);
        Ok(session.clone())
    }

    async fn get_session(&self, _ctx: &RequestContext, id: &str) -> ServiceResult<CheckoutSession> {
        self.sessions
            .get(id)
            .map(|state| state.session.clone())
            .ok_or_else(|| AcpError::not_found("checkout session not found").into())
    }

    async fn complete_session(
        &self,
        _ctx: &RequestContext,
        id: &str,
        req: CheckoutSessionCompleteRequest,
    ) -> ServiceResult<SessionWithOrder> {
        let (result, event) = {
            let mut state = self.lookup(id)?;
            if let Some(order) = &state.order {
                debug!(checkout_session_id = %id, "session already completed");
                return Ok(SessionWithOrder {
                    session: state.session.clone(),
                    order: order.clone(),
                });
            }
            if state.session.status == CheckoutSessionStatus::Canceled {
                return Err(conflict("canceled", "cannot complete a canceled session").into());
            }
            if state.session.line_items.is_empty() {
                return Err(AcpError::invalid_request(
                    ErrorCode::Custom("empty_cart".to_owned()),
                    "add items before completing the session",
                )
                .into());
            }

            if let Some(buyer) = req.buyer {
                state.session.buyer = Some(buyer);
            }
            state.session.status = CheckoutSessionStatus::Completed;
            let order_id = self.next_order_id();
            let order = Order {
                permalink_url: format!("{MERCHANT_URL}/orders/{order_id}"),
                id: order_id,
                checkout_session_id: state.session.id.clone(),
            };
            state.order = Some(order.clone());

            let event = WebhookEvent::OrderCreated(OrderEventData::new(
                &order.checkout_session_id,
                &order.permalink_url,
                OrderStatus::Created,
            ));
            info!(
                checkout_session_id = %order.checkout_session_id,
                order_id = %order.id,
                provider = %req.payment_data.provider,
                "checkout session completed"
            );
            (
                SessionWithOrder {
                    session: state.session.clone(),
                    order,
                },
                event,
            )
        };

        self.notify(event).await;
        Ok(result)
    }

    async fn cancel_session(
        &self,
        _ctx: &RequestContext,
        id: &str,
    ) -> ServiceResult<CheckoutSession> {
        let mut state = self.lookup(id)?;
        if state.order.is_some() {
            return Err(conflict("completed", "completed sessions cannot be canceled").into());
        }
        state.session.status = CheckoutSessionStatus::Canceled;
        info!(checkout_session_id = %id, "checkout session canceled");
        Ok(state.session.clone())
    }
}

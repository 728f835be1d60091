//! In-memory delegated payment vault.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use acp_core::{Clock, RequestContext};
use acp_http::{DelegatedPaymentProvider, ServiceResult};
use acp_model::delegated_payment::{PaymentRequest, VaultToken};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info};

/// Issues vault tokens, one per checkout session.
///
/// Delegating again for a session that already has a token returns the
/// original token, so agents can retry safely.
#[derive(Debug)]
pub struct InMemoryVault {
    tokens: DashMap<String, VaultToken>,
    seq: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl InMemoryVault {
    /// Create an empty vault.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tokens: DashMap::new(),
            seq: AtomicU64::new(0),
            clock,
        }
    }

    /// Number of tokens issued so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no token has been issued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl DelegatedPaymentProvider for InMemoryVault {
    async fn delegate_payment(
        &self,
        _ctx: &RequestContext,
        req: PaymentRequest,
    ) -> ServiceResult<VaultToken> {
        let key = req.allowance.checkout_session_id.clone();

        match self.tokens.entry(key) {
            Entry::Occupied(existing) => {
                debug!(checkout_session_id = %existing.key(), "returning existing vault token");
                Ok(existing.get().clone())
            }
            Entry::Vacant(slot) => {
                let mut metadata = req.metadata.unwrap_or_default();
                metadata.insert("merchant_id".to_owned(), req.allowance.merchant_id);
                metadata.insert("checkout_session_id".to_owned(), slot.key().clone());

                let token = VaultToken {
                    id: format!("vt_{:06}", self.seq.fetch_add(1, Ordering::SeqCst) + 1),
                    created: self.clock.now(),
                    metadata,
                };
                info!(
                    token_id = %token.id,
                    checkout_session_id = %slot.key(),
                    "vault token issued"
                );
                Ok(slot.insert(token).value().clone())
            }
        }
    }
}

//! Bearer API key authentication.

use std::fmt;

use acp_core::RequestContext;
use async_trait::async_trait;
use subtle::{Choice, ConstantTimeEq};

use crate::error::AuthenticationError;

/// Validates the API key presented in an `Authorization: Bearer` header.
///
/// Implementations may call out to remote identity services. Returning
/// [`AuthenticationError::Acp`] forwards that structured error to the client
/// unchanged; every other failure is reported as an invalid key.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticate `api_key` for the request described by `ctx`.
    async fn authenticate(
        &self,
        api_key: &str,
        ctx: &RequestContext,
    ) -> Result<(), AuthenticationError>;
}

/// In-memory authenticator over a fixed set of keys.
#[derive(Clone, Default)]
pub struct StaticApiKeyAuthenticator {
    keys: Vec<String>,
}

impl fmt::Debug for StaticApiKeyAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticApiKeyAuthenticator")
            .field("keys", &self.keys.len())
            .finish()
    }
}

impl StaticApiKeyAuthenticator {
    /// Create an authenticator accepting any of `keys`.
    #[must_use]
    pub fn new(keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether no keys are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[async_trait]
impl Authenticator for StaticApiKeyAuthenticator {
    async fn authenticate(
        &self,
        api_key: &str,
        _ctx: &RequestContext,
    ) -> Result<(), AuthenticationError> {
        // Compare against every key so timing does not reveal which one matched.
        let matched = self
            .keys
            .iter()
            .fold(Choice::from(0), |acc, key| {
                acc | key.as_bytes().ct_eq(api_key.as_bytes())
            });
        if matched.into() {
            Ok(())
        } else {
            Err(AuthenticationError::InvalidApiKey)
        }
    }
}

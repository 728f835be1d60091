//! Delegated payment (card tokenization) types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{Validate, ValidationError, exact_len, max_len, numeric, required};

/// Kind of delegated credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodType {
    Card,
}

/// How the card number is represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardNumberType {
    /// Funding primary account number.
    Fpan,
    /// Network token.
    NetworkToken,
}

/// Funding source of the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardFundingType {
    Credit,
    Debit,
    Prepaid,
}

/// A check already performed on the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardCheck {
    Avs,
    Cvv,
    Ani,
    #[serde(rename = "auth0")]
    Auth0,
}

/// Scope of the allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowanceReason {
    OneTime,
}

/// Kind of risk signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSignalType {
    CardTesting,
}

/// Action taken in response to a risk signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSignalAction {
    ManualReview,
    Authorized,
    Blocked,
}

/// The delegated card credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentMethodCard {
    #[serde(rename = "type")]
    pub method_type: PaymentMethodType,
    pub card_number_type: CardNumberType,
    #[serde(default)]
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp_month: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvc: Option<String>,
    /// Last four digits shown to the buyer for non-PAN credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_last4: Option<String>,
    pub display_card_funding_type: CardFundingType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_wallet_type: Option<String>,
    /// Issuer identification number, at most six digits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cryptogram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eci_value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checks_performed: Vec<CardCheck>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, String>>,
}

/// Limits on how the vaulted credential may be charged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Allowance {
    pub reason: AllowanceReason,
    /// Maximum chargeable amount in minor units.
    #[serde(default)]
    pub max_amount: i64,
    /// Lowercase ISO 4217 currency code.
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub checkout_session_id: String,
    #[serde(default)]
    pub merchant_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Fraud intelligence forwarded to the PSP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskSignal {
    #[serde(rename = "type")]
    pub signal_type: RiskSignalType,
    pub action: RiskSignalAction,
    #[serde(default)]
    pub score: i64,
}

/// Billing address of the card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BillingAddress {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub line_one: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_two: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    /// ISO 3166-1 alpha-2, uppercase.
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub postal_code: String,
}

/// Body of `POST /agentic_commerce/delegate_payment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentRequest {
    pub payment_method: PaymentMethodCard,
    pub allowance: Allowance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<BillingAddress>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub risk_signals: Option<Vec<RiskSignal>>,
}

/// Vault token issued for a delegated credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultToken {
    /// Token identifier, `vt_...`.
    pub id: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl Validate for PaymentMethodCard {
    fn validate(&self) -> Result<(), ValidationError> {
        required("payment_method.number", &self.number)?;
        if let Some(month) = &self.exp_month {
            exact_len("payment_method.exp_month", month, 2)?;
            numeric("payment_method.exp_month", month)?;
        }
        if let Some(year) = &self.exp_year {
            exact_len("payment_method.exp_year", year, 4)?;
            numeric("payment_method.exp_year", year)?;
        }
        if let Some(cvc) = &self.cvc {
            numeric("payment_method.cvc", cvc)?;
        }
        if let Some(last4) = &self.display_last4 {
            exact_len("payment_method.display_last4", last4, 4)?;
        }
        if let Some(iin) = &self.iin {
            max_len("payment_method.iin", iin, 6)?;
        }
        if self.metadata.is_none() {
            return Err(ValidationError::new("payment_method.metadata", "must be provided"));
        }
        Ok(())
    }
}

impl Validate for Allowance {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.max_amount <= 0 {
            return Err(ValidationError::new("allowance.max_amount", "must be greater than 0"));
        }
        if !is_currency_code(&self.currency) {
            return Err(ValidationError::new(
                "allowance.currency",
                "must be a lowercase 3-letter ISO-4217 code",
            ));
        }
        required("allowance.checkout_session_id", &self.checkout_session_id)?;
        required("allowance.merchant_id", &self.merchant_id)
    }
}

impl Validate for BillingAddress {
    fn validate(&self) -> Result<(), ValidationError> {
        required("billing_address.name", &self.name)?;
        required("billing_address.line_one", &self.line_one)?;
        required("billing_address.city", &self.city)?;
        required("billing_address.state", &self.state)?;
        required("billing_address.country", &self.country)?;
        exact_len("billing_address.country", &self.country, 2)?;
        if self.country.chars().any(char::is_lowercase) {
            return Err(ValidationError::new("billing_address.country", "must be uppercase"));
        }
        required("billing_address.postal_code", &self.postal_code)
    }
}

impl Validate for PaymentRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        self.payment_method.validate()?;
        self.allowance.validate()?;
        if let Some(address) = &self.billing_address {
            address.validate()?;
        }
        if self.metadata.is_none() {
            return Err(ValidationError::new("metadata", "must be provided"));
        }
        let Some(signals) = &self.risk_signals else {
            return Err(ValidationError::new("risk_signals", "is required"));
        };
        if signals.is_empty() {
            return Err(ValidationError::new("risk_signals", "must have at least 1 entries"));
        }
        for (i, signal) in signals.iter().enumerate() {
            if signal.score < 0 {
                return Err(ValidationError::new(
                    format!("risk_signals[{i}].score"),
                    "must be at least 0",
                ));
            }
        }
        Ok(())
    }
}

fn is_currency_code(value: &str) -> bool {
    value.len() == 3 && value.bytes().all(|b| b.is_ascii_lowercase())
}

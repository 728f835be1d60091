//! Signature verification.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::SignatureError;
use crate::signing::{build_signing_payload, hmac_sha256};

/// Everything a verifier may inspect about a signed request.
#[derive(Debug, Clone)]
pub struct SigningMaterial {
    /// The `Signature` header value.
    pub signature: String,
    /// The parsed `Timestamp` header, in UTC.
    pub timestamp: DateTime<Utc>,
    /// Canonical JSON of the request body.
    pub canonical_body: Vec<u8>,
    /// Request method.
    pub method: http::Method,
    /// Request path.
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub raw_query: String,
    /// Full inbound header set.
    pub headers: http::HeaderMap,
}

/// Validates the authenticity of a signed request.
///
/// Verifiers are shared by all in-flight requests and must be safe to call
/// concurrently. Closures of the right shape implement this trait.
pub trait SignatureVerifier: Send + Sync {
    /// Returns `Ok(())` when the signature is authentic.
    fn verify(&self, material: &SigningMaterial) -> Result<(), SignatureError>;
}

impl<F> SignatureVerifier for F
where
    F: Fn(&SigningMaterial) -> Result<(), SignatureError> + Send + Sync,
{
    fn verify(&self, material: &SigningMaterial) -> Result<(), SignatureError> {
        self(material)
    }
}

/// Verifies base64url HMAC-SHA256 signatures computed with a shared secret.
#[derive(Clone)]
pub struct HmacVerifier {
    key: Vec<u8>,
}

impl fmt::Debug for HmacVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacVerifier").field("key", &"...").finish()
    }
}

impl HmacVerifier {
    /// Create a verifier for `key`, which must not be empty.
    pub fn new(key: impl Into<Vec<u8>>) -> Result<Self, SignatureError> {
        let key = key.into();
        if key.is_empty() {
            return Err(SignatureError::EmptyKey);
        }
        Ok(Self { key })
    }
}

impl SignatureVerifier for HmacVerifier {
    fn verify(&self, material: &SigningMaterial) -> Result<(), SignatureError> {
        let payload = build_signing_payload(&material.timestamp, &material.canonical_body);
        let expected = hmac_sha256(&self.key, &payload);
        let provided = URL_SAFE_NO_PAD.decode(material.signature.as_bytes())?;

        if provided.ct_eq(&expected).into() {
            Ok(())
        } else {
            debug!(path = %material.path, "HMAC signature mismatch");
            Err(SignatureError::Mismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::canonical::canonicalize_json;
    use crate::signing::compute_signature;

    fn material(key: &[u8], body: &[u8]) -> SigningMaterial {
        let timestamp = Utc.with_ymd_and_hms(2025, 9, 25, 10, 30, 0).unwrap();
        let canonical_body = canonicalize_json(body).unwrap();
        let signature = compute_signature(key, &build_signing_payload(&timestamp, &canonical_body));
        SigningMaterial {
            signature,
            timestamp,
            canonical_body,
            method: http::Method::POST,
            path: "/checkout_sessions".to_owned(),
            raw_query: String::new(),
            headers: http::HeaderMap::new(),
        }
    }

    #[test]
    fn test_should_reject_empty_key() {
        assert!(matches!(HmacVerifier::new(Vec::new()), Err(SignatureError::EmptyKey)));
    }

    #[test]
    fn test_should_verify_matching_signature() {
        let verifier = HmacVerifier::new(b"secret".to_vec()).unwrap();
        verifier.verify(&material(b"secret", br#"{"items":[]}"#)).unwrap();
    }

    #[test]
    fn test_should_reject_wrong_secret() {
        let verifier = HmacVerifier::new(b"secret".to_vec()).unwrap();
        let err = verifier
            .verify(&material(b"other", br#"{"items":[]}"#))
            .unwrap_err();
        assert!(matches!(err, SignatureError::Mismatch));
    }

    #[test]
    fn test_should_reject_tampered_body_and_timestamp() {
        let verifier = HmacVerifier::new(b"secret".to_vec()).unwrap();

        let mut tampered = material(b"secret", br#"{"amount":100}"#);
        tampered.canonical_body = canonicalize_json(br#"{"amount":101}"#).unwrap();
        assert!(verifier.verify(&tampered).is_err());

        let mut shifted = material(b"secret", br#"{"amount":100}"#);
        shifted.timestamp += chrono::TimeDelta::seconds(1);
        assert!(verifier.verify(&shifted).is_err());
    }

    #[test]
    fn test_should_reject_undecodable_signature() {
        let verifier = HmacVerifier::new(b"secret".to_vec()).unwrap();
        let mut m = material(b"secret", b"{}");
        m.signature = "not base64url!".to_owned();
        assert!(matches!(
            verifier.verify(&m),
            Err(SignatureError::MalformedSignature(_))
        ));
    }

    #[test]
    fn test_should_accept_closure_verifier() {
        let verifier = |m: &SigningMaterial| {
            if m.headers.contains_key("x-trusted") {
                Ok(())
            } else {
                Err(SignatureError::Rejected("untrusted".to_owned()))
            }
        };
        let mut m = material(b"k", b"{}");
        assert!(SignatureVerifier::verify(&verifier, &m).is_err());
        m.headers.insert("x-trusted", http::HeaderValue::from_static("1"));
        assert!(SignatureVerifier::verify(&verifier, &m).is_ok());
    }
}

//! HMAC-SHA256 signing primitives.
//!
//! Inbound requests are signed over
//!
//! ```text
//! RFC3339Nano(UTC(timestamp)) + "." + canonical_json(body)
//! ```
//!
//! while outbound webhooks are signed over the literal serialized body. Both
//! encode the MAC as base64url without padding.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeZone, Timelike, Utc};
use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;

use crate::canonical::canonicalize_json;
use crate::error::{CanonicalizationError, SignatureError};

type HmacSha256 = Hmac<Sha256>;

/// Format an instant as RFC 3339 with nanosecond precision in UTC.
///
/// Fractional seconds are trimmed of trailing zeros and omitted entirely when
/// zero, so `10:30:00.500` renders as `10:30:00.5Z` and `10:30:00.000` as
/// `10:30:00Z`.
#[must_use]
pub fn format_timestamp<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String {
    let utc = timestamp.with_timezone(&Utc);
    let mut out = utc.format("%Y-%m-%dT%H:%M:%S").to_string();
    let nanos = utc.nanosecond() % 1_000_000_000;
    if nanos != 0 {
        let frac = format!("{nanos:09}");
        out.push('.');
        out.push_str(frac.trim_end_matches('0'));
    }
    out.push('Z');
    out
}

/// Parse a `Timestamp` header value in RFC 3339 form, with or without
/// fractional seconds, normalizing it to UTC.
///
/// The date and time must be joined by an uppercase `T` and the zone must be
/// an uppercase `Z` or a numeric offset.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, SignatureError> {
    let invalid = || SignatureError::InvalidTimestamp(value.to_owned());
    if value.as_bytes().get(10) != Some(&b'T') || value.contains(['t', 'z']) {
        return Err(invalid());
    }
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| invalid())
}

/// Build the byte string that is HMAC-signed for an inbound request.
#[must_use]
pub fn build_signing_payload<Tz: TimeZone>(
    timestamp: &DateTime<Tz>,
    canonical_body: &[u8],
) -> Vec<u8> {
    let ts = format_timestamp(timestamp);
    let mut payload = Vec::with_capacity(ts.len() + 1 + canonical_body.len());
    payload.extend_from_slice(ts.as_bytes());
    payload.push(b'.');
    payload.extend_from_slice(canonical_body);
    payload
}

/// Compute the raw HMAC-SHA256 of `data`.
#[must_use]
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Compute `base64url(HMAC-SHA256(secret, payload))` without padding.
#[must_use]
pub fn compute_signature(secret: &[u8], payload: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(hmac_sha256(secret, payload))
}

/// Sign an outgoing request body the way an ACP client would.
///
/// The body is canonicalized first, so any JSON spelling of the same document
/// yields the same signature.
pub fn sign_request<Tz: TimeZone>(
    secret: &[u8],
    timestamp: &DateTime<Tz>,
    raw_body: &[u8],
) -> Result<String, CanonicalizationError> {
    let canonical = canonicalize_json(raw_body)?;
    Ok(compute_signature(
        secret,
        &build_signing_payload(timestamp, &canonical),
    ))
}

/// Sign a serialized webhook envelope.
///
/// Unlike inbound requests, webhook signatures cover the exact bytes sent.
#[must_use]
pub fn sign_webhook_payload(secret: &[u8], body: &[u8]) -> String {
    compute_signature(secret, body)
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;

    #[test]
    fn test_should_format_whole_seconds_without_fraction() {
        let ts = Utc.with_ymd_and_hms(2025, 9, 25, 10, 30, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "2025-09-25T10:30:00Z");
    }

    #[test]
    fn test_should_trim_trailing_fraction_zeros() {
        let ts = Utc
            .with_ymd_and_hms(2025, 9, 25, 10, 30, 0)
            .unwrap()
            .with_nanosecond(500_000_000)
            .unwrap();
        assert_eq!(format_timestamp(&ts), "2025-09-25T10:30:00.5Z");

        let ts = ts.with_nanosecond(123_456_789).unwrap();
        assert_eq!(format_timestamp(&ts), "2025-09-25T10:30:00.123456789Z");
    }

    #[test]
    fn test_should_normalize_offsets_to_utc() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2025, 9, 25, 12, 30, 0).unwrap();
        let utc = Utc.with_ymd_and_hms(2025, 9, 25, 10, 30, 0).unwrap();
        assert_eq!(
            build_signing_payload(&local, b"null"),
            build_signing_payload(&utc, b"null")
        );
        assert_eq!(build_signing_payload(&utc, b"{}"), b"2025-09-25T10:30:00Z.{}");
    }

    #[test]
    fn test_should_parse_rfc3339_and_nano_timestamps() {
        let expected = Utc.with_ymd_and_hms(2025, 9, 25, 10, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2025-09-25T10:30:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-09-25T12:30:00+02:00").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2025-09-25T10:30:00.250Z").unwrap(),
            expected.with_nanosecond(250_000_000).unwrap()
        );
    }

    #[test]
    fn test_should_reject_non_rfc3339_timestamps() {
        assert!(parse_timestamp("").is_err());
        assert!(parse_timestamp("1727260200").is_err());
        assert!(parse_timestamp("2025-09-25 10:30:00").is_err());
    }

    #[test]
    fn test_should_require_uppercase_separator_and_zone() {
        for value in [
            "2025-01-01 12:00:30Z",
            "2025-01-01t12:00:30z",
            "2025-01-01T12:00:30z",
            "2025-01-01t12:00:30Z",
        ] {
            let err = parse_timestamp(value).unwrap_err();
            assert!(
                matches!(&err, SignatureError::InvalidTimestamp(v) if v == value),
                "got {err:?} for {value}"
            );
        }
        let expected = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 30).unwrap();
        assert_eq!(parse_timestamp("2025-01-01T12:00:30Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-01-01T14:00:30+02:00").unwrap(), expected);
    }

    #[test]
    fn test_should_match_rfc4231_hmac_vector() {
        // RFC 4231 test case 2.
        let mac = hmac_sha256(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            hex::encode(mac),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_should_encode_signature_as_unpadded_base64url() {
        let sig = compute_signature(b"secret", b"payload");
        assert_eq!(sig.len(), 43);
        assert!(!sig.contains('='));
        assert!(!sig.contains('+'));
        assert!(!sig.contains('/'));
    }

    #[test]
    fn test_should_sign_equivalent_bodies_identically() {
        let ts = Utc.with_ymd_and_hms(2025, 9, 25, 10, 30, 0).unwrap();
        let a = sign_request(b"k", &ts, br#"{"b":1,"a":2}"#).unwrap();
        let b = sign_request(b"k", &ts, b"{ \"a\": 2, \"b\": 1.0 }").unwrap();
        assert_eq!(a, b);
    }
}

//! Canonical JSON serialization for request signing.
//!
//! Both sides of a signed exchange must hash byte-identical input even when
//! the client serialized its payload with different key order, whitespace or
//! number spelling. The canonical form is:
//!
//! - object members sorted by the UTF-8 bytes of their keys
//! - no insignificant whitespace
//! - strings escaping only `"`, `\` and control characters (short escapes
//!   where JSON has one, otherwise `\u00XX` with uppercase hex), everything
//!   else emitted as raw UTF-8
//! - integral numbers without fraction or exponent (`1.0e2` becomes `100`,
//!   `-0` becomes `0`)
//! - other numbers as a single digit, a non-empty fraction without trailing
//!   zeros, and a capital `E` exponent (`0.5` becomes `5.0E-1`)
//!
//! Numbers are normalized from their literal digits, never through floating
//! point, so no precision the client sent is lost.

use serde_json::{Map, Number, Value};

use crate::error::CanonicalizationError;

/// Largest positive exponent expanded into a plain integer.
///
/// Bounds the output of adversarial literals such as `1e999999999`.
const MAX_INTEGER_EXPONENT: i128 = 1000;

/// Canonicalize a raw request body.
///
/// An empty or whitespace-only body canonicalizes to `null` so that bodiless
/// requests remain signable. Anything other than exactly one JSON document is
/// rejected.
///
/// # Examples
///
/// ```
/// use acp_auth::canonical::canonicalize_json;
///
/// let canonical = canonicalize_json(br#"{ "b": 1.50, "a": [true, null] }"#).unwrap();
/// assert_eq!(canonical, br#"{"a":[true,null],"b":1.5E0}"#);
/// ```
pub fn canonicalize_json(raw: &[u8]) -> Result<Vec<u8>, CanonicalizationError> {
    if raw.trim_ascii().is_empty() {
        return Ok(b"null".to_vec());
    }
    let value: Value = serde_json::from_slice(raw)?;
    canonicalize_value(&value)
}

/// Canonicalize an already parsed JSON value.
pub fn canonicalize_value(value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
    let mut out = Vec::with_capacity(128);
    write_value(&mut out, value)?;
    Ok(out)
}

fn write_value(out: &mut Vec<u8>, value: &Value) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => write_number(out, n)?,
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(out, item)?;
            }
            out.push(b']');
        }
        Value::Object(map) => write_object(out, map)?,
    }
    Ok(())
}

fn write_object(out: &mut Vec<u8>, map: &Map<String, Value>) -> Result<(), CanonicalizationError> {
    // Sort explicitly: `Map` may preserve insertion order if another crate in
    // the graph enables `preserve_order`.
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    out.push(b'{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(b',');
        }
        write_string(out, key);
        out.push(b':');
        write_value(out, value)?;
    }
    out.push(b'}');
    Ok(())
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    out.push(b'"');
    for ch in s.chars() {
        match ch {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\u{08}' => out.extend_from_slice(b"\\b"),
            '\t' => out.extend_from_slice(b"\\t"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\u{0C}' => out.extend_from_slice(b"\\f"),
            '\r' => out.extend_from_slice(b"\\r"),
            c if u32::from(c) < 0x20 => {
                out.extend_from_slice(format!("\\u{:04X}", u32::from(c)).as_bytes());
            }
            c => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    out.push(b'"');
}

fn write_number(out: &mut Vec<u8>, n: &Number) -> Result<(), CanonicalizationError> {
    let normalized = normalize_number(&n.to_string())?;
    out.extend_from_slice(normalized.as_bytes());
    Ok(())
}

/// Normalize a JSON number literal into its canonical spelling.
pub(crate) fn normalize_number(literal: &str) -> Result<String, CanonicalizationError> {
    let invalid = || CanonicalizationError::InvalidNumber(literal.to_owned());
    let out_of_range = || CanonicalizationError::NumberOutOfRange(literal.to_owned());

    let (negative, unsigned) = match literal.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, literal),
    };
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(idx) => (
            &unsigned[..idx],
            Exponent::parse(&unsigned[idx + 1..]).ok_or_else(invalid)?,
        ),
        None => (unsigned, Exponent::Fits(0)),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty()
        || !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    // Zero has one spelling whatever the exponent says.
    let all_digits = format!("{int_part}{frac_part}");
    let significant = all_digits.trim_start_matches('0');
    if significant.is_empty() {
        return Ok("0".to_owned());
    }
    let digits = significant.trim_end_matches('0');

    // value = digits * 10^(exponent + shift)
    let trailing =
        i128::try_from(significant.len() - digits.len()).map_err(|_| out_of_range())?;
    let frac_len = i128::try_from(frac_part.len()).map_err(|_| out_of_range())?;
    let len = i128::try_from(digits.len()).map_err(|_| out_of_range())?;
    let shift = trailing - frac_len;

    let mut out = String::with_capacity(digits.len() + 8);
    if negative {
        out.push('-');
    }
    let (first, rest) = digits.split_at(1);
    let push_mantissa = |out: &mut String| {
        out.push_str(first);
        out.push('.');
        out.push_str(if rest.is_empty() { "0" } else { rest });
        out.push('E');
    };

    match exponent {
        Exponent::Fits(e) => {
            let exp = e.checked_add(shift).ok_or_else(out_of_range)?;
            if exp >= 0 {
                if exp > MAX_INTEGER_EXPONENT {
                    return Err(out_of_range());
                }
                out.push_str(digits);
                let zeros = usize::try_from(exp).map_err(|_| out_of_range())?;
                out.extend(std::iter::repeat_n('0', zeros));
            } else {
                push_mantissa(&mut out);
                let scientific = exp.checked_add(len - 1).ok_or_else(out_of_range)?;
                out.push_str(&scientific.to_string());
            }
        }
        Exponent::HugePositive => return Err(out_of_range()),
        Exponent::HugeNegative(magnitude) => {
            // Never expanded, so only the exponent digits need adjusting.
            push_mantissa(&mut out);
            out.push('-');
            out.push_str(&offset_decimal(magnitude, -(shift + len - 1)));
        }
    }
    Ok(out)
}

/// A parsed exponent. Magnitudes beyond `i128` keep their digits.
enum Exponent<'a> {
    Fits(i128),
    HugePositive,
    HugeNegative(&'a str),
}

impl<'a> Exponent<'a> {
    fn parse(raw: &'a str) -> Option<Self> {
        let (negative, digits) = match raw.as_bytes().first() {
            Some(b'-') => (true, &raw[1..]),
            Some(b'+') => (false, &raw[1..]),
            _ => (false, raw),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let digits = match digits.trim_start_matches('0') {
            "" => "0",
            d => d,
        };
        Some(match digits.parse::<i128>() {
            Ok(v) if negative => Self::Fits(-v),
            Ok(v) => Self::Fits(v),
            Err(_) if negative => Self::HugeNegative(digits),
            Err(_) => Self::HugePositive,
        })
    }
}

/// `digits + delta` for a decimal too large for `i128`. `delta` is tiny in
/// comparison, so the result stays positive.
#[allow(clippy::cast_possible_truncation)]
fn offset_decimal(digits: &str, delta: i128) -> String {
    let mut rev: Vec<u8> = digits.bytes().rev().map(|b| b - b'0').collect();
    let adding = delta >= 0;
    let mut carry = delta.unsigned_abs();
    let mut i = 0;
    while carry > 0 {
        if i == rev.len() {
            rev.push(0);
        }
        let d = u128::from(rev[i]);
        let step = carry % 10;
        carry /= 10;
        if adding {
            let sum = d + step;
            rev[i] = (sum % 10) as u8;
            carry += sum / 10;
        } else if d >= step {
            rev[i] = (d - step) as u8;
        } else {
            rev[i] = (d + 10 - step) as u8;
            carry += 1;
        }
        i += 1;
    }
    while rev.len() > 1 && rev.last() == Some(&0) {
        rev.pop();
    }
    rev.iter().rev().map(|d| char::from(b'0' + d)).collect()
}

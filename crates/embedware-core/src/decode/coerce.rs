//! Scalar and container coercions used by the weak deserializer.

use serde::de::{Error as _, Unexpected};
use serde_json::{Map, Value};

use super::DecodeError;

/// Delimiter splitting a string supplied for a sequence field.
pub const SEQUENCE_DELIMITER: char = ',';

pub(crate) fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Unexpected::Unsigned(u)
            } else if let Some(i) = n.as_i64() {
                Unexpected::Signed(i)
            } else {
                Unexpected::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
    }
}

/// Compares two keys ignoring ASCII case, `_` and `-`, so that `trusted_ips`,
/// `Trusted-IPs` and `trustedIPs` are the same key.
pub(crate) fn loose_key_eq(a: &str, b: &str) -> bool {
    fn folded(key: &str) -> impl Iterator<Item = u8> + '_ {
        key.bytes()
            .filter(|b| *b != b'_' && *b != b'-')
            .map(|b| b.to_ascii_lowercase())
    }
    folded(a).eq(folded(b))
}

pub(crate) fn to_bool(value: Value) -> Result<bool, DecodeError> {
    match value {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => match s.as_str() {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "" | "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err(DecodeError::invalid_value(Unexpected::Str(&s), &"a boolean")),
        },
        other => Err(DecodeError::invalid_type(unexpected(&other), &"a boolean")),
    }
}

pub(crate) fn to_i64(value: Value) -> Result<i64, DecodeError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if let Some(u) = n.as_u64() {
                Err(DecodeError::invalid_value(
                    Unexpected::Unsigned(u),
                    &"a signed 64-bit integer",
                ))
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                truncate_signed(f)
                    .ok_or_else(|| DecodeError::invalid_value(Unexpected::Float(f), &"an integer"))
            }
        }
        Value::Bool(b) => Ok(i64::from(b)),
        Value::String(s) if s.is_empty() => Ok(0),
        Value::String(s) => {
            parse_signed(&s).ok_or_else(|| DecodeError::invalid_value(Unexpected::Str(&s), &"an integer"))
        }
        other => Err(DecodeError::invalid_type(unexpected(&other), &"an integer")),
    }
}

pub(crate) fn to_u64(value: Value) -> Result<u64, DecodeError> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Ok(u)
            } else if let Some(i) = n.as_i64() {
                Err(DecodeError::invalid_value(
                    Unexpected::Signed(i),
                    &"a non-negative integer",
                ))
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                truncate_unsigned(f).ok_or_else(|| {
                    DecodeError::invalid_value(Unexpected::Float(f), &"a non-negative integer")
                })
            }
        }
        Value::Bool(b) => Ok(u64::from(b)),
        Value::String(s) if s.is_empty() => Ok(0),
        Value::String(s) => parse_unsigned(&s).ok_or_else(|| {
            DecodeError::invalid_value(Unexpected::Str(&s), &"a non-negative integer")
        }),
        other => Err(DecodeError::invalid_type(unexpected(&other), &"a non-negative integer")),
    }
}

pub(crate) fn to_f64(value: Value) -> Result<f64, DecodeError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| DecodeError::custom(format!("number {n} is not representable as f64"))),
        Value::Bool(b) => Ok(if b { 1.0 } else { 0.0 }),
        Value::String(s) if s.is_empty() => Ok(0.0),
        Value::String(s) => s
            .parse::<f64>()
            .map_err(|_| DecodeError::invalid_value(Unexpected::Str(&s), &"a floating point number")),
        other => Err(DecodeError::invalid_type(unexpected(&other), &"a floating point number")),
    }
}

pub(crate) fn to_string(value: Value) -> Result<String, DecodeError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(if b { "1" } else { "0" }.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(DecodeError::invalid_type(unexpected(&other), &"a string")),
    }
}

/// Coerces a value into sequence elements.
///
/// A string is split on [`SEQUENCE_DELIMITER`] without trimming; any other
/// single value becomes a one-element sequence.
pub(crate) fn to_seq(value: Value) -> Result<Vec<Value>, DecodeError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        Value::String(s) if s.is_empty() => Ok(Vec::new()),
        Value::String(s) => Ok(s
            .split(SEQUENCE_DELIMITER)
            .map(|part| Value::String(part.to_string()))
            .collect()),
        Value::Object(map) if map.is_empty() => Ok(Vec::new()),
        single => Ok(vec![single]),
    }
}

/// Coerces a value into map entries; a sequence of maps is merged in order.
pub(crate) fn to_map(value: Value) -> Result<Map<String, Value>, DecodeError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        Value::Array(items) => {
            let mut merged = Map::new();
            for (index, item) in items.into_iter().enumerate() {
                match item {
                    Value::Object(map) => merged.extend(map),
                    other => {
                        return Err(DecodeError::invalid_type(unexpected(&other), &"a map")
                            .within(&format!("[{index}]")));
                    }
                }
            }
            Ok(merged)
        }
        other => Err(DecodeError::invalid_type(unexpected(&other), &"a map")),
    }
}

fn truncate_signed(f: f64) -> Option<i64> {
    (f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64).then(|| f.trunc() as i64)
}

fn truncate_unsigned(f: f64) -> Option<u64> {
    (f.is_finite() && f >= 0.0 && f < u64::MAX as f64).then(|| f.trunc() as u64)
}

fn split_sign(text: &str) -> (bool, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = text.strip_prefix('+') {
        (false, rest)
    } else {
        (false, text)
    }
}

/// Parses an unsigned integer literal: `0x`, `0o`, `0b` prefixes, or a
/// leading `0` for octal, otherwise decimal.
fn parse_magnitude(digits: &str) -> Option<u64> {
    let (radix, body) = match digits.as_bytes() {
        [b'0', b'x' | b'X', ..] => (16, &digits[2..]),
        [b'0', b'o' | b'O', ..] => (8, &digits[2..]),
        [b'0', b'b' | b'B', ..] => (2, &digits[2..]),
        [b'0', _, ..] => (8, &digits[1..]),
        _ => (10, digits),
    };
    if body.is_empty() || body.starts_with(['+', '-']) {
        return None;
    }
    u64::from_str_radix(body, radix).ok()
}

fn parse_signed(text: &str) -> Option<i64> {
    let (negative, digits) = split_sign(text);
    let magnitude = i128::from(parse_magnitude(digits)?);
    i64::try_from(if negative { -magnitude } else { magnitude }).ok()
}

fn parse_unsigned(text: &str) -> Option<u64> {
    match split_sign(text) {
        (false, digits) => parse_magnitude(digits),
        (true, _) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_loose_key_eq() {
        assert!(loose_key_eq("trusted_ips", "trustedIPs"));
        assert!(loose_key_eq("Trusted-IPs", "trustedIPs"));
        assert!(loose_key_eq("HTTP_Status_Banned", "httpStatusBanned"));
        assert!(!loose_key_eq("trusted", "trustedIPs"));
        assert!(!loose_key_eq("ips_trusted", "trustedIPs"));
    }

    #[test]
    fn test_bool_from_strings_and_numbers() {
        assert!(to_bool(json!("true")).unwrap());
        assert!(to_bool(json!("T")).unwrap());
        assert!(to_bool(json!(1)).unwrap());
        assert!(!to_bool(json!("")).unwrap());
        assert!(!to_bool(json!("False")).unwrap());
        assert!(!to_bool(json!(0)).unwrap());
        assert!(to_bool(json!("yes")).is_err());
        assert!(to_bool(json!({"a": 1})).is_err());
    }

    #[test]
    fn test_integer_literals() {
        assert_eq!(to_i64(json!("42")).unwrap(), 42);
        assert_eq!(to_i64(json!("-17")).unwrap(), -17);
        assert_eq!(to_i64(json!("0x1F")).unwrap(), 31);
        assert_eq!(to_i64(json!("0b101")).unwrap(), 5);
        assert_eq!(to_i64(json!("010")).unwrap(), 8);
        assert_eq!(to_i64(json!("")).unwrap(), 0);
        assert_eq!(to_i64(json!(true)).unwrap(), 1);
        assert_eq!(to_i64(json!(3.9)).unwrap(), 3);
        assert!(to_i64(json!("08")).is_err());
        assert!(to_i64(json!("12abc")).is_err());
        assert!(to_i64(json!(u64::MAX)).is_err());
    }

    #[test]
    fn test_unsigned_rejects_negative() {
        assert_eq!(to_u64(json!("+7")).unwrap(), 7);
        assert!(to_u64(json!("-1")).is_err());
        assert!(to_u64(json!(-1)).is_err());
        assert!(to_u64(json!(-0.5)).is_err());
    }

    #[test]
    fn test_float_and_string() {
        assert_eq!(to_f64(json!("0.25")).unwrap(), 0.25);
        assert_eq!(to_f64(json!(2)).unwrap(), 2.0);
        assert_eq!(to_string(json!(8080)).unwrap(), "8080");
        assert_eq!(to_string(json!(true)).unwrap(), "1");
        assert!(to_string(json!({"nested": "map"})).is_err());
        assert!(to_string(json!(["a"])).is_err());
    }

    #[test]
    fn test_sequence_coercion() {
        assert_eq!(to_seq(json!("x,y,z")).unwrap(), vec![json!("x"), json!("y"), json!("z")]);
        assert_eq!(to_seq(json!("a, b")).unwrap(), vec![json!("a"), json!(" b")]);
        assert!(to_seq(json!("")).unwrap().is_empty());
        assert!(to_seq(json!({})).unwrap().is_empty());
        assert_eq!(to_seq(json!(5)).unwrap(), vec![json!(5)]);
    }

    #[test]
    fn test_map_coercion() {
        let merged = to_map(json!([{"a": 1}, {"b": 2, "a": 3}])).unwrap();
        assert_eq!(merged.get("a"), Some(&json!(3)));
        assert_eq!(merged.get("b"), Some(&json!(2)));
        assert!(to_map(json!([])).unwrap().is_empty());

        let err = to_map(json!([{"a": 1}, "oops"])).unwrap_err();
        assert_eq!(err.path(), Some("[1]"));
        assert!(to_map(json!("scalar")).is_err());
    }
}

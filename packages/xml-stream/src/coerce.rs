//! Scalar coercion shared by attributes, text and child values.
//!
//! Coercion never fails: numeric text that cannot be parsed becomes NaN and
//! an unparseable date becomes `Null`. Numbers are read from the longest
//! valid prefix, so `"12px"` coerces to `12`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::config::UNZONED_TIMESTAMP_LEN;
use crate::schema::ValueType;
use crate::value::Value;

/// Coerce raw text to a value of the declared type.
pub fn coerce_str(raw: &str, value_type: ValueType) -> Value {
    let text = raw.trim();
    match value_type {
        ValueType::Integer => parse_integer(text),
        ValueType::Number => parse_number(text),
        ValueType::Date => parse_date(text).map_or(Value::Null, Value::Date),
        ValueType::String | ValueType::Object => Value::String(text.to_string()),
    }
}

/// Coerce an already built value.
///
/// Only text is converted; structured and typed values pass through.
pub fn coerce_value(value: Value, value_type: ValueType) -> Value {
    match value {
        Value::String(s) => coerce_str(&s, value_type),
        other => other,
    }
}

fn parse_integer(text: &str) -> Value {
    let sign_len = usize::from(text.starts_with(['+', '-']));
    let digits = text[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return Value::Float(f64::NAN);
    }

    let literal = &text[..sign_len + digits];
    match literal.parse::<i64>() {
        Ok(i) => Value::Int(i),
        // Out of i64 range: keep the magnitude as a float.
        Err(_) => Value::Float(literal.parse::<f64>().unwrap_or(f64::NAN)),
    }
}

fn parse_number(text: &str) -> Value {
    let bytes = text.as_bytes();
    let mut end = usize::from(text.starts_with(['+', '-']));
    let sign_len = end;

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return match &text[sign_len..] {
            rest if rest.starts_with("Infinity") => {
                if text.starts_with('-') {
                    Value::Float(f64::NEG_INFINITY)
                } else {
                    Value::Float(f64::INFINITY)
                }
            }
            _ => Value::Float(f64::NAN),
        };
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let exp_sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_digits = count_digits(&bytes[(end + 1 + exp_sign).min(bytes.len())..]);
        if exp_digits > 0 {
            end += 1 + exp_sign + exp_digits;
        }
    }

    Value::Float(text[..end].parse::<f64>().unwrap_or(f64::NAN))
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Parse a timestamp.
///
/// A value of exactly [`UNZONED_TIMESTAMP_LEN`] characters carries no zone
/// and is read as UTC. Date-only values are midnight UTC.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if text.chars().count() == UNZONED_TIMESTAMP_LEN {
        return DateTime::parse_from_rfc3339(&format!("{text}Z"))
            .ok()
            .map(|d| d.with_timezone(&Utc));
    }

    if let Ok(d) = DateTime::parse_from_rfc3339(text) {
        return Some(d.with_timezone(&Utc));
    }
    if let Ok(d) = DateTime::parse_from_rfc2822(text) {
        return Some(d.with_timezone(&Utc));
    }
    if let Ok(d) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(d.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn is_nan(value: &Value) -> bool {
        value.as_float().is_some_and(f64::is_nan)
    }

    #[test]
    fn test_integer() {
        assert_eq!(coerce_str("42", ValueType::Integer), Value::Int(42));
        assert_eq!(coerce_str(" -7 ", ValueType::Integer), Value::Int(-7));
        assert_eq!(coerce_str("12px", ValueType::Integer), Value::Int(12));
        assert_eq!(coerce_str("3.9", ValueType::Integer), Value::Int(3));
        assert!(is_nan(&coerce_str("abc", ValueType::Integer)));
        assert!(is_nan(&coerce_str("", ValueType::Integer)));
        assert!(is_nan(&coerce_str("-", ValueType::Integer)));
    }

    #[test]
    fn test_integer_overflow_becomes_float() {
        let value = coerce_str("99999999999999999999", ValueType::Integer);
        assert_eq!(value, Value::Float(1e20));
    }

    #[test]
    fn test_number() {
        assert_eq!(coerce_str("3.25", ValueType::Number), Value::Float(3.25));
        assert_eq!(coerce_str(".5", ValueType::Number), Value::Float(0.5));
        assert_eq!(coerce_str("1e3", ValueType::Number), Value::Float(1000.0));
        assert_eq!(coerce_str("2.5e", ValueType::Number), Value::Float(2.5));
        assert_eq!(coerce_str("7.", ValueType::Number), Value::Float(7.0));
        assert_eq!(
            coerce_str("-Infinity", ValueType::Number),
            Value::Float(f64::NEG_INFINITY)
        );
        assert!(is_nan(&coerce_str("n/a", ValueType::Number)));
        assert!(is_nan(&coerce_str(".", ValueType::Number)));
    }

    #[test]
    fn test_unzoned_timestamp_is_utc() {
        let expected = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            coerce_str("2020-01-01T00:00:00", ValueType::Date),
            Value::Date(expected)
        );
        assert_eq!(
            coerce_str("2020-01-01T00:00:00Z", ValueType::Date),
            Value::Date(expected)
        );
    }

    #[test]
    fn test_date_with_offset() {
        let expected = Utc.with_ymd_and_hms(2020, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(
            coerce_str("2020-01-01T12:00:00+02:00", ValueType::Date),
            Value::Date(expected)
        );
    }

    #[test]
    fn test_date_only() {
        let expected = Utc.with_ymd_and_hms(2021, 6, 30, 0, 0, 0).unwrap();
        assert_eq!(
            coerce_str("2021-06-30", ValueType::Date),
            Value::Date(expected)
        );
    }

    #[test]
    fn test_invalid_date_is_null() {
        assert_eq!(coerce_str("yesterday", ValueType::Date), Value::Null);
    }

    #[test]
    fn test_string_is_trimmed() {
        assert_eq!(
            coerce_str("  hello world \n", ValueType::String),
            Value::from("hello world")
        );
    }

    #[test]
    fn test_coerce_value_passes_typed_values() {
        assert_eq!(
            coerce_value(Value::Int(5), ValueType::String),
            Value::Int(5)
        );
        assert_eq!(
            coerce_value(Value::from("5"), ValueType::Integer),
            Value::Int(5)
        );
        let object = Value::object();
        assert_eq!(coerce_value(object.clone(), ValueType::Integer), object);
    }
}

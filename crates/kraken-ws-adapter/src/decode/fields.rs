/*
[INPUT]:  Positional JSON values from market-data payloads
[OUTPUT]: Coerced decimals, integers, timestamps and strings, or PayloadField errors
[POS]:    Decode layer - field coercion helpers
[UPDATE]: When Kraken changes numeric encodings
*/

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Value};

use crate::error::{DecodeError, ExpectedType, Result};

/// Positional view over a payload array, optionally labelled with the object key it came from
#[derive(Debug, Clone, Copy)]
pub(crate) struct Fields<'a> {
    values: &'a [Value],
    key: Option<&'static str>,
}

impl<'a> Fields<'a> {
    pub(crate) fn positional(values: &'a [Value]) -> Self {
        Self { values, key: None }
    }

    /// Array stored under `key` in an object payload
    pub(crate) fn keyed(object: &'a Map<String, Value>, key: &'static str) -> Result<Self> {
        object
            .get(key)
            .and_then(Value::as_array)
            .map(|values| Self {
                values,
                key: Some(key),
            })
            .ok_or_else(|| DecodeError::keyed_field(key, 0, ExpectedType::Array))
    }

    /// One row nested under an object key, e.g. a single level of `as`
    pub(crate) fn keyed_row(values: &'a [Value], key: &'static str) -> Self {
        Self {
            values,
            key: Some(key),
        }
    }

    pub(crate) fn values(&self) -> &'a [Value] {
        self.values
    }

    pub(crate) fn error(&self, index: usize, expected: ExpectedType) -> DecodeError {
        DecodeError::PayloadField {
            key: self.key,
            index,
            expected,
        }
    }

    fn coerce<T>(
        &self,
        index: usize,
        expected: ExpectedType,
        parse: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Result<T> {
        self.values
            .get(index)
            .and_then(parse)
            .ok_or_else(|| self.error(index, expected))
    }

    pub(crate) fn decimal(&self, index: usize) -> Result<Decimal> {
        self.coerce(index, ExpectedType::Decimal, parse_decimal)
    }

    pub(crate) fn integer(&self, index: usize) -> Result<u64> {
        self.coerce(index, ExpectedType::Integer, parse_integer)
    }

    pub(crate) fn timestamp(&self, index: usize) -> Result<DateTime<Utc>> {
        self.coerce(index, ExpectedType::Timestamp, parse_timestamp)
    }

    pub(crate) fn str(&self, index: usize) -> Result<&'a str> {
        self.coerce(index, ExpectedType::String, Value::as_str)
    }

    pub(crate) fn object(&self, index: usize) -> Result<&'a Map<String, Value>> {
        self.coerce(index, ExpectedType::Object, Value::as_object)
    }
}

/// Kraken sends prices and volumes as strings; plain JSON numbers are accepted too
pub(crate) fn parse_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(raw) => parse_decimal_str(raw),
        Value::Number(number) => parse_decimal_str(&number.to_string()),
        _ => None,
    }
}

fn parse_decimal_str(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

pub(crate) fn parse_integer(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    }
}

/// Fractional epoch seconds, e.g. `"1542057314.748456"`
pub(crate) fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let seconds = parse_decimal(value)?;
    let whole = seconds.trunc();
    let nanos = ((seconds - whole) * Decimal::from(1_000_000_000u32))
        .trunc()
        .to_u32()?;
    DateTime::from_timestamp(whole.to_i64()?, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decimal_accepts_strings_and_numbers() {
        assert_eq!(parse_decimal(&json!("5698.40000")), Some(Decimal::new(56984, 1)));
        assert_eq!(parse_decimal(&json!(2.5)), Some(Decimal::new(25, 1)));
        assert_eq!(parse_decimal(&json!("1.5e3")), Some(Decimal::from(1500)));
        assert_eq!(parse_decimal(&json!("")), None);
        assert_eq!(parse_decimal(&json!("abc")), None);
        assert_eq!(parse_decimal(&json!(null)), None);
    }

    #[test]
    fn test_integer_accepts_strings_and_numbers() {
        assert_eq!(parse_integer(&json!(12)), Some(12));
        assert_eq!(parse_integer(&json!("12")), Some(12));
        assert_eq!(parse_integer(&json!(-1)), None);
        assert_eq!(parse_integer(&json!("1.5")), None);
    }

    #[test]
    fn test_timestamp_keeps_microseconds() {
        let ts = parse_timestamp(&json!("1542057314.748456")).unwrap();
        assert_eq!(ts.timestamp(), 1542057314);
        assert_eq!(ts.timestamp_subsec_micros(), 748456);
        assert!(parse_timestamp(&json!("-1.5")).is_none());
    }

    #[test]
    fn test_missing_field_reports_index_and_key() {
        let values = vec![json!("1.0")];
        let fields = Fields::positional(&values);
        assert_eq!(fields.decimal(0).unwrap(), Decimal::ONE);
        match fields.decimal(1) {
            Err(DecodeError::PayloadField { key, index, expected }) => {
                assert_eq!(key, None);
                assert_eq!(index, 1);
                assert_eq!(expected, ExpectedType::Decimal);
            }
            other => panic!("Expected PayloadField, got {other:?}"),
        }

        let object = json!({ "a": ["x"] });
        let keyed = Fields::keyed(object.as_object().unwrap(), "a").unwrap();
        assert!(matches!(
            keyed.decimal(0),
            Err(DecodeError::PayloadField { key: Some("a"), index: 0, .. })
        ));
        assert!(Fields::keyed(object.as_object().unwrap(), "b").is_err());
    }
}

//! Lenient numeric decoding
//!
//! Stored blobs were produced by browser forms. Numeric fields may be missing,
//! `null`, strings or garbage; all of these decode to zero rather than failing
//! the whole array.

use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decodes a decimal, coalescing anything unusable to zero.
pub(crate) fn decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(decimal_from_value(&Value::deserialize(deserializer)?))
}

/// Decodes an optional decimal. `null` stays absent, garbage becomes zero.
pub(crate) fn optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;

    Ok(value
        .filter(|value| !value.is_null())
        .map(|value| decimal_from_value(&value)))
}

/// Decodes a non-negative quantity. Fractions are truncated like `parseInt`.
pub(crate) fn quantity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(quantity_from_value(&Value::deserialize(deserializer)?))
}

/// Decodes an optional quantity.
pub(crate) fn optional_quantity<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;

    Ok(value
        .filter(|value| !value.is_null())
        .map(|value| quantity_from_value(&value)))
}

/// Decodes an identifier that may have been stored as a string or a number.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

pub(crate) fn decimal_from_value(value: &Value) -> Decimal {
    match value {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Decimal::from(int)
            } else if let Some(uint) = number.as_u64() {
                Decimal::from(uint)
            } else {
                // Parse the printed form so `0.1` stays exactly `0.1`.
                number
                    .to_string()
                    .parse()
                    .ok()
                    .or_else(|| number.as_f64().and_then(Decimal::from_f64))
                    .unwrap_or(Decimal::ZERO)
            }
        }
        Value::String(text) => text.trim().parse().unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

fn quantity_from_value(value: &Value) -> u32 {
    match value {
        Value::Number(number) => {
            if let Some(uint) = number.as_u64() {
                u32::try_from(uint).unwrap_or(u32::MAX)
            } else {
                number
                    .as_f64()
                    .and_then(Decimal::from_f64)
                    .and_then(|dec| dec.trunc().to_u32())
                    .unwrap_or(0)
            }
        }
        Value::String(text) => text
            .trim()
            .parse::<Decimal>()
            .ok()
            .and_then(|dec| dec.trunc().to_u32())
            .unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;
    use serde_json::json;

    use super::*;

    #[test]
    fn numbers_decode_exactly() {
        assert_eq!(decimal_from_value(&json!(20)), dec!(20));
        assert_eq!(decimal_from_value(&json!(12.5)), dec!(12.5));
    }

    #[test]
    fn garbage_decodes_to_zero() {
        assert_eq!(decimal_from_value(&json!(null)), Decimal::ZERO);
        assert_eq!(decimal_from_value(&json!("abc")), Decimal::ZERO);
        assert_eq!(decimal_from_value(&json!({"x": 1})), Decimal::ZERO);
    }

    #[test]
    fn numeric_strings_are_parsed() {
        assert_eq!(decimal_from_value(&json!(" 7.25 ")), dec!(7.25));
    }

    #[test]
    fn quantities_truncate_and_clamp_negative_to_zero() {
        assert_eq!(quantity_from_value(&json!(3)), 3);
        assert_eq!(quantity_from_value(&json!(3.9)), 3);
        assert_eq!(quantity_from_value(&json!(-2)), 0);
        assert_eq!(quantity_from_value(&json!("4")), 4);
        assert_eq!(quantity_from_value(&json!(null)), 0);
    }
}

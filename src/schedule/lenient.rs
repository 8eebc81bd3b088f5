//! Forgiving readers for the numeric schedule fields. Hand-edited and
//! server-side schedules carry fractions, negatives and the odd string; those
//! are coerced to whole non-negative seconds instead of failing the whole file.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Whole non-negative count from any JSON value: fractions floor, numeric
/// strings parse, everything else (negative, NaN, null, text) is 0.
fn coerce(value: &Value) -> u32 {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() && n > 0.0 => n.floor().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

/// `null` stays unset so the caller's fallback applies.
fn coerce_opt(value: &Value) -> Option<u32> {
    match value {
        Value::Null => None,
        Value::Number(_) | Value::String(_) | Value::Bool(_) => Some(coerce(value)),
        _ => None,
    }
}

pub(crate) fn seconds<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(coerce(&Value::deserialize(deserializer)?))
}

pub(crate) fn seconds_opt<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(coerce_opt(&Value::deserialize(deserializer)?))
}

/// Sparse override arrays: each hole or `null` stays `None`. A non-array is
/// treated as absent.
pub(crate) fn sparse<'de, D>(deserializer: D) -> Result<Option<Vec<Option<u32>>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(items.iter().map(coerce_opt).collect()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerces_to_whole_seconds() {
        assert_eq!(coerce(&json!(7)), 7);
        assert_eq!(coerce(&json!(7.9)), 7);
        assert_eq!(coerce(&json!(-5)), 0);
        assert_eq!(coerce(&json!(-0.5)), 0);
        assert_eq!(coerce(&json!("12")), 12);
        assert_eq!(coerce(&json!("soon")), 0);
        assert_eq!(coerce(&json!(null)), 0);
        assert_eq!(coerce(&json!([3])), 0);
        assert_eq!(coerce(&json!(1e12)), u32::MAX);
    }

    #[test]
    fn null_overrides_stay_unset() {
        assert_eq!(coerce_opt(&json!(null)), None);
        assert_eq!(coerce_opt(&json!(0)), Some(0));
        assert_eq!(coerce_opt(&json!(-3)), Some(0));
        assert_eq!(coerce_opt(&json!({})), None);
    }
}

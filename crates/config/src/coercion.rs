//! Per-kind normalization of raw values into typed field values

use crate::value::RawValue;
use types::{ConfigError, Result, ScalarKind, Value};

/// Strings (compared lowercase) that coerce to `true`
pub const TRUTHY: [&str; 3] = ["true", "1", "yes"];

/// Normalize a raw value into the typed value for `kind`
pub fn normalize(kind: ScalarKind, raw: &RawValue) -> Result<Value> {
    match kind {
        ScalarKind::Bool => Ok(Value::Bool(normalize_bool(raw))),
        ScalarKind::Int => normalize_int(raw).map(Value::Int),
        ScalarKind::Float => normalize_float(raw).map(Value::Float),
        ScalarKind::Str => Ok(Value::Str(normalize_str(raw))),
    }
}

/// Booleans pass through; anything else is true only for a truthy string.
/// Never fails.
pub fn normalize_bool(raw: &RawValue) -> bool {
    match raw {
        RawValue::Bool(b) => *b,
        other => {
            let text = other.to_string().trim().to_lowercase();
            TRUTHY.contains(&text.as_str())
        }
    }
}

pub fn normalize_int(raw: &RawValue) -> Result<i64> {
    match raw {
        RawValue::Int(i) => Ok(*i),
        RawValue::Bool(b) => Ok(i64::from(*b)),
        // i64::MAX as f64 rounds up to 2^63, one past the range
        RawValue::Float(x)
            if x.fract() == 0.0 && *x >= i64::MIN as f64 && *x < i64::MAX as f64 =>
        {
            Ok(*x as i64)
        }
        RawValue::Str(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| ConfigError::invalid_field(s)),
        other => Err(ConfigError::invalid_field(other)),
    }
}

pub fn normalize_float(raw: &RawValue) -> Result<f64> {
    match raw {
        RawValue::Float(x) => Ok(*x),
        RawValue::Int(i) => Ok(*i as f64),
        RawValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        RawValue::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ConfigError::invalid_field(s)),
        other => Err(ConfigError::invalid_field(other)),
    }
}

/// String representation of any raw value. Never fails.
pub fn normalize_str(raw: &RawValue) -> String {
    match raw {
        RawValue::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_truthy_strings_any_case() {
        for payload in ["true", "True", "TRUE", "1", "yes", "Yes", "YES"] {
            assert!(normalize_bool(&RawValue::from(payload)), "{payload}");
        }
        assert!(normalize_bool(&RawValue::Bool(true)));
        assert!(normalize_bool(&RawValue::Int(1)));
    }

    #[test]
    fn test_bool_everything_else_is_false() {
        for payload in ["no", "None", "false", "0", "", "y", "on", "garbage"] {
            assert!(!normalize_bool(&RawValue::from(payload)), "{payload}");
        }
        assert!(!normalize_bool(&RawValue::Bool(false)));
        assert!(!normalize_bool(&RawValue::Int(2)));
    }

    #[test]
    fn test_int_normalize() {
        assert_eq!(normalize_int(&RawValue::Int(5432)).unwrap(), 5432);
        assert_eq!(normalize_int(&RawValue::from("5432")).unwrap(), 5432);
        assert_eq!(normalize_int(&RawValue::from(" 8500\n")).unwrap(), 8500);
        assert_eq!(normalize_int(&RawValue::from("-12")).unwrap(), -12);
        assert_eq!(normalize_int(&RawValue::Float(42.0)).unwrap(), 42);
    }

    #[test]
    fn test_int_normalize_failed() {
        for payload in ["foo", "abc123", "3.14", ""] {
            let err = normalize_int(&RawValue::from(payload)).unwrap_err();
            assert_eq!(err, ConfigError::invalid_field(payload));
        }
        assert!(normalize_int(&RawValue::Float(3.5)).is_err());
    }

    #[test]
    fn test_int_rejects_out_of_range_floats() {
        for payload in [1e20, -1e20, 9_223_372_036_854_775_808.0, f64::INFINITY, f64::NAN] {
            assert!(
                matches!(
                    normalize_int(&RawValue::Float(payload)),
                    Err(ConfigError::InvalidField { .. })
                ),
                "{payload}"
            );
        }
        assert_eq!(normalize_int(&RawValue::Float(-9_223_372_036_854_775_808.0)).unwrap(), i64::MIN);
    }

    #[test]
    fn test_float_normalize() {
        assert_eq!(normalize_float(&RawValue::Float(3.14)).unwrap(), 3.14);
        assert_eq!(normalize_float(&RawValue::from("3.14")).unwrap(), 3.14);
        assert_eq!(normalize_float(&RawValue::Int(3)).unwrap(), 3.0);
    }

    #[test]
    fn test_float_normalize_failed() {
        for payload in ["foo", "abc123"] {
            assert!(matches!(
                normalize_float(&RawValue::from(payload)),
                Err(ConfigError::InvalidField { .. })
            ));
        }
    }

    #[test]
    fn test_str_normalize() {
        assert_eq!(normalize_str(&RawValue::from("top_secret")), "top_secret");
        assert_eq!(normalize_str(&RawValue::Int(8500)), "8500");
        assert_eq!(normalize_str(&RawValue::Bool(false)), "false");
        assert_eq!(normalize_str(&RawValue::Float(1.0)), "1.0");
        assert_eq!(normalize_str(&RawValue::Float(0.25)), "0.25");
    }

    #[test]
    fn test_integral_float_is_not_truthy() {
        assert!(!normalize_bool(&RawValue::Float(1.0)));
        assert!(!normalize_bool(&RawValue::Float(0.0)));
    }

    #[test]
    fn test_normalize_dispatches_on_kind() {
        let raw = RawValue::from("8500");
        assert_eq!(normalize(ScalarKind::Int, &raw).unwrap(), Value::Int(8500));
        assert_eq!(normalize(ScalarKind::Float, &raw).unwrap(), Value::Float(8500.0));
        assert_eq!(normalize(ScalarKind::Str, &raw).unwrap(), Value::from("8500"));
        assert_eq!(normalize(ScalarKind::Bool, &raw).unwrap(), Value::Bool(false));
    }
}

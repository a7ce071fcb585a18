//! Per-field validators
//!
//! A validator sees the normalized value and returns `false` to reject it.
//! Rejected values are never stored; the setter fails with `InvalidField`.

use std::sync::Arc;
use types::Value;

/// Shared validation hook attached to a field declaration
pub type Validator = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Wrap a closure as a [`Validator`]
pub fn validator<F>(check: F) -> Validator
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Arc::new(check)
}

/// Integer within `min..=max`
pub fn int_range(min: i64, max: i64) -> Validator {
    validator(move |value| matches!(value.as_int(), Some(i) if (min..=max).contains(&i)))
}

/// Float within `min..=max`
pub fn float_range(min: f64, max: f64) -> Validator {
    validator(move |value| matches!(value.as_float(), Some(x) if x >= min && x <= max))
}

/// String equal to one of `allowed`
pub fn one_of(allowed: &[&str]) -> Validator {
    let allowed: Vec<String> = allowed.iter().map(|s| s.to_string()).collect();
    validator(move |value| {
        value
            .as_str()
            .map(|s| allowed.iter().any(|a| a == s))
            .unwrap_or(false)
    })
}

/// String that is not empty after trimming
pub fn non_empty() -> Validator {
    validator(|value| value.as_str().map(|s| !s.trim().is_empty()).unwrap_or(true))
}

/// TCP/UDP port number
pub fn port() -> Validator {
    int_range(1, u16::MAX as i64)
}

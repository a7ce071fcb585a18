//! Raw, untyped configuration values as supplied by dictionary sources

use crate::schema::Schema;
use std::collections::BTreeMap;
use std::fmt;
use types::{ConfigError, Result, Value};

/// Dictionary-shaped configuration source, possibly containing nested sections
pub type RawConfig = BTreeMap<String, RawValue>;

/// A value as it arrives from a source, before coercion
#[derive(Debug, Clone)]
pub enum RawValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Nested section, loaded into a nested schema field
    Map(RawConfig),
    /// Pre-built schema instance, injected into a nested field as a whole
    Schema(Box<Schema>),
}

impl RawValue {
    pub fn as_map(&self) -> Option<&RawConfig> {
        match self {
            RawValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            RawValue::Bool(_) => "bool",
            RawValue::Int(_) => "int",
            RawValue::Float(_) => "float",
            RawValue::Str(_) => "string",
            RawValue::Map(_) => "mapping",
            RawValue::Schema(_) => "schema",
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Bool(b) => write!(f, "{}", b),
            RawValue::Int(i) => write!(f, "{}", i),
            RawValue::Float(x) => write!(f, "{:?}", x),
            RawValue::Str(s) => f.write_str(s),
            RawValue::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
            RawValue::Schema(schema) => write!(f, "<schema {}>", schema.schema_type().name()),
        }
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Int(value)
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        RawValue::Int(value.into())
    }
}

impl From<u16> for RawValue {
    fn from(value: u16) -> Self {
        RawValue::Int(value.into())
    }
}

impl From<u32> for RawValue {
    fn from(value: u32) -> Self {
        RawValue::Int(value.into())
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Float(value)
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Str(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Str(value.to_string())
    }
}

impl From<RawConfig> for RawValue {
    fn from(value: RawConfig) -> Self {
        RawValue::Map(value)
    }
}

impl From<Schema> for RawValue {
    fn from(value: Schema) -> Self {
        RawValue::Schema(Box::new(value))
    }
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(b) => RawValue::Bool(b),
            Value::Int(i) => RawValue::Int(i),
            Value::Float(x) => RawValue::Float(x),
            Value::Str(s) => RawValue::Str(s),
        }
    }
}

impl TryFrom<serde_json::Value> for RawValue {
    type Error = ConfigError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Bool(b) => Ok(RawValue::Bool(b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(RawValue::Int(i)),
                None => n.as_f64().map(RawValue::Float).ok_or_else(|| {
                    ConfigError::ImproperlyConfigured(format!("Unrepresentable number: {}", n))
                }),
            },
            serde_json::Value::String(s) => Ok(RawValue::Str(s)),
            serde_json::Value::Object(map) => raw_config_from_json_map(map).map(RawValue::Map),
            serde_json::Value::Array(_) => Err(ConfigError::ImproperlyConfigured(
                "Arrays are not supported as configuration values".to_string(),
            )),
            serde_json::Value::Null => Err(ConfigError::ImproperlyConfigured(
                "Null is not a configuration value".to_string(),
            )),
        }
    }
}

/// Convert a parsed JSON document into a `RawConfig`.
///
/// The document must be an object (or null, which yields an empty config).
/// Null entries are dropped so that they behave like missing keys.
pub fn raw_config_from_json(value: serde_json::Value) -> Result<RawConfig> {
    match value {
        serde_json::Value::Object(map) => raw_config_from_json_map(map),
        serde_json::Value::Null => Ok(RawConfig::new()),
        other => Err(ConfigError::ImproperlyConfigured(format!(
            "Top-level configuration must be a mapping, got {}",
            other
        ))),
    }
}

fn raw_config_from_json_map(map: serde_json::Map<String, serde_json::Value>) -> Result<RawConfig> {
    let mut raw = RawConfig::new();
    for (key, value) in map {
        if value.is_null() {
            continue;
        }
        raw.insert(key, RawValue::try_from(value)?);
    }
    Ok(raw)
}

/// Build a [`RawConfig`] from `key => value` pairs.
///
/// Values go through `RawValue::from`, so nested sections can be written as
/// nested `raw_config!` invocations.
#[macro_export]
macro_rules! raw_config {
    () => {
        $crate::RawConfig::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut raw = $crate::RawConfig::new();
        $(
            raw.insert(::std::string::String::from($key), $crate::RawValue::from($value));
        )+
        raw
    }};
}

//! Field declarations and per-instance field descriptors

use crate::coercion;
use crate::env::EnvSource;
use crate::schema::{Schema, SchemaType};
use crate::validation::Validator;
use crate::value::{RawConfig, RawValue};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use types::{ConfigError, Result, ScalarKind, Value};

/// What a field holds
#[derive(Debug, Clone)]
pub enum FieldKind {
    Scalar(ScalarKind),
    Nested(Arc<SchemaType>),
}

/// Field declaration used while building a schema type
#[derive(Clone)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) kind: FieldKind,
    pub(crate) default: Option<RawValue>,
    pub(crate) key: Option<String>,
    pub(crate) env: Option<String>,
    pub(crate) file_path: Option<String>,
    pub(crate) external_path: Option<String>,
    pub(crate) readonly: bool,
    pub(crate) validators: Vec<Validator>,
}

impl Field {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            key: None,
            env: None,
            file_path: None,
            external_path: None,
            readonly: false,
            validators: Vec::new(),
        }
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Scalar(ScalarKind::Bool))
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Scalar(ScalarKind::Int))
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Scalar(ScalarKind::Float))
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Scalar(ScalarKind::Str))
    }

    /// Field holding a full instance of `schema_type`
    pub fn nested(name: impl Into<String>, schema_type: &Arc<SchemaType>) -> Self {
        Self::new(name, FieldKind::Nested(Arc::clone(schema_type)))
    }

    /// Default value, normalized when the schema type is built
    pub fn default(mut self, value: impl Into<RawValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Lookup name in dictionary sources; defaults to the field name
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Environment variable name; defaults to the uppercased field name
    pub fn env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    /// Path relative to a file provider's directory
    pub fn file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Address of the value in an external key/value store
    pub fn external_path(mut self, path: impl Into<String>) -> Self {
        self.external_path = Some(path.into());
        self
    }

    /// Accept one assignment, reject any later mutation
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("default", &self.default)
            .field("readonly", &self.readonly)
            .finish()
    }
}

/// Frozen field metadata, shared by every instance of a schema type
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
    default: Option<Value>,
    key: String,
    env: String,
    file_path: Option<String>,
    external_path: Option<String>,
    readonly: bool,
    validators: Vec<Validator>,
}

impl FieldSpec {
    /// Freeze a declaration: back-fill key and env name, normalize the default.
    pub(crate) fn from_declaration(field: Field) -> Result<Self> {
        if field.name.is_empty() {
            return Err(ConfigError::ImproperlyConfigured(
                "Field name cannot be empty".to_string(),
            ));
        }

        let key = field
            .key
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| field.name.clone());
        let env = field
            .env
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| field.name.to_uppercase());

        let default = match (&field.kind, field.default) {
            (_, None) => None,
            (FieldKind::Nested(_), Some(_)) => {
                return Err(ConfigError::ImproperlyConfigured(format!(
                    "Nested field {} cannot declare a default; set defaults on the nested schema",
                    field.name
                )));
            }
            (FieldKind::Scalar(kind), Some(raw)) => {
                let value = coercion::normalize(*kind, &raw).map_err(|e| {
                    ConfigError::ImproperlyConfigured(format!(
                        "Invalid default for field {}: {}",
                        field.name, e
                    ))
                })?;
                if !field.validators.iter().all(|check| check(&value)) {
                    return Err(ConfigError::ImproperlyConfigured(format!(
                        "Default for field {} fails validation: {}",
                        field.name, value
                    )));
                }
                Some(value)
            }
        };

        Ok(Self {
            name: field.name,
            kind: field.kind,
            default,
            key,
            env,
            file_path: field.file_path,
            external_path: field.external_path,
            readonly: field.readonly,
            validators: field.validators,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn env(&self) -> &str {
        &self.env
    }

    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }

    pub fn external_path(&self) -> Option<&str> {
        self.external_path.as_deref()
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    fn validate(&self, value: &Value) -> Result<()> {
        if self.validators.iter().all(|check| check(value)) {
            Ok(())
        } else {
            Err(ConfigError::invalid_field(value))
        }
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            FieldKind::Scalar(kind) => kind.to_string(),
            FieldKind::Nested(schema_type) => format!("nested({})", schema_type.name()),
        };
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("kind", &kind)
            .field("key", &self.key)
            .field("env", &self.env)
            .field("default", &self.default)
            .field("readonly", &self.readonly)
            .field("validators", &self.validators.len())
            .finish()
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Scalar {
        kind: ScalarKind,
        value: Option<Value>,
    },
    Nested(Box<Schema>),
}

/// One field of a schema instance: shared metadata plus this instance's value
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    spec: Arc<FieldSpec>,
    slot: Slot,
    assigned: bool,
}

impl FieldDescriptor {
    /// Fresh descriptor holding the declared default (or a default child schema)
    pub(crate) fn new(spec: Arc<FieldSpec>) -> Self {
        let slot = match spec.kind() {
            FieldKind::Scalar(kind) => Slot::Scalar {
                kind: *kind,
                value: spec.default_value().cloned(),
            },
            FieldKind::Nested(schema_type) => Slot::Nested(Box::new(Schema::new(schema_type))),
        };
        Self {
            spec,
            slot,
            assigned: false,
        }
    }

    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        self.spec.name()
    }

    pub fn key(&self) -> &str {
        self.spec.key()
    }

    pub fn env(&self) -> &str {
        self.spec.env()
    }

    pub fn file_path(&self) -> Option<&str> {
        self.spec.file_path()
    }

    pub fn external_path(&self) -> Option<&str> {
        self.spec.external_path()
    }

    pub fn is_readonly(&self) -> bool {
        self.spec.is_readonly()
    }

    pub fn is_nested(&self) -> bool {
        matches!(self.slot, Slot::Nested(_))
    }

    /// Whether a value was assigned since construction (defaults don't count)
    pub fn is_assigned(&self) -> bool {
        self.assigned
    }

    /// Read-only and already assigned
    pub fn is_locked(&self) -> bool {
        self.spec.is_readonly() && self.assigned
    }

    /// Current scalar value; `None` for unset fields and nested fields
    pub fn value(&self) -> Option<&Value> {
        match &self.slot {
            Slot::Scalar { value, .. } => value.as_ref(),
            Slot::Nested(_) => None,
        }
    }

    /// The live child schema of a nested field
    pub fn nested(&self) -> Option<&Schema> {
        match &self.slot {
            Slot::Nested(child) => Some(&**child),
            Slot::Scalar { .. } => None,
        }
    }

    pub fn nested_mut(&mut self) -> Option<&mut Schema> {
        match &mut self.slot {
            Slot::Nested(child) => Some(&mut **child),
            Slot::Scalar { .. } => None,
        }
    }

    /// Normalize, validate and store `raw`. Nothing is stored on failure.
    pub fn set_value(&mut self, raw: impl Into<RawValue>) -> Result<()> {
        if self.is_locked() {
            return Err(ConfigError::ReadOnlyField {
                field: self.spec.name().to_string(),
            });
        }

        let raw = raw.into();
        match &mut self.slot {
            Slot::Scalar { kind, value } => {
                let normalized = coercion::normalize(*kind, &raw)?;
                self.spec.validate(&normalized)?;
                *value = Some(normalized);
            }
            Slot::Nested(child) => {
                let replacement = normalize_nested(child.schema_type(), raw)?;
                **child = replacement;
            }
        }
        self.assigned = true;
        Ok(())
    }

    /// Apply `raw[key]` if present; missing keys keep the current value
    pub fn load_from_dict(&mut self, raw: &RawConfig) -> Result<()> {
        let Some(value) = raw.get(self.spec.key()) else {
            return Ok(());
        };
        if self.is_locked() {
            warn!(field = self.spec.name(), "Skipping read-only field already assigned");
            return Ok(());
        }

        if let Slot::Nested(child) = &mut self.slot {
            match value {
                RawValue::Map(section) => return child.load_from_dict(section),
                RawValue::Schema(_) => {}
                other => {
                    return Err(ConfigError::ImproperlyConfigured(format!(
                        "Section {} must be a mapping, got {} {}",
                        self.spec.key(),
                        other.type_name(),
                        other
                    )));
                }
            }
        }

        debug!(field = self.spec.name(), key = self.spec.key(), "Setting field from dict");
        self.set_value(value.clone())
    }

    /// Apply the environment variable if set; nested fields recurse unless locked
    pub fn load_from_env(&mut self, env: &dyn EnvSource) -> Result<()> {
        if self.is_nested() && self.is_locked() {
            warn!(field = self.spec.name(), "Skipping read-only section already assigned");
            return Ok(());
        }
        if let Slot::Nested(child) = &mut self.slot {
            return child.load_from_env_source(env);
        }

        let Some(value) = env.var(self.spec.env()) else {
            return Ok(());
        };
        if self.is_locked() {
            warn!(field = self.spec.name(), "Skipping read-only field already assigned");
            return Ok(());
        }
        debug!(field = self.spec.name(), env = self.spec.env(), "Setting field from environment");
        self.set_value(value)
    }
}

/// Pre-built instances of the same schema type pass through; mappings build
/// a fresh instance; anything else is rejected.
fn normalize_nested(schema_type: &Arc<SchemaType>, raw: RawValue) -> Result<Schema> {
    match raw {
        RawValue::Schema(schema) if Arc::ptr_eq(schema.schema_type(), schema_type) => Ok(*schema),
        RawValue::Map(section) => Schema::with_defaults(schema_type, &section),
        other => Err(ConfigError::invalid_field(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;
    use crate::raw_config;
    use crate::validation;
    use std::collections::HashMap;

    fn consul_type() -> Arc<SchemaType> {
        presets::consul().unwrap()
    }

    fn descriptor(field: Field) -> FieldDescriptor {
        FieldDescriptor::new(Arc::new(FieldSpec::from_declaration(field).unwrap()))
    }

    #[test]
    fn test_key_and_env_backfilled_from_name() {
        let spec = FieldSpec::from_declaration(Field::string("secret_key")).unwrap();
        assert_eq!(spec.key(), "secret_key");
        assert_eq!(spec.env(), "SECRET_KEY");

        let spec =
            FieldSpec::from_declaration(Field::string("host").key("hostname").env("APP_HOST"))
                .unwrap();
        assert_eq!(spec.key(), "hostname");
        assert_eq!(spec.env(), "APP_HOST");
    }

    #[test]
    fn test_default_is_normalized() {
        let spec = FieldSpec::from_declaration(Field::int("port").default("5432")).unwrap();
        assert_eq!(spec.default_value(), Some(&Value::Int(5432)));

        let err = FieldSpec::from_declaration(Field::int("port").default("postgres")).unwrap_err();
        assert!(matches!(err, ConfigError::ImproperlyConfigured(_)));
    }

    #[test]
    fn test_set_value_normalizes() {
        let mut field = descriptor(Field::int("port").default(0));
        assert_eq!(field.value(), Some(&Value::Int(0)));
        assert!(!field.is_assigned());

        field.set_value("8500").unwrap();
        assert_eq!(field.value(), Some(&Value::Int(8500)));
        assert!(field.is_assigned());
    }

    #[test]
    fn test_set_value_failure_keeps_previous_value() {
        let mut field = descriptor(Field::int("port").default(5432));
        let err = field.set_value("abc123").unwrap_err();
        assert_eq!(err, ConfigError::invalid_field("abc123"));
        assert_eq!(field.value(), Some(&Value::Int(5432)));
        assert!(!field.is_assigned());
    }

    #[test]
    fn test_validator_rejection_is_fatal_and_stores_nothing() {
        let mut field = descriptor(
            Field::int("port")
                .default(8500)
                .validator(validation::port()),
        );
        let err = field.set_value(70000).unwrap_err();
        assert_eq!(err, ConfigError::invalid_field(70000));
        assert_eq!(field.value(), Some(&Value::Int(8500)));
    }

    #[test]
    fn test_readonly_accepts_first_assignment_only() {
        let mut field = descriptor(Field::string("token").readonly());
        field.set_value("s3cr3t").unwrap();
        let err = field.set_value("other").unwrap_err();
        assert!(matches!(err, ConfigError::ReadOnlyField { field } if field == "token"));
        assert_eq!(field.value(), Some(&Value::from("s3cr3t")));
    }

    #[test]
    fn test_readonly_skipped_by_dict_loads() {
        let mut field = descriptor(Field::string("token").readonly());
        field.load_from_dict(&raw_config! { "token" => "first" }).unwrap();
        field.load_from_dict(&raw_config! { "token" => "second" }).unwrap();
        assert_eq!(field.value(), Some(&Value::from("first")));
    }

    #[test]
    fn test_load_from_dict_missing_key_is_noop() {
        let mut field = descriptor(Field::bool("debug").default(false));
        field.load_from_dict(&raw_config! { "other" => true }).unwrap();
        assert_eq!(field.value(), Some(&Value::Bool(false)));
        assert!(!field.is_assigned());
    }

    #[test]
    fn test_load_from_env() {
        let mut env = HashMap::new();
        env.insert("DEBUG".to_string(), "yes".to_string());

        let mut field = descriptor(Field::bool("debug").default(false));
        field.load_from_env(&env).unwrap();
        assert_eq!(field.value(), Some(&Value::Bool(true)));

        let mut field = descriptor(Field::int("workers").default(4));
        field.load_from_env(&env).unwrap();
        assert_eq!(field.value(), Some(&Value::Int(4)));
    }

    #[test]
    fn test_nested_field_starts_with_default_child() {
        let consul = consul_type();
        let field = descriptor(Field::nested("consul", &consul));
        let child = field.nested().unwrap();
        assert_eq!(child.get_str("host"), Some("localhost"));
        assert_eq!(child.get_int("port"), Some(8500));
        assert!(field.value().is_none());
    }

    #[test]
    fn test_nested_load_from_dict_section() {
        let consul = consul_type();
        let mut field = descriptor(Field::nested("consul", &consul));
        field
            .load_from_dict(&raw_config! {
                "consul" => raw_config! { "port" => "8501" },
            })
            .unwrap();
        let child = field.nested().unwrap();
        assert_eq!(child.get_int("port"), Some(8501));
        assert_eq!(child.get_str("host"), Some("localhost"));
    }

    #[test]
    fn test_nested_load_from_dict_scalar_is_improper() {
        let consul = consul_type();
        let mut field = descriptor(Field::nested("consul", &consul));
        let err = field
            .load_from_dict(&raw_config! { "consul" => "consul:8500" })
            .unwrap_err();
        assert!(matches!(err, ConfigError::ImproperlyConfigured(_)));
    }

    #[test]
    fn test_nested_injects_prebuilt_schema() {
        let consul = consul_type();
        let mut prebuilt = Schema::new(&consul);
        prebuilt.set("host", "10.0.0.1").unwrap();

        let mut field = descriptor(Field::nested("consul", &consul));
        field
            .load_from_dict(&raw_config! { "consul" => prebuilt })
            .unwrap();
        assert_eq!(field.nested().unwrap().get_str("host"), Some("10.0.0.1"));
        assert!(field.is_assigned());
    }

    #[test]
    fn test_nested_set_value_rejects_foreign_values() {
        let consul = consul_type();
        let other = SchemaType::builder("vault")
            .field(Field::string("host"))
            .build()
            .unwrap();

        let mut field = descriptor(Field::nested("consul", &consul));
        assert!(matches!(
            field.set_value("consul:8500"),
            Err(ConfigError::InvalidField { .. })
        ));
        assert!(matches!(
            field.set_value(Schema::new(&other)),
            Err(ConfigError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_nested_set_value_from_mapping_builds_fresh_child() {
        let consul = consul_type();
        let mut field = descriptor(Field::nested("consul", &consul));
        field.nested_mut().unwrap().set("host", "stale").unwrap();

        field.set_value(raw_config! { "port" => 9500 }).unwrap();
        let child = field.nested().unwrap();
        assert_eq!(child.get_int("port"), Some(9500));
        assert_eq!(child.get_str("host"), Some("localhost"));
    }

    #[test]
    fn test_nested_env_recurses() {
        let consul = consul_type();
        let mut env = HashMap::new();
        env.insert("CONSUL_HOST".to_string(), "consul.service.consul".to_string());

        let mut field = descriptor(Field::nested("consul", &consul).key("discovery"));
        field.load_from_env(&env).unwrap();
        assert_eq!(
            field.nested().unwrap().get_str("host"),
            Some("consul.service.consul")
        );
    }

    fn locked_consul_section() -> FieldDescriptor {
        let consul = consul_type();
        let mut injected = Schema::new(&consul);
        injected.set("host", "consul.injected").unwrap();

        let mut field = descriptor(Field::nested("consul", &consul).readonly());
        field.set_value(injected).unwrap();
        assert!(field.is_locked());
        field
    }

    #[test]
    fn test_readonly_nested_ignores_later_dict_section() {
        let mut field = locked_consul_section();

        let section = raw_config! { "host" => "consul.override", "port" => 9500 };
        field.load_from_dict(&raw_config! { "consul" => section }).unwrap();
        let child = field.nested().unwrap();
        assert_eq!(child.get_str("host"), Some("consul.injected"));
        assert_eq!(child.get_int("port"), Some(8500));

        // A non-mapping section is skipped too, not reported
        field.load_from_dict(&raw_config! { "consul" => "consul:8500" }).unwrap();
    }

    #[test]
    fn test_readonly_nested_ignores_env() {
        let mut field = locked_consul_section();
        let mut env = HashMap::new();
        env.insert("CONSUL_HOST".to_string(), "consul.override".to_string());

        field.load_from_env(&env).unwrap();
        assert_eq!(field.nested().unwrap().get_str("host"), Some("consul.injected"));
    }

    #[test]
    fn test_readonly_nested_recurses_until_assigned() {
        let consul = consul_type();
        let mut field = descriptor(Field::nested("consul", &consul).readonly());

        field
            .load_from_dict(&raw_config! { "consul" => raw_config! { "port" => 9500 } })
            .unwrap();
        assert!(!field.is_locked());
        assert_eq!(field.nested().unwrap().get_int("port"), Some(9500));
    }
}

//! Schema types and schema instances
//!
//! A [`SchemaType`] is the frozen, ordered field table of a configuration
//! structure, built once through [`SchemaBuilder`]. A [`Schema`] is one
//! instance of it, owning its own field values.

use crate::env::{EnvSource, ProcessEnv};
use crate::field::{Field, FieldDescriptor, FieldSpec};
use crate::providers::ValueProvider;
use crate::value::{RawConfig, RawValue};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};
use types::{ConfigError, Result, Value};

/// Immutable field table of a schema
#[derive(Debug)]
pub struct SchemaType {
    name: String,
    parent: Option<String>,
    fields: Vec<Arc<FieldSpec>>,
    index: HashMap<String, usize>,
}

impl SchemaType {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the schema type this one extends, if any
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Field specs in declaration order
    pub fn fields(&self) -> &[Arc<FieldSpec>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.index.get(name).map(|&i| self.fields[i].as_ref())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|spec| spec.name())
    }
}

/// Collects inherited and local field declarations for a new schema type
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    parent: Option<Arc<SchemaType>>,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    /// Inherit every field of `parent`; local fields of the same name replace them
    pub fn extends(mut self, parent: &Arc<SchemaType>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Freeze the field table.
    ///
    /// Inherited fields come first in the parent's order. A local field that
    /// overrides an inherited one takes its position; other local fields
    /// follow in declaration order.
    pub fn build(self) -> Result<Arc<SchemaType>> {
        let mut fields: Vec<Arc<FieldSpec>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        if let Some(parent) = &self.parent {
            for spec in parent.fields() {
                index.insert(spec.name().to_string(), fields.len());
                fields.push(Arc::clone(spec));
            }
        }

        let mut declared = HashSet::new();
        for field in self.fields {
            if !declared.insert(field.name().to_string()) {
                return Err(ConfigError::ImproperlyConfigured(format!(
                    "Field {} declared twice in schema {}",
                    field.name(),
                    self.name
                )));
            }

            let spec = Arc::new(FieldSpec::from_declaration(field)?);
            match index.get(spec.name()) {
                Some(&position) => fields[position] = spec,
                None => {
                    index.insert(spec.name().to_string(), fields.len());
                    fields.push(spec);
                }
            }
        }

        debug!(schema = %self.name, fields = fields.len(), "Schema type built");

        Ok(Arc::new(SchemaType {
            name: self.name,
            parent: self.parent.map(|p| p.name.clone()),
            fields,
            index,
        }))
    }
}

/// An instance of a schema type with independently owned field values
#[derive(Debug, Clone)]
pub struct Schema {
    schema_type: Arc<SchemaType>,
    fields: Vec<FieldDescriptor>,
}

impl Schema {
    /// New instance holding declared defaults
    pub fn new(schema_type: &Arc<SchemaType>) -> Self {
        let fields = schema_type
            .fields()
            .iter()
            .map(|spec| FieldDescriptor::new(Arc::clone(spec)))
            .collect();
        Self {
            schema_type: Arc::clone(schema_type),
            fields,
        }
    }

    /// New instance with `defaults` applied on top of the declared defaults
    pub fn with_defaults(schema_type: &Arc<SchemaType>, defaults: &RawConfig) -> Result<Self> {
        let mut schema = Self::new(schema_type);
        schema.load_from_dict(defaults)?;
        Ok(schema)
    }

    pub fn schema_type(&self) -> &Arc<SchemaType> {
        &self.schema_type
    }

    /// Field descriptors in declaration order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.position(name).map(|i| &self.fields[i])
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FieldDescriptor> {
        let position = self.position(name)?;
        Some(&mut self.fields[position])
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.schema_type.index.get(name).copied()
    }

    /// Current value of a scalar field
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.field(name).and_then(FieldDescriptor::value)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_float)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// The live child schema of a nested field
    pub fn nested(&self, name: &str) -> Option<&Schema> {
        self.field(name).and_then(FieldDescriptor::nested)
    }

    pub fn nested_mut(&mut self, name: &str) -> Option<&mut Schema> {
        self.field_mut(name).and_then(FieldDescriptor::nested_mut)
    }

    /// Resolve a dotted path such as `services.bar.host`
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut schema = self;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                return schema.get(segment);
            }
            schema = schema.nested(segment)?;
        }
        None
    }

    /// Assign a field through normalize, validate and store
    pub fn set(&mut self, name: &str, value: impl Into<RawValue>) -> Result<()> {
        let field = self.field_mut(name).ok_or_else(|| ConfigError::UnknownField {
            field: name.to_string(),
        })?;
        field.set_value(value)
    }

    /// Apply a dictionary source to every field in declaration order.
    ///
    /// Stops at the first failing field; fields before it stay applied.
    pub fn load_from_dict(&mut self, raw: &RawConfig) -> Result<()> {
        for field in &mut self.fields {
            field.load_from_dict(raw)?;
        }
        Ok(())
    }

    /// Apply the process environment
    pub fn load_from_env(&mut self) -> Result<()> {
        self.load_from_env_source(&ProcessEnv)
    }

    /// Apply an environment source to every field in declaration order
    pub fn load_from_env_source(&mut self, env: &dyn EnvSource) -> Result<()> {
        for field in &mut self.fields {
            field.load_from_env(env)?;
        }
        Ok(())
    }

    /// Query every provider for every field; see [`crate::loader::ConfigLoader::load`]
    pub fn load(&mut self, providers: &[&dyn ValueProvider]) -> Result<()> {
        for field in &mut self.fields {
            if field.is_nested() {
                if field.is_locked() {
                    warn!(field = field.name(), "Skipping read-only section already assigned");
                    continue;
                }
                if let Some(child) = field.nested_mut() {
                    child.load(providers)?;
                }
                continue;
            }

            for provider in providers {
                if field.is_locked() {
                    break;
                }
                if let Some(value) = provider.load(field)? {
                    debug!(
                        field = field.name(),
                        provider = provider.name(),
                        "Setting field from provider"
                    );
                    field.set_value(value)?;
                }
            }
        }
        Ok(())
    }
}

impl Serialize for Schema {
    /// Serializes as a mapping of field key to value; unset scalars are omitted
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for field in &self.fields {
            if let Some(child) = field.nested() {
                map.serialize_entry(field.key(), child)?;
            } else if let Some(value) = field.value() {
                map.serialize_entry(field.key(), value)?;
            }
        }
        map.end()
    }
}

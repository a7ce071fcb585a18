//! Declarative configuration schemas
//!
//! Schema types are declared once as ordered tables of typed fields, and
//! schema instances are populated from dictionaries, environment variables,
//! files and pluggable value providers, with per-field coercion and validation.

pub mod coercion;
pub mod env;
pub mod field;
pub mod loader;
pub mod presets;
pub mod providers;
pub mod schema;
pub mod validation;
pub mod value;

pub use env::{EnvSource, ProcessEnv};
pub use field::{Field, FieldDescriptor, FieldKind, FieldSpec};
pub use loader::{ConfigFormat, ConfigLoader};
pub use providers::{EnvValueProvider, FileValueProvider, MapValueProvider, ValueProvider};
pub use schema::{Schema, SchemaBuilder, SchemaType};
pub use validation::Validator;
pub use value::{raw_config_from_json, RawConfig, RawValue};

pub use types::{ConfigError, Result, ScalarKind, Value};

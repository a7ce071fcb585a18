//! Shared types for the configuration framework
//!
//! This crate contains the error taxonomy and the typed scalar values used
//! across the schema and loader components.

pub mod error;
pub mod value;

// Re-export commonly used types
pub use error::{ConfigError, Result};
pub use value::{ScalarKind, Value};

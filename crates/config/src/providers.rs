//! Value providers queried by provider-driven load passes

use crate::env::{EnvSource, ProcessEnv};
use crate::field::FieldDescriptor;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use types::{ConfigError, Result};

/// Source of raw string values for individual fields.
///
/// `Ok(None)` means the source has nothing for the field; an empty string is
/// a value like any other.
pub trait ValueProvider: Send + Sync {
    /// Raw value for `field`, if the source has one
    fn load(&self, field: &FieldDescriptor) -> Result<Option<String>>;

    /// Name used in logs and provider errors
    fn name(&self) -> &str;
}

/// Reads each field's environment variable
pub struct EnvValueProvider<E: EnvSource = ProcessEnv> {
    source: E,
}

impl EnvValueProvider<ProcessEnv> {
    pub fn new() -> Self {
        Self { source: ProcessEnv }
    }
}

impl Default for EnvValueProvider<ProcessEnv> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EnvSource> EnvValueProvider<E> {
    pub fn with_source(source: E) -> Self {
        Self { source }
    }
}

impl<E: EnvSource + Send + Sync> ValueProvider for EnvValueProvider<E> {
    fn load(&self, field: &FieldDescriptor) -> Result<Option<String>> {
        Ok(self.source.var(field.env()))
    }

    fn name(&self) -> &str {
        "env"
    }
}

/// Reads `conf_dir/<file_path>` for fields that declare a file path
#[derive(Debug, Clone)]
pub struct FileValueProvider {
    conf_dir: PathBuf,
}

impl FileValueProvider {
    pub fn new(conf_dir: impl AsRef<Path>) -> Self {
        Self {
            conf_dir: conf_dir.as_ref().to_path_buf(),
        }
    }

    pub fn conf_dir(&self) -> &Path {
        &self.conf_dir
    }
}

impl ValueProvider for FileValueProvider {
    fn load(&self, field: &FieldDescriptor) -> Result<Option<String>> {
        let Some(relative) = field.file_path() else {
            return Ok(None);
        };

        let path = self.conf_dir.join(relative);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                debug!(field = field.name(), path = %path.display(), "Read field value from file");
                Ok(Some(content))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConfigError::Provider {
                provider: self.name().to_string(),
                message: format!("{}: {}", path.display(), e),
            }),
        }
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// In-memory values keyed by field key
#[derive(Debug, Clone, Default)]
pub struct MapValueProvider {
    values: HashMap<String, String>,
}

impl MapValueProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

impl FromIterator<(String, String)> for MapValueProvider {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl ValueProvider for MapValueProvider {
    fn load(&self, field: &FieldDescriptor) -> Result<Option<String>> {
        Ok(self.values.get(field.key()).cloned())
    }

    fn name(&self) -> &str {
        "map"
    }
}

//! Configuration loader implementation

use crate::providers::ValueProvider;
use crate::schema::Schema;
use crate::value::{raw_config_from_json, RawConfig};
use figment::Figment;
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use types::{ConfigError, Result};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Pick the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("json") => Ok(ConfigFormat::Json),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            _ => Err(ConfigError::UnknownConfigFormat {
                path: path.display().to_string(),
            }),
        }
    }

    /// Parse file content into a `RawConfig`; the error is a parser message
    pub fn parse(self, content: &str) -> std::result::Result<RawConfig, String> {
        let document: serde_json::Value = match self {
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string())?,
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string())?,
        };
        raw_config_from_json(document).map_err(|e| e.to_string())
    }
}

/// Entry points for populating schema instances from providers and files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Walk the schema in declaration order and apply provider values.
    ///
    /// Nested fields recurse with the same providers. For scalar fields every
    /// provider is asked in order and each present value is applied, so later
    /// providers win. The first failing field aborts the pass.
    pub fn load(schema: &mut Schema, providers: &[&dyn ValueProvider]) -> Result<()> {
        schema.load(providers)
    }

    /// Load a JSON or YAML file into `schema` with dictionary semantics.
    ///
    /// A missing path is always an error. With `silent`, a file that exists
    /// but can't be read is skipped.
    pub fn load_from_file<P: AsRef<Path>>(schema: &mut Schema, path: P, silent: bool) -> Result<()> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if silent => {
                warn!("Skipping unreadable configuration file {}: {}", path.display(), e);
                return Ok(());
            }
            Err(_) => {
                return Err(ConfigError::ConfigNotFound {
                    path: path.display().to_string(),
                });
            }
        };

        let format = ConfigFormat::from_path(path)?;
        let raw = format
            .parse(&content)
            .map_err(|message| ConfigError::BrokenConfig {
                path: path.display().to_string(),
                message,
            })?;

        info!("Loading configuration from {}", path.display());
        schema.load_from_dict(&raw)
    }

    /// Load configuration content held in memory
    pub fn load_from_str(schema: &mut Schema, content: &str, format: ConfigFormat) -> Result<()> {
        let raw = format
            .parse(content)
            .map_err(|message| ConfigError::BrokenConfig {
                path: "<string>".to_string(),
                message,
            })?;
        schema.load_from_dict(&raw)
    }

    /// Extract a layered figment (files, prefixed env, ...) and apply it with
    /// dictionary semantics
    pub fn load_from_figment(schema: &mut Schema, figment: &Figment) -> Result<()> {
        let document: serde_json::Value =
            figment
                .extract()
                .map_err(|e: figment::Error| ConfigError::BrokenConfig {
                    path: "<figment>".to_string(),
                    message: e.to_string(),
                })?;

        let raw = raw_config_from_json(document).map_err(|e| ConfigError::BrokenConfig {
            path: "<figment>".to_string(),
            message: e.to_string(),
        })?;
        schema.load_from_dict(&raw)
    }

    /// Write the schema's current values as an example file (JSON or YAML by extension)
    pub fn create_example<P: AsRef<Path>>(schema: &Schema, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Json => serde_json::to_string_pretty(schema)
                .map_err(|e| ConfigError::Serialization(e.to_string()))?,
            ConfigFormat::Yaml => serde_yaml::to_string(schema)
                .map_err(|e| ConfigError::Serialization(e.to_string()))?,
        };

        fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

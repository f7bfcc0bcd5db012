//! Gate configuration files
//!
//! The gating core only ever sees a parsed [`GateConfig`]; this module is the
//! file boundary. `.toml`, `.yaml` and `.yml` are supported, and every
//! loaded configuration is validated before it is returned.

use crate::gate::{GateConfig, GateError};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported config format {0:?} (expected .toml, .yaml or .yml)")]
    UnsupportedFormat(String),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Invalid(#[from] GateError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match extension.as_str() {
            "toml" => Ok(ConfigFormat::Toml),
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            _ => Err(ConfigError::UnsupportedFormat(extension)),
        }
    }
}

/// Parse and validate configuration text
pub fn parse(content: &str, format: ConfigFormat) -> Result<GateConfig, ConfigError> {
    let config: GateConfig = match format {
        ConfigFormat::Toml => toml::from_str(content)?,
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
    };
    config.validate()?;
    Ok(config)
}

/// Load and validate a configuration file
pub fn load<P: AsRef<Path>>(path: P) -> Result<GateConfig, ConfigError> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse(&content, format)
}

//! Extractor configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extractor::DEFAULT_PLACEHOLDER_NAME;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// How converted documents (PDF/DOCX) are routed through the extractors.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoutingPolicy {
    /// Plain text gets the full tiered chain; PDF and DOCX go straight to the
    /// whole-text extractor
    #[default]
    ByFormat,
    /// Every format gets the full tiered chain
    Unified,
}

/// Tunables for the extraction chain. Every field may be omitted in JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Minimum populated top-level fields for a section result to be kept
    pub min_populated_fields: usize,
    /// Name written into structured drafts that carry none
    pub placeholder_name: String,
    pub routing: RoutingPolicy,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_populated_fields: 3,
            placeholder_name: DEFAULT_PLACEHOLDER_NAME.to_string(),
            routing: RoutingPolicy::ByFormat,
        }
    }
}

impl ExtractorConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.min_populated_fields == 0 {
            return Err(ConfigError::Invalid(
                "min_populated_fields must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

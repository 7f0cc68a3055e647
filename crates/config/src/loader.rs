//! Configuration loading from multiple sources

use crate::{ConfigError, Result, SourcingConfig};
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Default environment variable prefix
pub const ENV_PREFIX: &str = "RFQ_SOURCING";

/// Configuration loader with support for multiple formats and sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    ///
    /// Supports TOML, YAML, and JSON formats based on file extension
    pub fn from_file(path: &Path) -> Result<SourcingConfig> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::LoadError("No file extension found".to_string()))?;

        let content = std::fs::read_to_string(path)?;

        match extension {
            "toml" => Self::from_toml(&content),
            "yaml" | "yml" => Self::from_yaml(&content),
            "json" => Self::from_json(&content),
            _ => Err(ConfigError::LoadError(format!(
                "Unsupported file extension: {}",
                extension
            ))),
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<SourcingConfig> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from YAML string
    pub fn from_yaml(content: &str) -> Result<SourcingConfig> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<SourcingConfig> {
        serde_json::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from environment variables with the default
    /// `RFQ_SOURCING` prefix
    pub fn from_env() -> Result<SourcingConfig> {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Load configuration from environment variables with custom prefix
    ///
    /// Environment variables should be in the format: PREFIX_SECTION_KEY
    /// For example: RFQ_SOURCING_NUMBERING_PAD_WIDTH=6
    pub fn from_env_with_prefix(prefix: &str) -> Result<SourcingConfig> {
        let config = Config::builder()
            .add_source(Environment::with_prefix(prefix).separator("_"))
            .build()?;

        config.try_deserialize().map_err(ConfigError::from)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// The file is the base layer; environment variables with the given
    /// prefix override individual keys. Keys the environment does not set
    /// keep their file values.
    pub fn from_file_with_env(path: &Path, env_prefix: &str) -> Result<SourcingConfig> {
        Self::builder().add_file(path, true).add_env(env_prefix).build()
    }

    /// Build configuration using the config crate's builder pattern
    pub fn builder() -> ConfigLoaderBuilder {
        ConfigLoaderBuilder {
            builder: Config::builder(),
        }
    }
}

/// Builder for complex configuration loading scenarios
pub struct ConfigLoaderBuilder {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl ConfigLoaderBuilder {
    /// Add a configuration file source
    pub fn add_file(mut self, path: &Path, required: bool) -> Self {
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Toml,
        };

        self.builder = self
            .builder
            .add_source(File::from(path).format(format).required(required));
        self
    }

    /// Add environment variable source with prefix
    pub fn add_env(mut self, prefix: &str) -> Self {
        self.builder = self
            .builder
            .add_source(Environment::with_prefix(prefix).separator("_"));
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Result<SourcingConfig> {
        let config = self.builder.build()?;
        config.try_deserialize().map_err(ConfigError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::io::Write;

    #[test]
    fn test_load_from_toml() {
        let toml = r#"
            [numbering]
            rfq_prefix = "SRC-"
            bid_prefix = "OFR-"
            pad_width = 5

            [evaluation]
            weight_tolerance = "0.01"
            compliance_threshold = "75"

            [lifecycle]
            default_validity_period_days = 45
            max_validity_period_days = 180
        "#;

        let config = ConfigLoader::from_toml(toml).unwrap();
        assert_eq!(config.numbering.rfq_prefix, "SRC-");
        assert_eq!(config.numbering.pad_width, 5);
        assert_eq!(config.evaluation.compliance_threshold, Decimal::from(75));
        assert_eq!(config.lifecycle.default_validity_period_days, 45);
    }

    #[test]
    fn test_load_from_yaml() {
        let yaml = r#"
numbering:
  rfq_prefix: "SRC-"
  bid_prefix: "OFR-"
  pad_width: 4

evaluation:
  weight_tolerance: "0.01"
  compliance_threshold: "80"

lifecycle:
  default_validity_period_days: 30
  max_validity_period_days: 365
        "#;

        let config = ConfigLoader::from_yaml(yaml).unwrap();
        assert_eq!(config.numbering.rfq_prefix, "SRC-");
        assert_eq!(config.lifecycle.max_validity_period_days, 365);
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"
{
  "numbering": { "rfq_prefix": "SRC-", "bid_prefix": "OFR-", "pad_width": 4 },
  "evaluation": { "weight_tolerance": "0.01", "compliance_threshold": "80" },
  "lifecycle": { "default_validity_period_days": 30, "max_validity_period_days": 365 }
}
        "#;

        let config = ConfigLoader::from_json(json).unwrap();
        assert_eq!(config.numbering.bid_prefix, "OFR-");
    }

    #[test]
    fn test_missing_sections_take_defaults() {
        let config = ConfigLoader::from_toml("[numbering]\nrfq_prefix = \"SRC-\"\n").unwrap();
        assert_eq!(config.numbering.rfq_prefix, "SRC-");
        assert_eq!(config.numbering.pad_width, 4);
        assert_eq!(config.lifecycle.default_validity_period_days, 30);
    }

    #[test]
    fn test_load_from_file() {
        let toml = r#"
[numbering]
rfq_prefix = "SRC-"
        "#;

        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(toml.as_bytes()).unwrap();

        let config = ConfigLoader::from_file(file.path()).unwrap();
        assert_eq!(config.numbering.rfq_prefix, "SRC-");
    }

    #[test]
    fn test_file_values_survive_absent_env_overrides() {
        let toml = r#"
[numbering]
rfq_prefix = "SRC-"
pad_width = 5
        "#;

        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(toml.as_bytes()).unwrap();

        // No variables carry this prefix, so the file layer must win
        let config =
            ConfigLoader::from_file_with_env(file.path(), "RFQ_SOURCING_ABSENT").unwrap();
        assert_eq!(config.numbering.rfq_prefix, "SRC-");
        assert_eq!(config.numbering.pad_width, 5);
        assert_eq!(config.lifecycle.default_validity_period_days, 30);
    }
}

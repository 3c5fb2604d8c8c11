use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::driver::Collection;
use crate::error::ConfigError;
use crate::loader::is_plain_file_name;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "STOPLIGHT_CONFIG";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Convert into a `ConfigError` when any error was recorded.
    pub fn into_result(self) -> Result<(), ConfigError> {
        for warning in &self.warnings {
            tracing::warn!("Config warning: {}", warning);
        }
        if self.is_valid() {
            return Ok(());
        }
        Err(ConfigError::Invalid(self.error_summary()))
    }
}

/// One configured data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Unique source id, used on the command line
    pub id: String,

    /// Driver identifier the registry resolves (e.g. "stoplight")
    #[serde(rename = "type")]
    pub source_type: String,

    /// Destination collection
    pub collection: Collection,

    /// Untyped driver configuration; each driver validates its own shape
    #[serde(default)]
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory the file loader writes into
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Configured sources
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("stoplight-data")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            sources: Vec::new(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load configuration from `path`, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if !config_path.exists() {
            return Err(ConfigError::NotFound(config_path.display().to_string()));
        }

        let contents = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ParseError(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_toml(&contents)?;
        tracing::debug!(
            "Loaded {} sources from {}",
            config.sources.len(),
            config_path.display()
        );
        Ok(config)
    }

    /// Load configuration and reject it if validation finds errors
    pub fn load_validated(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate().into_result()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Driver-specific settings are validated by the driver itself.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.sources.is_empty() {
            result.add_warning("sources", "No sources configured");
        }

        let mut seen = HashSet::new();
        for (i, source) in self.sources.iter().enumerate() {
            let field = format!("sources[{}]", i);

            if source.id.trim().is_empty() {
                result.add_error(format!("{}.id", field), "Source id must not be empty");
            } else if !seen.insert(source.id.as_str()) {
                result.add_error(
                    format!("{}.id", field),
                    format!("Duplicate source id: {}", source.id),
                );
            }

            if source.source_type.trim().is_empty() {
                result.add_error(format!("{}.type", field), "Source type must not be empty");
            }

            if source.collection.name.trim().is_empty() {
                result.add_error(
                    format!("{}.collection.name", field),
                    "Collection name must not be empty",
                );
            }

            let table = source.collection.table_name();
            if !table.trim().is_empty() && !is_plain_file_name(table) {
                result.add_error(
                    format!("{}.collection.table_name", field),
                    format!("Table name must be a plain directory name: {}", table),
                );
            }
        }

        result
    }

    /// Find a source by id
    pub fn source(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }

    /// Get the default path of the configuration file
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound("user config directory".to_string()))?
            .join("stoplight");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
output_dir = "/tmp/stoplight"

[[sources]]
id = "crm"
type = "stoplight"
collection = { name = "leads", table_name = "leads_table" }

[sources.config]
access_token = "Bearer abc"
api_version = "2021-07-28"
calendar_id = "cal_1"
"#;

    #[test]
    fn test_parse_sample() {
        let config = Config::from_toml(SAMPLE).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/stoplight"));
        assert_eq!(config.sources.len(), 1);

        let source = config.source("crm").unwrap();
        assert_eq!(source.source_type, "stoplight");
        assert_eq!(source.collection.table_name(), "leads_table");
        assert_eq!(source.config["calendar_id"], "cal_1");
        assert!(config.validate().is_valid());
    }

    #[test]
    fn test_default_output_dir() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.output_dir, PathBuf::from("stoplight-data"));
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "sources"));
    }

    #[test]
    fn test_duplicate_source_ids() {
        let mut config = Config::from_toml(SAMPLE).unwrap();
        let dup = config.sources[0].clone();
        config.sources.push(dup);

        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("Duplicate")));
    }

    #[test]
    fn test_empty_type_is_error() {
        let mut config = Config::from_toml(SAMPLE).unwrap();
        config.sources[0].source_type = " ".into();

        let err = config.validate().into_result().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("sources[0].type")));
    }

    #[test]
    fn test_path_like_table_name_is_error() {
        let mut config = Config::from_toml(SAMPLE).unwrap();
        config.sources[0].collection = Collection::new("leads", "../x");

        let err = config.validate().into_result().unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid(msg) if msg.contains("sources[0].collection.table_name"))
        );
    }

    #[test]
    fn test_malformed_toml() {
        let err = Config::from_toml("sources = 3").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = Config::load_validated(Some(&path)).unwrap();
        assert_eq!(config.sources[0].id, "crm");
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }
}

//! Connector configuration and its validation.

use std::time::Duration;

use serde::Deserialize;
use stoplight_core::{ConfigError, ValidationResult};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://services.leadconnectorhq.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How the three resource collections are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// One request after another, in table order
    #[default]
    Sequential,
    /// All requests in flight at once; the first failure aborts the rest
    Concurrent,
}

/// Raw payload shape. Every field is optional so missing values surface as
/// `MissingSetting` rather than a serde error.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default, alias = "accessToken")]
    access_token: Option<serde_json::Value>,
    #[serde(default, alias = "apiVersion")]
    api_version: Option<serde_json::Value>,
    #[serde(default, alias = "calendarId")]
    calendar_id: Option<serde_json::Value>,
    #[serde(default, alias = "baseUrl")]
    base_url: Option<String>,
    #[serde(default, alias = "timeoutSecs")]
    timeout_secs: Option<u64>,
    #[serde(default, alias = "fetchMode")]
    fetch_mode: Option<FetchMode>,
}

/// Validated, immutable connector configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct StoplightConfig {
    pub access_token: String,
    pub api_version: String,
    pub calendar_id: String,
    pub base_url: String,
    pub timeout: Duration,
    pub fetch_mode: FetchMode,
}

impl StoplightConfig {
    /// Validate an untyped configuration payload.
    ///
    /// No network activity happens here.
    pub fn from_value(raw: &serde_json::Value) -> Result<Self, ConfigError> {
        if !raw.is_object() {
            return Err(ConfigError::ParseError(
                "connector config must be an object".to_string(),
            ));
        }

        let raw: RawConfig = serde_json::from_value(raw.clone())
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        let access_token = required(raw.access_token.as_ref(), "access_token")?;
        let api_version = required(raw.api_version.as_ref(), "api_version")?;
        let calendar_id = required(raw.calendar_id.as_ref(), "calendar_id")?;

        let config = Self {
            access_token,
            api_version,
            calendar_id,
            base_url: raw
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout: Duration::from_secs(raw.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            fetch_mode: raw.fetch_mode.unwrap_or_default(),
        };

        config.validate().into_result()?;
        Ok(config)
    }

    /// Validate the optional settings
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        match Url::parse(&self.base_url) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        "base_url",
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }
                if url.host().is_none() {
                    result.add_error("base_url", "URL must have a host");
                }
                if url.scheme() == "http" {
                    result.add_warning("base_url", "Access token will be sent without TLS");
                }
            }
            Err(e) => result.add_error("base_url", format!("Invalid URL: {}", e)),
        }

        if self.timeout.is_zero() {
            result.add_error("timeout_secs", "Timeout must be greater than 0");
        }

        result
    }
}

fn required(value: Option<&serde_json::Value>, field: &str) -> Result<String, ConfigError> {
    match value.and_then(|v| v.as_str()) {
        Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
        _ => Err(ConfigError::MissingSetting(field.to_string())),
    }
}

impl std::fmt::Debug for StoplightConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoplightConfig")
            .field("access_token", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("calendar_id", &self.calendar_id)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("fetch_mode", &self.fetch_mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> serde_json::Value {
        json!({
            "access_token": "Bearer abc",
            "api_version": "2021-07-28",
            "calendar_id": "cal_1"
        })
    }

    #[test]
    fn test_valid_config_defaults() {
        let config = StoplightConfig::from_value(&valid()).unwrap();
        assert_eq!(config.access_token, "Bearer abc");
        assert_eq!(config.api_version, "2021-07-28");
        assert_eq!(config.calendar_id, "cal_1");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.fetch_mode, FetchMode::Sequential);
    }

    #[test]
    fn test_missing_fields() {
        for field in ["access_token", "api_version", "calendar_id"] {
            let mut raw = valid();
            raw.as_object_mut().unwrap().remove(field);

            let err = StoplightConfig::from_value(&raw).unwrap_err();
            assert!(
                matches!(&err, ConfigError::MissingSetting(f) if f == field),
                "{} should be required, got {:?}",
                field,
                err
            );
        }
    }

    #[test]
    fn test_empty_null_and_non_string_fields() {
        for bad in [json!(""), json!("   "), json!(null), json!(42)] {
            let mut raw = valid();
            raw["api_version"] = bad;
            let err = StoplightConfig::from_value(&raw).unwrap_err();
            assert!(matches!(err, ConfigError::MissingSetting(f) if f == "api_version"));
        }
    }

    #[test]
    fn test_camel_case_aliases() {
        let raw = json!({
            "accessToken": "tok",
            "apiVersion": "v",
            "calendarId": "c",
            "fetchMode": "concurrent"
        });
        let config = StoplightConfig::from_value(&raw).unwrap();
        assert_eq!(config.access_token, "tok");
        assert_eq!(config.fetch_mode, FetchMode::Concurrent);
    }

    #[test]
    fn test_non_object_payload() {
        let err = StoplightConfig::from_value(&json!(["x"])).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));

        let err = StoplightConfig::from_value(&serde_json::Value::Null).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_invalid_base_url() {
        let mut raw = valid();
        raw["base_url"] = json!("ftp://example.com");
        let err = StoplightConfig::from_value(&raw).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("http or https")));

        raw["base_url"] = json!("not a url");
        assert!(StoplightConfig::from_value(&raw).is_err());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let mut raw = valid();
        raw["base_url"] = json!("http://127.0.0.1:9000/");
        let config = StoplightConfig::from_value(&raw).unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_zero_timeout() {
        let mut raw = valid();
        raw["timeout_secs"] = json!(0);
        let err = StoplightConfig::from_value(&raw).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("timeout_secs")));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = StoplightConfig::from_value(&valid()).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("Bearer abc"));
        assert!(debug.contains("<redacted>"));
    }
}

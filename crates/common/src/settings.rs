use std::collections::HashMap;

use config::{Config, Environment, File, FileFormat};
use error_stack::{Report, ResultExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use validator::Validate;

use crate::constants::{ENVIRONMENT_VARIABLE_PREFIX, ENVIRONMENT_VARIABLE_SEPARATOR};
use crate::error::AdapterError;

/// Common behaviour for integration config sections.
pub trait IntegrationConfig {
    /// Whether the integration should be registered.
    fn is_enabled(&self) -> bool;
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct Logging {
    /// Maximum log level (`error`, `warn`, `info`, `debug`, `trace`).
    #[serde(default = "default_log_level")]
    #[validate(length(min = 1))]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct Settings {
    #[serde(default)]
    #[validate(nested)]
    pub logging: Logging,

    /// Raw per-integration sections, keyed by integration id.
    #[serde(default)]
    pub integrations: HashMap<String, Json>,
}

impl Settings {
    /// Load settings from the embedded `aja-adapter.toml` plus environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] when the TOML cannot be parsed
    /// or the result fails validation.
    pub fn new() -> Result<Self, Report<AdapterError>> {
        let toml_str = include_str!("../../../aja-adapter.toml");
        Self::from_toml(toml_str)
    }

    /// Parse settings from a TOML string, applying `AJA_ADAPTER__*` overrides.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] when the TOML cannot be parsed
    /// or the result fails validation.
    pub fn from_toml(toml_str: &str) -> Result<Self, Report<AdapterError>> {
        let environment = Environment::default()
            .prefix(ENVIRONMENT_VARIABLE_PREFIX)
            .separator(ENVIRONMENT_VARIABLE_SEPARATOR)
            .try_parsing(true);

        let toml = File::from_str(toml_str, FileFormat::Toml);
        let config = Config::builder()
            .add_source(toml)
            .add_source(environment)
            .build()
            .change_context(AdapterError::Configuration {
                message: "Failed to build configuration".to_string(),
            })?;

        let settings: Self =
            config
                .try_deserialize()
                .change_context(AdapterError::Configuration {
                    message: "Failed to deserialize configuration".to_string(),
                })?;

        settings
            .validate()
            .change_context(AdapterError::Configuration {
                message: "Settings failed validation".to_string(),
            })?;

        Ok(settings)
    }

    /// Deserialize and validate the config section for `integration_id`.
    ///
    /// Returns `Ok(None)` when the section is missing or disabled.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] when the section exists but is
    /// malformed or fails validation.
    pub fn integration_config<T>(
        &self,
        integration_id: &str,
    ) -> Result<Option<T>, Report<AdapterError>>
    where
        T: DeserializeOwned + Validate + IntegrationConfig,
    {
        let Some(raw) = self.integrations.get(integration_id) else {
            return Ok(None);
        };

        let config: T = serde_json::from_value(raw.clone()).change_context(
            AdapterError::Configuration {
                message: format!("Invalid configuration for integration '{integration_id}'"),
            },
        )?;

        config.validate().change_context(AdapterError::Configuration {
            message: format!("Integration '{integration_id}' failed validation"),
        })?;

        if !config.is_enabled() {
            return Ok(None);
        }

        Ok(Some(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::aja::AjaConfig;
    use crate::test_support::tests::crate_test_settings_str;

    #[test]
    fn test_settings_new() {
        let settings = Settings::new().expect("embedded settings should load");
        assert!(!settings.logging.level.is_empty());
        assert!(settings.integrations.contains_key("aja"));
    }

    #[test]
    fn test_settings_from_valid_toml() {
        let settings =
            Settings::from_toml(&crate_test_settings_str()).expect("test settings should load");
        assert_eq!(settings.logging.level, "debug");

        let aja = settings
            .integration_config::<AjaConfig>("aja")
            .expect("aja config should parse")
            .expect("aja should be enabled");
        assert_eq!(aja.endpoint, "https://test-exchange.example/v1/prebid");
        assert_eq!(aja.prebid_version, "9.9.9");
    }

    #[test]
    fn test_missing_integration_is_none() {
        let settings = Settings::from_toml("").expect("empty settings should load");
        let aja = settings
            .integration_config::<AjaConfig>("aja")
            .expect("missing section is not an error");
        assert!(aja.is_none());
    }

    #[test]
    fn test_disabled_integration_is_none() {
        let toml_str = r#"
            [integrations.aja]
            enabled = false
            "#;
        let settings = Settings::from_toml(toml_str).expect("settings should load");
        let aja = settings
            .integration_config::<AjaConfig>("aja")
            .expect("disabled section is not an error");
        assert!(aja.is_none());
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        let toml_str = r#"
            [integrations.aja]
            enabled = true
            endpoint = "not a url"
            "#;
        let settings = Settings::from_toml(toml_str).expect("settings should load");
        let err = settings
            .integration_config::<AjaConfig>("aja")
            .expect_err("invalid endpoint should fail validation");
        assert!(matches!(
            err.current_context(),
            AdapterError::Configuration { .. }
        ));
    }

    #[test]
    fn test_invalid_toml_is_configuration_error() {
        let err = Settings::from_toml("[logging\nlevel = ").expect_err("toml should not parse");
        assert!(matches!(
            err.current_context(),
            AdapterError::Configuration { .. }
        ));
    }

    #[test]
    fn test_env_override_applies() {
        temp_env::with_var(
            "AJA_ADAPTER__INTEGRATIONS__AJA__TTL_SECONDS",
            Some("120"),
            || {
                let settings = Settings::from_toml(&crate_test_settings_str())
                    .expect("settings should load");
                let aja = settings
                    .integration_config::<AjaConfig>("aja")
                    .expect("aja config should parse")
                    .expect("aja should be enabled");
                assert_eq!(aja.ttl_seconds, 120);
            },
        );
    }
}

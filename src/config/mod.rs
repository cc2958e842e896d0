//! Configuration management

use crate::domain::push::{AuthorizationOption, PushType};
use crate::domain::telephony::HandleType;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Environment variable prefix, e.g. `RINGSIDE__LOGGING__LEVEL=debug`
pub const ENV_PREFIX: &str = "RINGSIDE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub push: PushConfig,
    pub permissions: PermissionsConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// Native telephony provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub includes_calls_in_recents: bool,
    pub supports_video: bool,
    pub maximum_calls_per_call_group: usize,
    pub maximum_call_groups: usize,
    pub supported_handle_types: Vec<HandleType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// The only push class that can surface calls
    pub desired_push_type: PushType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionsConfig {
    /// Prompt for authorization at startup instead of only reading status
    pub request_on_start: bool,
    pub options: Vec<AuthorizationOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub listen: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            includes_calls_in_recents: true,
            supports_video: true,
            maximum_calls_per_call_group: 1,
            maximum_call_groups: 2,
            supported_handle_types: vec![HandleType::Generic],
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            desired_push_type: PushType::Voip,
        }
    }
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            request_on_start: false,
            options: vec![
                AuthorizationOption::Badge,
                AuthorizationOption::Alert,
                AuthorizationOption::Sound,
            ],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: "127.0.0.1:9185".to_string(),
        }
    }
}

impl Config {
    /// Load defaults, then an optional TOML file, then `RINGSIDE__*`
    /// environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?);

        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.provider.supports_video);
        assert!(config.provider.includes_calls_in_recents);
        assert_eq!(config.provider.maximum_calls_per_call_group, 1);
        assert_eq!(config.provider.supported_handle_types, vec![HandleType::Generic]);
        assert_eq!(config.push.desired_push_type, PushType::Voip);
        assert_eq!(config.permissions.options.len(), 3);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [provider]
            supports_video = false
            maximum_call_groups = 4

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert!(!config.provider.supports_video);
        assert_eq!(config.provider.maximum_call_groups, 4);
        assert_eq!(config.provider.maximum_calls_per_call_group, 1);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.push.desired_push_type, PushType::Voip);
    }

    #[test]
    fn test_load_without_file_matches_defaults() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.provider, ProviderConfig::default());
        assert_eq!(config.push, PushConfig::default());
    }

    #[test]
    fn test_rejects_unknown_push_type() {
        let result = Config::from_toml_str(
            r#"
            [push]
            desired_push_type = "carrier-pigeon"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }
}

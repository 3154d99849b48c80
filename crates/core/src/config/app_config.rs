use crate::config::{validate_tag, ConfigError, ConfigSource, ConfigSources};
use crate::logging::{LogFormat, LoggingConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::Path;

pub const DEFAULT_ENVIRONMENT: &str = "local";
pub const DEFAULT_CONTEXT: &str = "server";
pub const DEFAULT_APP_NAME: &str = "trellis";

const FIELDS: [&str; 5] = ["app_name", "environment", "context", "log_level", "log_format"];

/// Configuration trait for bootstrap configuration
pub trait AppConfigTrait: Sized {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self, ConfigError>;

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError>;

    /// Get configuration source information for debugging
    fn config_sources(&self) -> HashMap<String, ConfigSource>;
}

/// Settings the bootstrapper needs before any provider runs: which
/// environment and execution context are active, and how to log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootConfig {
    pub app_name: String,
    /// Environment tag matched against provider `environments`
    pub environment: String,
    /// Execution-context tag matched against provider `contexts`
    pub context: String,
    pub log_level: String,
    pub log_format: LogFormat,
    #[serde(skip)]
    sources: ConfigSources,
}

impl BootConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            context: DEFAULT_CONTEXT.to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            sources: ConfigSources::defaults(&FIELDS),
        }
    }

    /// Shorthand for tests and embedders that only care about the gate
    pub fn for_target(environment: impl Into<String>, context: impl Into<String>) -> Self {
        Self::new()
            .with_environment(environment)
            .with_context(context)
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self.sources.record("environment", ConfigSource::Programmatic);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self.sources.record("context", ConfigSource::Programmatic);
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self.sources.record("app_name", ConfigSource::Programmatic);
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self.sources.record("log_level", ConfigSource::Programmatic);
        self
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self.sources.record("log_format", ConfigSource::Programmatic);
        self
    }

    /// Parse a YAML document; absent keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Self::from_yaml_with_origin(yaml, "<inline>")
    }

    /// Load a YAML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|source| ConfigError::FileSystemError {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_yaml_with_origin(&contents, &path.display().to_string())
    }

    fn from_yaml_with_origin(yaml: &str, origin: &str) -> Result<Self, ConfigError> {
        let document: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        let mut config: BootConfig = serde_yaml::from_value(document.clone())?;
        config.sources = Self::new().sources;

        if let serde_yaml::Value::Mapping(map) = document {
            for field in FIELDS {
                if map.contains_key(field) {
                    config
                        .sources
                        .record(field, ConfigSource::File(origin.to_string()));
                }
            }
        }

        Ok(config)
    }

    /// Overlay `APP_NAME`, `APP_ENV`, `APP_CONTEXT`, `LOG_LEVEL` and
    /// `LOG_FORMAT` on top of the current values
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(name) = env::var("APP_NAME") {
            self.app_name = name;
            self.sources.record("app_name", ConfigSource::EnvVar("APP_NAME".into()));
        }

        if let Ok(environment) = env::var("APP_ENV") {
            self.environment = environment;
            self.sources.record("environment", ConfigSource::EnvVar("APP_ENV".into()));
        }

        if let Ok(context) = env::var("APP_CONTEXT") {
            self.context = context;
            self.sources.record("context", ConfigSource::EnvVar("APP_CONTEXT".into()));
        }

        if let Ok(level) = env::var("LOG_LEVEL") {
            self.log_level = level;
            self.sources.record("log_level", ConfigSource::EnvVar("LOG_LEVEL".into()));
        }

        if let Ok(format) = env::var("LOG_FORMAT") {
            self.log_format = format.parse()?;
            self.sources.record("log_format", ConfigSource::EnvVar("LOG_FORMAT".into()));
        }

        Ok(self)
    }

    /// Logging settings derived from this configuration
    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
            format: self.log_format,
            env_filter: None,
            service_name: Some(self.app_name.clone()),
        }
    }

    /// Per-field provenance, in field-name order
    pub fn sources(&self) -> &ConfigSources {
        &self.sources
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "production" | "prod")
    }
}

impl Default for BootConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfigTrait for BootConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self::new().apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_tag("environment", &self.environment)?;
        validate_tag("context", &self.context)?;

        if self.app_name.trim().is_empty() {
            return Err(ConfigError::missing_required(
                "app_name",
                "Set APP_NAME or app_name in the configuration file",
            ));
        }

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        self.sources.to_map()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in ["APP_NAME", "APP_ENV", "APP_CONTEXT", "LOG_LEVEL", "LOG_FORMAT"] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_defaults() {
        let config = BootConfig::new();
        assert_eq!(config.environment, "local");
        assert_eq!(config.context, "server");
        assert!(config.validate().is_ok());
        assert!(config.config_sources()["environment"].is_default());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides_defaults() {
        clear_env();
        env::set_var("APP_ENV", "uat");
        env::set_var("APP_CONTEXT", "cli");
        env::set_var("LOG_FORMAT", "json");

        let config = BootConfig::from_env().unwrap();
        assert_eq!(config.environment, "uat");
        assert_eq!(config.context, "cli");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.config_sources()["environment"],
            ConfigSource::EnvVar("APP_ENV".to_string())
        );
        assert!(config.config_sources()["app_name"].is_default());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_blank_environment() {
        clear_env();
        env::set_var("APP_ENV", "   ");

        let result = BootConfig::from_env();
        assert!(matches!(result, Err(ConfigError::MissingRequired { .. })));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_log_format_from_env() {
        clear_env();
        env::set_var("LOG_FORMAT", "xml");

        assert!(matches!(
            BootConfig::from_env(),
            Err(ConfigError::InvalidValue { .. })
        ));

        clear_env();
    }

    #[test]
    fn test_from_yaml_keeps_defaults_for_missing_keys() {
        let config = BootConfig::from_yaml_str("environment: production\nlog_format: json\n").unwrap();
        assert_eq!(config.environment, "production");
        assert_eq!(config.context, "server");
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.is_production());

        let sources = config.config_sources();
        assert!(sources["environment"].is_file());
        assert!(sources["context"].is_default());
    }

    #[test]
    fn test_misspelled_key_is_rejected() {
        let result = BootConfig::from_yaml_str("enviroment: uat\n");
        match result {
            Err(ConfigError::Yaml(err)) => assert!(err.to_string().contains("enviroment")),
            other => panic!("expected a YAML error, got {other:?}"),
        }
    }

    #[test]
    fn test_logging_carries_app_name() {
        let config = BootConfig::new()
            .with_app_name("shop")
            .with_log_level("debug");
        let logging = config.logging();
        assert_eq!(logging.level, "debug");
        assert_eq!(logging.service_name.as_deref(), Some("shop"));
    }
}

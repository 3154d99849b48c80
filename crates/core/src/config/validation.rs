use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required field: {field}. {hint}")]
    MissingRequired { field: String, hint: String },

    #[error("Invalid value for field '{field}': '{value}'. Expected: {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Failed to read configuration file '{path}': {source}")]
    FileSystemError {
        path: String,
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Logging setup failed: {message}")]
    Logging { message: String },
}

impl ConfigError {
    /// Create a missing required field error
    pub fn missing_required(field: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::MissingRequired {
            field: field.into(),
            hint: hint.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }
}

/// Validate an environment or execution-context tag.
///
/// Tags are compared verbatim by the gate, so surrounding whitespace would
/// silently exclude every provider that names the tag.
pub fn validate_tag(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::missing_required(
            field,
            format!("Set a non-empty {} tag", field),
        ));
    }

    if value.trim() != value || value.chars().any(char::is_whitespace) {
        return Err(ConfigError::invalid_value(
            field,
            value,
            "a tag without whitespace (e.g. 'local', 'uat', 'production')",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tag() {
        assert!(validate_tag("environment", "local").is_ok());
        assert!(validate_tag("context", "cli").is_ok());

        assert!(matches!(
            validate_tag("environment", "  "),
            Err(ConfigError::MissingRequired { .. })
        ));
        assert!(matches!(
            validate_tag("environment", " uat"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            validate_tag("context", "web server"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}

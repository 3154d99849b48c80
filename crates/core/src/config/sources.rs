use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// The configuration layer a value was taken from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Default,
    /// YAML file, by path
    File(String),
    /// Environment variable, by name
    EnvVar(String),
    /// Builder call or command-line flag
    Programmatic,
}

impl ConfigSource {
    /// Precedence of the layer; higher wins
    pub fn layer(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File(_) => 1,
            ConfigSource::EnvVar(_) => 2,
            ConfigSource::Programmatic => 3,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, ConfigSource::Default)
    }

    pub fn is_file(&self) -> bool {
        matches!(self, ConfigSource::File(_))
    }

    pub fn is_env_var(&self) -> bool {
        matches!(self, ConfigSource::EnvVar(_))
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File(path) => write!(f, "file {}", path),
            ConfigSource::EnvVar(var) => write!(f, "env ${}", var),
            ConfigSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// Provenance of every field of a configuration struct
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSources {
    fields: BTreeMap<&'static str, ConfigSource>,
}

impl ConfigSources {
    /// Every field starts out as a default
    pub fn defaults(fields: &[&'static str]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|field| (*field, ConfigSource::Default))
                .collect(),
        }
    }

    pub fn record(&mut self, field: &'static str, source: ConfigSource) {
        self.fields.insert(field, source);
    }

    pub fn get(&self, field: &str) -> Option<&ConfigSource> {
        self.fields.get(field)
    }

    /// Fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ConfigSource)> {
        self.fields.iter().map(|(field, source)| (*field, source))
    }

    pub fn to_map(&self) -> HashMap<String, ConfigSource> {
        self.fields
            .iter()
            .map(|(field, source)| (field.to_string(), source.clone()))
            .collect()
    }
}

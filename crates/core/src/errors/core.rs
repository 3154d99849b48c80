use crate::config::ConfigError;
use std::fmt;
use thiserror::Error;

/// Where an injected function lives: the owning provider and the method name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSite {
    pub provider: String,
    pub method: String,
}

impl InvocationSite {
    pub fn new(provider: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for InvocationSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.provider, self.method)
    }
}

fn site_suffix(site: &Option<InvocationSite>) -> String {
    site.as_ref()
        .map(|s| format!(" requested by {}", s))
        .unwrap_or_default()
}

fn join_names(names: &[String]) -> String {
    names.join(", ")
}

fn unresolved_reason(gated_out: &bool) -> &'static str {
    if *gated_out {
        "gated out for the active environment/context"
    } else {
        "not registered"
    }
}

/// Core error type for the trellis container
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Missing dependency '{parameter}'{}", site_suffix(.site))]
    MissingDependency {
        parameter: String,
        site: Option<InvocationSite>,
    },

    #[error("Cyclic provider dependency between: {}", join_names(.members))]
    CyclicDependency { members: Vec<String> },

    #[error("Provider '{provider}' requires '{dependency}', which is {}", unresolved_reason(.gated_out))]
    UnresolvedDependency {
        provider: String,
        dependency: String,
        gated_out: bool,
    },

    #[error("Service '{name}' is already registered")]
    DuplicateService { name: String },

    #[error("Provider '{name}' is registered more than once")]
    DuplicateProvider { name: String },

    #[error("Provider '{provider}' failed during '{method}': {source}")]
    ProviderLoad {
        provider: String,
        method: String,
        source: Box<ProviderError>,
    },

    #[error("Service '{name}' is not of the requested type {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    #[error("Provider '{provider}' listens to '{event}' but has no handler named '{method}'")]
    HandlerNotFound {
        provider: String,
        event: String,
        method: String,
    },

    #[error("Bootstrapper is in state {actual:?}, expected {expected:?}")]
    InvalidState { expected: String, actual: String },

    #[error("Event channel closed while raising '{event}'")]
    EventChannelClosed { event: String },

    #[error("Lock error on resource: {resource}")]
    LockPoisoned { resource: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl CoreError {
    /// Missing dependency raised by a bare registry lookup
    pub fn missing(parameter: impl Into<String>) -> Self {
        Self::MissingDependency {
            parameter: parameter.into(),
            site: None,
        }
    }

    /// Missing dependency raised while resolving an injected function
    pub fn missing_at(parameter: impl Into<String>, site: InvocationSite) -> Self {
        Self::MissingDependency {
            parameter: parameter.into(),
            site: Some(site),
        }
    }

    pub fn unresolved(
        provider: impl Into<String>,
        dependency: impl Into<String>,
        gated_out: bool,
    ) -> Self {
        Self::UnresolvedDependency {
            provider: provider.into(),
            dependency: dependency.into(),
            gated_out,
        }
    }

    pub fn provider_load(site: InvocationSite, source: ProviderError) -> Self {
        Self::ProviderLoad {
            provider: site.provider,
            method: site.method,
            source: Box::new(source),
        }
    }

    pub fn lock(resource: impl Into<String>) -> Self {
        Self::LockPoisoned {
            resource: resource.into(),
        }
    }

    /// Attach an invocation site to a site-less missing dependency error
    pub fn at_site(self, site: &InvocationSite) -> Self {
        match self {
            Self::MissingDependency {
                parameter,
                site: None,
            } => Self::missing_at(parameter, site.clone()),
            other => other,
        }
    }

    pub fn is_missing_dependency(&self) -> bool {
        matches!(self, Self::MissingDependency { .. })
    }

    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::CyclicDependency { .. })
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::UnresolvedDependency { .. })
    }

    /// Name of the provider the error is attributed to, when there is one
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::MissingDependency {
                site: Some(site), ..
            } => Some(&site.provider),
            Self::UnresolvedDependency { provider, .. }
            | Self::ProviderLoad { provider, .. }
            | Self::HandlerNotFound { provider, .. } => Some(provider),
            Self::DuplicateProvider { name } => Some(name),
            _ => None,
        }
    }
}

/// Error returned by provider code from `register`, `boot` or event handlers
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{message}")]
    Failed { message: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ProviderError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Wrap any error type raised by provider internals
    pub fn other<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Other(Box::new(error))
    }
}

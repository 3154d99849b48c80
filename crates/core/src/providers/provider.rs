use crate::container::Injectable;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Neutral tie-break value for providers that do not care about ordering
pub const DEFAULT_ORDER: i32 = 0;

/// A unit of application functionality with declared dependencies,
/// eligibility tags and two lifecycle hooks.
pub trait ServiceProvider: Send + Sync {
    /// Provider name for identification and dependency resolution
    fn name(&self) -> &str;

    /// Providers that must be registered and booted first
    fn requires(&self) -> Vec<&str> {
        vec![]
    }

    /// Tie-break among providers with no dependency relation; lower loads earlier
    fn order(&self) -> i32 {
        DEFAULT_ORDER
    }

    /// Environments this provider loads in; empty means all
    fn environments(&self) -> Vec<&str> {
        vec![]
    }

    /// Execution contexts this provider loads in; empty means all
    fn contexts(&self) -> Vec<&str> {
        vec![]
    }

    /// Called once during the register pass
    fn register(&self) -> Injectable {
        Injectable::noop()
    }

    /// Called once during the boot pass, after every provider registered
    fn boot(&self) -> Injectable {
        Injectable::noop()
    }

    /// Event name to handler method name
    fn events(&self) -> Vec<(&str, &str)> {
        vec![]
    }

    /// The injectable behind a handler method named in `events`
    fn handler(&self, method: &str) -> Option<Injectable> {
        let _ = method;
        None
    }

    /// Provider description
    fn description(&self) -> Option<&str> {
        None
    }
}

/// Snapshot of a provider's declarations, taken once per bootstrap run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderMetadata {
    pub name: String,
    pub requires: Vec<String>,
    pub order: i32,
    pub environments: Vec<String>,
    pub contexts: Vec<String>,
    /// Event name to handler method, sorted by event name
    pub events: BTreeMap<String, String>,
    pub description: Option<String>,
}

impl ProviderMetadata {
    /// Create metadata with no declarations beyond the name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requires: Vec::new(),
            order: DEFAULT_ORDER,
            environments: Vec::new(),
            contexts: Vec::new(),
            events: BTreeMap::new(),
            description: None,
        }
    }

    /// Create metadata from a provider
    pub fn from_provider<P: ServiceProvider + ?Sized>(provider: &P) -> Self {
        let mut requires: Vec<String> = Vec::new();
        for dependency in provider.requires() {
            if !requires.iter().any(|r| r == dependency) {
                requires.push(dependency.to_string());
            }
        }

        Self {
            name: provider.name().to_string(),
            requires,
            order: provider.order(),
            environments: provider.environments().iter().map(|e| e.to_string()).collect(),
            contexts: provider.contexts().iter().map(|c| c.to_string()).collect(),
            events: provider
                .events()
                .into_iter()
                .map(|(event, method)| (event.to_string(), method.to_string()))
                .collect(),
            description: provider.description().map(|d| d.to_string()),
        }
    }

    pub fn with_requires<I, S>(mut self, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for dependency in requires {
            let dependency = dependency.into();
            if !self.requires.contains(&dependency) {
                self.requires.push(dependency);
            }
        }
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_environments<I, S>(mut self, environments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.environments = environments.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_contexts<I, S>(mut self, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contexts = contexts.into_iter().map(Into::into).collect();
        self
    }

    /// Handler method registered for `event`, if any
    pub fn handler_for(&self, event: &str) -> Option<&str> {
        self.events.get(event).map(String::as_str)
    }
}

/// Closure-backed provider assembled with a builder
#[derive(Debug)]
pub struct BaseProvider {
    name: String,
    requires: Vec<String>,
    order: i32,
    environments: Vec<String>,
    contexts: Vec<String>,
    register: Injectable,
    boot: Injectable,
    events: Vec<(String, String)>,
    handlers: HashMap<String, Injectable>,
    description: Option<String>,
}

impl BaseProvider {
    /// Create a new base provider
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requires: Vec::new(),
            order: DEFAULT_ORDER,
            environments: Vec::new(),
            contexts: Vec::new(),
            register: Injectable::noop(),
            boot: Injectable::noop(),
            events: Vec::new(),
            handlers: HashMap::new(),
            description: None,
        }
    }

    /// Set provider dependencies
    pub fn with_requires<I, S>(mut self, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires = requires.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_environments<I, S>(mut self, environments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.environments = environments.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_contexts<I, S>(mut self, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contexts = contexts.into_iter().map(Into::into).collect();
        self
    }

    /// Set provider description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn on_register(mut self, register: Injectable) -> Self {
        self.register = register;
        self
    }

    pub fn on_boot(mut self, boot: Injectable) -> Self {
        self.boot = boot;
        self
    }

    /// Add a named handler method
    pub fn with_handler(mut self, method: impl Into<String>, handler: Injectable) -> Self {
        self.handlers.insert(method.into(), handler);
        self
    }

    /// Route `event` to the handler method named `method`
    pub fn listen(mut self, event: impl Into<String>, method: impl Into<String>) -> Self {
        let event = event.into();
        self.events.retain(|(existing, _)| *existing != event);
        self.events.push((event, method.into()));
        self
    }
}

impl ServiceProvider for BaseProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn requires(&self) -> Vec<&str> {
        self.requires.iter().map(String::as_str).collect()
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn environments(&self) -> Vec<&str> {
        self.environments.iter().map(String::as_str).collect()
    }

    fn contexts(&self) -> Vec<&str> {
        self.contexts.iter().map(String::as_str).collect()
    }

    fn register(&self) -> Injectable {
        self.register.clone()
    }

    fn boot(&self) -> Injectable {
        self.boot.clone()
    }

    fn events(&self) -> Vec<(&str, &str)> {
        self.events
            .iter()
            .map(|(event, method)| (event.as_str(), method.as_str()))
            .collect()
    }

    fn handler(&self, method: &str) -> Option<Injectable> {
        self.handlers.get(method).cloned()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

//! Dependency injection by declared name.
//!
//! An [`Injectable`] pairs an async function with the ordered list of service
//! names it needs. The [`Injector`] resolves those names on every call (no
//! caching) and hands them to the function as an [`Injected`] bundle.

use crate::bootstrap::AppContext;
use crate::container::registry::{downcast, ServiceRegistry, ServiceValue};
use crate::errors::{CoreError, InvocationSite, ProviderError};
use futures::future::{self, BoxFuture, FutureExt};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// The application context handle
pub const APP: &str = "app";
/// The active request inside request-scoped invocations
pub const REQUEST: &str = "request";
/// The active response inside request-scoped invocations
pub const RESPONSE: &str = "response";
/// The payload of the event being dispatched
pub const PAYLOAD: &str = "payload";

/// Names that never resolve from the registry
pub const RESERVED_NAMES: [&str; 4] = [APP, REQUEST, RESPONSE, PAYLOAD];

pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

pub type InjectFuture = BoxFuture<'static, Result<(), ProviderError>>;

type InjectFn = dyn Fn(Injected) -> InjectFuture + Send + Sync;

/// A function together with the names of the services it depends on
#[derive(Clone)]
pub struct Injectable {
    dependencies: Vec<String>,
    func: Arc<InjectFn>,
}

impl Injectable {
    /// Wrap an async function
    pub fn new<I, S, F, Fut>(dependencies: I, func: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Injected) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ProviderError>> + Send + 'static,
    {
        Self {
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            func: Arc::new(move |injected| func(injected).boxed()),
        }
    }

    /// Wrap a synchronous function
    pub fn from_fn<I, S, F>(dependencies: I, func: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Injected) -> Result<(), ProviderError> + Send + Sync + 'static,
    {
        Self::new(dependencies, move |injected| future::ready(func(injected)))
    }

    /// A function with no dependencies that does nothing
    pub fn noop() -> Self {
        Self::from_fn(Vec::<String>::new(), |_| Ok(()))
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    fn call(&self, injected: Injected) -> InjectFuture {
        (self.func)(injected)
    }
}

impl std::fmt::Debug for Injectable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injectable")
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// Values supplied by the caller rather than the registry
#[derive(Clone, Default)]
pub struct Extras {
    values: HashMap<String, ServiceValue>,
}

impl Extras {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T>(self, name: impl Into<String>, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        self.with_shared(name, Arc::new(value))
    }

    pub fn with_shared(mut self, name: impl Into<String>, value: ServiceValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Extras carrying an event payload, if there is one
    pub fn for_payload(payload: Option<ServiceValue>) -> Self {
        match payload {
            Some(value) => Self::new().with_shared(PAYLOAD, value),
            None => Self::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ServiceValue> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for Extras {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.values.keys().collect();
        names.sort();
        f.debug_struct("Extras").field("names", &names).finish()
    }
}

/// Resolved dependencies handed to an injected function
pub struct Injected {
    app: AppContext,
    site: InvocationSite,
    values: Vec<(String, ServiceValue)>,
}

impl Injected {
    /// The application context, available whether declared or not
    pub fn app(&self) -> &AppContext {
        &self.app
    }

    /// Registry handle used to expose new services
    pub fn services(&self) -> &ServiceRegistry {
        self.app.services()
    }

    pub fn site(&self) -> &InvocationSite {
        &self.site
    }

    /// A declared dependency, downcast to `T`
    pub fn get<T>(&self, name: &str) -> Result<Arc<T>, CoreError>
    where
        T: Any + Send + Sync,
    {
        let value = self
            .value(name)
            .cloned()
            .ok_or_else(|| CoreError::missing_at(name, self.site.clone()))?;
        downcast(name, value)
    }

    /// A declared dependency without downcasting
    pub fn value(&self, name: &str) -> Option<&ServiceValue> {
        self.values
            .iter()
            .find(|(declared, _)| declared == name)
            .map(|(_, value)| value)
    }

    /// Declared names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }
}

/// Resolves declared dependency names and invokes injectables
#[derive(Debug, Clone)]
pub struct Injector {
    app: AppContext,
}

impl Injector {
    pub fn new(app: AppContext) -> Self {
        Self { app }
    }

    pub fn app(&self) -> &AppContext {
        &self.app
    }

    /// Resolve every declared dependency of `injectable`, in order
    pub fn resolve(
        &self,
        injectable: &Injectable,
        site: &InvocationSite,
        extras: &Extras,
    ) -> Result<Injected, CoreError> {
        let values = injectable
            .dependencies()
            .iter()
            .map(|name| {
                self.resolve_one(name, extras)
                    .map(|value| (name.clone(), value))
                    .map_err(|e| e.at_site(site))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Injected {
            app: self.app.clone(),
            site: site.clone(),
            values,
        })
    }

    fn resolve_one(&self, name: &str, extras: &Extras) -> Result<ServiceValue, CoreError> {
        if name == APP {
            return Ok(Arc::new(self.app.clone()));
        }

        if let Some(value) = extras.get(name) {
            return Ok(value.clone());
        }

        if is_reserved(name) {
            return Err(CoreError::missing(name));
        }

        self.app.services().get(name)
    }

    /// Resolve and call `injectable`, awaiting its completion
    pub async fn invoke(
        &self,
        injectable: &Injectable,
        site: InvocationSite,
        extras: &Extras,
    ) -> Result<(), CoreError> {
        let injected = self.resolve(injectable, &site, extras)?;

        tracing::debug!(
            provider = %site.provider,
            method = %site.method,
            dependencies = ?injectable.dependencies(),
            "Invoking injected function"
        );

        injectable
            .call(injected)
            .await
            .map_err(|source| CoreError::provider_load(site, source))
    }
}

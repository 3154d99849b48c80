use crate::errors::CoreError;
use std::any::{Any, type_name};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard};

/// A resolved service value. Shared, never mutated in place.
pub type ServiceValue = Arc<dyn Any + Send + Sync>;

/// Service entry in the registry
#[derive(Clone)]
pub struct ServiceEntry {
    pub value: ServiceValue,
    pub description: Option<String>,
}

impl std::fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceEntry")
            .field("value", &"<service>")
            .field("description", &self.description)
            .finish()
    }
}

/// Name-keyed store of service values.
///
/// Cloning the registry clones the handle; all clones see the same bindings.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    services: Arc<RwLock<HashMap<String, ServiceEntry>>>,
}

impl ServiceRegistry {
    /// Create a new service registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`. Fails if the name is already bound.
    pub fn register<T>(
        &self,
        name: impl Into<String>,
        value: T,
        description: Option<&str>,
    ) -> Result<(), CoreError>
    where
        T: Any + Send + Sync,
    {
        self.insert(name.into(), Arc::new(value), description, false)
    }

    /// Bind an already shared value, e.g. one resolved from another registry
    pub fn register_shared(
        &self,
        name: impl Into<String>,
        value: ServiceValue,
        description: Option<&str>,
    ) -> Result<(), CoreError> {
        self.insert(name.into(), value, description, false)
    }

    /// Bind `name` to `value`, replacing any previous binding.
    ///
    /// Callers that already hold the previous value keep it; only later
    /// lookups observe the replacement.
    pub fn register_override<T>(
        &self,
        name: impl Into<String>,
        value: T,
        description: Option<&str>,
    ) -> Result<(), CoreError>
    where
        T: Any + Send + Sync,
    {
        self.insert(name.into(), Arc::new(value), description, true)
    }

    fn insert(
        &self,
        name: String,
        value: ServiceValue,
        description: Option<&str>,
        allow_override: bool,
    ) -> Result<(), CoreError> {
        let mut services = self
            .services
            .write()
            .map_err(|_| CoreError::lock("service_registry"))?;

        if services.contains_key(&name) {
            if !allow_override {
                return Err(CoreError::DuplicateService { name });
            }
            tracing::warn!(service = %name, "Replacing existing service binding");
        } else {
            tracing::debug!(service = %name, "Registered service");
        }

        services.insert(
            name,
            ServiceEntry {
                value,
                description: description.map(str::to_string),
            },
        );

        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, ServiceEntry>>, CoreError> {
        self.services
            .read()
            .map_err(|_| CoreError::lock("service_registry"))
    }

    /// Get the value bound to `name`
    pub fn get(&self, name: &str) -> Result<ServiceValue, CoreError> {
        self.read()?
            .get(name)
            .map(|entry| entry.value.clone())
            .ok_or_else(|| CoreError::missing(name))
    }

    /// Get the value bound to `name` as a concrete type
    pub fn get_as<T>(&self, name: &str) -> Result<Arc<T>, CoreError>
    where
        T: Any + Send + Sync,
    {
        downcast(name, self.get(name)?)
    }

    /// Check if a service name is bound
    pub fn has(&self, name: &str) -> Result<bool, CoreError> {
        Ok(self.read()?.contains_key(name))
    }

    pub fn description(&self, name: &str) -> Result<Option<String>, CoreError> {
        Ok(self
            .read()?
            .get(name)
            .and_then(|entry| entry.description.clone()))
    }

    /// All bound names, sorted
    pub fn names(&self) -> Result<Vec<String>, CoreError> {
        let mut names: Vec<String> = self.read()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Get the number of registered services
    pub fn len(&self) -> Result<usize, CoreError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, CoreError> {
        Ok(self.len()? == 0)
    }
}

/// Downcast a shared service value, reporting the service name on mismatch
pub fn downcast<T>(name: &str, value: ServiceValue) -> Result<Arc<T>, CoreError>
where
    T: Any + Send + Sync,
{
    value.downcast::<T>().map_err(|_| CoreError::TypeMismatch {
        name: name.to_string(),
        expected: type_name::<T>(),
    })
}

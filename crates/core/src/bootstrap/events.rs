use crate::container::ServiceValue;
use crate::errors::CoreError;

/// Dispatched once the application reaches `Ready`
pub const READY_EVENT: &str = "ready";
/// Dispatched by `Application::shutdown`, in reverse boot order
pub const SHUTDOWN_EVENT: &str = "shutdown";

/// A named event raised by any component, waiting to be dispatched
#[derive(Clone)]
pub struct Event {
    pub name: String,
    pub payload: Option<ServiceValue>,
}

impl Event {
    pub fn new(name: impl Into<String>, payload: Option<ServiceValue>) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("has_payload", &self.payload.is_some())
            .finish()
    }
}

/// A handler that failed while an event was dispatched
#[derive(Debug)]
pub struct HandlerFailure {
    pub provider: String,
    pub method: String,
    pub error: CoreError,
}

/// Outcome of dispatching one event to every interested provider
#[derive(Debug)]
pub struct DispatchReport {
    pub event: String,
    /// Providers whose handler completed, in invocation order
    pub handled: Vec<String>,
    pub failures: Vec<HandlerFailure>,
}

impl DispatchReport {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            handled: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of handlers invoked, successful or not
    pub fn invoked(&self) -> usize {
        self.handled.len() + self.failures.len()
    }
}

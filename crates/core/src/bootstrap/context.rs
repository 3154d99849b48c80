use crate::bootstrap::events::Event;
use crate::config::BootConfig;
use crate::container::{ServiceRegistry, ServiceValue};
use crate::errors::CoreError;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug)]
struct ContextInner {
    id: Uuid,
    app_name: String,
    environment: String,
    context: String,
}

/// Explicit application handle passed into every injected call.
///
/// Cheap to clone. Carries the active gate tags, the service registry and
/// the sending half of the application's event channel.
#[derive(Debug, Clone)]
pub struct AppContext {
    inner: Arc<ContextInner>,
    services: ServiceRegistry,
    events: mpsc::UnboundedSender<Event>,
}

impl AppContext {
    /// Create a context and the receiving half of its event channel
    pub fn new(
        config: &BootConfig,
        services: ServiceRegistry,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let context = Self {
            inner: Arc::new(ContextInner {
                id: Uuid::new_v4(),
                app_name: config.app_name.clone(),
                environment: config.environment.clone(),
                context: config.context.clone(),
            }),
            services,
            events,
        };
        (context, receiver)
    }

    /// Unique id of this application instance
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn app_name(&self) -> &str {
        &self.inner.app_name
    }

    pub fn environment(&self) -> &str {
        &self.inner.environment
    }

    pub fn context(&self) -> &str {
        &self.inner.context
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    /// Queue a named event for dispatch by the application
    pub fn raise(
        &self,
        name: impl Into<String>,
        payload: Option<ServiceValue>,
    ) -> Result<(), CoreError> {
        let event = Event::new(name, payload);
        tracing::debug!(event = %event.name, "Raising event");
        self.events
            .send(event)
            .map_err(|err| CoreError::EventChannelClosed { event: err.0.name })
    }
}

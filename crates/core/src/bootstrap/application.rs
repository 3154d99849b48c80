use crate::bootstrap::{
    AppContext, BootstrapStats, DispatchReport, Event, HandlerFailure, READY_EVENT,
    SHUTDOWN_EVENT,
};
use crate::container::{Extras, Injectable, Injector, ServiceRegistry, ServiceValue};
use crate::errors::{CoreError, InvocationSite};
use crate::providers::{BootOrder, ProviderMetadata, ServiceProvider};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// A fully booted application.
///
/// Owns the only event fan-out point: events raised through
/// [`AppContext::raise`] queue up until [`Application::dispatch_pending`]
/// delivers them, and [`Application::emit`] delivers immediately.
pub struct Application {
    injector: Injector,
    boot_order: BootOrder,
    providers: Vec<(ProviderMetadata, Arc<dyn ServiceProvider>)>,
    events: mpsc::UnboundedReceiver<Event>,
    booted_at: DateTime<Utc>,
    stats: BootstrapStats,
    ready: DispatchReport,
}

impl Application {
    pub(crate) fn new(
        injector: Injector,
        boot_order: BootOrder,
        providers: Vec<(ProviderMetadata, Arc<dyn ServiceProvider>)>,
        events: mpsc::UnboundedReceiver<Event>,
        stats: BootstrapStats,
    ) -> Self {
        Self {
            injector,
            boot_order,
            providers,
            events,
            booted_at: Utc::now(),
            stats,
            ready: DispatchReport::new(READY_EVENT),
        }
    }

    /// Dispatch the built-in `ready` event and keep its report
    pub(crate) async fn dispatch_ready(&mut self) -> &DispatchReport {
        let order: Vec<usize> = (0..self.providers.len()).collect();
        self.ready = self.dispatch(READY_EVENT, None, &order).await;
        &self.ready
    }

    pub fn context(&self) -> &AppContext {
        self.injector.app()
    }

    pub fn services(&self) -> &ServiceRegistry {
        self.context().services()
    }

    pub fn id(&self) -> Uuid {
        self.context().id()
    }

    pub fn boot_order(&self) -> &BootOrder {
        &self.boot_order
    }

    pub fn booted_at(&self) -> DateTime<Utc> {
        self.booted_at
    }

    pub fn stats(&self) -> &BootstrapStats {
        &self.stats
    }

    /// Outcome of the `ready` dispatch performed at the end of bootstrap
    pub fn ready_report(&self) -> &DispatchReport {
        &self.ready
    }

    /// Run a request-scoped function; `request`/`response` come from `extras`
    pub async fn invoke(
        &self,
        site: InvocationSite,
        injectable: &Injectable,
        extras: &Extras,
    ) -> Result<(), CoreError> {
        self.injector.invoke(injectable, site, extras).await
    }

    /// Dispatch `event` to every provider listening for it, in boot order.
    ///
    /// A failing handler is recorded in the report and does not stop the
    /// remaining handlers.
    pub async fn emit(&self, event: &str, payload: Option<ServiceValue>) -> DispatchReport {
        let order: Vec<usize> = (0..self.providers.len()).collect();
        self.dispatch(event, payload, &order).await
    }

    /// Deliver the events queued when the call starts, in arrival order.
    ///
    /// Events raised by handlers during this call stay queued for the next
    /// call, so a handler re-raising its own event cannot spin forever.
    pub async fn dispatch_pending(&mut self) -> Vec<DispatchReport> {
        let queued = self.events.len();
        let mut reports = Vec::with_capacity(queued);
        for _ in 0..queued {
            let Ok(event) = self.events.try_recv() else {
                break;
            };
            reports.push(self.emit(&event.name, event.payload).await);
        }
        reports
    }

    /// Deliver the events pending at this point, then dispatch `shutdown` in
    /// reverse boot order. Events raised after that are dropped.
    pub async fn shutdown(mut self) -> DispatchReport {
        for report in self.dispatch_pending().await {
            if !report.is_success() {
                tracing::warn!(event = %report.event, "Pending event had failing handlers during shutdown");
            }
        }
        if !self.events.is_empty() {
            tracing::warn!(
                dropped = self.events.len(),
                "Events raised while draining were not delivered"
            );
        }

        tracing::info!("Shutting down application {}", self.id());
        let order: Vec<usize> = (0..self.providers.len()).rev().collect();
        self.dispatch(SHUTDOWN_EVENT, None, &order).await
    }

    async fn dispatch(
        &self,
        event: &str,
        payload: Option<ServiceValue>,
        order: &[usize],
    ) -> DispatchReport {
        let extras = Extras::for_payload(payload);
        let mut report = DispatchReport::new(event);

        for &index in order {
            let (metadata, provider) = &self.providers[index];
            let Some(method) = metadata.handler_for(event) else {
                continue;
            };

            let result = match provider.handler(method) {
                Some(handler) => {
                    let site = InvocationSite::new(&metadata.name, method);
                    self.injector.invoke(&handler, site, &extras).await
                }
                None => Err(CoreError::HandlerNotFound {
                    provider: metadata.name.clone(),
                    event: event.to_string(),
                    method: method.to_string(),
                }),
            };

            match result {
                Ok(()) => report.handled.push(metadata.name.clone()),
                Err(error) => {
                    tracing::error!(
                        event = %event,
                        provider = %metadata.name,
                        method = %method,
                        "Event handler failed: {}",
                        error
                    );
                    report.failures.push(HandlerFailure {
                        provider: metadata.name.clone(),
                        method: method.to_string(),
                        error,
                    });
                }
            }
        }

        tracing::debug!(
            event = %event,
            handled = report.handled.len(),
            failed = report.failures.len(),
            "Event dispatched"
        );
        report
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("id", &self.id())
            .field("boot_order", &self.boot_order)
            .field("booted_at", &self.booted_at)
            .finish()
    }
}

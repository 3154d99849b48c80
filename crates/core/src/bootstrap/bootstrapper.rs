use crate::bootstrap::{AppContext, Application, READY_EVENT};
use crate::config::BootConfig;
use crate::container::{Extras, Injectable, Injector, ServiceRegistry};
use crate::errors::{CoreError, InvocationSite};
use crate::foundation::{BootState, ProviderState};
use crate::providers::{BootOrder, ContextGate, ProviderGraph, ProviderMetadata, ServiceProvider};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Statistics for one bootstrap run
#[derive(Debug, Clone, Default)]
pub struct BootstrapStats {
    pub provider_count: usize,
    pub gated_out_count: usize,
    pub gating_time: Duration,
    pub ordering_time: Duration,
    pub registration_time: Duration,
    pub boot_time: Duration,
    pub total_time: Duration,
}

/// Result of gating and ordering without running any provider code
#[derive(Debug, Clone, Serialize)]
pub struct BootPlan {
    pub order: BootOrder,
    pub gated_in: Vec<ProviderMetadata>,
    pub gated_out: Vec<ProviderMetadata>,
}

/// Drives the provider set from discovery to a ready [`Application`].
///
/// One bootstrapper performs one run. `Failed` is terminal; build a new
/// bootstrapper (in practice: restart the process) to try again.
pub struct ApplicationBootstrapper {
    config: BootConfig,
    providers: Vec<Arc<dyn ServiceProvider>>,
    state: BootState,
    provider_states: Vec<(String, ProviderState)>,
    stats: BootstrapStats,
}

impl ApplicationBootstrapper {
    pub fn new(config: BootConfig) -> Self {
        Self {
            config,
            providers: Vec::new(),
            state: BootState::Idle,
            provider_states: Vec::new(),
            stats: BootstrapStats::default(),
        }
    }

    /// Append a provider to the discovery list
    pub fn add_provider<P: ServiceProvider + 'static>(&mut self, provider: P) {
        self.providers.push(Arc::new(provider));
    }

    pub fn with_provider<P: ServiceProvider + 'static>(mut self, provider: P) -> Self {
        self.add_provider(provider);
        self
    }

    /// Append an already shared discovery list, keeping its order
    pub fn with_providers<I>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn ServiceProvider>>,
    {
        self.providers.extend(providers);
        self
    }

    pub fn config(&self) -> &BootConfig {
        &self.config
    }

    pub fn state(&self) -> BootState {
        self.state
    }

    pub fn provider_state(&self, name: &str) -> Option<ProviderState> {
        self.provider_states
            .iter()
            .find(|(provider, _)| provider == name)
            .map(|(_, state)| *state)
    }

    /// Lifecycle state of every discovered provider, in discovery order
    pub fn provider_states(&self) -> &[(String, ProviderState)] {
        &self.provider_states
    }

    pub fn stats(&self) -> &BootstrapStats {
        &self.stats
    }

    fn gate(&self) -> ContextGate {
        ContextGate::new(&self.config.environment, &self.config.context)
    }

    fn discover(&self) -> Result<Vec<ProviderMetadata>, CoreError> {
        let mut seen = HashSet::new();
        self.providers
            .iter()
            .map(|provider| {
                let metadata = ProviderMetadata::from_provider(provider.as_ref());
                if !seen.insert(metadata.name.clone()) {
                    return Err(CoreError::DuplicateProvider {
                        name: metadata.name,
                    });
                }
                Ok(metadata)
            })
            .collect()
    }

    /// Gate and order the discovery list without invoking any provider
    pub fn plan(&self) -> Result<BootPlan, CoreError> {
        let (gated_in, gated_out) = self.gate().partition(self.discover()?);
        let excluded: Vec<String> = gated_out.iter().map(|p| p.name.clone()).collect();
        let order = ProviderGraph::build(&gated_in, &excluded)?.order()?;

        Ok(BootPlan {
            order,
            gated_in,
            gated_out,
        })
    }

    /// Run the full bootstrap: gate, order, register, boot, then dispatch
    /// the `ready` event.
    pub async fn run(&mut self) -> Result<Application, CoreError> {
        if self.state != BootState::Idle {
            return Err(CoreError::InvalidState {
                expected: BootState::Idle.to_string(),
                actual: self.state.to_string(),
            });
        }

        let start_time = Instant::now();
        tracing::info!(
            environment = %self.config.environment,
            context = %self.config.context,
            providers = self.providers.len(),
            "Starting application bootstrap"
        );

        let result = self.execute().await;
        self.stats.total_time = start_time.elapsed();

        match result {
            Ok(mut application) => {
                tracing::info!(
                    "Bootstrap completed successfully in {:?} with {} providers",
                    self.stats.total_time,
                    application.boot_order().len()
                );
                let report = application.dispatch_ready().await;
                if !report.is_success() {
                    tracing::warn!(
                        failures = report.failures.len(),
                        "Some '{}' handlers failed",
                        READY_EVENT
                    );
                }
                Ok(application)
            }
            Err(error) => {
                self.transition(BootState::Failed);
                tracing::error!(
                    provider = error.provider().unwrap_or("-"),
                    "Bootstrap failed: {}",
                    error
                );
                Err(error)
            }
        }
    }

    async fn execute(&mut self) -> Result<Application, CoreError> {
        // Gating
        self.transition(BootState::Gating);
        let gating_start = Instant::now();
        let discovered = self.discover()?;
        self.provider_states = discovered
            .iter()
            .map(|p| (p.name.clone(), ProviderState::Discovered))
            .collect();

        let (gated_in, gated_out) = self.gate().partition(discovered);
        for provider in &gated_in {
            self.set_provider_state(&provider.name, ProviderState::GatedIn);
        }
        for provider in &gated_out {
            tracing::info!(provider = %provider.name, "Provider gated out");
            self.set_provider_state(&provider.name, ProviderState::GatedOut);
        }
        self.stats.provider_count = gated_in.len() + gated_out.len();
        self.stats.gated_out_count = gated_out.len();
        self.stats.gating_time = gating_start.elapsed();

        // Ordering
        self.transition(BootState::Ordering);
        let ordering_start = Instant::now();
        let excluded: Vec<String> = gated_out.iter().map(|p| p.name.clone()).collect();
        let order = ProviderGraph::build(&gated_in, &excluded)?.order()?;
        self.stats.ordering_time = ordering_start.elapsed();
        tracing::debug!(order = ?order.names(), "Computed boot order");

        let ordered = self.ordered_providers(&order, &gated_in);
        let registry = ServiceRegistry::new();
        let (context, events) = AppContext::new(&self.config, registry);
        let injector = Injector::new(context.clone());

        // Registering
        self.transition(BootState::Registering);
        let registration_start = Instant::now();
        for (metadata, provider) in &ordered {
            tracing::info!("Registering provider: {}", metadata.name);
            self.invoke_phase(&injector, &metadata.name, "register", provider.register())
                .await?;
            self.set_provider_state(&metadata.name, ProviderState::Registered);
        }
        self.stats.registration_time = registration_start.elapsed();

        // Booting
        self.transition(BootState::Booting);
        let boot_start = Instant::now();
        for (metadata, provider) in &ordered {
            tracing::info!("Booting provider: {}", metadata.name);
            self.invoke_phase(&injector, &metadata.name, "boot", provider.boot())
                .await?;
            self.set_provider_state(&metadata.name, ProviderState::Booted);
        }
        self.stats.boot_time = boot_start.elapsed();

        self.transition(BootState::Ready);
        Ok(Application::new(
            injector,
            order,
            ordered,
            events,
            self.stats.clone(),
        ))
    }

    async fn invoke_phase(
        &self,
        injector: &Injector,
        provider: &str,
        phase: &str,
        injectable: Injectable,
    ) -> Result<(), CoreError> {
        injector
            .invoke(&injectable, InvocationSite::new(provider, phase), &Extras::new())
            .await
    }

    /// Pair each name in the boot order with its metadata and provider
    fn ordered_providers(
        &self,
        order: &BootOrder,
        gated_in: &[ProviderMetadata],
    ) -> Vec<(ProviderMetadata, Arc<dyn ServiceProvider>)> {
        order
            .iter()
            .filter_map(|name| {
                let metadata = gated_in.iter().find(|m| &m.name == name)?;
                let provider = self.providers.iter().find(|p| p.name() == name)?;
                Some((metadata.clone(), provider.clone()))
            })
            .collect()
    }

    fn set_provider_state(&mut self, name: &str, state: ProviderState) {
        if let Some(entry) = self
            .provider_states
            .iter_mut()
            .find(|(provider, _)| provider == name)
        {
            entry.1 = state;
        }
    }

    fn transition(&mut self, next: BootState) {
        tracing::debug!(from = %self.state, to = %next, "Bootstrap state transition");
        self.state = next;
    }
}

impl std::fmt::Debug for ApplicationBootstrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationBootstrapper")
            .field("config", &self.config)
            .field("providers", &self.providers.len())
            .field("state", &self.state)
            .finish()
    }
}

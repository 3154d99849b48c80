//! Provider bootstrap container for the trellis web-application scaffold.
//!
//! Applications are assembled from providers. Each provider declares the
//! providers it requires, where it is allowed to load (environment and
//! execution context tags), and two injectable lifecycle hooks. The
//! [`ApplicationBootstrapper`] gates, orders, registers and boots them, then
//! hands back a ready [`Application`].
//!
//! ```no_run
//! use trellis_core::{ApplicationBootstrapper, BaseProvider, BootConfig, Injectable};
//!
//! # async fn run() -> Result<(), trellis_core::CoreError> {
//! let config = BaseProvider::new("config").on_register(Injectable::from_fn(
//!     ["app"],
//!     |deps| {
//!         deps.services().register("config.port", 8080_u16, Some("HTTP port"))?;
//!         Ok(())
//!     },
//! ));
//! let server = BaseProvider::new("server")
//!     .with_requires(["config"])
//!     .with_contexts(["server"])
//!     .on_boot(Injectable::from_fn(["config.port"], |deps| {
//!         let port = deps.get::<u16>("config.port")?;
//!         tracing::info!("would listen on {}", port);
//!         Ok(())
//!     }));
//!
//! let mut bootstrapper = ApplicationBootstrapper::new(BootConfig::new())
//!     .with_provider(server)
//!     .with_provider(config);
//! let app = bootstrapper.run().await?;
//! assert_eq!(app.boot_order().names(), vec!["config", "server"]);
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod config;
pub mod container;
pub mod errors;
pub mod foundation;
pub mod logging;
pub mod providers;

pub use bootstrap::{
    AppContext, Application, ApplicationBootstrapper, BootPlan, BootstrapStats, DispatchReport,
    Event, HandlerFailure, READY_EVENT, SHUTDOWN_EVENT,
};
pub use config::{AppConfigTrait, BootConfig, ConfigError, ConfigSource, ConfigSources};
pub use container::{
    Extras, Injectable, Injected, Injector, ServiceRegistry, ServiceValue, APP, PAYLOAD, REQUEST,
    RESPONSE,
};
pub use errors::{CoreError, InvocationSite, ProviderError};
pub use foundation::{BootState, ProviderState};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use providers::{
    boot_order, BaseProvider, BootOrder, ContextGate, ProviderGraph, ProviderMetadata,
    ServiceProvider, DEFAULT_ORDER,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get framework version
pub fn version() -> &'static str {
    VERSION
}

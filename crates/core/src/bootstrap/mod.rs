pub mod application;
pub mod bootstrapper;
pub mod context;
pub mod events;

pub use application::Application;
pub use bootstrapper::{ApplicationBootstrapper, BootPlan, BootstrapStats};
pub use context::AppContext;
pub use events::{DispatchReport, Event, HandlerFailure, READY_EVENT, SHUTDOWN_EVENT};

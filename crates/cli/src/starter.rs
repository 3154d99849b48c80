//! The starter provider set every new trellis application ships with.
//!
//! Discovery is a static list: the order of [`discover`] is the discovery
//! order used for tie-breaking.

use std::sync::Arc;

use trellis_core::{
    AppContext, BaseProvider, Injectable, ProviderError, ServiceProvider, APP, PAYLOAD,
    READY_EVENT, SHUTDOWN_EVENT,
};

/// Application settings exposed by the `config` provider
#[derive(Debug, Clone)]
pub struct Settings {
    pub app_name: String,
    pub environment: String,
    pub host: String,
    pub port: u16,
}

impl Settings {
    fn for_app(app: &AppContext) -> Self {
        let port = match app.environment() {
            "production" => 80,
            _ => 3000,
        };
        Self {
            app_name: app.app_name().to_string(),
            environment: app.environment().to_string(),
            host: "127.0.0.1".to_string(),
            port,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Reads settings from the application context
struct ConfigProvider;

impl ServiceProvider for ConfigProvider {
    fn name(&self) -> &str {
        "config"
    }

    fn order(&self) -> i32 {
        -100
    }

    fn register(&self) -> Injectable {
        Injectable::from_fn([APP], |deps| {
            let app = deps.get::<AppContext>(APP)?;
            deps.services()
                .register("config", Settings::for_app(&app), Some("Application settings"))?;
            Ok(())
        })
    }

    fn description(&self) -> Option<&str> {
        Some("Application settings")
    }
}

fn url() -> BaseProvider {
    BaseProvider::new("url")
        .with_requires(["config"])
        .with_description("Absolute URL generation")
        .on_register(Injectable::from_fn(["config"], |deps| {
            let settings = deps.get::<Settings>("config")?;
            deps.services()
                .register("url.base", settings.base_url(), Some("Base URL"))?;
            Ok(())
        }))
}

fn database() -> BaseProvider {
    BaseProvider::new("database")
        .with_requires(["config"])
        .with_description("Database connection settings")
        .on_register(Injectable::from_fn(["config"], |deps| {
            let settings = deps.get::<Settings>("config")?;
            let url = format!("postgres://localhost/{}_{}", settings.app_name, settings.environment);
            deps.services()
                .register("db.url", url, Some("Database connection URL"))?;
            Ok(())
        }))
        .on_boot(Injectable::from_fn(["db.url"], |deps| {
            let url = deps.get::<String>("db.url")?;
            tracing::info!(url = %url, "Database configured");
            Ok(())
        }))
}

fn session() -> BaseProvider {
    BaseProvider::new("session")
        .with_requires(["database"])
        .with_contexts(["server"])
        .with_description("Database-backed sessions")
        .on_register(Injectable::from_fn(["db.url"], |deps| {
            let store = format!("{}#sessions", deps.get::<String>("db.url")?);
            deps.services()
                .register("session.store", store, Some("Session store"))?;
            Ok(())
        }))
}

fn mailer() -> BaseProvider {
    BaseProvider::new("mailer")
        .with_requires(["config"])
        .with_environments(["uat", "production"])
        .with_description("Outgoing mail")
        .with_handler(
            "deliver",
            Injectable::from_fn([PAYLOAD], |deps| {
                let recipient = deps.get::<String>(PAYLOAD)?;
                tracing::info!(recipient = %recipient, "Queued mail");
                Ok(())
            }),
        )
        .listen("mail.send", "deliver")
}

fn server() -> BaseProvider {
    BaseProvider::new("server")
        .with_requires(["url", "session"])
        .with_contexts(["server"])
        .with_order(100)
        .with_description("HTTP listener")
        .on_boot(Injectable::from_fn(["config"], |deps| {
            let settings = deps.get::<Settings>("config")?;
            if settings.port == 0 {
                return Err(ProviderError::failed("port 0 is not a valid listen port"));
            }
            Ok(())
        }))
        .with_handler(
            "announce",
            Injectable::from_fn(["url.base"], |deps| {
                let base = deps.get::<String>("url.base")?;
                tracing::info!("Listening on {}", base);
                Ok(())
            }),
        )
        .with_handler(
            "close",
            Injectable::from_fn(Vec::<String>::new(), |_| {
                tracing::info!("Listener closed");
                Ok(())
            }),
        )
        .listen(READY_EVENT, "announce")
        .listen(SHUTDOWN_EVENT, "close")
}

fn console() -> BaseProvider {
    BaseProvider::new("console")
        .with_requires(["config"])
        .with_contexts(["cli"])
        .with_description("Interactive console commands")
        .on_boot(Injectable::from_fn([APP], |deps| {
            tracing::info!(app = %deps.app().app_name(), "Console ready");
            Ok(())
        }))
}

/// Every starter provider, in discovery order
pub fn discover() -> Vec<Arc<dyn ServiceProvider>> {
    vec![
        Arc::new(ConfigProvider),
        Arc::new(url()),
        Arc::new(database()),
        Arc::new(session()),
        Arc::new(mailer()),
        Arc::new(server()),
        Arc::new(console()),
    ]
}

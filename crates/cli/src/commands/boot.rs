use std::sync::Arc;

use anyhow::Context;
use trellis_core::{ApplicationBootstrapper, BootConfig, ServiceProvider};

use crate::starter;

pub async fn run(config: BootConfig, events: &[String]) -> anyhow::Result<()> {
    execute(config, starter::discover(), events).await
}

async fn execute(
    config: BootConfig,
    providers: Vec<Arc<dyn ServiceProvider>>,
    events: &[String],
) -> anyhow::Result<()> {
    let environment = config.environment.clone();
    let context = config.context.clone();

    let mut bootstrapper = ApplicationBootstrapper::new(config).with_providers(providers);
    let mut app = bootstrapper.run().await.with_context(|| {
        format!("Bootstrap failed (environment: {environment}, context: {context})")
    })?;

    println!("Application {} ready", app.id());
    println!("Boot order: {}", app.boot_order().names().join(" -> "));

    let mut failed = app.ready_report().failures.len();
    for event in events {
        let report = app.emit(event, None).await;
        println!(
            "Event '{}': {} handled, {} failed",
            report.event,
            report.handled.len(),
            report.failures.len()
        );
        failed += report.failures.len();
    }

    for report in app.dispatch_pending().await {
        failed += report.failures.len();
    }

    let report = app.shutdown().await;
    failed += report.failures.len();
    println!("Shut down ({} providers notified)", report.invoked());

    if failed > 0 {
        anyhow::bail!("{} event handler(s) failed", failed);
    }
    Ok(())
}

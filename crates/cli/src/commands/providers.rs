use trellis_core::{BootConfig, ContextGate, ProviderMetadata};

use crate::starter;

pub fn run(config: BootConfig) -> anyhow::Result<()> {
    let gate = ContextGate::new(&config.environment, &config.context);
    println!(
        "Providers (environment: {}, context: {})",
        gate.environment(),
        gate.context()
    );

    for provider in starter::discover() {
        let metadata = ProviderMetadata::from_provider(provider.as_ref());
        let status = if gate.is_eligible(&metadata) {
            "loaded"
        } else {
            "skipped"
        };
        println!(
            "  {:<10} {:<8} {}",
            metadata.name,
            status,
            describe(&metadata)
        );
    }

    Ok(())
}

fn describe(metadata: &ProviderMetadata) -> String {
    let mut parts = Vec::new();
    if let Some(description) = &metadata.description {
        parts.push(description.clone());
    }
    if !metadata.requires.is_empty() {
        parts.push(format!("requires {}", metadata.requires.join(", ")));
    }
    if !metadata.environments.is_empty() {
        parts.push(format!("env [{}]", metadata.environments.join(", ")));
    }
    if !metadata.contexts.is_empty() {
        parts.push(format!("context [{}]", metadata.contexts.join(", ")));
    }
    parts.join("; ")
}

use anyhow::Context;
use trellis_core::{ApplicationBootstrapper, BootConfig};

use crate::starter;

pub fn run(config: BootConfig, json: bool) -> anyhow::Result<()> {
    let bootstrapper = ApplicationBootstrapper::new(config).with_providers(starter::discover());
    let plan = bootstrapper
        .plan()
        .context("Failed to compute boot order")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        for (position, name) in plan.order.iter().enumerate() {
            println!("{:>3}. {}", position + 1, name);
        }
    }

    Ok(())
}

mod commands;
mod starter;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::*;
use trellis_core::{init_logging, AppConfigTrait, BootConfig, LogFormat};

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "Boot and inspect the trellis provider set")]
#[command(version)]
struct Cli {
    /// Environment tag (local, uat, production, ...)
    #[arg(long = "env", global = true)]
    environment: Option<String>,

    /// Execution context tag (server, cli, ...)
    #[arg(long, global = true)]
    context: Option<String>,

    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level or filter directive
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_parser = parse_log_format)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bootstrap the starter providers, dispatch events and shut down
    Boot {
        /// Event to emit once the application is ready (repeatable)
        #[arg(long = "event")]
        events: Vec<String>,
    },

    /// Print the computed boot order
    Order {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List providers with their eligibility under the active gate
    Providers,
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse().map_err(|e: trellis_core::ConfigError| e.to_string())
}

impl Cli {
    /// Defaults, then the YAML file, then environment variables, then flags
    fn load_config(&self) -> anyhow::Result<BootConfig> {
        let mut config = match &self.config {
            Some(path) => BootConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => BootConfig::new(),
        };
        config = config
            .apply_env()
            .context("Invalid configuration in environment")?;

        if let Some(environment) = &self.environment {
            config = config.with_environment(environment);
        }
        if let Some(context) = &self.context {
            config = config.with_context(context);
        }
        if let Some(level) = &self.log_level {
            config = config.with_log_level(level);
        }
        if let Some(format) = self.log_format {
            config = config.with_log_format(format);
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        tracing::error!("{:#}", error);
        eprintln!("Error: {:#}", error);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.load_config()?;
    init_logging(&config.logging()).context("Failed to initialise logging")?;
    for (field, source) in config.sources().iter() {
        tracing::debug!(field, source = %source, "Configuration value");
    }

    match cli.command {
        Commands::Boot { events } => {
            boot::run(config, &events).await?;
        }
        Commands::Order { json } => {
            order::run(config, json)?;
        }
        Commands::Providers => {
            providers::run(config)?;
        }
    }

    Ok(())
}

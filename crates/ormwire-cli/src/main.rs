//! `ormwire`: print the ORM configuration resolved from a settings file
//!
//! ```bash
//! ormwire config/orm
//! ormwire config/orm --connect
//! ormwire config/orm --services config/services.yaml
//! ```

mod report;

use anyhow::{Context, Result};
use clap::Parser;
use ormwire_container::ContainerAccessor;
use ormwire_core::Settings;
use ormwire_resolver::{ConfigurationResolver, NetworkCacheConnector};
use report::{ContainerReport, Report, WiringReport};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "ormwire", version, about = "Resolve ORM bootstrap configuration")]
struct Cli {
    /// Settings file, without extension (YAML or JSON)
    #[arg(env = "ORMWIRE_CONFIG", default_value = "config/orm")]
    config: PathBuf,

    /// Also connect the cache client and assemble the configuration
    #[arg(long)]
    connect: bool,

    /// Container definition files to load, in order
    #[arg(long, value_name = "FILE")]
    services: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let cli = Cli::parse();

    let settings = Settings::load(&cli.config)
        .with_context(|| format!("Failed to load settings from {}", cli.config.display()))?;
    let resolver = ConfigurationResolver::new(settings);
    let resolved = resolver.resolve()?;

    let wiring = if cli.connect {
        let configuration = resolver.assemble(&NetworkCacheConnector).await?;
        info!("Cache backend wired: {}", configuration.cache_provider());
        Some(WiringReport::from_configuration(&configuration))
    } else {
        None
    };

    let container = if cli.services.is_empty() {
        None
    } else {
        let accessor = ContainerAccessor::global().set(cli.services.clone())?;
        accessor
            .get()
            .map(|container| ContainerReport::from_container(&container))
    };

    let report = Report {
        resolved,
        wiring,
        container,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ormwire=info,ormwire_resolver=info,ormwire_container=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}

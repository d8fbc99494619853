//! # homewired — homewire daemon
//!
//! Composition root that wires all adapters to the intercom and runs the hub.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Install the `tracing` subscriber
//! - Create every `[[components]]` entry through the factory table and
//!   install them on the intercom
//! - Start the components' background tasks (radio read loops, clock,
//!   HTTP gateway)
//! - Stop on Ctrl-C / SIGINT
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer. No domain logic belongs here.

mod components;
mod config;

use anyhow::Context;
use homewire_app::intercom::Intercom;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::Config::load().context("unable to load configuration")?;

    let filter = EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {:?}: {err}", config.logging.filter);
        EnvFilter::new("info")
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let intercom = Intercom::new(config.variables);
    components::install(&intercom, &config.components)
        .context("unable to set up components")?;

    let tasks = intercom.start();
    tracing::info!(
        components = config.components.len(),
        tasks = tasks.len(),
        "homewired running"
    );

    tokio::signal::ctrl_c()
        .await
        .context("unable to listen for shutdown signal")?;
    tracing::info!("shutting down");
    for task in &tasks {
        task.abort();
    }
    Ok(())
}

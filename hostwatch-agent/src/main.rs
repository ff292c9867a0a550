//! hostwatch agent - runs the observation engine on this host
//!
//! Bootstrap:
//! - `.env` and `$HOSTWATCH_CONFIG` (YAML) loading
//! - tracing setup (`RUST_LOG`, default `hostwatch=info`)
//! - metrics sampler on the real host probe
//! - a console viewer logging every snapshot it receives
//! - startup report of logs and system state
//! - clean shutdown on ctrl-c

mod viewer;

use anyhow::{Context, Result};
use hostwatch_core::{EngineConfig, ObservationEngine, SysinfoProbe};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "hostwatch_core=info,hostwatch_agent=info";

/// Log what the engine sees at startup; failures are reported, not fatal
async fn startup_report(engine: &ObservationEngine) {
    let summary = engine.log_summary().await;
    info!(
        "Logs: {} entries ({} errors, {} warnings) across {} source(s)",
        summary.total_entries,
        summary.error_count,
        summary.warning_count,
        summary.source_counts.len()
    );
    for record in &summary.recent_errors {
        info!("  recent error [{}] {}: {}", record.timestamp, record.source, record.message);
    }

    match engine.firewall_rules().await {
        Ok(rules) => info!("Firewall: {} rule(s)", rules.len()),
        Err(e) => warn!("Firewall rules unavailable: {}", e),
    }
    match engine.open_ports().await {
        Ok(ports) => info!("Listening ports: {}", ports.len()),
        Err(e) => warn!("Open ports unavailable: {}", e),
    }
    match engine.services().await {
        Ok(services) => info!("Services: {}", services.len()),
        Err(e) => warn!("Services unavailable: {}", e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .init();

    info!("hostwatch agent starting...");

    let config = EngineConfig::load().await;
    let engine = ObservationEngine::new(config);

    if !engine.start(SysinfoProbe::new()) {
        anyhow::bail!("Sampler did not start");
    }
    let viewer = tokio::spawn(viewer::run(engine.subscribe()));

    startup_report(&engine).await;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;
    info!("Shutdown requested");

    engine.shutdown().await;
    viewer.abort();
    info!("hostwatch agent stopped");
    Ok(())
}

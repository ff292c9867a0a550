//! Composition root handed to the transport layer
//!
//! Provides:
//! - Live metrics: start the sampler, subscribe/unsubscribe viewers, read the
//!   latest snapshot
//! - Logs: filtered queries, the cached summary, explicit reload and export
//! - System state: firewall rules, listening ports and services, fetched and
//!   parsed on every call

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::broadcast::{Broadcaster, SharedSnapshot, Subscription};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::execution::{Listing, ListingSource, SystemListings};
use crate::logs::LogStore;
use crate::metrics::{HostProbe, MetricsSampler};
use crate::model::{FirewallRule, LogQuery, LogRecord, LogSummary, PortRecord, ServiceRecord};
use crate::parser::{parse_firewall_rules, parse_port_listing, parse_service_listing};

pub struct ObservationEngine {
    config: EngineConfig,
    broadcaster: Broadcaster,
    logs: Arc<LogStore>,
    listings: Arc<dyn ListingSource>,
    cancel: CancellationToken,
    sampler: Mutex<Option<JoinHandle<()>>>,
}

impl ObservationEngine {
    /// Engine running the real listing commands
    pub fn new(config: EngineConfig) -> Self {
        let listings = Arc::new(SystemListings::new(config.commands.timeout()));
        Self::with_listings(config, listings)
    }

    pub fn with_listings(config: EngineConfig, listings: Arc<dyn ListingSource>) -> Self {
        Self {
            logs: Arc::new(LogStore::new(config.logs.clone())),
            config,
            broadcaster: Broadcaster::new(),
            listings,
            cancel: CancellationToken::new(),
            sampler: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start sampling `probe` at the configured interval.
    ///
    /// Returns false if a sampler is already running or the engine was shut
    /// down.
    pub fn start<P: HostProbe>(&self, probe: P) -> bool {
        let mut sampler = self.sampler.lock();
        if sampler.is_some() || self.cancel.is_cancelled() {
            warn!("Sampler start ignored (already running or engine shut down)");
            return false;
        }

        let metrics = MetricsSampler::new(probe, self.config.sampler.interval());
        info!("Observation engine started (interval: {:?})", metrics.interval());
        *sampler = Some(metrics.spawn(self.broadcaster.clone(), self.cancel.clone()));
        true
    }

    pub fn is_running(&self) -> bool {
        self.sampler
            .lock()
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }

    pub fn subscribe(&self) -> Subscription {
        self.broadcaster.subscribe()
    }

    pub fn unsubscribe(&self, subscription: Subscription) {
        self.broadcaster.unsubscribe(subscription);
    }

    pub fn subscriber_count(&self) -> usize {
        self.broadcaster.subscriber_count()
    }

    pub fn latest_snapshot(&self) -> Option<SharedSnapshot> {
        self.broadcaster.latest()
    }

    pub async fn query_logs(&self, query: &LogQuery) -> Result<Vec<LogRecord>> {
        self.logs.query(query).await
    }

    pub async fn log_summary(&self) -> Arc<LogSummary> {
        self.logs.summary().await
    }

    pub fn log_sources(&self) -> Vec<String> {
        self.logs.sources()
    }

    pub fn invalidate_log(&self, source: &str) -> Result<bool> {
        self.logs.invalidate(source)
    }

    pub async fn export_log(&self, source: &str, dir: &Path) -> Result<PathBuf> {
        self.logs.export(source, dir).await
    }

    pub async fn firewall_rules(&self) -> Result<Vec<FirewallRule>> {
        let raw = self.listings.fetch(Listing::FirewallRules).await?;
        Ok(parse_firewall_rules(&raw))
    }

    pub async fn open_ports(&self) -> Result<Vec<PortRecord>> {
        let raw = self.listings.fetch(Listing::OpenPorts).await?;
        Ok(parse_port_listing(&raw))
    }

    pub async fn services(&self) -> Result<Vec<ServiceRecord>> {
        let raw = self.listings.fetch(Listing::Services).await?;
        Ok(parse_service_listing(&raw))
    }

    /// Stop the sampler and wait for it to exit. Idempotent.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handle = self.sampler.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Sampler task failed: {}", e);
            }
            info!("Observation engine stopped");
        }
    }
}

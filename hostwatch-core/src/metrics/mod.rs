//! Host metrics sampling
//!
//! Provides:
//! - `HostProbe`, the OS metrics provider seam (CPU, memory, root
//!   filesystem, network counters, host identity and load)
//! - `SysinfoProbe`, the production probe backed by `sysinfo`
//! - `MetricsSampler`, the periodic loop turning probe readings into one
//!   snapshot per tick and handing it to the broadcaster
//!
//! A failing reading never aborts a tick: the affected sub-field stays at
//! its zero value and the partial snapshot is still published.

mod sysinfo_probe;

pub use sysinfo_probe::SysinfoProbe;

use chrono::Local;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::broadcast::Broadcaster;
use crate::error::Result;
use crate::model::{CpuStats, DiskStats, HostStats, MemoryStats, MetricSnapshot, NetworkStats};

/// Source of host counters. Each reading may fail independently.
pub trait HostProbe: Send + 'static {
    /// CPU usage since the previous call
    fn cpu(&mut self) -> Result<CpuStats>;
    fn memory(&mut self) -> Result<MemoryStats>;
    /// Usage of the filesystem mounted at `/`
    fn disk(&mut self) -> Result<DiskStats>;
    /// Cumulative counters of the first interface
    fn network(&mut self) -> Result<NetworkStats>;
    fn host(&mut self) -> Result<HostStats>;
}

fn or_zero<T: Default>(metric: &str, reading: Result<T>) -> T {
    reading.unwrap_or_else(|e| {
        warn!("Metric {} unavailable: {}", metric, e);
        T::default()
    })
}

/// Take one snapshot, zeroing whatever the probe fails to read
pub fn collect_snapshot<P: HostProbe + ?Sized>(probe: &mut P) -> MetricSnapshot {
    MetricSnapshot {
        cpu: or_zero("cpu", probe.cpu()),
        memory: or_zero("memory", probe.memory()),
        disk: or_zero("disk", probe.disk()),
        network: or_zero("network", probe.network()),
        system: or_zero("host", probe.host()),
        taken_at: Local::now(),
    }
}

/// Periodic sampler feeding a broadcaster
pub struct MetricsSampler<P: HostProbe> {
    probe: Arc<Mutex<P>>,
    interval: Duration,
}

impl<P: HostProbe> MetricsSampler<P> {
    pub fn new(probe: P, interval: Duration) -> Self {
        Self {
            probe: Arc::new(Mutex::new(probe)),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Collect one snapshot off the async runtime
    pub async fn sample(&self) -> Option<MetricSnapshot> {
        let probe = self.probe.clone();
        match tokio::task::spawn_blocking(move || collect_snapshot(&mut *probe.lock())).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                error!("Metric collection panicked: {}", e);
                None
            }
        }
    }

    /// Run the sampling loop until `cancel` fires.
    ///
    /// The first snapshot is taken one interval after start. Ticks that
    /// fall behind are skipped rather than bunched up.
    pub fn spawn(self, broadcaster: Broadcaster, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(broadcaster, cancel).await })
    }

    async fn run(self, broadcaster: Broadcaster, cancel: CancellationToken) {
        info!("Metrics sampler started (interval: {:?})", self.interval);

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(snapshot) = self.sample().await else {
                        continue;
                    };
                    let delivered = broadcaster.publish(Arc::new(snapshot));
                    debug!("Snapshot published to {} subscriber(s)", delivered);
                }
            }
        }

        info!("Metrics sampler stopped");
    }
}

//! Scripted host probe

use hostwatch_core::metrics::HostProbe;
use hostwatch_core::{CpuStats, DiskStats, Error, HostStats, MemoryStats, NetworkStats, Result};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub const GIB: u64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Cpu,
    Memory,
    Disk,
    Network,
    Host,
}

/// Deterministic `HostProbe`.
///
/// CPU usage equals the number of CPU readings taken so far (1, 2, 3, ...),
/// so consumers can tell snapshots apart and check their order. Clones share
/// state: keep one to flip failures after handing the other to a sampler.
#[derive(Clone, Default)]
pub struct ScriptedProbe {
    readings: Arc<AtomicU64>,
    failing: Arc<Mutex<HashSet<Metric>>>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(self, metric: Metric) -> Self {
        self.set_failing(metric, true);
        self
    }

    pub fn set_failing(&self, metric: Metric, failing: bool) {
        let mut set = self.failing.lock();
        if failing {
            set.insert(metric);
        } else {
            set.remove(&metric);
        }
    }

    /// CPU readings taken so far
    pub fn readings(&self) -> u64 {
        self.readings.load(Ordering::SeqCst)
    }

    fn check(&self, metric: Metric) -> Result<()> {
        if self.failing.lock().contains(&metric) {
            Err(Error::Probe(format!("{:?} reading scripted to fail", metric)))
        } else {
            Ok(())
        }
    }
}

impl HostProbe for ScriptedProbe {
    fn cpu(&mut self) -> Result<CpuStats> {
        let reading = self.readings.fetch_add(1, Ordering::SeqCst) + 1;
        self.check(Metric::Cpu)?;
        Ok(CpuStats {
            usage_percent: reading as f64,
        })
    }

    fn memory(&mut self) -> Result<MemoryStats> {
        self.check(Metric::Memory)?;
        Ok(MemoryStats {
            total: 8 * GIB,
            used: 2 * GIB,
            free: 6 * GIB,
            usage_percent: 25.0,
        })
    }

    fn disk(&mut self) -> Result<DiskStats> {
        self.check(Metric::Disk)?;
        Ok(DiskStats {
            total: 100 * GIB,
            used: 40 * GIB,
            free: 60 * GIB,
            usage_percent: 40.0,
        })
    }

    fn network(&mut self) -> Result<NetworkStats> {
        self.check(Metric::Network)?;
        Ok(NetworkStats {
            bytes_sent: 1_000,
            bytes_received: 5_000,
        })
    }

    fn host(&mut self) -> Result<HostStats> {
        self.check(Metric::Host)?;
        Ok(HostStats {
            hostname: "web01".to_string(),
            uptime: 86_400,
            load_average: [0.42, 0.35, 0.3],
        })
    }
}

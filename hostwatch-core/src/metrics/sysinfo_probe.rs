use std::path::Path;
use sysinfo::{Disks, Networks, System};

use super::HostProbe;
use crate::error::{Error, Result};
use crate::model::{CpuStats, DiskStats, HostStats, MemoryStats, NetworkStats};

/// `HostProbe` backed by the `sysinfo` crate.
///
/// Keeps its `System` between calls so CPU usage is measured over the
/// window between two consecutive ticks.
pub struct SysinfoProbe {
    sys: System,
    disks: Disks,
    networks: Networks,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        let mut sys = System::new();
        // baseline for the first usage delta
        sys.refresh_cpu();

        Self {
            sys,
            disks: Disks::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

fn percent(part: u64, total: u64) -> f64 {
    if total > 0 {
        part as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

impl HostProbe for SysinfoProbe {
    fn cpu(&mut self) -> Result<CpuStats> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(Error::Probe("cpu usage not supported on this platform".into()));
        }
        self.sys.refresh_cpu();
        Ok(CpuStats {
            usage_percent: self.sys.global_cpu_info().cpu_usage() as f64,
        })
    }

    fn memory(&mut self) -> Result<MemoryStats> {
        self.sys.refresh_memory();
        let total = self.sys.total_memory();
        if total == 0 {
            return Err(Error::Probe("memory counters unavailable".into()));
        }
        let used = self.sys.used_memory();

        Ok(MemoryStats {
            total,
            used,
            free: self.sys.free_memory(),
            usage_percent: percent(used, total),
        })
    }

    fn disk(&mut self) -> Result<DiskStats> {
        self.disks.refresh_list();
        let root = self
            .disks
            .list()
            .iter()
            .find(|disk| disk.mount_point() == Path::new("/"))
            .ok_or_else(|| Error::Probe("no filesystem mounted at /".into()))?;

        let total = root.total_space();
        let free = root.available_space();
        let used = total.saturating_sub(free);

        Ok(DiskStats {
            total,
            used,
            free,
            usage_percent: percent(used, total),
        })
    }

    fn network(&mut self) -> Result<NetworkStats> {
        self.networks.refresh_list();

        let mut interfaces: Vec<_> = self.networks.iter().collect();
        interfaces.sort_by(|a, b| a.0.cmp(b.0));
        // first by name, loopback only when nothing else exists
        let (name, data) = interfaces
            .iter()
            .find(|(name, _)| !name.starts_with("lo"))
            .or_else(|| interfaces.first())
            .ok_or_else(|| Error::Probe("no network interface".into()))?;
        tracing::trace!("Network counters from {}", name);

        Ok(NetworkStats {
            bytes_sent: data.total_transmitted(),
            bytes_received: data.total_received(),
        })
    }

    fn host(&mut self) -> Result<HostStats> {
        let load = System::load_average();
        Ok(HostStats {
            hostname: System::host_name().unwrap_or_default(),
            uptime: System::uptime(),
            load_average: [load.one, load.five, load.fifteen],
        })
    }
}

//! Engine configuration
//!
//! Handles:
//! - Sampler cadence
//! - Log sources (name -> file path) and summary tuning
//! - Listing command timeout
//!
//! Loaded from YAML. Every field has a default so a partial file (or no
//! file at all) is valid.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::Result;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "HOSTWATCH_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "hostwatch.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sampler: SamplerConfig,
    pub logs: LogsConfig,
    pub commands: CommandsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    /// Source name -> backing file. Iteration order (sorted by name) is the
    /// order the summary walks the sources.
    pub sources: BTreeMap<String, PathBuf>,
    pub summary_ttl_secs: u64,
    /// Per-source record cap used when computing the summary
    pub summary_sample: usize,
    pub recent_errors: usize,
    pub recent_error_order: RecentErrorOrder,
}

/// How the summary picks its recent errors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecentErrorOrder {
    /// First errors met while walking sources in order
    #[default]
    SourceOrder,
    /// Newest errors across all sources, newest first
    Newest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    pub timeout_secs: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self { interval_secs: 5 }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        let sources = [
            ("auth", "/var/log/auth.log"),
            ("syslog", "/var/log/syslog"),
            ("kern", "/var/log/kern.log"),
            ("fail2ban", "/var/log/fail2ban.log"),
        ]
        .into_iter()
        .map(|(name, path)| (name.to_string(), PathBuf::from(path)))
        .collect();

        Self {
            sources,
            summary_ttl_secs: 300,
            summary_sample: 1000,
            recent_errors: 10,
            recent_error_order: RecentErrorOrder::SourceOrder,
        }
    }
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl SamplerConfig {
    pub fn interval(&self) -> Duration {
        // a zero period would make tokio's interval panic
        Duration::from_secs(self.interval_secs.max(1))
    }
}

impl LogsConfig {
    pub fn summary_ttl(&self) -> Duration {
        Duration::from_secs(self.summary_ttl_secs)
    }
}

impl CommandsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl EngineConfig {
    /// Strict parse, for callers that want to reject a bad file
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load from `$HOSTWATCH_CONFIG` (default `hostwatch.yaml`).
    ///
    /// A missing, empty or invalid file falls back to defaults.
    pub async fn load() -> Self {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::load_from(&path).await
    }

    pub async fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Cannot read config {}: {}", path.display(), e);
                return Self::default();
            }
        };

        Self::from_yaml_str(&text).unwrap_or_else(|e| {
            warn!("Invalid config {}: {}", path.display(), e);
            Self::default()
        })
    }
}

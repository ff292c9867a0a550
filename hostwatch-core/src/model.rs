//! Domain records produced by the engine
//!
//! Everything here is plain data: snapshots from the sampler, records from
//! the text parsers, and the query/summary types of the log store. Field
//! names serialize in camelCase, the shape the dashboard consumes.

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One immutable sample of host resource metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    pub cpu: CpuStats,
    pub memory: MemoryStats,
    pub disk: DiskStats,
    pub network: NetworkStats,
    pub system: HostStats,
    pub taken_at: DateTime<Local>,
}

/// CPU usage over the last sampling window
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuStats {
    pub usage_percent: f64,
}

/// Virtual memory usage, in bytes
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub usage_percent: f64,
}

/// Root filesystem usage, in bytes
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskStats {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub usage_percent: f64,
}

/// Cumulative counters of the observed network interface
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStats {
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

/// Host identity and load
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostStats {
    pub hostname: String,
    pub uptime: u64,
    pub load_average: [f64; 3], // [1min, 5min, 15min]
}

/// Heuristic severity of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    /// Case-insensitive; accepts the short `warn` alias.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = String;

    fn try_from(value: String) -> Result<Self, String> {
        value.parse()
    }
}

/// One structured log line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub timestamp: NaiveDateTime,
    /// Host token of the line (the field right after the timestamp)
    pub source: String,
    pub level: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_name: Option<String>,
    #[serde(rename = "processId", skip_serializing_if = "Option::is_none")]
    pub process_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

/// Filter applied to one configured log source
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogQuery {
    pub source: String,
    pub level: Option<Severity>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub search: Option<String>,
    /// Keeps the last N matches, not the first N
    pub limit: Option<usize>,
}

impl LogQuery {
    pub fn for_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn level(mut self, level: Severity) -> Self {
        self.level = Some(level);
        self
    }

    pub fn between(mut self, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        self.start_time = start;
        self.end_time = end;
        self
    }

    pub fn search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Aggregate over every configured log source
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSummary {
    pub total_entries: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub source_counts: BTreeMap<String, usize>,
    pub recent_errors: Vec<LogRecord>,
    pub last_update_time: DateTime<Local>,
}

/// One numbered firewall rule
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRule {
    /// Rule position; shifts when earlier rules are deleted
    pub id: u32,
    pub action: String,
    pub protocol: String,
    pub port: u16,
    /// Empty means from anywhere
    pub source: String,
    pub enabled: bool,
}

/// One listening socket
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRecord {
    pub number: u16,
    pub protocol: String,
    pub status: String,
    pub service: String,
}

/// Service unit state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Active,
    Inactive,
    Failed,
    Unknown,
}

/// One service unit from the service listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    pub name: String,
    pub display_name: String,
    pub status: ServiceState,
    pub description: String,
}

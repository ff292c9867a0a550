//! Structured log store
//!
//! Each configured source (name -> file) is read and parsed in full on its
//! first query, then served from memory. Nothing refreshes the cache on its
//! own: lines appended later stay invisible until `invalidate` is called or
//! the process restarts.
//!
//! Locking:
//! - the per-source cache sits behind a read/write lock that is never held
//!   across a file read; a parsed set is inserted in one step, first writer
//!   wins, so readers see a source either absent or complete
//! - the summary sits behind an async mutex held for the whole
//!   recomputation, so at most one recomputation runs at a time while plain
//!   queries keep going

use chrono::Local;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{LogsConfig, RecentErrorOrder};
use crate::error::{Error, Result};
use crate::model::{LogQuery, LogRecord, LogSummary, Severity};
use crate::parser::parse_log_text;

struct CachedSummary {
    summary: Arc<LogSummary>,
    computed_at: Instant,
}

pub struct LogStore {
    config: LogsConfig,
    cache: RwLock<HashMap<String, Arc<Vec<LogRecord>>>>,
    summary: Mutex<Option<CachedSummary>>,
}

/// Apply a query's filters to an ordered record set.
///
/// Order: time range (inclusive) -> severity -> text search -> keep the
/// last `limit` matches. Input order is preserved.
pub fn filter_records(records: &[LogRecord], query: &LogQuery) -> Vec<LogRecord> {
    let needle = query.search.as_deref().filter(|s| !s.is_empty()).map(str::to_lowercase);

    let mut filtered: Vec<LogRecord> = records
        .iter()
        .filter(|r| query.start_time.map_or(true, |start| r.timestamp >= start))
        .filter(|r| query.end_time.map_or(true, |end| r.timestamp <= end))
        .filter(|r| query.level.map_or(true, |level| r.level == level))
        .filter(|r| {
            needle
                .as_ref()
                .map_or(true, |needle| r.message.to_lowercase().contains(needle))
        })
        .cloned()
        .collect();

    if let Some(limit) = query.limit.filter(|l| *l > 0) {
        if filtered.len() > limit {
            filtered.drain(..filtered.len() - limit);
        }
    }

    filtered
}

impl LogStore {
    pub fn new(config: LogsConfig) -> Self {
        Self {
            config,
            cache: RwLock::new(HashMap::new()),
            summary: Mutex::new(None),
        }
    }

    /// Configured source names, in summary iteration order
    pub fn sources(&self) -> Vec<String> {
        self.config.sources.keys().cloned().collect()
    }

    pub fn is_cached(&self, source: &str) -> bool {
        self.cache.read().contains_key(source)
    }

    fn path_of(&self, source: &str) -> Result<&Path> {
        self.config
            .sources
            .get(source)
            .map(PathBuf::as_path)
            .ok_or_else(|| Error::UnknownSource(source.to_string()))
    }

    async fn read_source(&self, source: &str) -> Result<Vec<u8>> {
        let path = self.path_of(source)?;
        tokio::fs::read(path).await.map_err(|error| Error::SourceUnavailable {
            name: source.to_string(),
            error,
        })
    }

    /// Parsed records of one source, reading the file on first use
    async fn records(&self, source: &str) -> Result<Arc<Vec<LogRecord>>> {
        if let Some(cached) = self.cache.read().get(source) {
            return Ok(cached.clone());
        }

        let raw = self.read_source(source).await?;
        // whole files can be large; keep the parse off the async workers
        let parsed = tokio::task::spawn_blocking(move || {
            parse_log_text(&String::from_utf8_lossy(&raw), Local::now().naive_local())
        })
        .await?;
        debug!("Parsed {} records from source {}", parsed.len(), source);

        let mut cache = self.cache.write();
        let records = cache
            .entry(source.to_string())
            .or_insert_with(|| Arc::new(parsed))
            .clone();
        Ok(records)
    }

    /// Filtered records of one configured source
    pub async fn query(&self, query: &LogQuery) -> Result<Vec<LogRecord>> {
        let records = self.records(&query.source).await?;
        Ok(filter_records(&records, query))
    }

    /// Drop one source from the cache so the next query re-reads it.
    ///
    /// Returns whether anything was cached.
    pub fn invalidate(&self, source: &str) -> Result<bool> {
        self.path_of(source)?;
        let removed = self.cache.write().remove(source).is_some();
        if removed {
            info!("Log cache for {} invalidated", source);
        }
        Ok(removed)
    }

    /// Aggregate over all sources, recomputed once the TTL has passed
    pub async fn summary(&self) -> Arc<LogSummary> {
        let mut cached = self.summary.lock().await;
        if let Some(current) = cached.as_ref() {
            if current.computed_at.elapsed() < self.config.summary_ttl() {
                return current.summary.clone();
            }
        }

        let summary = Arc::new(self.compute_summary().await);
        *cached = Some(CachedSummary {
            summary: summary.clone(),
            computed_at: Instant::now(),
        });
        summary
    }

    async fn compute_summary(&self) -> LogSummary {
        debug!("Recomputing log summary");
        let wanted = self.config.recent_errors;
        let mut summary = LogSummary {
            total_entries: 0,
            error_count: 0,
            warning_count: 0,
            source_counts: Default::default(),
            recent_errors: Vec::new(),
            last_update_time: Local::now(),
        };

        for source in self.config.sources.keys() {
            let query = LogQuery::for_source(source.as_str()).limit(self.config.summary_sample);
            let records = match self.query(&query).await {
                Ok(records) => records,
                Err(e) => {
                    warn!("Summary skips source {}: {}", source, e);
                    continue;
                }
            };

            summary.total_entries += records.len();
            summary.source_counts.insert(source.clone(), records.len());

            for record in records {
                match record.level {
                    Severity::Error => {
                        summary.error_count += 1;
                        match self.config.recent_error_order {
                            RecentErrorOrder::SourceOrder if summary.recent_errors.len() >= wanted => {}
                            _ => summary.recent_errors.push(record),
                        }
                    }
                    Severity::Warning => summary.warning_count += 1,
                    Severity::Info => {}
                }
            }
        }

        if self.config.recent_error_order == RecentErrorOrder::Newest {
            summary.recent_errors.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            summary.recent_errors.truncate(wanted);
        }

        summary.last_update_time = Local::now();
        summary
    }

    /// Copy a source's raw file into `dir` as `<source>_<YYYYmmdd_HHMMSS>.log`
    pub async fn export(&self, source: &str, dir: &Path) -> Result<PathBuf> {
        let raw = self.read_source(source).await?;
        let target = dir.join(format!("{}_{}.log", source, Local::now().format("%Y%m%d_%H%M%S")));
        tokio::fs::write(&target, raw).await?;
        info!("Exported log {} to {}", source, target.display());
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::io::Write;
    use std::time::Duration;
    use tempfile::TempDir;

    const AUTH_LOG: &str = "\
2024-03-10T08:00:00 web01 sshd[100]: Accepted publickey for deploy from 10.0.0.2
2024-03-10T08:05:00 web01 sshd[101]: Failed password for root from 192.168.1.5
garbage that is not a log line
2024-03-10T08:10:00 web01 sudo[102]: warning: unusual sudo usage
2024-03-10T08:15:00 web01 sshd[103]: error: maximum authentication attempts exceeded
2024-03-10T08:20:00 web01 sshd[104]: session opened for user deploy
";

    const KERN_LOG: &str = "\
2024-03-10T07:00:00 web01 kernel: usb 1-1: new high-speed USB device
2024-03-10T09:00:00 web01 kernel: EXT4-fs error (device sda1): bad block
";

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    fn store_with(files: &[(&str, &str)]) -> (TempDir, LogStore, LogsConfig) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = LogsConfig {
            sources: Default::default(),
            ..LogsConfig::default()
        };
        for (name, content) in files {
            let path = dir.path().join(format!("{name}.log"));
            std::fs::write(&path, content).unwrap();
            config.sources.insert(name.to_string(), path);
        }
        let store = LogStore::new(config.clone());
        (dir, store, config)
    }

    fn append(config: &LogsConfig, source: &str, line: &str) {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&config.sources[source])
            .unwrap();
        writeln!(file, "{line}").unwrap();
    }

    #[tokio::test]
    async fn test_query_whole_source_in_file_order() {
        let (_dir, store, _) = store_with(&[("auth", AUTH_LOG)]);
        let records = store.query(&LogQuery::for_source("auth")).await.unwrap();

        assert_eq!(records.len(), 5);
        assert_eq!(records[0].timestamp, at(8, 0));
        assert_eq!(records[4].timestamp, at(8, 20));
        assert_eq!(records[1].ip.as_deref(), Some("192.168.1.5"));
    }

    #[tokio::test]
    async fn test_limit_keeps_the_tail() {
        let (_dir, store, _) = store_with(&[("auth", AUTH_LOG)]);
        let records = store.query(&LogQuery::for_source("auth").limit(2)).await.unwrap();

        let times: Vec<_> = records.iter().map(|r| r.timestamp).collect();
        assert_eq!(times, vec![at(8, 15), at(8, 20)]);
    }

    #[tokio::test]
    async fn test_filters_compose() {
        let (_dir, store, _) = store_with(&[("auth", AUTH_LOG)]);

        let errors = store
            .query(&LogQuery::for_source("auth").level(Severity::Error))
            .await
            .unwrap();
        assert_eq!(errors.len(), 2);

        // bounds are inclusive
        let window = store
            .query(&LogQuery::for_source("auth").between(Some(at(8, 5)), Some(at(8, 15))))
            .await
            .unwrap();
        assert_eq!(window.len(), 3);

        let search = store
            .query(&LogQuery::for_source("auth").search("DEPLOY"))
            .await
            .unwrap();
        assert_eq!(search.len(), 2);

        // the limit applies after every other filter
        let combined = store
            .query(
                &LogQuery::for_source("auth")
                    .between(Some(at(8, 0)), Some(at(8, 12)))
                    .search("sshd")
                    .limit(1),
            )
            .await
            .unwrap();
        assert!(combined.is_empty());

        let combined = store
            .query(&LogQuery::for_source("auth").level(Severity::Error).limit(1))
            .await
            .unwrap();
        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0].timestamp, at(8, 15));
    }

    #[tokio::test]
    async fn test_empty_search_and_zero_limit_are_ignored() {
        let (_dir, store, _) = store_with(&[("auth", AUTH_LOG)]);
        let records = store
            .query(&LogQuery::for_source("auth").search("").limit(0))
            .await
            .unwrap();
        assert_eq!(records.len(), 5);
    }

    #[tokio::test]
    async fn test_unknown_source() {
        let (_dir, store, _) = store_with(&[("auth", AUTH_LOG)]);
        let err = store.query(&LogQuery::for_source("nginx")).await.unwrap_err();
        assert!(matches!(err, Error::UnknownSource(name) if name == "nginx"));
        assert!(matches!(store.invalidate("nginx"), Err(Error::UnknownSource(_))));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_cached() {
        let (_dir, store, config) = store_with(&[("auth", AUTH_LOG)]);
        let path = config.sources["auth"].clone();
        std::fs::remove_file(&path).unwrap();

        let err = store.query(&LogQuery::for_source("auth")).await.unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable { .. }));
        assert!(!store.is_cached("auth"));

        std::fs::write(&path, KERN_LOG).unwrap();
        assert_eq!(store.query(&LogQuery::for_source("auth")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cache_hides_appended_lines_until_invalidated() {
        let (_dir, store, config) = store_with(&[("auth", AUTH_LOG)]);
        assert_eq!(store.query(&LogQuery::for_source("auth")).await.unwrap().len(), 5);
        assert!(store.is_cached("auth"));

        append(&config, "auth", "2024-03-10T08:30:00 web01 sshd[105]: Connection closed");
        assert_eq!(store.query(&LogQuery::for_source("auth")).await.unwrap().len(), 5);

        assert!(store.invalidate("auth").unwrap());
        assert!(!store.invalidate("auth").unwrap());
        assert_eq!(store.query(&LogQuery::for_source("auth")).await.unwrap().len(), 6);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_queries_agree() {
        let (_dir, store, _) = store_with(&[("auth", AUTH_LOG), ("kern", KERN_LOG)]);
        let store = Arc::new(store);

        let mut tasks = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            let source = if i % 2 == 0 { "auth" } else { "kern" };
            tasks.push(tokio::spawn(async move {
                (source, store.query(&LogQuery::for_source(source)).await.unwrap().len())
            }));
        }

        for task in tasks {
            let (source, len) = task.await.unwrap();
            assert_eq!(len, if source == "auth" { 5 } else { 2 });
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_large_source_parse_leaves_runtime_free() {
        let mut text = String::new();
        for i in 0..20_000u32 {
            let (m, sec) = (i / 60 % 60, i % 60);
            text.push_str(&format!("2024-03-10T{:02}:{m:02}:{sec:02} web01 app[{i}]: request {i} served\n", i / 3600));
        }
        let (_dir, store, _) = store_with(&[("app", text.as_str())]);
        let store = Arc::new(store);

        let ticks = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let heartbeat = {
            let ticks = ticks.clone();
            tokio::spawn(async move {
                loop {
                    ticks.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                    tokio::task::yield_now().await;
                }
            })
        };

        let tail = store.query(&LogQuery::for_source("app").limit(3)).await.unwrap();
        heartbeat.abort();

        assert_eq!(tail.len(), 3);
        assert_eq!(tail[2].process_id, Some(19_999));
        assert!(ticks.load(std::sync::atomic::Ordering::Relaxed) > 0);
    }

    #[tokio::test]
    async fn test_summary_counts() {
        let (_dir, store, _) = store_with(&[("auth", AUTH_LOG), ("kern", KERN_LOG)]);
        let summary = store.summary().await;

        assert_eq!(summary.total_entries, 7);
        assert_eq!(summary.error_count, 3);
        assert_eq!(summary.warning_count, 1);
        assert_eq!(summary.source_counts["auth"], 5);
        assert_eq!(summary.source_counts["kern"], 2);
        // source order: auth errors first, then kern
        let times: Vec<_> = summary.recent_errors.iter().map(|r| r.timestamp).collect();
        assert_eq!(times, vec![at(8, 5), at(8, 15), at(9, 0)]);
    }

    #[tokio::test]
    async fn test_summary_recent_errors_are_capped() {
        let (_dir, store, mut config) = store_with(&[("auth", AUTH_LOG), ("kern", KERN_LOG)]);
        drop(store);
        config.recent_errors = 2;
        let store = LogStore::new(config.clone());
        let summary = store.summary().await;
        assert_eq!(summary.error_count, 3);
        let times: Vec<_> = summary.recent_errors.iter().map(|r| r.timestamp).collect();
        assert_eq!(times, vec![at(8, 5), at(8, 15)]);

        config.recent_error_order = RecentErrorOrder::Newest;
        let store = LogStore::new(config);
        let times: Vec<_> = store.summary().await.recent_errors.iter().map(|r| r.timestamp).collect();
        assert_eq!(times, vec![at(9, 0), at(8, 15)]);
    }

    #[tokio::test]
    async fn test_summary_skips_failing_sources() {
        let (_dir, store, config) = store_with(&[("auth", AUTH_LOG), ("kern", KERN_LOG)]);
        std::fs::remove_file(&config.sources["kern"]).unwrap();

        let summary = store.summary().await;
        assert_eq!(summary.total_entries, 5);
        assert!(!summary.source_counts.contains_key("kern"));
    }

    #[tokio::test]
    async fn test_summary_sample_caps_each_source() {
        let (_dir, store, mut config) = store_with(&[("auth", AUTH_LOG)]);
        drop(store);
        config.summary_sample = 2;
        let summary = LogStore::new(config).summary().await;
        assert_eq!(summary.total_entries, 2);
        assert_eq!(summary.error_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_summary_is_reused_within_ttl() {
        let (_dir, store, config) = store_with(&[("auth", AUTH_LOG)]);
        let first = store.summary().await;

        append(&config, "auth", "2024-03-10T08:30:00 web01 sshd[105]: error: late failure");
        store.invalidate("auth").unwrap();

        tokio::time::advance(Duration::from_secs(299)).await;
        let second = store.summary().await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.error_count, 2);

        tokio::time::advance(Duration::from_secs(2)).await;
        let third = store.summary().await;
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.error_count, 3);
        assert_eq!(third.total_entries, 6);
    }

    #[tokio::test]
    async fn test_export_copies_raw_file() {
        let (_dir, store, _) = store_with(&[("auth", AUTH_LOG)]);
        let out = tempfile::tempdir().unwrap();

        let path = store.export("auth", out.path()).await.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("auth_"));
        assert!(name.ends_with(".log"));
        // auth_YYYYmmdd_HHMMSS.log
        assert_eq!(name.len(), "auth_".len() + 15 + ".log".len());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), AUTH_LOG);

        assert!(matches!(
            store.export("nginx", out.path()).await,
            Err(Error::UnknownSource(_))
        ));
    }
}

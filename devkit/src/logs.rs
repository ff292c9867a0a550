//! Temporary log directories

use anyhow::{Context, Result};
use hostwatch_core::config::{EngineConfig, LogsConfig};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::fixtures;

/// Log files in a temp dir plus the `LogsConfig` pointing at them.
///
/// The directory is removed when the fixture is dropped.
pub struct LogFixture {
    dir: TempDir,
    config: LogsConfig,
}

impl LogFixture {
    /// No sources configured
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("Failed to create temp log dir")?;
        let config = LogsConfig {
            sources: Default::default(),
            ..LogsConfig::default()
        };
        Ok(Self { dir, config })
    }

    /// `auth`, `kern` and `syslog` filled from `fixtures`
    pub fn standard() -> Result<Self> {
        let mut fixture = Self::new()?;
        fixture.add_source("auth", fixtures::AUTH_LOG)?;
        fixture.add_source("kern", fixtures::KERN_LOG)?;
        fixture.add_source("syslog", fixtures::SYSLOG)?;
        Ok(fixture)
    }

    pub fn add_source(&mut self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.file_of(name);
        std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        self.config.sources.insert(name.to_string(), path.clone());
        Ok(path)
    }

    /// Configure a source whose file does not exist
    pub fn add_missing_source(&mut self, name: &str) -> PathBuf {
        let path = self.file_of(name);
        self.config.sources.insert(name.to_string(), path.clone());
        path
    }

    pub fn append(&self, name: &str, line: &str) -> Result<()> {
        let path = self.source_path(name)?;
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        std::fs::remove_file(self.source_path(name)?)?;
        Ok(())
    }

    pub fn source_path(&self, name: &str) -> Result<&Path> {
        self.config
            .sources
            .get(name)
            .map(PathBuf::as_path)
            .with_context(|| format!("Source not configured: {}", name))
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> LogsConfig {
        self.config.clone()
    }

    /// Default engine config with these sources
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            logs: self.config(),
            ..EngineConfig::default()
        }
    }

    fn file_of(&self, name: &str) -> PathBuf {
        self.dir.path().join(format!("{}.log", name))
    }
}

use std::time::Duration;

/// Errors surfaced by the observation engine.
///
/// Malformed lines never show up here: parsers drop them silently. Only
/// whole-source failures (unreadable file, failing command) reach callers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown log source: {0}")]
    UnknownSource(String),
    #[error("log source `{name}` unavailable: {error}")]
    SourceUnavailable {
        name: String,
        #[source]
        error: std::io::Error,
    },
    #[error("command `{command}` failed: {reason}")]
    Command { command: String, reason: String },
    #[error("command `{command}` timed out after {timeout:?}")]
    CommandTimeout { command: String, timeout: Duration },
    #[error("metric probe failed: {0}")]
    Probe(String),
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

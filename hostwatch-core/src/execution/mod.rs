//! Raw text from system listing commands
//!
//! Handles:
//! - Firewall rule listing (`ufw status numbered`)
//! - Listening socket listing (`ss -tuln`)
//! - Service unit listing (`systemctl list-units`)
//!
//! Only read-only listings live here; the parsers turn their output into
//! records. Every call runs the command again, nothing is cached.

use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command as AsyncCommand;
use tracing::debug;

use crate::error::{Error, Result};

/// Which listing to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listing {
    FirewallRules,
    OpenPorts,
    Services,
}

const FIREWALL_ARGS: &[&str] = &["status", "numbered"];
const PORTS_ARGS: &[&str] = &["-tuln"];
const SERVICES_ARGS: &[&str] = &[
    "list-units",
    "--type=service",
    "--all",
    "--no-pager",
    "--plain",
    "--no-legend",
];

impl Listing {
    /// Program and arguments producing the listing
    pub fn command(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            Listing::FirewallRules => ("ufw", FIREWALL_ARGS),
            Listing::OpenPorts => ("ss", PORTS_ARGS),
            Listing::Services => ("systemctl", SERVICES_ARGS),
        }
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (program, args) = self.command();
        write!(f, "{} {}", program, args.join(" "))
    }
}

/// Provider of raw listing text
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch(&self, listing: Listing) -> Result<String>;
}

/// Runs the real commands with a timeout
#[derive(Debug, Clone)]
pub struct SystemListings {
    timeout: Duration,
}

impl SystemListings {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run `program args...` and return its stdout; non-zero exit is an error
    pub async fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        let command_line = format!("{} {}", program, args.join(" "));
        let start_time = Instant::now();
        debug!("Executing listing command: {} (timeout: {:?})", command_line, self.timeout);

        let output = tokio::time::timeout(
            self.timeout,
            AsyncCommand::new(program)
                .args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| Error::CommandTimeout {
            command: command_line.clone(),
            timeout: self.timeout,
        })?
        .map_err(|e| Error::Command {
            command: command_line.clone(),
            reason: e.to_string(),
        })?;

        debug!("{} finished in {}ms", command_line, start_time.elapsed().as_millis());

        if !output.status.success() {
            return Err(Error::Command {
                command: command_line,
                reason: format!(
                    "exit code {}: {}",
                    output.status.code().unwrap_or(-1),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for SystemListings {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait]
impl ListingSource for SystemListings {
    async fn fetch(&self, listing: Listing) -> Result<String> {
        let (program, args) = listing.command();
        self.run(program, args).await
    }
}

/*!
# hostwatch devkit - fixtures and fakes for tests

Helpers for exercising the observation engine without touching the host:
- Sample log, firewall, socket and service listing text
- Temporary log directories with a matching `LogsConfig`
- A scripted `HostProbe` with per-metric failure switches
- A `ListingSource` answering from canned strings
*/

pub mod fixtures;
pub mod listings;
pub mod logs;
pub mod probe;

pub use listings::StaticListings;
pub use logs::LogFixture;
pub use probe::{Metric, ScriptedProbe};

use anyhow::{Context, Result};
use hostwatch_core::broadcast::SharedSnapshot;
use hostwatch_core::Subscription;
use std::time::Duration;

/// Route `tracing` output through the test harness (once per process)
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("hostwatch_core=debug"))
        .with_test_writer()
        .try_init();
}

/// Wait for the next snapshot delivered to `subscription`
pub async fn next_snapshot(subscription: &mut Subscription, within: Duration) -> Result<SharedSnapshot> {
    tokio::time::timeout(within, subscription.recv())
        .await
        .context("no snapshot before the deadline")?
        .context("subscription closed")
}

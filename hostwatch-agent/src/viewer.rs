//! Console viewer: one subscriber printing snapshots as they arrive

use hostwatch_core::Subscription;
use tracing::{debug, info};

pub async fn run(mut subscription: Subscription) {
    info!("Console viewer subscribed (id {})", subscription.id());

    while let Some(snapshot) = subscription.recv().await {
        info!(
            "cpu {:.1}% | mem {:.1}% | disk {:.1}% | net tx {} rx {} | load {:.2}",
            snapshot.cpu.usage_percent,
            snapshot.memory.usage_percent,
            snapshot.disk.usage_percent,
            snapshot.network.bytes_sent,
            snapshot.network.bytes_received,
            snapshot.system.load_average[0],
        );
        match serde_json::to_string(&*snapshot) {
            Ok(json) => debug!("snapshot {}", json),
            Err(e) => debug!("snapshot not serializable: {}", e),
        }
    }

    info!("Console viewer closed");
}

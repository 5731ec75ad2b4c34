//! Background eviction of idle sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::registry::{EvictionPolicy, SessionRegistry};

/// Upper bound on how long an expired session can linger.
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

/// Start the sweeper for `registry`'s policy.
///
/// Returns `None` under [`EvictionPolicy::Retain`].
pub fn spawn_eviction_sweeper(
    registry: Arc<SessionRegistry>,
    cancellation_token: CancellationToken,
) -> Option<JoinHandle<()>> {
    let EvictionPolicy::IdleTtl(ttl) = registry.policy() else {
        return None;
    };
    let period = ttl.clamp(MIN_SWEEP_INTERVAL, MAX_SWEEP_INTERVAL);
    info!(ttl_secs = ttl.as_secs(), "Idle session eviction enabled");

    Some(tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => break,
                _ = ticker.tick() => {
                    let evicted = registry.evict_idle(std::time::Instant::now());
                    if evicted > 0 {
                        debug!(evicted, remaining = registry.len(), "Sweep complete");
                    }
                }
            }
        }
    }))
}

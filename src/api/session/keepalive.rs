//! Keep-alive ticker for attached SSE streams.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::debug;

use super::channel::SseChannel;

/// Send a comment frame on `channel` every `period` until its stream closes.
///
/// A failed send just ends the ticker; the session is left alone.
pub fn spawn_keep_alive(channel: SseChannel, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if channel.keep_alive().is_err() {
                        break;
                    }
                }
                _ = channel.closed() => break,
            }
        }

        debug!("Keep-alive stopped");
    })
}

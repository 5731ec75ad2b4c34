//! A single logical client conversation.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, warn};

use crate::rpc::RpcResponse;

#[cfg(test)]
use mockall::automock;

/// Identifies one attachment of a channel to a session.
pub type ChannelId = u64;

/// Errors writing to a channel. Never surfaced to the client.
#[derive(Error, Diagnostic, Debug)]
pub enum DeliveryError {
    #[error("Channel is closed")]
    #[diagnostic(code(perplexica_mcp::session::closed))]
    Closed,

    #[error("Failed to serialize response: {0}")]
    #[diagnostic(code(perplexica_mcp::session::serialize))]
    Serialize(#[from] serde_json::Error),
}

/// One-way delivery mechanism for a session's responses.
#[cfg_attr(test, automock)]
pub trait Channel: Send + Sync {
    /// Write one response to the client.
    fn deliver(&self, response: &RpcResponse) -> Result<(), DeliveryError>;

    /// Whether the underlying connection can still accept writes.
    fn is_alive(&self) -> bool;
}

/// Where a delivered response ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Queued,
}

/// Result of attaching a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachOutcome {
    pub channel_id: ChannelId,
    /// A previous channel was displaced.
    pub replaced: bool,
    /// Queued responses written to the new channel.
    pub flushed: usize,
    /// False when the new channel died during the flush.
    pub attached: bool,
}

struct Attached {
    id: ChannelId,
    channel: Box<dyn Channel>,
}

struct SessionState {
    channel: Option<Attached>,
    pending: VecDeque<RpcResponse>,
    next_channel_id: ChannelId,
    in_flight: usize,
    /// Set while no channel is attached.
    idle_since: Option<Instant>,
}

/// Session state shared between the SSE and messages endpoints.
///
/// Every operation takes the session lock once and never yields while
/// holding it, so a flush cannot interleave with a concurrent delivery.
pub struct Session {
    id: String,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: Mutex::new(SessionState {
                channel: None,
                pending: VecDeque::new(),
                next_channel_id: 0,
                in_flight: 0,
                idle_since: Some(Instant::now()),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install `channel`, replacing any attached one, then flush `pending`
    /// over it in FIFO order.
    ///
    /// The displaced channel is dropped, not closed.
    pub fn attach(&self, channel: Box<dyn Channel>) -> AttachOutcome {
        let mut state = self.state();
        state.next_channel_id += 1;
        let channel_id = state.next_channel_id;
        let replaced = state.channel.take().is_some();

        let mut flushed = 0;
        while let Some(response) = state.pending.pop_front() {
            if let Err(e) = channel.deliver(&response) {
                warn!(session_id = %self.id, error = %e, "Flush failed, keeping responses queued");
                state.pending.push_front(response);
                state.idle_since = Some(Instant::now());
                return AttachOutcome {
                    channel_id,
                    replaced,
                    flushed,
                    attached: false,
                };
            }
            flushed += 1;
        }

        state.channel = Some(Attached {
            id: channel_id,
            channel,
        });
        state.idle_since = None;

        AttachOutcome {
            channel_id,
            replaced,
            flushed,
            attached: true,
        }
    }

    /// Write `response` to the attached channel, or queue it.
    ///
    /// A failed write counts as "no channel": the channel is cleared and the
    /// response is queued instead.
    pub fn deliver(&self, response: RpcResponse) -> Delivery {
        let mut state = self.state();

        let outcome = state.channel.as_ref().map(|attached| {
            if attached.channel.is_alive() {
                attached.channel.deliver(&response)
            } else {
                Err(DeliveryError::Closed)
            }
        });

        match outcome {
            Some(Ok(())) => return Delivery::Sent,
            Some(Err(e)) => {
                warn!(session_id = %self.id, error = %e, "Channel write failed, queueing response");
                state.channel = None;
                state.idle_since = Some(Instant::now());
            }
            None => {}
        }

        state.pending.push_back(response);
        debug!(session_id = %self.id, pending = state.pending.len(), "Response queued");
        Delivery::Queued
    }

    /// Clear the channel if `channel_id` is still the attached one.
    pub fn detach(&self, channel_id: ChannelId) -> bool {
        let mut state = self.state();
        let is_current = state
            .channel
            .as_ref()
            .is_some_and(|attached| attached.id == channel_id);
        if is_current {
            state.channel = None;
            state.idle_since = Some(Instant::now());
        }
        is_current
    }

    pub fn has_channel(&self) -> bool {
        self.state().channel.is_some()
    }

    pub fn pending_len(&self) -> usize {
        self.state().pending.len()
    }

    /// Snapshot of queued responses, oldest first.
    pub fn pending(&self) -> Vec<RpcResponse> {
        self.state().pending.iter().cloned().collect()
    }

    pub fn in_flight(&self) -> usize {
        self.state().in_flight
    }

    pub(crate) fn begin_dispatch(&self) {
        self.state().in_flight += 1;
    }

    pub(crate) fn end_dispatch(&self) {
        let mut state = self.state();
        state.in_flight = state.in_flight.saturating_sub(1);
    }

    /// True when nothing is attached, nothing is in flight, and the session
    /// has been idle for at least `ttl` as of `now`.
    pub fn is_idle_for(&self, ttl: Duration, now: Instant) -> bool {
        let state = self.state();
        state.channel.is_none()
            && state.in_flight == 0
            && state
                .idle_since
                .is_some_and(|since| now.saturating_duration_since(since) >= ttl)
    }
}

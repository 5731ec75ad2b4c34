//! Process-wide session registry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use tracing::info;

use super::session::{AttachOutcome, Channel, Delivery, Session};
use crate::rpc::RpcResponse;

/// Mint a fresh session id.
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// What happens to sessions left without a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Keep every session for the life of the process.
    #[default]
    Retain,
    /// Drop sessions with no channel and no in-flight dispatch once they
    /// have been idle this long.
    IdleTtl(Duration),
}

/// Diagnostic view of one session.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: String,
    pub attached: bool,
    pub pending: usize,
    pub in_flight: usize,
}

/// Maps session id to [`Session`]; never holds two entries for one id.
///
/// Owned by the HTTP state and shared with both endpoints. Lock order is
/// always map shard, then session.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Session>>,
    policy: EvictionPolicy,
}

impl SessionRegistry {
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            sessions: DashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Resolve `id`, creating the session if it is unknown.
    pub fn get_or_create(&self, id: &str) -> Arc<Session> {
        let entry = self.sessions.entry(id.to_string()).or_insert_with(|| {
            info!(session_id = id, "Session created");
            Arc::new(Session::new(id))
        });
        Arc::clone(entry.value())
    }

    /// Resolve or create `id` and attach `channel` to it.
    ///
    /// Runs under the map entry so eviction cannot remove the session
    /// between lookup and attach.
    pub fn attach(&self, id: &str, channel: Box<dyn Channel>) -> (Arc<Session>, AttachOutcome) {
        let entry = self.sessions.entry(id.to_string()).or_insert_with(|| {
            info!(session_id = id, "Session created");
            Arc::new(Session::new(id))
        });
        let session = Arc::clone(entry.value());
        let outcome = session.attach(channel);
        drop(entry);
        (session, outcome)
    }

    /// Resolve or create `id` and mark one dispatch as in flight on it.
    ///
    /// The session is pinned against eviction until the returned guard is
    /// completed or dropped.
    pub fn begin_dispatch(&self, id: &str) -> InFlight {
        let entry = self.sessions.entry(id.to_string()).or_insert_with(|| {
            info!(session_id = id, "Session created");
            Arc::new(Session::new(id))
        });
        let session = Arc::clone(entry.value());
        session.begin_dispatch();
        drop(entry);
        InFlight { session }
    }

    /// Snapshot of every session, for diagnostics.
    pub fn all(&self) -> Vec<SessionInfo> {
        self.sessions
            .iter()
            .map(|entry| {
                let session = entry.value();
                SessionInfo {
                    id: session.id().to_string(),
                    attached: session.has_channel(),
                    pending: session.pending_len(),
                    in_flight: session.in_flight(),
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Apply the eviction policy as of `now`. Returns how many sessions
    /// were removed.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let EvictionPolicy::IdleTtl(ttl) = self.policy else {
            return 0;
        };

        let mut evicted = 0;
        self.sessions.retain(|id, session| {
            let idle = session.is_idle_for(ttl, now);
            if idle {
                info!(session_id = %id, pending = session.pending_len(), "Evicting idle session");
                evicted += 1;
            }
            !idle
        });
        evicted
    }
}

/// One dispatch running against a session.
pub struct InFlight {
    session: Arc<Session>,
}

impl InFlight {
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Deliver the finished response through the session.
    pub fn complete(self, response: RpcResponse) -> Delivery {
        self.session.deliver(response)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.session.end_dispatch();
    }
}

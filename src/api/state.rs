//! Application state for the HTTP transport.

use std::sync::Arc;
use std::time::Duration;

use super::session::SessionRegistry;
use crate::mcp::Dispatcher;
use crate::search::SearchBackend;

/// Shared application state.
///
/// Generic over `B: SearchBackend`, so tests can run the full HTTP stack
/// against a canned backend. Dependencies are injected via constructor.
pub struct AppState<B: SearchBackend> {
    dispatcher: Arc<Dispatcher<B>>,
    registry: Arc<SessionRegistry>,
    keep_alive: Duration,
}

// Manual Clone impl - only the Arcs are cloned, B need not be Clone
impl<B: SearchBackend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
            registry: Arc::clone(&self.registry),
            keep_alive: self.keep_alive,
        }
    }
}

impl<B: SearchBackend> AppState<B> {
    /// Create a new AppState.
    ///
    /// - `dispatcher`: shared with every in-flight request task
    /// - `registry`: the session registry both endpoints operate on
    /// - `keep_alive`: interval between keep-alive frames on each SSE stream
    pub fn new(
        dispatcher: Arc<Dispatcher<B>>,
        registry: Arc<SessionRegistry>,
        keep_alive: Duration,
    ) -> Self {
        Self {
            dispatcher,
            registry,
            keep_alive,
        }
    }

    /// Get a cloned Arc to the dispatcher.
    pub fn dispatcher(&self) -> Arc<Dispatcher<B>> {
        Arc::clone(&self.dispatcher)
    }

    /// Get a reference to the session registry.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Get a cloned Arc to the session registry.
    pub fn registry_arc(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn keep_alive(&self) -> Duration {
        self.keep_alive
    }
}

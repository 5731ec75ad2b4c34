//! Perplexica search collaborator.
//!
//! The dispatcher only ever sees the [`SearchBackend`] trait. The production
//! implementation, [`PerplexicaClient`], resolves chat and embedding providers
//! and forwards the normalized query to Perplexica's search API.

mod client;
mod error;
mod models;
mod provider;


use std::future::Future;

pub use client::PerplexicaClient;
pub use error::{SearchError, SearchResult};
pub use models::{
    FocusMode, HistoryEntry, OptimizationMode, Provider, ResolvedModels, SearchAnswer,
    SearchOutcome, SearchQuery, SearchSettings,
};
pub use provider::{pick_embedding_provider, pick_provider};

/// Anything that can answer a normalized search query, reporting which
/// providers and models it used.
///
/// Generic seam used by the dispatcher (no dynamic dispatch), so tests can
/// plug in a canned backend without touching the network.
pub trait SearchBackend: Send + Sync {
    fn search(&self, query: SearchQuery)
        -> impl Future<Output = SearchResult<SearchOutcome>> + Send;
}

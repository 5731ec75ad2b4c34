//! Test doubles shared across module tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::json;

use crate::mcp::Dispatcher;
use crate::mcp::tools::SearchDefaults;
use crate::search::{
    ResolvedModels, SearchAnswer, SearchBackend, SearchError, SearchOutcome, SearchQuery,
    SearchResult,
};

#[derive(Clone)]
enum Failure {
    Status(u16, String),
    NoProviders,
}

/// Canned search backend that counts calls and can be slowed down.
#[derive(Clone)]
pub struct StaticBackend {
    answer: SearchAnswer,
    failure: Option<Failure>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl StaticBackend {
    /// Answers `ANSWER` with a single source titled `S`, via providers
    /// `p-chat` and `p-embed`.
    pub fn new() -> Self {
        Self {
            answer: SearchAnswer {
                message: "ANSWER".to_string(),
                sources: vec![json!({"title": "S"})],
            },
            failure: None,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self, status: u16, body: &str) -> Self {
        self.failure = Some(Failure::Status(status, body.to_string()));
        self
    }

    pub fn without_providers(mut self) -> Self {
        self.failure = Some(Failure::NoProviders);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SearchBackend for StaticBackend {
    async fn search(&self, _query: SearchQuery) -> SearchResult<SearchOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.failure {
            Some(Failure::Status(status, body)) => Err(SearchError::Search {
                status: *status,
                body: body.clone(),
            }),
            Some(Failure::NoProviders) => Err(SearchError::NoProviders),
            None => Ok(SearchOutcome {
                answer: self.answer.clone(),
                models: ResolvedModels {
                    provider_id: "p-chat".to_string(),
                    embed_provider_id: "p-embed".to_string(),
                    llm_model: "gpt-4o-mini".to_string(),
                    embedding_model: "text-embedding-3-small".to_string(),
                },
            }),
        }
    }
}

pub fn dispatcher(backend: StaticBackend) -> Arc<Dispatcher<StaticBackend>> {
    Arc::new(Dispatcher::new(backend, SearchDefaults::default()))
}

//! Search collaborator error types.

use miette::Diagnostic;
use thiserror::Error;

/// Failures talking to Perplexica. None of these are retried.
#[derive(Error, Diagnostic, Debug)]
pub enum SearchError {
    #[error("Failed to reach Perplexica: {source}")]
    #[diagnostic(
        code(perplexica_mcp::search::http),
        help("Check PERPLEXICA_API_URL and that the Perplexica backend is running.")
    )]
    Http {
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to fetch providers ({status}): {body}")]
    #[diagnostic(code(perplexica_mcp::search::providers))]
    Providers { status: u16, body: String },

    #[error("Search failed ({status}): {body}")]
    #[diagnostic(code(perplexica_mcp::search::search_failed))]
    Search { status: u16, body: String },

    #[error("No configured providers found in Perplexica")]
    #[diagnostic(
        code(perplexica_mcp::search::no_providers),
        help("Configure at least one chat and embedding provider in Perplexica.")
    )]
    NoProviders,

    #[error("Invalid response from Perplexica: {message}")]
    #[diagnostic(code(perplexica_mcp::search::invalid_response))]
    InvalidResponse { message: String },
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SearchError::InvalidResponse {
                message: e.to_string(),
            }
        } else {
            SearchError::Http { source: e }
        }
    }
}

pub type SearchResult<T> = Result<T, SearchError>;

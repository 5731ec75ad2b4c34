//! Perplexica MCP server binary.
//!
//! Builds the Perplexica client from configuration and serves it over the
//! selected transport.

use std::sync::Arc;

use miette::Diagnostic;
use perplexica_mcp::api::{self, AppState, ServerError, SessionRegistry};
use perplexica_mcp::config::{Config, Transport};
use perplexica_mcp::mcp::{Dispatcher, serve_stdio};
use perplexica_mcp::search::{PerplexicaClient, SearchError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Error, Diagnostic, Debug)]
enum BinaryError {
    #[error("Failed to build Perplexica client: {0}")]
    #[diagnostic(code(perplexica_mcp::binary::client))]
    Client(#[from] SearchError),

    #[error("stdio transport failed: {0}")]
    #[diagnostic(code(perplexica_mcp::binary::stdio))]
    Stdio(#[from] std::io::Error),

    #[error("HTTP server error: {0}")]
    #[diagnostic(code(perplexica_mcp::binary::api))]
    Api(#[from] ServerError),
}

fn init_tracing() {
    // stdout belongs to the stdio transport, so logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "perplexica_mcp=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), BinaryError> {
    let config = Config::load();
    init_tracing();

    let _ = rustls::crypto::ring::default_provider().install_default();

    let client = PerplexicaClient::new(config.search_settings())?;
    info!("Using Perplexica at {}", client.base_url());
    let dispatcher = Arc::new(Dispatcher::new(client, config.search_defaults()));

    match config.transport {
        Transport::Stdio => {
            serve_stdio(dispatcher, tokio::io::stdin(), tokio::io::stdout()).await?;
        }
        Transport::Sse => {
            let registry = Arc::new(SessionRegistry::new(config.eviction_policy()));
            let state = AppState::new(dispatcher, registry, config.keep_alive());
            api::run(config.bind_addr(), state).await?;
        }
    }

    Ok(())
}

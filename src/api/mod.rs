//! HTTP + SSE transport.
//!
//! `GET /sse` attaches a push stream to a session, `POST /messages` accepts
//! requests for it. The two flows share nothing but the [`SessionRegistry`]
//! in [`AppState`]. `POST /tools/perplexica_search` runs the search tool
//! without a session and answers in the HTTP response.

mod handlers;
pub mod routes;
pub mod session;
mod state;

#[cfg(test)]
mod handlers_test;

use std::future::IntoFuture;
use std::net::SocketAddr;

use miette::Diagnostic;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use handlers::{
    HealthResponse, SessionQuery, ToolErrorResponse, ToolSearchResponse, messages_path,
};
pub use session::{EvictionPolicy, SessionRegistry};
pub use state::AppState;

use crate::search::SearchBackend;

/// Errors starting or running the HTTP server.
#[derive(Error, Diagnostic, Debug)]
pub enum ServerError {
    #[error("Failed to bind or serve: {0}")]
    #[diagnostic(
        code(perplexica_mcp::api::io),
        help("Is another process already listening on MCP_PORT?")
    )]
    Io(#[from] std::io::Error),
}

/// Run the HTTP server until Ctrl-C.
pub async fn run<B: SearchBackend + 'static>(
    addr: SocketAddr,
    state: AppState<B>,
) -> Result<(), ServerError> {
    let cancellation_token = CancellationToken::new();
    let sweeper = session::spawn_eviction_sweeper(state.registry_arc(), cancellation_token.clone());

    let app = routes::create_router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("MCP SSE server listening on http://{}", listener.local_addr()?);

    tokio::select! {
        result = axum::serve(listener, app).into_future() => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
    }

    cancellation_token.cancel();
    if let Some(sweeper) = sweeper {
        let _ = sweeper.await;
    }
    Ok(())
}

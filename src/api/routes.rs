//! HTTP route configuration.

use axum::Router;
use axum::routing::{get, post};

use super::handlers;
use super::state::AppState;
use crate::search::SearchBackend;

/// Build routes with generic backend type.
///
/// This macro reduces boilerplate when registering handlers that are generic
/// over the SearchBackend trait. It applies the turbofish operator automatically.
macro_rules! routes {
    ($B:ty => {
        $($method:ident $path:literal => $($handler:ident)::+),* $(,)?
    }) => {{
        let router = Router::new();
        $(
            let router = router.route($path, $method($($handler)::+::<$B>));
        )*
        router
    }};
}

/// Create the HTTP router: the MCP pair `/sse` + `/messages`, the REST
/// search tool, and `/health`.
pub fn create_router<B: SearchBackend + 'static>(state: AppState<B>) -> Router {
    let system_routes = Router::new().route("/health", get(handlers::health));

    let mcp_routes = routes!(B => {
        get "/sse" => handlers::sse,
        post "/messages" => handlers::messages,
        post "/tools/perplexica_search" => handlers::tool_search,
    });

    system_routes.merge(mcp_routes).with_state(state)
}

//! `POST /messages`: accept one JSON-RPC request for out-of-band delivery.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use tracing::{debug, warn};

use super::SessionQuery;
use crate::api::session::new_session_id;
use crate::api::state::AppState;
use crate::rpc::parse_request;
use crate::search::SearchBackend;

/// Acknowledge with 202 straight away, then dispatch on a separate task.
///
/// The response (result or error) goes through the session: written to the
/// attached SSE stream, or queued until one attaches.
pub async fn messages<B: SearchBackend + 'static>(
    State(state): State<AppState<B>>,
    Query(query): Query<SessionQuery>,
    body: Bytes,
) -> StatusCode {
    let session_id = query.session_id().unwrap_or_else(|| {
        let id = new_session_id();
        warn!(session_id = %id, "POST without session_id, created orphan session");
        id
    });

    let in_flight = state.registry().begin_dispatch(&session_id);

    match parse_request(&body) {
        Ok(request) => {
            debug!(session_id = %session_id, method = %request.method, "Request accepted");
            let dispatcher = state.dispatcher();
            tokio::spawn(async move {
                if let Some(response) = dispatcher.handle(request).await {
                    let delivery = in_flight.complete(response);
                    debug!(session_id = %session_id, ?delivery, "Response delivered");
                }
            });
        }
        Err(response) => {
            warn!(session_id = %session_id, "Malformed request body");
            in_flight.complete(response);
        }
    }

    StatusCode::ACCEPTED
}

//! `GET /sse`: attach a push channel to a session.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::sse::Sse;
use tracing::{info, instrument};

use super::SessionQuery;
use crate::api::session::{SessionStream, SseChannel, new_session_id, spawn_keep_alive};
use crate::api::state::AppState;
use crate::search::SearchBackend;

/// Companion POST path for a session.
pub fn messages_path(session_id: &str) -> String {
    format!("/messages?session_id={session_id}")
}

/// Open an SSE stream for a new or returning session.
///
/// New sessions first receive an `endpoint` event naming their POST path.
/// A returning client replaces whatever channel was attached and receives
/// every response queued while it was away. Disconnecting detaches the
/// channel; the session stays registered.
#[instrument(skip(state))]
pub async fn sse<B: SearchBackend + 'static>(
    State(state): State<AppState<B>>,
    Query(query): Query<SessionQuery>,
) -> impl IntoResponse {
    let (session_id, minted) = match query.session_id() {
        Some(id) => (id, false),
        None => (new_session_id(), true),
    };

    let (channel, rx) = SseChannel::new();
    if minted {
        // Receiver is held right here, so the send cannot fail.
        let _ = channel.send_endpoint(&messages_path(&session_id));
    }

    let (session, outcome) = state
        .registry()
        .attach(&session_id, Box::new(channel.clone()));

    info!(
        session_id = %session_id,
        minted,
        replaced = outcome.replaced,
        flushed = outcome.flushed,
        "SSE client attached"
    );

    spawn_keep_alive(channel, state.keep_alive());

    (
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Sse::new(SessionStream::new(rx, session, outcome.channel_id)),
    )
}

//! SSE implementation of [`Channel`].

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::response::sse::Event;
use futures_util::Stream;
use tokio::sync::mpsc;
use tracing::info;

use super::session::{Channel, ChannelId, DeliveryError, Session};
use crate::rpc::RpcResponse;

/// One frame on an SSE stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Tells a new client where to POST its requests.
    Endpoint(String),
    /// A serialized JSON-RPC response.
    Message(String),
    KeepAlive,
}

impl Frame {
    pub fn into_event(self) -> Event {
        match self {
            Frame::Endpoint(path) => Event::default().event("endpoint").data(path),
            Frame::Message(json) => Event::default().event("message").data(json),
            Frame::KeepAlive => Event::default().comment("keepalive"),
        }
    }
}

/// Sending half of one SSE response stream.
#[derive(Clone)]
pub struct SseChannel {
    tx: mpsc::UnboundedSender<Frame>,
}

impl SseChannel {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Frame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, frame: Frame) -> Result<(), DeliveryError> {
        self.tx.send(frame).map_err(|_| DeliveryError::Closed)
    }

    pub fn send_endpoint(&self, path: &str) -> Result<(), DeliveryError> {
        self.send(Frame::Endpoint(path.to_string()))
    }

    pub fn keep_alive(&self) -> Result<(), DeliveryError> {
        self.send(Frame::KeepAlive)
    }

    /// Resolves once the response stream has been dropped.
    pub async fn closed(&self) {
        self.tx.closed().await
    }
}

impl Channel for SseChannel {
    fn deliver(&self, response: &RpcResponse) -> Result<(), DeliveryError> {
        let json = serde_json::to_string(response)?;
        self.send(Frame::Message(json))
    }

    fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Body of one `GET /sse` response.
///
/// Dropping it (client disconnect) detaches its channel from the session,
/// unless a newer channel has already replaced it. The session itself stays
/// registered.
pub struct SessionStream {
    rx: mpsc::UnboundedReceiver<Frame>,
    session: Arc<Session>,
    channel_id: ChannelId,
}

impl SessionStream {
    pub fn new(
        rx: mpsc::UnboundedReceiver<Frame>,
        session: Arc<Session>,
        channel_id: ChannelId,
    ) -> Self {
        Self {
            rx,
            session,
            channel_id,
        }
    }
}

impl Stream for SessionStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx
            .poll_recv(cx)
            .map(|frame| frame.map(|frame| Ok(frame.into_event())))
    }
}

impl Drop for SessionStream {
    fn drop(&mut self) {
        self.rx.close();
        if self.session.detach(self.channel_id) {
            info!(session_id = %self.session.id(), "SSE client disconnected");
        }
    }
}

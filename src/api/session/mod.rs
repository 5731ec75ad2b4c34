//! Session multiplexing for the HTTP transport.
//!
//! An SSE stream (server → client) and POSTed requests (client → server)
//! are joined only by a session id. Each [`Session`] owns at most one
//! attached [`Channel`] plus a FIFO of responses that completed while no
//! channel was attached.
//!
//! # Architecture
//!
//! - `session`: one conversation; attach/deliver/detach
//! - `registry`: process-wide id → session map with optional idle eviction
//! - `channel`: the SSE implementation of [`Channel`] and its response stream
//! - `keepalive`: periodic comment frames per attached stream
//! - `sweeper`: background task applying the eviction policy

mod channel;
mod keepalive;
mod registry;
#[allow(clippy::module_inception)]
mod session;
mod sweeper;


pub use channel::{Frame, SessionStream, SseChannel};
pub use keepalive::spawn_keep_alive;
pub use registry::{EvictionPolicy, InFlight, SessionInfo, SessionRegistry, new_session_id};
pub use session::{AttachOutcome, Channel, ChannelId, Delivery, DeliveryError, Session};
pub use sweeper::spawn_eviction_sweeper;

#[cfg(test)]
pub use session::MockChannel;

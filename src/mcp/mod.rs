//! Model Context Protocol (MCP) server implementation
//!
//! - **dispatcher**: maps JSON-RPC methods onto results; shared by every
//!   transport
//! - **tools**: the `perplexica_search` tool
//! - **stdio**: line-delimited JSON-RPC over a single pipe
//!
//! The dispatcher is generic over `B: SearchBackend`, so the HTTP and stdio
//! transports share one concrete type with no dynamic dispatch.

mod dispatcher;
mod error;
mod stdio;
pub mod tools;


pub use dispatcher::{Dispatcher, PROTOCOL_VERSION, SERVER_NAME};
pub use error::{DispatchError, DispatchResult};
pub use stdio::serve_stdio;

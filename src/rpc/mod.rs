//! JSON-RPC 2.0 envelope types.
//!
//! Both transports speak the same envelope: the stdio channel reads one
//! request per line, the HTTP transport reads one request per POST body.
//! Responses are built here and handed to whichever delivery path owns the
//! client.

mod message;


pub use message::{INTERNAL_ERROR, JSONRPC_VERSION, RpcError, RpcRequest, RpcResponse, parse_request};

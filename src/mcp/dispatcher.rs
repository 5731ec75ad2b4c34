//! Transport-agnostic JSON-RPC dispatcher.

use serde_json::{Value, json};
use tracing::{debug, error, info, instrument};

use super::error::{DispatchError, DispatchResult};
use super::tools::search::{self, SearchDefaults, TOOL_NAME};
use crate::rpc::{RpcError, RpcRequest, RpcResponse};
use crate::search::SearchBackend;

/// MCP protocol revision this server speaks.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Name reported in `initialize`.
pub const SERVER_NAME: &str = "perplexica-mcp";

/// Maps `(method, params)` to a result or an error.
///
/// Generic over `B: SearchBackend` (no dynamic dispatch). The same instance
/// drives the stdio channel and the HTTP messages endpoint.
pub struct Dispatcher<B: SearchBackend> {
    backend: B,
    defaults: SearchDefaults,
}

impl<B: SearchBackend> Dispatcher<B> {
    pub fn new(backend: B, defaults: SearchDefaults) -> Self {
        Self { backend, defaults }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn defaults(&self) -> &SearchDefaults {
        &self.defaults
    }

    /// Handle one request and build its response.
    ///
    /// Notifications are acknowledged silently and yield `None`.
    pub async fn handle(&self, request: RpcRequest) -> Option<RpcResponse> {
        let Some(id) = request.id else {
            debug!(method = %request.method, "Notification received");
            return None;
        };

        let response = match self.dispatch(&request.method, request.params).await {
            Ok(result) => RpcResponse::success(id, result),
            Err(e) => {
                error!(method = %request.method, error = %e, "Dispatch failed");
                RpcResponse::failure(id, RpcError::from(e))
            }
        };
        Some(response)
    }

    /// Resolve a method call. Unknown methods are a hard failure.
    #[instrument(skip(self, params))]
    pub async fn dispatch(&self, method: &str, params: Option<Value>) -> DispatchResult<Value> {
        match method {
            "initialize" => Ok(self.initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": [search::descriptor(&self.defaults)] })),
            "tools/call" => self.call_tool(params).await,
            _ => Err(DispatchError::UnknownMethod {
                method: method.to_string(),
            }),
        }
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {
                    "listChanged": false
                }
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            },
            "instructions": "Use perplexica_search to answer questions with up-to-date, sourced web results."
        })
    }

    async fn call_tool(&self, params: Option<Value>) -> DispatchResult<Value> {
        let params = params.ok_or_else(|| DispatchError::InvalidParams {
            message: "missing params".to_string(),
        })?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| DispatchError::InvalidParams {
                message: "missing tool name".to_string(),
            })?;

        if name != TOOL_NAME {
            return Err(DispatchError::UnknownTool {
                name: name.to_string(),
            });
        }

        let query = search::parse_arguments(params.get("arguments"), &self.defaults)?;
        info!(
            query = %query.query,
            focus_mode = query.focus_mode.as_str(),
            variations = query.query_variations_count,
            "Running search"
        );

        let outcome = self.backend.search(query).await?;
        Ok(search::render_answer(&outcome.answer))
    }
}

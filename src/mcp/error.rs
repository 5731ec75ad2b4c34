//! Dispatch error types.

use miette::Diagnostic;
use thiserror::Error;

use crate::rpc::RpcError;
use crate::search::SearchError;

/// Why a request could not be answered with a result.
#[derive(Error, Diagnostic, Debug)]
pub enum DispatchError {
    #[error("Method not found: {method}")]
    #[diagnostic(code(perplexica_mcp::mcp::unknown_method))]
    UnknownMethod { method: String },

    #[error("Unknown tool: {name}")]
    #[diagnostic(code(perplexica_mcp::mcp::unknown_tool))]
    UnknownTool { name: String },

    #[error("Invalid params: {message}")]
    #[diagnostic(code(perplexica_mcp::mcp::invalid_params))]
    InvalidParams { message: String },

    #[error("Missing query")]
    #[diagnostic(
        code(perplexica_mcp::mcp::missing_query),
        help("`query` must be a non-empty string.")
    )]
    MissingQuery,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Search(#[from] SearchError),
}

impl From<DispatchError> for RpcError {
    fn from(e: DispatchError) -> Self {
        RpcError::internal(e.to_string())
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;

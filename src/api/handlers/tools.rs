//! `POST /tools/perplexica_search`: the search tool as a plain REST call.
//!
//! Unlike `/messages`, the answer comes back in the HTTP response, together
//! with the providers and models that produced it.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::api::state::AppState;
use crate::mcp::tools::search::{TOOL_NAME, parse_arguments};
use crate::search::{
    FocusMode, OptimizationMode, ResolvedModels, SearchAnswer, SearchBackend, SearchError,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSearchResponse {
    pub tool: String,
    pub query: String,
    pub focus_mode: FocusMode,
    pub optimization_mode: OptimizationMode,
    #[serde(flatten)]
    pub models: ResolvedModels,
    pub result: SearchAnswer,
}

/// `{message}` for rejected input, `{message, error}` for failed searches.
#[derive(Debug, Serialize)]
pub struct ToolErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

type ToolError = (StatusCode, Json<ToolErrorResponse>);

/// Run one search synchronously.
///
/// The body takes the same fields as the tool's `arguments`. An unparseable
/// body is treated like one without a query.
#[instrument(skip(state, body))]
pub async fn tool_search<B: SearchBackend + 'static>(
    State(state): State<AppState<B>>,
    body: Bytes,
) -> Result<Json<ToolSearchResponse>, ToolError> {
    let arguments: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let dispatcher = state.dispatcher();

    let query = parse_arguments(Some(&arguments), dispatcher.defaults()).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ToolErrorResponse {
                message: e.to_string(),
                error: None,
            }),
        )
    })?;

    let text = query.query.clone();
    let focus_mode = query.focus_mode;
    let optimization_mode = query.optimization_mode;
    info!(query = %text, focus_mode = focus_mode.as_str(), "REST search");

    let outcome = dispatcher.backend().search(query).await.map_err(|e| {
        error!(error = %e, "REST search failed");
        let body = match &e {
            SearchError::NoProviders => ToolErrorResponse {
                message: e.to_string(),
                error: None,
            },
            _ => ToolErrorResponse {
                message: "MCP search error".to_string(),
                error: Some(e.to_string()),
            },
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body))
    })?;

    Ok(Json(ToolSearchResponse {
        tool: TOOL_NAME.to_string(),
        query: text,
        focus_mode,
        optimization_mode,
        models: outcome.models,
        result: outcome.answer,
    }))
}

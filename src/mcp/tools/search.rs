//! The `perplexica_search` tool: descriptor, argument normalization and
//! result rendering.

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::mcp::error::{DispatchError, DispatchResult};
use crate::search::{FocusMode, HistoryEntry, OptimizationMode, SearchAnswer, SearchQuery};

pub const TOOL_NAME: &str = "perplexica_search";

const MIN_VARIATIONS: i64 = 1;
const MAX_VARIATIONS: i64 = 5;
const DEFAULT_VARIATIONS: u8 = 1;

/// Modes applied when the caller leaves them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchDefaults {
    pub focus_mode: FocusMode,
    pub optimization_mode: OptimizationMode,
}

/// Static tool descriptor returned by `tools/list`.
pub fn descriptor(defaults: &SearchDefaults) -> Value {
    let focus_modes: Vec<&str> = FocusMode::ALL.iter().map(FocusMode::as_str).collect();
    let optimization_modes: Vec<&str> = OptimizationMode::ALL
        .iter()
        .map(OptimizationMode::as_str)
        .collect();
    let turns = json!({
        "type": "array",
        "items": {
            "type": "array",
            "items": {"type": "string"},
            "minItems": 2,
            "maxItems": 2
        }
    });

    json!({
        "name": TOOL_NAME,
        "description": "Search the web through Perplexica and return a sourced answer.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query"
                },
                "focusMode": {
                    "type": "string",
                    "enum": focus_modes,
                    "default": defaults.focus_mode.as_str(),
                    "description": "Perplexica focus mode"
                },
                "optimizationMode": {
                    "type": "string",
                    "enum": optimization_modes,
                    "default": defaults.optimization_mode.as_str(),
                    "description": "Trade answer quality for speed"
                },
                "history": merge_description(&turns, "Conversation history as [role, text] pairs (role: human or ai)"),
                "lastTwoMessages": merge_description(&turns, "Recent turns used to reformulate the query"),
                "queryVariationsCount": {
                    "type": "integer",
                    "minimum": MIN_VARIATIONS,
                    "maximum": MAX_VARIATIONS,
                    "default": DEFAULT_VARIATIONS,
                    "description": "Number of query reformulations to search with"
                }
            },
            "required": ["query"]
        }
    })
}

fn merge_description(schema: &Value, description: &str) -> Value {
    let mut schema = schema.clone();
    schema["description"] = Value::String(description.to_string());
    schema
}

/// Validate and normalize `tools/call` arguments.
///
/// Only a missing or blank `query` is rejected; every other field is coerced
/// to its default when absent or out of range.
pub fn parse_arguments(arguments: Option<&Value>, defaults: &SearchDefaults) -> DispatchResult<SearchQuery> {
    let empty = Value::Null;
    let args = arguments.unwrap_or(&empty);

    let query = args
        .get("query")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or(DispatchError::MissingQuery)?;

    let focus_mode = match args.get("focusMode").and_then(Value::as_str) {
        None | Some("") => defaults.focus_mode,
        Some(raw) => FocusMode::parse(raw).unwrap_or_else(|| {
            warn!(focus_mode = raw, "Unknown focusMode, using default");
            defaults.focus_mode
        }),
    };

    let optimization_mode = match args.get("optimizationMode").and_then(Value::as_str) {
        None | Some("") => defaults.optimization_mode,
        Some(raw) => OptimizationMode::parse(raw).unwrap_or_else(|| {
            warn!(optimization_mode = raw, "Unknown optimizationMode, using default");
            defaults.optimization_mode
        }),
    };

    Ok(SearchQuery {
        query: query.to_string(),
        focus_mode,
        optimization_mode,
        history: normalize_history(args.get("history")),
        last_two_messages: normalize_history(args.get("lastTwoMessages")),
        query_variations_count: coerce_variations(args.get("queryVariationsCount")),
    })
}

/// Map role synonyms onto Perplexica's two roles.
///
/// `user` becomes `human`, `assistant` becomes `ai`; anything else passes
/// through unchanged.
pub fn normalize_role(role: &str) -> String {
    match role {
        "user" | "human" => "human".to_string(),
        "assistant" | "ai" => "ai".to_string(),
        other => other.to_string(),
    }
}

/// Parse a `[[role, text], ...]` sequence, normalizing roles.
pub fn normalize_history(value: Option<&Value>) -> Vec<HistoryEntry> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item.as_array().map(Vec::as_slice) {
            Some([Value::String(role), Value::String(text)]) => {
                Some(HistoryEntry(normalize_role(role), text.clone()))
            }
            _ => {
                debug!(entry = %item, "Skipping malformed history entry");
                None
            }
        })
        .collect()
}

/// Out-of-range or non-integer counts fall back to the default.
pub fn coerce_variations(value: Option<&Value>) -> u8 {
    value
        .and_then(Value::as_i64)
        .filter(|n| (MIN_VARIATIONS..=MAX_VARIATIONS).contains(n))
        .map_or(DEFAULT_VARIATIONS, |n| n as u8)
}

/// Render an answer as a `tools/call` result.
pub fn render_answer(answer: &SearchAnswer) -> Value {
    let mut text = answer.message.clone();

    if !answer.sources.is_empty() {
        let sources = serde_json::to_string_pretty(&answer.sources)
            .unwrap_or_else(|_| Value::Array(answer.sources.clone()).to_string());
        text.push_str("\n\nSources:\n");
        text.push_str(&sources);
    }

    json!({
        "content": [{"type": "text", "text": text}],
        "isError": false
    })
}

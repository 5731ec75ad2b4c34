//! HTTP handlers.

mod messages;
mod sse;
mod system;
mod tools;

use serde::Deserialize;

pub use messages::messages;
pub use sse::{messages_path, sse};
pub use system::{HealthResponse, health};
pub use tools::{ToolErrorResponse, ToolSearchResponse, tool_search};

/// `?session_id=` shared by both MCP endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    pub session_id: Option<String>,
}

impl SessionQuery {
    /// The supplied id, ignoring an empty value.
    pub fn session_id(self) -> Option<String> {
        self.session_id.filter(|id| !id.is_empty())
    }
}

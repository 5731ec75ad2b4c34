//! MCP tool implementations
//!
//! A single tool is exposed: [`search::TOOL_NAME`], which forwards a
//! normalized query to the search backend.

pub mod search;


pub use search::{SearchDefaults, TOOL_NAME};

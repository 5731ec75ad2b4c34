pub mod api;
pub mod config;
pub mod mcp;
pub mod rpc;
pub mod search;

#[cfg(test)]
pub(crate) mod testing;

//! Server configuration.
//!
//! Every setting is a CLI flag with an environment-variable fallback, so the
//! server can be configured purely through the environment in containers.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::api::EvictionPolicy;
use crate::mcp::tools::SearchDefaults;
use crate::search::{FocusMode, OptimizationMode, SearchSettings};


/// Which transport carries JSON-RPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Transport {
    /// Line-delimited JSON-RPC on stdin/stdout
    Stdio,
    /// `GET /sse` push stream plus `POST /messages`
    #[default]
    #[value(alias = "http")]
    Sse,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "perplexica-mcp")]
#[command(author, version, about = "MCP server for Perplexica search", long_about = None)]
pub struct Config {
    /// Transport to serve
    #[arg(long, env = "MCP_TRANSPORT", value_enum, default_value_t = Transport::Sse)]
    pub transport: Transport,

    /// Host address to bind to
    #[arg(long, env = "MCP_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "MCP_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Perplexica base URL
    #[arg(long, env = "PERPLEXICA_API_URL", default_value = "http://perplexica:3000")]
    pub perplexica_url: String,

    /// Preferred chat provider (id or name; first available otherwise)
    #[arg(long, env = "MCP_PROVIDER_NAME")]
    pub provider: Option<String>,

    /// Preferred embedding provider (defaults to --provider)
    #[arg(long, env = "MCP_EMBED_PROVIDER_NAME")]
    pub embed_provider: Option<String>,

    /// Chat model key
    #[arg(long, env = "MCP_LLM_MODEL", default_value = "gpt-4o-mini")]
    pub llm_model: String,

    /// Embedding model key
    #[arg(long, env = "MCP_EMBED_MODEL", default_value = "text-embedding-3-small")]
    pub embed_model: String,

    /// Focus mode used when a call does not specify one
    #[arg(long, env = "MCP_FOCUS_MODE", value_enum, default_value_t = FocusMode::WebSearch)]
    pub focus_mode: FocusMode,

    /// Optimization mode used when a call does not specify one
    #[arg(
        long,
        env = "MCP_OPTIMIZATION_MODE",
        value_enum,
        default_value_t = OptimizationMode::Balanced
    )]
    pub optimization_mode: OptimizationMode,

    /// System instructions forwarded with every search
    #[arg(long, env = "MCP_SYSTEM_INSTRUCTIONS", default_value = "")]
    pub system_instructions: String,

    /// Timeout for each upstream request, in seconds
    #[arg(long, env = "MCP_REQUEST_TIMEOUT_SECS", default_value_t = 120)]
    pub request_timeout_secs: u64,

    /// Interval between SSE keep-alive frames, in seconds
    #[arg(long, env = "MCP_KEEPALIVE_SECS", default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub keep_alive_secs: u64,

    /// Evict sessions idle this many seconds with no stream attached
    /// (unset or 0 keeps them for the life of the process)
    #[arg(long, env = "MCP_SESSION_TTL_SECS")]
    pub session_ttl_secs: Option<u64>,
}

impl Config {
    /// Parse from the process arguments and environment.
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn eviction_policy(&self) -> EvictionPolicy {
        match self.session_ttl_secs {
            Some(secs) if secs > 0 => EvictionPolicy::IdleTtl(Duration::from_secs(secs)),
            _ => EvictionPolicy::Retain,
        }
    }

    pub fn search_defaults(&self) -> SearchDefaults {
        SearchDefaults {
            focus_mode: self.focus_mode,
            optimization_mode: self.optimization_mode,
        }
    }

    /// Settings for the Perplexica client. Blank provider names count as
    /// unset.
    pub fn search_settings(&self) -> SearchSettings {
        let non_blank = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        SearchSettings {
            base_url: self.perplexica_url.trim_end_matches('/').to_string(),
            chat_provider: non_blank(&self.provider),
            embed_provider: non_blank(&self.embed_provider),
            llm_model: self.llm_model.clone(),
            embed_model: self.embed_model.clone(),
            system_instructions: self.system_instructions.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

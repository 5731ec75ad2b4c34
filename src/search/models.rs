//! Search request and response models.

use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Perplexica focus modes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
#[value(rename_all = "camelCase")]
pub enum FocusMode {
    #[default]
    WebSearch,
    AcademicSearch,
    WritingAssistant,
    WolframAlphaSearch,
    YoutubeSearch,
    RedditSearch,
    LocalResearch,
}

impl FocusMode {
    pub const ALL: [FocusMode; 7] = [
        FocusMode::WebSearch,
        FocusMode::AcademicSearch,
        FocusMode::WritingAssistant,
        FocusMode::WolframAlphaSearch,
        FocusMode::YoutubeSearch,
        FocusMode::RedditSearch,
        FocusMode::LocalResearch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FocusMode::WebSearch => "webSearch",
            FocusMode::AcademicSearch => "academicSearch",
            FocusMode::WritingAssistant => "writingAssistant",
            FocusMode::WolframAlphaSearch => "wolframAlphaSearch",
            FocusMode::YoutubeSearch => "youtubeSearch",
            FocusMode::RedditSearch => "redditSearch",
            FocusMode::LocalResearch => "localResearch",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_str() == value)
    }
}

/// Speed/quality trade-off requested from Perplexica.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
#[value(rename_all = "camelCase")]
pub enum OptimizationMode {
    #[default]
    Balanced,
    Speed,
}

impl OptimizationMode {
    pub const ALL: [OptimizationMode; 2] = [OptimizationMode::Balanced, OptimizationMode::Speed];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationMode::Balanced => "balanced",
            OptimizationMode::Speed => "speed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.as_str() == value)
    }
}

/// One conversation turn, serialized as a `[role, text]` pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry(pub String, pub String);

impl HistoryEntry {
    pub fn role(&self) -> &str {
        &self.0
    }

    pub fn text(&self) -> &str {
        &self.1
    }
}

/// A validated, normalized search query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub focus_mode: FocusMode,
    pub optimization_mode: OptimizationMode,
    pub history: Vec<HistoryEntry>,
    pub last_two_messages: Vec<HistoryEntry>,
    pub query_variations_count: u8,
}

/// What Perplexica answered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SearchAnswer {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub sources: Vec<Value>,
}

/// Providers and model keys a search actually ran with.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedModels {
    pub provider_id: String,
    pub embed_provider_id: String,
    pub llm_model: String,
    pub embedding_model: String,
}

/// An answer together with the models that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub answer: SearchAnswer,
    pub models: ResolvedModels,
}

/// A provider as listed by `GET /api/providers`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Provider {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(
        default,
        rename = "embeddingModels",
        skip_serializing_if = "Option::is_none"
    )]
    pub embedding_models: Option<Vec<Value>>,
}

impl Provider {
    pub fn has_embedding_models(&self) -> bool {
        self.embedding_models
            .as_ref()
            .is_some_and(|models| !models.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProvidersResponse {
    #[serde(default)]
    pub providers: Vec<Provider>,
}

/// Model reference inside a search body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ModelRef<'a> {
    pub provider_id: &'a str,
    pub key: &'a str,
}

/// Body of `POST /api/search`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchBody<'a> {
    pub query: &'a str,
    pub focus_mode: FocusMode,
    pub optimization_mode: OptimizationMode,
    pub chat_model: ModelRef<'a>,
    pub embedding_model: ModelRef<'a>,
    pub history: &'a [HistoryEntry],
    pub last_two_messages: &'a [HistoryEntry],
    pub query_variations_count: u8,
    pub stream: bool,
    pub system_instructions: &'a str,
}

/// Static settings for the Perplexica client.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    /// Base URL without trailing slash.
    pub base_url: String,
    /// Preferred chat provider, by id or name.
    pub chat_provider: Option<String>,
    /// Preferred embedding provider, by id or name.
    pub embed_provider: Option<String>,
    pub llm_model: String,
    pub embed_model: String,
    pub system_instructions: String,
    pub timeout: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            base_url: "http://perplexica:3000".to_string(),
            chat_provider: None,
            embed_provider: None,
            llm_model: "gpt-4o-mini".to_string(),
            embed_model: "text-embedding-3-small".to_string(),
            system_instructions: String::new(),
            timeout: Duration::from_secs(120),
        }
    }
}

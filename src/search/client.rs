//! HTTP client for the Perplexica API.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::error::{SearchError, SearchResult};
use super::models::{
    ModelRef, Provider, ProvidersResponse, ResolvedModels, SearchAnswer, SearchBody,
    SearchOutcome, SearchQuery, SearchSettings,
};
use super::provider::{pick_embedding_provider, pick_provider};
use super::SearchBackend;

/// Client for Perplexica's `/api/providers` and `/api/search` endpoints.
pub struct PerplexicaClient {
    settings: SearchSettings,
    client: Client,
}

impl PerplexicaClient {
    /// Build a client. The upstream timeout bounds every request.
    pub fn new(mut settings: SearchSettings) -> SearchResult<Self> {
        settings.base_url = settings.base_url.trim_end_matches('/').to_string();
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { settings, client })
    }

    /// Get the base URL being used
    pub fn base_url(&self) -> &str {
        &self.settings.base_url
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url, path)
    }

    /// List the providers configured in Perplexica.
    pub async fn fetch_providers(&self) -> SearchResult<Vec<Provider>> {
        let response = self.client.get(self.url("/api/providers")).send().await?;
        if !response.status().is_success() {
            let (status, body) = error_parts(response).await;
            return Err(SearchError::Providers { status, body });
        }

        let data: ProvidersResponse = decode(response).await?;
        Ok(data.providers)
    }

    /// Run a search against explicit chat and embedding providers.
    #[instrument(skip(self, query), fields(query = %query.query))]
    pub async fn search_with(
        &self,
        query: &SearchQuery,
        chat_provider: &Provider,
        embed_provider: &Provider,
    ) -> SearchResult<SearchAnswer> {
        let body = SearchBody {
            query: &query.query,
            focus_mode: query.focus_mode,
            optimization_mode: query.optimization_mode,
            chat_model: ModelRef {
                provider_id: &chat_provider.id,
                key: &self.settings.llm_model,
            },
            embedding_model: ModelRef {
                provider_id: &embed_provider.id,
                key: &self.settings.embed_model,
            },
            history: &query.history,
            last_two_messages: &query.last_two_messages,
            query_variations_count: query.query_variations_count,
            stream: false,
            system_instructions: &self.settings.system_instructions,
        };

        debug!(
            chat_provider = %chat_provider.id,
            embed_provider = %embed_provider.id,
            "Forwarding search to Perplexica"
        );

        let response = self
            .client
            .post(self.url("/api/search"))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, body) = error_parts(response).await;
            return Err(SearchError::Search { status, body });
        }

        decode(response).await
    }
}

impl SearchBackend for PerplexicaClient {
    async fn search(&self, query: SearchQuery) -> SearchResult<SearchOutcome> {
        let providers = self.fetch_providers().await?;

        let chat = pick_provider(&providers, self.settings.chat_provider.as_deref());
        let embed_preference = self
            .settings
            .embed_provider
            .as_deref()
            .or(self.settings.chat_provider.as_deref());
        let embed = pick_embedding_provider(&providers, embed_preference);

        let (Some(chat), Some(embed)) = (chat, embed) else {
            return Err(SearchError::NoProviders);
        };

        let answer = self.search_with(&query, chat, embed).await?;
        Ok(SearchOutcome {
            answer,
            models: ResolvedModels {
                provider_id: chat.id.clone(),
                embed_provider_id: embed.id.clone(),
                llm_model: self.settings.llm_model.clone(),
                embedding_model: self.settings.embed_model.clone(),
            },
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> SearchResult<T> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| SearchError::InvalidResponse {
        message: e.to_string(),
    })
}

async fn error_parts(response: Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    (status, body)
}

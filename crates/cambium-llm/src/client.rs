//! Chat and embedding service traits and the reqwest-backed OpenAI client.
//!
//! - `OpenAiClient` talks to an OpenAI-compatible API for both chat
//!   completions (answer synthesis) and embeddings (indexing + query).
//!   This is the production backend.
//! - `MockChatModel` / `MockEmbedding` (in [`crate::mock`]) provide
//!   deterministic behavior for testing.

use std::time::Duration;

use cambium_core::config::LlmConfig;
use cambium_core::error::CambiumError;
use tracing::{debug, info};

use crate::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, EmbeddingRequest,
    EmbeddingResponse,
};

/// Service for generating chat completions.
pub trait ChatModel: Send + Sync {
    /// Generate a reply for the given message sequence.
    fn complete(
        &self,
        messages: &[ChatMessage],
    ) -> impl std::future::Future<Output = Result<String, CambiumError>> + Send;
}

/// Service for generating text embeddings.
///
/// Implementations convert text into fixed-dimensional vectors that capture
/// semantic meaning. Used for both indexing documents and embedding queries.
pub trait EmbeddingModel: Send + Sync {
    /// Generate an embedding vector for the given text.
    fn embed(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Vec<f32>, CambiumError>> + Send;

    /// Return the dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;
}

/// Object-safe version of [`ChatModel`] for dynamic dispatch.
///
/// Because `ChatModel::complete` returns `impl Future` it is not object-safe.
/// This trait uses a boxed future instead, allowing `Arc<dyn DynChatModel>`
/// to be stored in structs without generics. A blanket implementation is
/// provided so that every `ChatModel` automatically implements it.
pub trait DynChatModel: Send + Sync {
    fn complete_boxed<'a>(
        &'a self,
        messages: &'a [ChatMessage],
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<String, CambiumError>> + Send + 'a>,
    >;
}

impl<T: ChatModel> DynChatModel for T {
    fn complete_boxed<'a>(
        &'a self,
        messages: &'a [ChatMessage],
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<String, CambiumError>> + Send + 'a>,
    > {
        Box::pin(self.complete(messages))
    }
}

/// Object-safe version of [`EmbeddingModel`] for dynamic dispatch.
pub trait DynEmbeddingModel: Send + Sync {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Vec<f32>, CambiumError>> + Send + 'a>,
    >;

    fn dimensions(&self) -> usize;
}

impl<T: EmbeddingModel> DynEmbeddingModel for T {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Vec<f32>, CambiumError>> + Send + 'a>,
    > {
        Box::pin(self.embed(text))
    }

    fn dimensions(&self) -> usize {
        EmbeddingModel::dimensions(self)
    }
}

// ---------------------------------------------------------------------------
// OpenAiClient - reqwest-backed OpenAI-compatible API client
// ---------------------------------------------------------------------------

/// Dimensionality of `text-embedding-3-small` vectors.
const OPENAI_EMBEDDING_DIMENSIONS: usize = 1536;

/// Client for an OpenAI-compatible hosted LLM API.
///
/// Serves both roles: chat completions for answer synthesis and embeddings
/// for indexing. One instance is shared across the process.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    embedding_model: String,
    temperature: f32,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // api_key deliberately omitted.
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl OpenAiClient {
    /// Build a client from configuration.
    ///
    /// Fails with `CambiumError::Config` when no API key can be resolved,
    /// before any network call is attempted.
    pub fn from_config(config: &LlmConfig) -> Result<Self, CambiumError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            CambiumError::Config(
                "no API key: set OPENAI_API_KEY or [llm].api_key in config.toml".to_string(),
            )
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| CambiumError::Api(format!("failed to build HTTP client: {}", e)))?;

        info!(
            model = %config.model,
            embedding_model = %config.embedding_model,
            base_url = %config.base_url,
            "LLM client ready"
        );

        Ok(Self {
            http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            embedding_model: config.embedding_model.clone(),
            temperature: config.temperature,
        })
    }
}

impl ChatModel for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CambiumError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        debug!(message_count = messages.len(), "Requesting chat completion");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CambiumError::Generation(format!("completion request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CambiumError::Generation(format!(
                "completion returned {}: {}",
                status, body
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CambiumError::Generation(format!("invalid completion body: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        // An empty reply must never be committed to a transcript.
        if content.trim().is_empty() {
            return Err(CambiumError::Generation(
                "completion returned no content".to_string(),
            ));
        }

        Ok(content)
    }
}

impl EmbeddingModel for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CambiumError> {
        if text.is_empty() {
            return Err(CambiumError::Api("cannot embed empty text".to_string()));
        }

        let url = format!("{}/embeddings", self.base_url);
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: text,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CambiumError::Api(format!("embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CambiumError::Api(format!(
                "embedding returned {}: {}",
                status, body
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| CambiumError::Api(format!("invalid embedding body: {}", e)))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| CambiumError::Api("embedding response had no data".to_string()))
    }

    fn dimensions(&self) -> usize {
        OPENAI_EMBEDDING_DIMENSIONS
    }
}

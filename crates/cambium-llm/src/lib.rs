//! Cambium LLM crate - OpenAI-compatible API client behind service traits.
//!
//! Provides chat completion and embedding traits with a reqwest-backed
//! production client and deterministic mock implementations for testing.

pub mod client;
pub mod mock;
pub mod types;

pub use client::{ChatModel, DynChatModel, DynEmbeddingModel, EmbeddingModel, OpenAiClient};
pub use mock::{MockChatModel, MockEmbedding};
pub use types::ChatMessage;

//! Deterministic mock services for testing without network access.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use cambium_core::error::CambiumError;

use crate::client::{ChatModel, EmbeddingModel};
use crate::types::ChatMessage;

/// Mock chat model that echoes a canned reply and counts calls.
///
/// Configure with `failing()` to simulate an LLM API outage: every call
/// returns `CambiumError::Generation` without producing content.
#[derive(Debug, Default)]
pub struct MockChatModel {
    reply: Option<String>,
    fail: bool,
    calls: AtomicUsize,
    last_messages: Mutex<Vec<ChatMessage>>,
}

impl MockChatModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always reply with the given text.
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            ..Self::default()
        }
    }

    /// Fail every completion call.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of completion calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Messages passed to the most recent completion call.
    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.last_messages.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

impl ChatModel for MockChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CambiumError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_messages.lock() {
            *last = messages.to_vec();
        }

        if self.fail {
            return Err(CambiumError::Generation(
                "mock completion failure".to_string(),
            ));
        }

        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => {
                let question = messages
                    .iter()
                    .rev()
                    .find(|m| m.role == "user")
                    .map(|m| m.content.as_str())
                    .unwrap_or("");
                Ok(format!("You asked: {}", question))
            }
        }
    }
}

/// Mock embedding service that returns deterministic 384-dimensional vectors.
///
/// The output is derived from a hash of the input text, so identical inputs
/// always produce identical outputs. This allows testing indexing and
/// retrieval ordering without a real model.
#[derive(Debug, Clone, Default)]
pub struct MockEmbedding;

impl MockEmbedding {
    pub fn new() -> Self {
        Self
    }

    fn hash_to_vector(text: &str) -> Vec<f32> {
        let mut result = Vec::with_capacity(384);
        for i in 0..384 {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            i.hash(&mut hasher);
            let h = hasher.finish();
            let val = ((h as f64) / (u64::MAX as f64)) * 2.0 - 1.0;
            result.push(val as f32);
        }

        // L2-normalize to unit vectors, matching the hosted embedding API.
        let norm: f32 = result.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut result {
                *val /= norm;
            }
        }

        result
    }
}

impl EmbeddingModel for MockEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CambiumError> {
        if text.is_empty() {
            return Err(CambiumError::Api("cannot embed empty text".to_string()));
        }
        Ok(Self::hash_to_vector(text))
    }

    fn dimensions(&self) -> usize {
        384
    }
}

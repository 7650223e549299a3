//! Process-wide memoization of built indexes.
//!
//! Replaces the original ambient caching decorator with an explicit
//! compute-if-absent table keyed by `(source_directory, model_config)`.
//! Concurrent first callers for the same key collapse to a single in-flight
//! build; a failed build leaves the slot empty so the next caller retries.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cambium_core::config::LlmConfig;
use cambium_core::error::Result;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

use crate::index::DocumentIndex;

/// Cache key: source directory plus every model setting that shapes a build.
///
/// Temperature is keyed by its bit pattern so the key is `Eq + Hash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexKey {
    source_dir: PathBuf,
    model: String,
    embedding_model: String,
    temperature_bits: u32,
    system_prompt: String,
}

impl IndexKey {
    pub fn new(source_dir: &Path, llm: &LlmConfig) -> Self {
        Self {
            source_dir: source_dir.to_path_buf(),
            model: llm.model.clone(),
            embedding_model: llm.embedding_model.clone(),
            temperature_bits: llm.temperature.to_bits(),
            system_prompt: llm.system_prompt.clone(),
        }
    }
}

/// Memoization table for built indexes with single-flight semantics.
///
/// Entries live for the process lifetime; there is no TTL or invalidation.
#[derive(Default)]
pub struct IndexCache {
    slots: Mutex<HashMap<IndexKey, Arc<OnceCell<Arc<DocumentIndex>>>>>,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached index for `key`, building it with `build` if absent.
    ///
    /// Repeated calls with the same key return the identical `Arc` without
    /// re-running the build. Concurrent first callers share one in-flight
    /// build: the cell serializes initializers, so only one `build` future
    /// completes per key.
    pub async fn get_or_build<F, Fut>(&self, key: IndexKey, build: F) -> Result<Arc<DocumentIndex>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Arc<DocumentIndex>>>,
    {
        let cell = {
            let mut slots = self.slots.lock().await;
            Arc::clone(slots.entry(key).or_default())
        };

        if let Some(index) = cell.get() {
            debug!("Index cache hit");
            return Ok(Arc::clone(index));
        }

        let index = cell.get_or_try_init(build).await?;
        Ok(Arc::clone(index))
    }

    /// Number of keys with a completed build.
    pub async fn len(&self) -> usize {
        let slots = self.slots.lock().await;
        slots.values().filter(|cell| cell.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

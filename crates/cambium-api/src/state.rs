//! Application state shared across all route handlers.
//!
//! AppState holds references to all services and shared resources.
//! It is passed to handlers via axum's State extractor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use cambium_chat::ChatEngine;
use cambium_core::config::CambiumConfig;
use cambium_index::DocumentIndex;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks. The config
/// and index are immutable after startup; session state lives inside the
/// engine's store.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration, fixed at startup.
    pub config: Arc<CambiumConfig>,
    /// Immutable document index built at startup.
    pub index: Arc<DocumentIndex>,
    /// Chat engine (session store + retrieval + generation).
    pub engine: Arc<ChatEngine>,
    /// Raised while an index build is in progress.
    pub busy: Arc<AtomicBool>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState with the given components.
    pub fn new(
        config: CambiumConfig,
        index: Arc<DocumentIndex>,
        engine: Arc<ChatEngine>,
        busy: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            index,
            engine,
            busy,
            start_time: Instant::now(),
        }
    }

    /// True while the document index is being (re)built.
    pub fn index_building(&self) -> bool {
        self.busy.load(Ordering::Relaxed)
    }
}

//! Index construction: load documents, embed them, assemble the index.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use cambium_core::config::LlmConfig;
use cambium_core::error::Result;
use cambium_llm::DynEmbeddingModel;
use tracing::{error, info};

use crate::index::DocumentIndex;
use crate::loader::DocumentLoader;

/// Builds a [`DocumentIndex`] from a source directory.
///
/// While a build is running the shared busy flag is raised so callers can
/// present an indeterminate progress indication; the flag is cleared on all
/// exit paths, including failure.
pub struct IndexBuilder {
    loader: DocumentLoader,
    embedder: Arc<dyn DynEmbeddingModel>,
    busy: Arc<AtomicBool>,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn DynEmbeddingModel>) -> Self {
        Self {
            loader: DocumentLoader::new(),
            embedder,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share an externally owned busy flag (e.g. surfaced via `/health`).
    pub fn with_busy_flag(mut self, busy: Arc<AtomicBool>) -> Self {
        self.busy = busy;
        self
    }

    /// The loader, exposing its scan counter.
    pub fn loader(&self) -> &DocumentLoader {
        &self.loader
    }

    /// True while a build is in progress.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Load all documents under `source_dir`, embed them, and assemble an
    /// index configured with the given model settings.
    ///
    /// Fails with `DataLoad` when the directory is missing or yields no
    /// parsable documents; embedding failures propagate and abort the build.
    pub async fn build(&self, source_dir: &Path, llm: &LlmConfig) -> Result<Arc<DocumentIndex>> {
        let _guard = BusyGuard::engage(&self.busy);
        let started = Instant::now();

        info!(dir = %source_dir.display(), "Indexing started");

        let documents = self.loader.load_dir(source_dir).inspect_err(|e| {
            error!(error = %e, "Indexing failed during document load");
        })?;

        let mut pairs = Vec::with_capacity(documents.len());
        for document in documents {
            let embedding = self
                .embedder
                .embed_boxed(&document.text)
                .await
                .inspect_err(|e| {
                    error!(path = %document.path.display(), error = %e, "Embedding failed");
                })?;
            pairs.push((document, embedding));
        }

        let index = Arc::new(DocumentIndex::new(
            pairs,
            self.embedder.dimensions(),
            llm.model.clone(),
            llm.temperature,
            llm.system_prompt.clone(),
        ));

        info!(
            documents = index.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Indexing complete"
        );

        Ok(index)
    }
}

/// RAII guard that raises the busy flag for the duration of a build.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn engage(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self { flag }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cambium_core::error::CambiumError;
    use cambium_llm::MockEmbedding;

    fn builder() -> IndexBuilder {
        IndexBuilder::new(Arc::new(MockEmbedding::new()))
    }

    fn llm_config() -> LlmConfig {
        LlmConfig::default()
    }

    #[tokio::test]
    async fn test_build_indexes_all_documents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "about cambium").unwrap();
        std::fs::write(dir.path().join("b.txt"), "about software").unwrap();

        let builder = builder();
        let index = builder.build(dir.path(), &llm_config()).await.unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.dimensions(), 384);
    }

    #[tokio::test]
    async fn test_build_carries_model_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "doc").unwrap();

        let mut llm = llm_config();
        llm.temperature = 0.0;
        llm.system_prompt = "be terse".to_string();

        let index = builder().build(dir.path(), &llm).await.unwrap();
        assert_eq!(index.system_prompt(), "be terse");
        assert_eq!(index.temperature(), 0.0);
        assert_eq!(index.model(), "gpt-3.5-turbo");
    }

    #[tokio::test]
    async fn test_build_missing_dir_is_data_load_error() {
        let builder = builder();
        let result = builder
            .build(Path::new("/nonexistent/docs"), &llm_config())
            .await;
        assert!(matches!(result, Err(CambiumError::DataLoad(_))));
    }

    #[tokio::test]
    async fn test_build_empty_dir_is_data_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = builder().build(dir.path(), &llm_config()).await;
        assert!(matches!(result, Err(CambiumError::DataLoad(_))));
    }

    #[tokio::test]
    async fn test_busy_flag_cleared_after_success() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "doc").unwrap();

        let builder = builder();
        builder.build(dir.path(), &llm_config()).await.unwrap();
        assert!(!builder.is_busy());
    }

    #[tokio::test]
    async fn test_busy_flag_cleared_after_failure() {
        let dir = tempfile::tempdir().unwrap();

        let builder = builder();
        let _ = builder.build(dir.path(), &llm_config()).await;
        assert!(!builder.is_busy());
    }

    #[tokio::test]
    async fn test_shared_busy_flag() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "doc").unwrap();

        let flag = Arc::new(AtomicBool::new(false));
        let builder =
            IndexBuilder::new(Arc::new(MockEmbedding::new())).with_busy_flag(Arc::clone(&flag));
        builder.build(dir.path(), &llm_config()).await.unwrap();
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_build_scans_once_per_call() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "doc").unwrap();

        let builder = builder();
        builder.build(dir.path(), &llm_config()).await.unwrap();
        builder.build(dir.path(), &llm_config()).await.unwrap();
        // The builder itself does not memoize; that is IndexCache's job.
        assert_eq!(builder.loader().scans(), 2);
    }
}

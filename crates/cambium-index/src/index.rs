//! In-memory vector index with brute-force cosine similarity search.
//!
//! The index is immutable once built: it is constructed in one pass from a
//! document set and shared behind an `Arc` for the rest of the process
//! lifetime. Search is O(n), which is acceptable for moderate document sets.

use cambium_core::types::Document;

/// A single entry: one document plus its embedding.
#[derive(Debug, Clone)]
struct IndexEntry {
    document: Document,
    embedding: Vec<f32>,
}

/// A document returned from a similarity search.
#[derive(Debug, Clone)]
pub struct ScoredDocument<'a> {
    pub document: &'a Document,
    /// Cosine similarity score (-1.0 to 1.0).
    pub score: f64,
}

/// Queryable structure over all loaded documents.
///
/// Carries the model configuration that steers downstream answer synthesis,
/// so a cached index always answers with the settings it was built for.
#[derive(Debug)]
pub struct DocumentIndex {
    entries: Vec<IndexEntry>,
    dimensions: usize,
    model: String,
    temperature: f32,
    system_prompt: String,
}

impl DocumentIndex {
    pub(crate) fn new(
        pairs: Vec<(Document, Vec<f32>)>,
        dimensions: usize,
        model: String,
        temperature: f32,
        system_prompt: String,
    ) -> Self {
        let entries = pairs
            .into_iter()
            .map(|(document, embedding)| IndexEntry {
                document,
                embedding,
            })
            .collect();
        Self {
            entries,
            dimensions,
            model,
            temperature,
            system_prompt,
        }
    }

    /// Find the k most similar documents to the query vector.
    ///
    /// Returns results sorted by descending similarity score.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<ScoredDocument<'_>> {
        let mut scored: Vec<ScoredDocument<'_>> = self
            .entries
            .iter()
            .map(|entry| ScoredDocument {
                document: &entry.document,
                score: cosine_similarity(query, &entry.embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        scored
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimensionality of the stored embeddings.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Chat model this index was built for.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// System prompt steering answer tone and domain.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude or lengths differ.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();

    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_index(pairs: Vec<(Document, Vec<f32>)>) -> DocumentIndex {
        DocumentIndex::new(
            pairs,
            384,
            "gpt-3.5-turbo".to_string(),
            0.5,
            "system".to_string(),
        )
    }

    #[test]
    fn test_search_ordering() {
        let close = Document::new("close.txt", "close");
        let far = Document::new("far.txt", "far");
        let close_id = close.id;

        let index = make_index(vec![
            (close, vec![1.0f32; 384]),
            (far, vec![-1.0f32; 384]),
        ]);

        let query = vec![1.0f32; 384];
        let hits = index.search(&query, 10);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.id, close_id);
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_search_respects_k_limit() {
        let pairs = (0..10)
            .map(|i| {
                (
                    Document::new(format!("{}.txt", i), "doc"),
                    vec![1.0f32; 384],
                )
            })
            .collect();
        let index = make_index(pairs);

        let hits = index.search(&vec![1.0f32; 384], 3);
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_search_empty_index() {
        let index = make_index(vec![]);
        assert!(index.is_empty());
        assert!(index.search(&vec![1.0f32; 384], 5).is_empty());
    }

    #[test]
    fn test_model_config_carried() {
        let index = make_index(vec![]);
        assert_eq!(index.model(), "gpt-3.5-turbo");
        assert_eq!(index.system_prompt(), "system");
        assert!((index.temperature() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0f32; 100];
        let b = vec![1.0f32; 100];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let mut a = vec![0.0f32; 100];
        let mut b = vec![0.0f32; 100];
        a[0] = 1.0;
        b[1] = 1.0;
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let a = vec![0.0f32; 100];
        let b = vec![1.0f32; 100];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_similarity_length_mismatch() {
        let a = vec![1.0f32; 10];
        let b = vec![1.0f32; 20];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }
}

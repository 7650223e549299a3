//! Cambium index crate - document loading, vector index, and memoized builds.
//!
//! Provides a recursive document loader, a brute-force cosine-similarity
//! index over document embeddings, the builder that ties them to an
//! embedding service, and a process-wide compute-if-absent cache with
//! single-flight semantics.

pub mod builder;
pub mod cache;
pub mod index;
pub mod loader;

pub use builder::IndexBuilder;
pub use cache::{IndexCache, IndexKey};
pub use index::{DocumentIndex, ScoredDocument};
pub use loader::DocumentLoader;

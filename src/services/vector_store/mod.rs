//! Vector store abstraction layer.
//!
//! Commands talk to the store through [`VectorStore`] so the Qdrant backend
//! can be swapped for the in-memory one in tests.

mod memory;
mod qdrant;

pub use memory::MemoryBackend;
pub use qdrant::QdrantBackend;

use async_trait::async_trait;

use crate::error::VectorStoreError;
use crate::models::{CollectionInfo, QueryHit, StoredRow, VectorStoreConfig};

/// Payload key holding the original chunk id.
pub const CHUNK_ID_KEY: &str = "chunk_id";
/// Payload key holding the chunk text.
pub const DOCUMENT_KEY: &str = "document";

/// Abstract trait for vector store operations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Check if the vector store is healthy and accessible.
    async fn health_check(&self) -> Result<bool, VectorStoreError>;

    /// All collections with their point counts.
    async fn list_collections(&self) -> Result<Vec<CollectionInfo>, VectorStoreError>;

    /// Returns None if the collection doesn't exist.
    async fn collection_info(&self, name: &str)
    -> Result<Option<CollectionInfo>, VectorStoreError>;

    /// Create an empty cosine-distance collection.
    async fn create_collection(&self, name: &str, dimension: u64) -> Result<(), VectorStoreError>;

    /// Returns false if there was nothing to delete.
    async fn delete_collection(&self, name: &str) -> Result<bool, VectorStoreError>;

    /// Insert or replace rows, waiting until they are persisted.
    async fn add(&self, name: &str, rows: Vec<StoredRow>) -> Result<(), VectorStoreError>;

    async fn count(&self, name: &str) -> Result<u64, VectorStoreError>;

    /// Read rows in storage order, at most `limit` when given.
    async fn get(
        &self,
        name: &str,
        limit: Option<usize>,
        with_vectors: bool,
    ) -> Result<Vec<StoredRow>, VectorStoreError>;

    /// Nearest neighbours of `vector`, best first.
    async fn query(
        &self,
        name: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<QueryHit>, VectorStoreError>;

    /// Human-readable location of the store.
    fn location(&self) -> &str;

    async fn collection_exists(&self, name: &str) -> Result<bool, VectorStoreError> {
        Ok(self.collection_info(name).await?.is_some())
    }

    /// Drop `name` if present and create it again empty.
    async fn recreate_collection(&self, name: &str, dimension: u64) -> Result<(), VectorStoreError> {
        if self.delete_collection(name).await? {
            tracing::info!(collection = name, "deleted existing collection");
        }
        self.create_collection(name, dimension).await
    }
}

/// Create the configured vector store backend.
pub fn create_backend(config: &VectorStoreConfig) -> Result<Box<dyn VectorStore>, VectorStoreError> {
    let backend = QdrantBackend::new(config)?;
    Ok(Box::new(backend))
}

/// Cosine similarity; zero for empty, mismatched or zero-norm inputs.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

//! Collection inspection and search used by the collection manager.

use std::collections::BTreeMap;

use serde::Serialize;

use super::embedding::Embedder;
use super::vector_store::VectorStore;
use crate::error::{AppError, VectorStoreError};
use crate::models::QueryHit;

const INSPECT_SAMPLE_SIZE: usize = 10;
const INSPECT_SHOWN_ROWS: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct DocumentLengthStats {
    pub sampled: usize,
    pub min: usize,
    pub max: usize,
    pub avg: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleRow {
    pub id: String,
    pub document: String,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionInspection {
    pub name: String,
    pub count: u64,
    pub metadata: BTreeMap<String, String>,
    pub embedding_dim: Option<usize>,
    pub document_lengths: Option<DocumentLengthStats>,
    pub samples: Vec<SampleRow>,
}

impl CollectionInspection {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Count, metadata and statistics over the first rows of a collection.
pub async fn inspect_collection(
    store: &dyn VectorStore,
    name: &str,
) -> Result<CollectionInspection, VectorStoreError> {
    let info = store
        .collection_info(name)
        .await?
        .ok_or_else(|| VectorStoreError::CollectionNotFound(name.to_string()))?;

    let mut inspection = CollectionInspection {
        name: name.to_string(),
        count: info.count,
        metadata: info.metadata(),
        embedding_dim: None,
        document_lengths: None,
        samples: Vec::new(),
    };
    if info.count == 0 {
        return Ok(inspection);
    }

    let sample = store.get(name, Some(INSPECT_SAMPLE_SIZE), true).await?;

    inspection.embedding_dim = sample
        .first()
        .map(|r| r.embedding.len())
        .filter(|d| *d > 0);

    let lengths: Vec<usize> = sample.iter().map(|r| r.document.chars().count()).collect();
    if let (Some(min), Some(max)) = (lengths.iter().min(), lengths.iter().max()) {
        inspection.document_lengths = Some(DocumentLengthStats {
            sampled: lengths.len(),
            min: *min,
            max: *max,
            avg: lengths.iter().sum::<usize>() as f64 / lengths.len() as f64,
        });
    }

    inspection.samples = sample
        .into_iter()
        .take(INSPECT_SHOWN_ROWS)
        .map(|r| SampleRow {
            id: r.id,
            document: r.document,
            metadata: r.metadata,
        })
        .collect();

    Ok(inspection)
}

/// Embed `query` as a retrieval query and return the nearest rows.
pub async fn search_collection(
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    name: &str,
    query: &str,
    limit: u64,
) -> Result<Vec<QueryHit>, AppError> {
    if !store.collection_exists(name).await? {
        return Err(VectorStoreError::CollectionNotFound(name.to_string()).into());
    }
    let vector = embedder.embed_query(query).await?;
    Ok(store.query(name, vector, limit).await?)
}

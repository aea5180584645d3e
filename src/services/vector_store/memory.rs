//! In-memory vector store.
//!
//! Collections live in a `BTreeMap` behind an async `RwLock`; queries are
//! brute-force cosine similarity. Rows keep insertion order and an upsert of
//! an existing id replaces the row in place.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{VectorStore, cosine_similarity};
use crate::error::VectorStoreError;
use crate::models::{CollectionInfo, QueryHit, StoredRow};

struct MemoryCollection {
    dimension: u64,
    rows: Vec<StoredRow>,
}

#[derive(Default)]
pub struct MemoryBackend {
    collections: RwLock<BTreeMap<String, MemoryCollection>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn info(name: &str, collection: &MemoryCollection) -> CollectionInfo {
    CollectionInfo {
        name: name.to_string(),
        count: collection.rows.len() as u64,
        dimension: Some(collection.dimension),
        distance: Some("Cosine".to_string()),
    }
}

#[async_trait]
impl VectorStore for MemoryBackend {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        Ok(true)
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>, VectorStoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .iter()
            .map(|(name, collection)| info(name, collection))
            .collect())
    }

    async fn collection_info(
        &self,
        name: &str,
    ) -> Result<Option<CollectionInfo>, VectorStoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(name).map(|c| info(name, c)))
    }

    async fn create_collection(&self, name: &str, dimension: u64) -> Result<(), VectorStoreError> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            return Err(VectorStoreError::CollectionError(format!(
                "collection '{}' already exists",
                name
            )));
        }
        collections.insert(
            name.to_string(),
            MemoryCollection {
                dimension,
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<bool, VectorStoreError> {
        Ok(self.collections.write().await.remove(name).is_some())
    }

    async fn add(&self, name: &str, rows: Vec<StoredRow>) -> Result<(), VectorStoreError> {
        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| VectorStoreError::CollectionNotFound(name.to_string()))?;

        for row in rows {
            let actual = row.embedding.len() as u64;
            if actual != collection.dimension {
                return Err(VectorStoreError::DimensionMismatch {
                    expected: collection.dimension,
                    actual,
                });
            }
            match collection.rows.iter_mut().find(|r| r.id == row.id) {
                Some(existing) => *existing = row,
                None => collection.rows.push(row),
            }
        }
        Ok(())
    }

    async fn count(&self, name: &str) -> Result<u64, VectorStoreError> {
        let collections = self.collections.read().await;
        collections
            .get(name)
            .map(|c| c.rows.len() as u64)
            .ok_or_else(|| VectorStoreError::CollectionNotFound(name.to_string()))
    }

    async fn get(
        &self,
        name: &str,
        limit: Option<usize>,
        with_vectors: bool,
    ) -> Result<Vec<StoredRow>, VectorStoreError> {
        let collections = self.collections.read().await;
        let collection = collections
            .get(name)
            .ok_or_else(|| VectorStoreError::CollectionNotFound(name.to_string()))?;

        let limit = limit.unwrap_or(usize::MAX);
        Ok(collection
            .rows
            .iter()
            .take(limit)
            .map(|row| {
                let mut row = row.clone();
                if !with_vectors {
                    row.embedding.clear();
                }
                row
            })
            .collect())
    }

    async fn query(
        &self,
        name: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<QueryHit>, VectorStoreError> {
        let collections = self.collections.read().await;
        let collection = collections
            .get(name)
            .ok_or_else(|| VectorStoreError::CollectionNotFound(name.to_string()))?;

        let mut hits: Vec<QueryHit> = collection
            .rows
            .iter()
            .map(|row| QueryHit {
                id: row.id.clone(),
                document: row.document.clone(),
                metadata: row.metadata.clone(),
                similarity: cosine_similarity(&vector, &row.embedding),
            })
            .collect();

        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(limit as usize);
        Ok(hits)
    }

    fn location(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, embedding: Vec<f32>) -> StoredRow {
        StoredRow {
            id: id.to_string(),
            document: format!("text of {}", id),
            metadata: BTreeMap::from([("source".to_string(), format!("{}.txt", id))]),
            embedding,
        }
    }

    #[tokio::test]
    async fn test_add_query_and_upsert() {
        let store = MemoryBackend::new();
        store.create_collection("docs", 2).await.unwrap();
        store
            .add(
                "docs",
                vec![row("a", vec![1.0, 0.0]), row("b", vec![0.0, 1.0])],
            )
            .await
            .unwrap();
        store
            .add("docs", vec![row("a", vec![0.6, 0.8])])
            .await
            .unwrap();

        assert_eq!(store.count("docs").await.unwrap(), 2);

        let hits = store.query("docs", vec![0.0, 1.0], 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");
        assert!(hits[0].distance().abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_dimension_mismatch() {
        let store = MemoryBackend::new();
        store.create_collection("docs", 3).await.unwrap();
        let err = store
            .add("docs", vec![row("a", vec![1.0])])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VectorStoreError::DimensionMismatch {
                expected: 3,
                actual: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_recreate_leaves_collection_empty() {
        let store = MemoryBackend::new();
        store.create_collection("docs", 2).await.unwrap();
        store
            .add("docs", vec![row("a", vec![1.0, 0.0])])
            .await
            .unwrap();

        store.recreate_collection("docs", 2).await.unwrap();
        assert_eq!(store.count("docs").await.unwrap(), 0);
        assert!(!store.delete_collection("missing").await.unwrap());
        assert!(store.collection_exists("docs").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_limit_and_vectors() {
        let store = MemoryBackend::new();
        store.create_collection("docs", 1).await.unwrap();
        store
            .add(
                "docs",
                vec![row("a", vec![1.0]), row("b", vec![2.0]), row("c", vec![3.0])],
            )
            .await
            .unwrap();

        let rows = store.get("docs", Some(2), false).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].embedding.is_empty());

        let rows = store.get("docs", None, true).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].embedding, vec![3.0]);
    }
}

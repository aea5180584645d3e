//! Qdrant vector store backend implementation.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfigKind;
use qdrant_client::qdrant::vectors_output::VectorsOptions;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointId, PointStruct,
    ScrollPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder,
    VectorsOutput,
};

use super::{CHUNK_ID_KEY, DOCUMENT_KEY, VectorStore};
use crate::error::VectorStoreError;
use crate::models::{CollectionInfo, QueryHit, StoredRow, VectorStoreConfig};

const SCROLL_PAGE_SIZE: u32 = 256;

/// Qdrant vector store backend.
pub struct QdrantBackend {
    client: Qdrant,
    url: String,
}

impl QdrantBackend {
    pub fn new(config: &VectorStoreConfig) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    async fn exact_count(&self, name: &str) -> Result<u64, VectorStoreError> {
        let response = self
            .client
            .count(CountPointsBuilder::new(name).exact(true))
            .await
            .map_err(|e| VectorStoreError::QueryError(e.to_string()))?;
        Ok(response.result.map_or(0, |r| r.count))
    }
}

/// Flatten a row into a Qdrant payload: id and text under reserved keys,
/// every metadata entry as its own string field.
fn row_payload(row: StoredRow) -> HashMap<String, Value> {
    let mut payload: HashMap<String, Value> = HashMap::new();
    for (key, value) in row.metadata {
        payload.insert(key, value.into());
    }
    payload.insert(CHUNK_ID_KEY.to_string(), row.id.into());
    payload.insert(DOCUMENT_KEY.to_string(), row.document.into());
    payload
}

fn payload_string(value: &Value) -> Option<String> {
    match &value.kind {
        Some(Kind::StringValue(s)) => Some(s.clone()),
        Some(Kind::IntegerValue(n)) => Some(n.to_string()),
        Some(Kind::DoubleValue(n)) => Some(n.to_string()),
        Some(Kind::BoolValue(b)) => Some(b.to_string()),
        _ => None,
    }
}

fn point_id_string(id: Option<&PointId>) -> String {
    match id.and_then(|id| id.point_id_options.as_ref()) {
        Some(PointIdOptions::Uuid(uuid)) => uuid.clone(),
        Some(PointIdOptions::Num(num)) => num.to_string(),
        None => String::new(),
    }
}

/// Split a payload back into (chunk id, document, metadata). Points written
/// by other tools fall back to their store id and an empty document.
fn split_payload(
    mut payload: HashMap<String, Value>,
    fallback_id: String,
) -> (String, String, BTreeMap<String, String>) {
    let id = payload
        .remove(CHUNK_ID_KEY)
        .and_then(|v| payload_string(&v))
        .unwrap_or(fallback_id);
    let document = payload
        .remove(DOCUMENT_KEY)
        .and_then(|v| payload_string(&v))
        .unwrap_or_default();
    let metadata = payload
        .into_iter()
        .filter_map(|(k, v)| payload_string(&v).map(|s| (k, s)))
        .collect();
    (id, document, metadata)
}

#[allow(deprecated)]
fn dense_vector(vectors: Option<VectorsOutput>) -> Vec<f32> {
    match vectors.and_then(|v| v.vectors_options) {
        Some(VectorsOptions::Vector(vector)) => vector.data,
        _ => Vec::new(),
    }
}

#[async_trait]
impl VectorStore for QdrantBackend {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.client
            .health_check()
            .await
            .map(|_| true)
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>, VectorStoreError> {
        let response = self
            .client
            .list_collections()
            .await
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        let mut names: Vec<String> = response.collections.into_iter().map(|c| c.name).collect();
        names.sort();

        let mut collections = Vec::with_capacity(names.len());
        for name in names {
            if let Some(info) = self.collection_info(&name).await? {
                collections.push(info);
            }
        }
        Ok(collections)
    }

    async fn collection_info(
        &self,
        name: &str,
    ) -> Result<Option<CollectionInfo>, VectorStoreError> {
        let exists = self
            .client
            .collection_exists(name)
            .await
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;
        if !exists {
            return Ok(None);
        }

        let response = self
            .client
            .collection_info(name)
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;

        let params = response
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config);

        let (dimension, distance) = match params {
            Some(VectorsConfigKind::Params(params)) => {
                let distance = Distance::try_from(params.distance)
                    .map(|d| d.as_str_name().to_string())
                    .ok();
                (Some(params.size), distance)
            }
            _ => (None, None),
        };

        Ok(Some(CollectionInfo {
            name: name.to_string(),
            count: self.exact_count(name).await?,
            dimension,
            distance,
        }))
    }

    async fn create_collection(&self, name: &str, dimension: u64) -> Result<(), VectorStoreError> {
        let create_collection = CreateCollectionBuilder::new(name)
            .vectors_config(VectorParamsBuilder::new(dimension, Distance::Cosine));

        self.client
            .create_collection(create_collection)
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;

        tracing::debug!(collection = name, dimension, "created collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<bool, VectorStoreError> {
        let exists = self
            .client
            .collection_exists(name)
            .await
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;
        if !exists {
            return Ok(false);
        }

        self.client
            .delete_collection(name)
            .await
            .map_err(|e| VectorStoreError::DeleteError(e.to_string()))?;
        Ok(true)
    }

    async fn add(&self, name: &str, rows: Vec<StoredRow>) -> Result<(), VectorStoreError> {
        if rows.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = rows
            .into_iter()
            .map(|mut row| {
                let id = row.point_id();
                let vector = std::mem::take(&mut row.embedding);
                PointStruct::new(id, vector, row_payload(row))
            })
            .collect();

        let upsert = UpsertPointsBuilder::new(name, points).wait(true);

        self.client
            .upsert_points(upsert)
            .await
            .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;

        Ok(())
    }

    async fn count(&self, name: &str) -> Result<u64, VectorStoreError> {
        self.exact_count(name).await
    }

    async fn get(
        &self,
        name: &str,
        limit: Option<usize>,
        with_vectors: bool,
    ) -> Result<Vec<StoredRow>, VectorStoreError> {
        let mut rows = Vec::new();
        let mut offset: Option<PointId> = None;

        loop {
            let remaining = limit.map(|l| l.saturating_sub(rows.len()));
            if remaining == Some(0) {
                break;
            }
            let page = remaining.map_or(SCROLL_PAGE_SIZE, |r| r.min(SCROLL_PAGE_SIZE as usize) as u32);

            let mut scroll_builder = ScrollPointsBuilder::new(name)
                .limit(page)
                .with_payload(true)
                .with_vectors(with_vectors);

            if let Some(off) = offset {
                scroll_builder = scroll_builder.offset(off);
            }

            let response = self
                .client
                .scroll(scroll_builder)
                .await
                .map_err(|e| VectorStoreError::ScrollError(e.to_string()))?;

            if response.result.is_empty() {
                break;
            }

            for point in response.result {
                let fallback = point_id_string(point.id.as_ref());
                let (id, document, metadata) = split_payload(point.payload, fallback);
                rows.push(StoredRow {
                    id,
                    document,
                    metadata,
                    embedding: dense_vector(point.vectors),
                });
            }

            offset = response.next_page_offset;
            if offset.is_none() {
                break;
            }
        }

        Ok(rows)
    }

    async fn query(
        &self,
        name: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<QueryHit>, VectorStoreError> {
        let search = SearchPointsBuilder::new(name, vector, limit).with_payload(true);

        let results = self
            .client
            .search_points(search)
            .await
            .map_err(|e| VectorStoreError::QueryError(e.to_string()))?;

        Ok(results
            .result
            .into_iter()
            .map(|point| {
                let fallback = point_id_string(point.id.as_ref());
                let (id, document, metadata) = split_payload(point.payload, fallback);
                QueryHit {
                    id,
                    document,
                    metadata,
                    similarity: point.score,
                }
            })
            .collect())
    }

    fn location(&self) -> &str {
        &self.url
    }
}

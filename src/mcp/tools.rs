//! Tool implementations behind the MCP server.
//!
//! Every tool returns a JSON object with a `success` flag; failures are
//! logged and reported as `{"success": false, "error": ...}` instead of
//! protocol errors.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::models::{QueryResults, SOURCE_KEY, StoredRow};
use crate::services::{Embedder, VectorStore};

pub const DEFAULT_N_RESULTS: u64 = 5;
pub const MEMORY_SOURCE: &str = "user_memory";

pub const LIST_COLLECTIONS: &str = "list_collections";
pub const QUERY: &str = "query";
pub const SEARCH_MEMORY: &str = "search_memory";
pub const REMEMBER: &str = "remember";

fn default_n_results() -> u64 {
    DEFAULT_N_RESULTS
}

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    pub query_text: String,
    #[serde(default = "default_n_results")]
    pub n_results: u64,
}

#[derive(Debug, Deserialize)]
pub struct RememberParams {
    pub memory_text: String,
}

/// JSON schema describing the arguments of `tool`.
pub fn input_schema(tool: &str) -> Value {
    match tool {
        QUERY | SEARCH_MEMORY => json!({
            "type": "object",
            "properties": {
                "query_text": {"type": "string", "description": "Text to search for"},
                "n_results": {
                    "type": "integer",
                    "description": "Number of results to return",
                    "default": DEFAULT_N_RESULTS,
                    "minimum": 1
                }
            },
            "required": ["query_text"]
        }),
        REMEMBER => json!({
            "type": "object",
            "properties": {
                "memory_text": {"type": "string", "description": "Text to store as a memory"}
            },
            "required": ["memory_text"]
        }),
        _ => json!({
            "type": "object",
            "properties": {
                "dummy": {"type": "string", "description": "Unused"}
            }
        }),
    }
}

pub fn description(tool: &str) -> &'static str {
    match tool {
        LIST_COLLECTIONS => "List all collections in the vector database with their sizes.",
        QUERY => "Find text in the configured collection similar to query_text.",
        SEARCH_MEMORY => "Search only the memory collection for text similar to query_text.",
        REMEMBER => "Store a piece of text as a memory. A unique id is generated.",
        _ => "",
    }
}

pub const TOOL_NAMES: [&str; 4] = [LIST_COLLECTIONS, QUERY, SEARCH_MEMORY, REMEMBER];

/// Shared state for tool calls.
pub struct ToolBackend {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    collection: String,
    memory_collection: String,
    memory_lock: Mutex<()>,
}

impl ToolBackend {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
        memory_collection: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            store,
            collection: collection.into(),
            memory_collection: memory_collection.into(),
            memory_lock: Mutex::new(()),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn memory_collection(&self) -> &str {
        &self.memory_collection
    }

    /// Dispatch a call by tool name. Returns `None` for unknown tools.
    pub async fn call(&self, name: &str, arguments: Value) -> Option<Value> {
        let result = match name {
            LIST_COLLECTIONS => self.list_collections().await,
            QUERY | SEARCH_MEMORY | REMEMBER => self.call_with_arguments(name, arguments).await,
            _ => return None,
        };

        Some(result.unwrap_or_else(|e| {
            tracing::error!(tool = name, error = %e, "tool call failed");
            json!({"success": false, "error": e.to_string()})
        }))
    }

    async fn call_with_arguments(&self, name: &str, arguments: Value) -> Result<Value, AppError> {
        match name {
            QUERY => {
                let params: QueryParams = parse(arguments)?;
                self.query(&params.query_text, params.n_results).await
            }
            SEARCH_MEMORY => {
                let params: QueryParams = parse(arguments)?;
                self.search_memory(&params.query_text, params.n_results).await
            }
            _ => {
                let params: RememberParams = parse(arguments)?;
                self.remember(&params.memory_text).await
            }
        }
    }

    pub async fn list_collections(&self) -> Result<Value, AppError> {
        let collections: Vec<Value> = self
            .store
            .list_collections()
            .await?
            .into_iter()
            .map(|c| json!({"name": c.name, "count": c.count}))
            .collect();
        Ok(json!({"success": true, "collections": collections}))
    }

    pub async fn query(&self, text: &str, n_results: u64) -> Result<Value, AppError> {
        let results = self.search(&self.collection, text, n_results).await?;
        Ok(json!({"success": true, "results": results}))
    }

    pub async fn search_memory(&self, text: &str, n_results: u64) -> Result<Value, AppError> {
        if !self.store.collection_exists(&self.memory_collection).await? {
            return Ok(json!({"success": true, "results": QueryResults::default()}));
        }
        let results = self.search(&self.memory_collection, text, n_results).await?;
        Ok(json!({"success": true, "results": results}))
    }

    pub async fn remember(&self, text: &str) -> Result<Value, AppError> {
        let memory_id = format!("memory_{}", uuid::Uuid::new_v4());
        tracing::info!(memory_id = %memory_id, "storing memory");

        let vector = self.embedder.embed_query(text).await?;

        let _guard = self.memory_lock.lock().await;
        if !self.store.collection_exists(&self.memory_collection).await? {
            self.store
                .create_collection(&self.memory_collection, vector.len() as u64)
                .await?;
        }

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
        let row = StoredRow {
            id: memory_id.clone(),
            document: text.to_string(),
            metadata: BTreeMap::from([
                (SOURCE_KEY.to_string(), MEMORY_SOURCE.to_string()),
                ("timestamp_utc".to_string(), timestamp),
            ]),
            embedding: vector,
        };
        self.store.add(&self.memory_collection, vec![row]).await?;

        Ok(json!({
            "success": true,
            "message": "Memory stored successfully.",
            "memory_id": memory_id
        }))
    }

    async fn search(
        &self,
        collection: &str,
        text: &str,
        n_results: u64,
    ) -> Result<QueryResults, AppError> {
        let vector = self.embedder.embed_query(text).await?;
        let hits = self
            .store
            .query(collection, vector, n_results.max(1))
            .await?;
        Ok(QueryResults::from(hits))
    }
}

fn parse<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T, AppError> {
    serde_json::from_value(arguments).map_err(|e| AppError::Other(format!("invalid arguments: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmbeddingError;
    use crate::models::EmbeddingTask;
    use crate::services::{EmbeddingBatch, MemoryBackend};
    use async_trait::async_trait;

    struct LengthEmbedder;

    #[async_trait]
    impl Embedder for LengthEmbedder {
        async fn embed(
            &self,
            texts: &[String],
            _task: EmbeddingTask,
        ) -> Result<EmbeddingBatch, EmbeddingError> {
            Ok(EmbeddingBatch {
                vectors: texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect(),
                tokens: None,
            })
        }

        fn model(&self) -> &str {
            "length"
        }
    }

    async fn backend() -> ToolBackend {
        let store = MemoryBackend::new();
        store.create_collection("main", 2).await.unwrap();
        store
            .add(
                "main",
                vec![StoredRow {
                    id: "doc_1".to_string(),
                    document: "hello".to_string(),
                    metadata: BTreeMap::from([("source".to_string(), "a.txt".to_string())]),
                    embedding: vec![5.0, 1.0],
                }],
            )
            .await
            .unwrap();
        ToolBackend::new(Arc::new(LengthEmbedder), Arc::new(store), "main", "user_memories")
    }

    #[tokio::test]
    async fn test_query_tool() {
        let backend = backend().await;
        let result = backend
            .call(QUERY, json!({"query_text": "hello"}))
            .await
            .unwrap();
        assert_eq!(result["success"], true);
        assert_eq!(result["results"]["ids"], json!(["doc_1"]));
        assert_eq!(result["results"]["metadatas"][0]["source"], "a.txt");
        assert!(result["results"]["distances"][0].as_f64().unwrap().abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_memory_round_trip() {
        let backend = backend().await;

        let empty = backend
            .call(SEARCH_MEMORY, json!({"query_text": "anything"}))
            .await
            .unwrap();
        assert_eq!(empty["success"], true);
        assert_eq!(empty["results"]["ids"], json!([]));

        let stored = backend
            .call(REMEMBER, json!({"memory_text": "likes rust"}))
            .await
            .unwrap();
        assert_eq!(stored["success"], true);
        let memory_id = stored["memory_id"].as_str().unwrap().to_string();
        assert!(memory_id.starts_with("memory_"));

        let found = backend
            .call(SEARCH_MEMORY, json!({"query_text": "likes rust", "n_results": 3}))
            .await
            .unwrap();
        assert_eq!(found["results"]["ids"], json!([memory_id]));
        assert_eq!(found["results"]["documents"], json!(["likes rust"]));
        assert_eq!(found["results"]["metadatas"][0]["source"], MEMORY_SOURCE);
        assert!(found["results"]["metadatas"][0]["timestamp_utc"].is_string());

        let listed = backend.call(LIST_COLLECTIONS, json!({})).await.unwrap();
        assert_eq!(
            listed["collections"],
            json!([{"name": "main", "count": 1}, {"name": "user_memories", "count": 1}])
        );
    }

    #[tokio::test]
    async fn test_failures_are_reported() {
        let backend = backend().await;
        let result = backend.call(QUERY, json!({"n_results": 2})).await.unwrap();
        assert_eq!(result["success"], false);
        assert!(result["error"].as_str().unwrap().contains("query_text"));

        assert!(backend.call("unknown", json!({})).await.is_none());
    }

    #[test]
    fn test_schemas() {
        assert_eq!(input_schema(QUERY)["required"], json!(["query_text"]));
        assert_eq!(input_schema(REMEMBER)["required"], json!(["memory_text"]));
        assert!(input_schema(LIST_COLLECTIONS)["properties"]["dummy"].is_object());
        assert!(TOOL_NAMES.iter().all(|t| !description(t).is_empty()));
    }
}

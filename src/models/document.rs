use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata key holding the chunk's provenance path.
pub const SOURCE_KEY: &str = "source";

/// One line of an input JSONL file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub text: String,
    pub source: String,
}

impl ChunkRecord {
    pub fn metadata(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(SOURCE_KEY.to_string(), self.source.clone())])
    }
}

/// A row as held by the vector store: original id, text, flat string
/// metadata and its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRow {
    pub id: String,
    pub document: String,
    pub metadata: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
}

impl StoredRow {
    pub fn from_chunk(chunk: &ChunkRecord, embedding: Vec<f32>) -> Self {
        Self {
            id: chunk.id.clone(),
            document: chunk.text.clone(),
            metadata: chunk.metadata(),
            embedding,
        }
    }

    /// Stable store-side point id for this row.
    pub fn point_id(&self) -> String {
        point_id(&self.id)
    }
}

/// Map an arbitrary string id onto the UUID space accepted by the store.
pub fn point_id(id: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, id.as_bytes()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_id_is_stable_uuid() {
        let id = point_id("doc_000001");
        assert_eq!(id.len(), 36);
        assert!(id.chars().filter(|c| *c == '-').count() == 4);
        assert_eq!(id, point_id("doc_000001"));
        assert_ne!(id, point_id("doc_000002"));
    }

    #[test]
    fn test_chunk_record_parse() {
        let chunk: ChunkRecord = serde_json::from_str(
            r#"{"id": "c1", "text": "hello world", "source": "docs/a.md", "extra": 1}"#,
        )
        .unwrap();
        assert_eq!(chunk.id, "c1");

        let row = StoredRow::from_chunk(&chunk, vec![0.1, 0.2]);
        assert_eq!(row.metadata.get(SOURCE_KEY).unwrap(), "docs/a.md");
        assert_eq!(row.point_id(), point_id("c1"));
    }

    #[test]
    fn test_chunk_record_requires_source() {
        let parsed = serde_json::from_str::<ChunkRecord>(r#"{"id": "c1", "text": "x"}"#);
        assert!(parsed.is_err());
    }
}

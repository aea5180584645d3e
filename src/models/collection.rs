//! Collection descriptors, naming and the export document format.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Upper bound on collection name length.
pub const MAX_COLLECTION_NAME_LEN: usize = 63;

/// Summary of a collection as reported by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub count: u64,
    /// Vector size, when the store reports one
    pub dimension: Option<u64>,
    /// Distance metric name, when the store reports one
    pub distance: Option<String>,
}

impl CollectionInfo {
    pub fn metadata(&self) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        if let Some(ref distance) = self.distance {
            metadata.insert("distance".to_string(), distance.clone());
        }
        if let Some(dimension) = self.dimension {
            metadata.insert("dimension".to_string(), dimension.to_string());
        }
        metadata
    }
}

/// Derive the collection name for an input file and model.
///
/// `data/notes.jsonl` with `jinaai/jina-embeddings-v3` becomes
/// `notes_jina-embeddings-v3`.
pub fn collection_name(input: &Path, model: &str) -> String {
    let base = input
        .file_name()
        .map(|n| n.to_string_lossy().replace(".jsonl", ""))
        .unwrap_or_default();
    let model_short = model.rsplit('/').next().unwrap_or(model);

    format!("{}_{}", base, model_short)
        .chars()
        .take(MAX_COLLECTION_NAME_LEN)
        .collect()
}

/// Aligned column data of an export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportData {
    pub ids: Vec<String>,
    pub documents: Vec<String>,
    pub metadatas: Vec<BTreeMap<String, String>>,
    pub embeddings: Vec<Vec<f32>>,
}

/// JSON document written by `collection export`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub collection_name: String,
    pub export_time: String,
    pub count: usize,
    pub metadata: BTreeMap<String, String>,
    pub data: ExportData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_name() {
        assert_eq!(
            collection_name(Path::new("x.jsonl"), "org/model"),
            "x_model"
        );
        assert_eq!(
            collection_name(Path::new("/data/chunks.jsonl"), "plain-model"),
            "chunks_plain-model"
        );
    }

    #[test]
    fn test_collection_name_truncated() {
        let input = format!("{}.jsonl", "a".repeat(80));
        let name = collection_name(Path::new(&input), "org/model");
        assert_eq!(name.chars().count(), MAX_COLLECTION_NAME_LEN);
        assert!(name.chars().all(|c| c == 'a'));
    }

    #[test]
    fn test_info_metadata() {
        let info = CollectionInfo {
            name: "docs".to_string(),
            count: 3,
            dimension: Some(1024),
            distance: Some("Cosine".to_string()),
        };
        let metadata = info.metadata();
        assert_eq!(metadata["distance"], "Cosine");
        assert_eq!(metadata["dimension"], "1024");
    }
}

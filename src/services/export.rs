//! Collection export to a self-describing JSON document.

use std::path::Path;

use anyhow::{Context, Result};

use super::vector_store::VectorStore;
use crate::error::VectorStoreError;
use crate::models::{ExportData, ExportDocument, StoredRow};
use crate::utils::ensure_parent_dir;

/// Summary of a finished export.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExportSummary {
    pub collection: String,
    pub output: std::path::PathBuf,
    pub count: usize,
    pub size_bytes: u64,
}

pub fn build_export(
    collection: &str,
    metadata: std::collections::BTreeMap<String, String>,
    rows: Vec<StoredRow>,
) -> ExportDocument {
    let mut data = ExportData::default();
    for row in rows {
        data.ids.push(row.id);
        data.documents.push(row.document);
        data.metadatas.push(row.metadata);
        data.embeddings.push(row.embedding);
    }

    ExportDocument {
        collection_name: collection.to_string(),
        export_time: chrono::Local::now().to_rfc3339(),
        count: data.ids.len(),
        metadata,
        data,
    }
}

/// Export up to `limit` rows of `collection`, embeddings included.
pub async fn export_collection(
    store: &dyn VectorStore,
    collection: &str,
    output: &Path,
    limit: Option<usize>,
) -> Result<ExportSummary> {
    let info = store
        .collection_info(collection)
        .await?
        .ok_or_else(|| VectorStoreError::CollectionNotFound(collection.to_string()))?;

    let rows = store.get(collection, limit, true).await?;
    let document = build_export(collection, info.metadata(), rows);

    ensure_parent_dir(output)
        .with_context(|| format!("failed to create directory for {}", output.display()))?;
    let json = serde_json::to_string_pretty(&document)?;
    std::fs::write(output, json)
        .with_context(|| format!("failed to write {}", output.display()))?;

    let size_bytes = std::fs::metadata(output)?.len();
    tracing::info!(collection, count = document.count, "exported collection");

    Ok(ExportSummary {
        collection: collection.to_string(),
        output: output.to_path_buf(),
        count: document.count,
        size_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::vector_store::MemoryBackend;
    use std::collections::{BTreeMap, BTreeSet};

    fn load_export(path: &Path) -> ExportDocument {
        let content = std::fs::read_to_string(path).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    async fn seeded_store() -> MemoryBackend {
        let store = MemoryBackend::new();
        store.create_collection("docs", 2).await.unwrap();
        let rows = (0..5)
            .map(|i| StoredRow {
                id: format!("doc_{:06}", i),
                document: format!("document {}", i),
                metadata: BTreeMap::from([("source".to_string(), format!("{}.txt", i))]),
                embedding: vec![i as f32, 1.0],
            })
            .collect();
        store.add("docs", rows).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_export_round_trip() {
        let store = seeded_store().await;
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("exports").join("docs.json");

        let summary = export_collection(&store, "docs", &output, None)
            .await
            .unwrap();
        assert_eq!(summary.count, 5);
        assert!(summary.size_bytes > 0);

        let loaded = load_export(&output);
        assert_eq!(loaded.collection_name, "docs");
        assert_eq!(loaded.count, 5);
        assert_eq!(loaded.metadata["distance"], "Cosine");
        assert_eq!(loaded.data.embeddings[3], vec![3.0, 1.0]);

        let exported: BTreeSet<String> = loaded.data.ids.into_iter().collect();
        let stored: BTreeSet<String> = store
            .get("docs", None, false)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(exported, stored);
    }

    #[tokio::test]
    async fn test_export_limit_and_missing() {
        let store = seeded_store().await;
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("docs.json");

        let summary = export_collection(&store, "docs", &output, Some(2))
            .await
            .unwrap();
        assert_eq!(summary.count, 2);

        let missing = export_collection(&store, "nope", &output, None).await;
        assert!(missing.is_err());
    }
}

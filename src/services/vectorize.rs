//! The vectorize pipeline: load, embed, rebuild the collection, store.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use super::batch::{batch_count, batch_ranges};
use super::embedding::Embedder;
use super::loader::load_chunks;
use super::monitor::ResourceMonitor;
use super::vector_store::VectorStore;
use crate::models::{EmbeddingTask, StoredRow, collection_name};
use crate::utils::ensure_parent_dir;

const COLLECTIONS_LOG: &str = "collections.txt";

#[derive(Debug, Clone)]
pub struct VectorizeOptions {
    pub input: PathBuf,
    pub task: EmbeddingTask,
    pub batch_size: usize,
    /// Root of `vector_stores/` and `visualizations/`
    pub artifacts_dir: PathBuf,
    pub show_progress: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct VectorizeStats {
    pub input: PathBuf,
    pub collection: String,
    pub model: String,
    pub task: EmbeddingTask,
    pub chunks: usize,
    pub batches: usize,
    pub avg_text_length: f64,
    pub max_text_length: usize,
    /// `None` when neither the service nor a local tokenizer reported usage
    pub tokens: Option<u64>,
    pub dimension: Option<u64>,
    pub stored_count: u64,
    pub store_location: String,
    pub duration_ms: u64,
}

impl VectorizeStats {
    pub fn chunks_per_sec(&self) -> f64 {
        per_second(self.chunks as f64, self.duration_ms)
    }

    pub fn tokens_per_sec(&self) -> Option<f64> {
        self.tokens.map(|t| per_second(t as f64, self.duration_ms))
    }
}

fn per_second(amount: f64, duration_ms: u64) -> f64 {
    if duration_ms == 0 {
        0.0
    } else {
        amount / (duration_ms as f64 / 1000.0)
    }
}

fn progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} {prefix} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Run the pipeline end to end. Any failure aborts; rows stored before the
/// failure stay in the collection.
pub async fn vectorize(
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    options: &VectorizeOptions,
    monitor: Option<&ResourceMonitor>,
) -> Result<VectorizeStats> {
    let start_time = Instant::now();
    let chunks = load_chunks(&options.input)
        .with_context(|| format!("failed to load {}", options.input.display()))?;

    let collection = collection_name(&options.input, embedder.model());
    let mut stats = VectorizeStats {
        input: options.input.clone(),
        collection: collection.clone(),
        model: embedder.model().to_string(),
        task: options.task,
        chunks: chunks.len(),
        batches: batch_count(chunks.len(), options.batch_size),
        avg_text_length: 0.0,
        max_text_length: 0,
        tokens: None,
        dimension: None,
        stored_count: 0,
        store_location: store.location().to_string(),
        duration_ms: 0,
    };

    // No dimension is known without embeddings, so an empty run drops the
    // collection instead of recreating it.
    if chunks.is_empty() {
        tracing::warn!(input = %options.input.display(), "no chunks found, nothing to process");
        let dropped = store
            .delete_collection(&collection)
            .await
            .with_context(|| format!("failed to delete collection '{}'", collection))?;
        if dropped {
            tracing::info!(collection = %collection, "dropped rows of the previous run");
        }
        stats.duration_ms = start_time.elapsed().as_millis() as u64;
        return Ok(stats);
    }

    let lengths: Vec<usize> = chunks.iter().map(|c| c.text.chars().count()).collect();
    stats.avg_text_length = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
    stats.max_text_length = lengths.iter().copied().max().unwrap_or(0);

    let ranges = batch_ranges(chunks.len(), options.batch_size);
    tracing::info!(
        chunks = chunks.len(),
        batches = ranges.len(),
        collection = %collection,
        "vectorizing"
    );

    let pb = progress_bar(chunks.len() as u64, options.show_progress);
    pb.set_prefix("embedding");

    let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());
    let mut total_tokens: Option<u64> = None;
    for range in &ranges {
        let texts: Vec<String> = chunks[range.clone()].iter().map(|c| c.text.clone()).collect();
        let batch = embedder
            .embed(&texts, options.task)
            .await
            .with_context(|| format!("failed to embed chunks {}..{}", range.start, range.end))?;

        if let Some(tokens) = batch.tokens {
            total_tokens = Some(total_tokens.unwrap_or(0) + tokens);
        }
        embeddings.extend(batch.vectors);

        pb.inc(range.len() as u64);
        if let Some(monitor) = monitor {
            pb.set_message(monitor.snapshot().compact());
        }
    }
    pb.finish_and_clear();
    stats.tokens = total_tokens;

    let dimension = embeddings.first().map_or(0, |v| v.len() as u64);
    stats.dimension = Some(dimension);

    store
        .recreate_collection(&collection, dimension)
        .await
        .with_context(|| format!("failed to create collection '{}'", collection))?;
    record_collection(&options.artifacts_dir, &collection, embedder.model(), options.task)
        .context("failed to record collection")?;

    let pb = progress_bar(ranges.len() as u64, options.show_progress);
    pb.set_prefix("storing");

    let mut embeddings = embeddings.into_iter();
    for range in &ranges {
        let rows: Vec<StoredRow> = chunks[range.clone()]
            .iter()
            .zip(embeddings.by_ref())
            .map(|(chunk, embedding)| StoredRow::from_chunk(chunk, embedding))
            .collect();

        store
            .add(&collection, rows)
            .await
            .with_context(|| format!("failed to store chunks {}..{}", range.start, range.end))?;

        pb.inc(1);
        if let Some(monitor) = monitor {
            pb.set_message(monitor.snapshot().compact());
        }
    }
    pb.finish_and_clear();

    stats.stored_count = store.count(&collection).await?;
    stats.duration_ms = start_time.elapsed().as_millis() as u64;
    Ok(stats)
}

pub fn collections_log_path(artifacts_dir: &Path) -> PathBuf {
    artifacts_dir.join("vector_stores").join(COLLECTIONS_LOG)
}

/// Append a creation line to the collections log.
pub fn record_collection(
    artifacts_dir: &Path,
    collection: &str,
    model: &str,
    task: EmbeddingTask,
) -> std::io::Result<()> {
    let path = collections_log_path(artifacts_dir);
    ensure_parent_dir(&path)?;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    writeln!(
        file,
        "{} ({}) - Model: {}, Task: {}",
        collection, timestamp, model, task
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmbeddingError;
    use crate::services::embedding::EmbeddingBatch;
    use crate::services::vector_store::MemoryBackend;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeEmbedder {
        calls: AtomicUsize,
    }

    impl FakeEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(
            &self,
            texts: &[String],
            _task: EmbeddingTask,
        ) -> Result<EmbeddingBatch, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(EmbeddingBatch {
                vectors: texts
                    .iter()
                    .map(|t| vec![t.len() as f32, 1.0, 0.5])
                    .collect(),
                tokens: Some(texts.len() as u64 * 2),
            })
        }

        fn model(&self) -> &str {
            "org/fake-model"
        }
    }

    fn write_chunks(dir: &Path, name: &str, ids: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let lines: Vec<String> = ids
            .iter()
            .map(|id| {
                serde_json::json!({"id": id, "text": format!("text for {}", id), "source": "s.txt"})
                    .to_string()
            })
            .collect();
        std::fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    fn options(input: PathBuf, artifacts: &Path) -> VectorizeOptions {
        VectorizeOptions {
            input,
            task: EmbeddingTask::RetrievalPassage,
            batch_size: 2,
            artifacts_dir: artifacts.to_path_buf(),
            show_progress: false,
        }
    }

    #[tokio::test]
    async fn test_vectorize_batches_and_stores() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_chunks(dir.path(), "notes.jsonl", &["a", "b", "c", "d", "e"]);
        let embedder = FakeEmbedder::new();
        let store = MemoryBackend::new();

        let stats = vectorize(&embedder, &store, &options(input, dir.path()), None)
            .await
            .unwrap();

        assert_eq!(stats.collection, "notes_fake-model");
        assert_eq!(stats.chunks, 5);
        assert_eq!(stats.batches, 3);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
        assert_eq!(stats.tokens, Some(10));
        assert_eq!(stats.dimension, Some(3));
        assert_eq!(stats.stored_count, 5);

        let log = std::fs::read_to_string(collections_log_path(dir.path())).unwrap();
        assert!(log.starts_with("notes_fake-model ("));
        assert!(log.trim_end().ends_with("- Model: org/fake-model, Task: retrieval.passage"));
    }

    #[tokio::test]
    async fn test_rerun_keeps_only_latest_rows() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = FakeEmbedder::new();
        let store = MemoryBackend::new();

        let input = write_chunks(dir.path(), "notes.jsonl", &["a", "b", "c"]);
        vectorize(&embedder, &store, &options(input, dir.path()), None)
            .await
            .unwrap();

        let input = write_chunks(dir.path(), "notes.jsonl", &["x", "y"]);
        let stats = vectorize(&embedder, &store, &options(input, dir.path()), None)
            .await
            .unwrap();

        assert_eq!(stats.stored_count, 2);
        let rows = store.get(&stats.collection, None, false).await.unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y"]);
    }

    #[tokio::test]
    async fn test_empty_input_on_fresh_store() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.jsonl");
        std::fs::write(&input, "\n\n").unwrap();
        let embedder = FakeEmbedder::new();
        let store = MemoryBackend::new();

        let stats = vectorize(&embedder, &store, &options(input, dir.path()), None)
            .await
            .unwrap();

        assert_eq!(stats.chunks, 0);
        assert_eq!(stats.stored_count, 0);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
        assert!(store.list_collections().await.unwrap().is_empty());
        assert!(!collections_log_path(dir.path()).exists());
    }

    #[tokio::test]
    async fn test_empty_rerun_drops_previous_rows() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = FakeEmbedder::new();
        let store = MemoryBackend::new();

        let input = write_chunks(dir.path(), "notes.jsonl", &["a", "b"]);
        let first = vectorize(&embedder, &store, &options(input.clone(), dir.path()), None)
            .await
            .unwrap();
        assert_eq!(first.stored_count, 2);

        std::fs::write(&input, "\n").unwrap();
        let stats = vectorize(&embedder, &store, &options(input, dir.path()), None)
            .await
            .unwrap();

        assert_eq!(stats.collection, first.collection);
        assert_eq!(stats.chunks, 0);
        assert_eq!(stats.stored_count, 0);
        assert!(!store.collection_exists(&stats.collection).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_input_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.jsonl");
        std::fs::write(&input, "{\"id\": \"a\"}\n").unwrap();
        let store = MemoryBackend::new();

        let err = vectorize(&FakeEmbedder::new(), &store, &options(input, dir.path()), None)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("line 1"));
    }
}

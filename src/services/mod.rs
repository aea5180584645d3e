mod batch;
mod collections;
mod embedding;
mod export;
mod generator;
mod loader;
mod monitor;
mod tokens;
mod validator;
mod vectorize;

pub mod vector_store;
pub mod visualize;

pub use batch::{batch_count, batch_ranges};
pub use collections::{
    CollectionInspection, DocumentLengthStats, SampleRow, inspect_collection, search_collection,
};
pub use embedding::{Embedder, EmbeddingBatch, EmbeddingClient};
pub use export::{ExportSummary, build_export, export_collection};
pub use generator::{
    DEFAULT_NUM_DOCS, DEFAULT_OUTPUT, GenerateOptions, GenerateSummary, generate_samples,
};
pub use loader::{load_chunks, parse_chunks};
pub use monitor::{
    DEFAULT_SAMPLE_INTERVAL, GpuStats, ResourceMonitor, ResourceSnapshot, parse_nvidia_smi,
};
pub use tokens::TokenCounter;
pub use validator::{
    TextLengthStats, ValidationReport, ValidationStats, top_patterns, validate_file,
};
pub use vector_store::{MemoryBackend, QdrantBackend, VectorStore, create_backend};
pub use vectorize::{
    VectorizeOptions, VectorizeStats, collections_log_path, record_collection, vectorize,
};
pub use visualize::{VisualizeOptions, VisualizeSummary, open_in_browser};

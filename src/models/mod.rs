mod collection;
mod config;
mod document;
mod search;
mod task;

pub use collection::{
    CollectionInfo, ExportData, ExportDocument, MAX_COLLECTION_NAME_LEN, collection_name,
};
pub use config::{
    Config, DEFAULT_ARTIFACTS_DIR, DEFAULT_EMBEDDING_MODEL, DEFAULT_EMBEDDING_URL,
    DEFAULT_MEMORY_COLLECTION, DEFAULT_QDRANT_URL, ENV_EMBEDDING_API_KEY, ENV_EMBEDDING_URL,
    ENV_QDRANT_API_KEY, ENV_QDRANT_URL, EmbeddingConfig, OutputConfig, PathsConfig,
    ResolvedConfig, RunConfig, VectorStoreConfig, merge_toml,
};
pub use document::{ChunkRecord, SOURCE_KEY, StoredRow, point_id};
pub use search::{OutputFormat, QueryHit, QueryResults};
pub use task::EmbeddingTask;

//! Error types for chunkvec.

use std::path::PathBuf;

use thiserror::Error;

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding service: {0}")]
    ConnectionError(String),

    #[error("embedding service error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("tokenizer error: {0}")]
    TokenizerError(String),

    #[error("embedding timeout")]
    Timeout,
}

/// Errors related to vector store operations.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to connect to vector store: {0}")]
    ConnectionError(String),

    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("collection error: {0}")]
    CollectionError(String),

    #[error("upsert error: {0}")]
    UpsertError(String),

    #[error("query error: {0}")]
    QueryError(String),

    #[error("scroll error: {0}")]
    ScrollError(String),

    #[error("delete error: {0}")]
    DeleteError(String),

    #[error("dimension mismatch: collection expects {expected}, got {actual}")]
    DimensionMismatch { expected: u64, actual: u64 },
}

/// Errors raised while loading chunk records from a JSONL file.
#[derive(Debug, Error)]
pub enum ChunkLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: invalid chunk record: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("JSON parse error: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Errors related to building a visualization.
#[derive(Debug, Error)]
pub enum VisualizeError {
    #[error("collection '{0}' has no embeddings to visualize")]
    Empty(String),

    #[error("embeddings have inconsistent dimensions ({0} vs {1})")]
    RaggedEmbeddings(usize, usize),

    #[error("failed to write visualization: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize figure: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    #[error("load error: {0}")]
    Load(#[from] ChunkLoadError),

    #[error("visualize error: {0}")]
    Visualize(#[from] VisualizeError),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_names_line() {
        let source = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = ChunkLoadError::Decode { line: 7, source };
        assert!(err.to_string().starts_with("line 7:"));
    }

    #[test]
    fn test_app_error_wraps_domain_error() {
        let err: AppError = VectorStoreError::CollectionNotFound("docs".to_string()).into();
        assert_eq!(
            err.to_string(),
            "vector store error: collection not found: docs"
        );
    }
}

//! Local token counting used when the embedding service reports no usage.

use std::path::Path;

use tokenizers::Tokenizer;

use crate::error::EmbeddingError;

pub struct TokenCounter {
    tokenizer: Tokenizer,
}

impl TokenCounter {
    /// Load a `tokenizer.json`. Padding and truncation are disabled so the
    /// count reflects the full text.
    pub fn from_file(path: &Path) -> Result<Self, EmbeddingError> {
        let mut tokenizer = Tokenizer::from_file(path)
            .map_err(|e| EmbeddingError::TokenizerError(e.to_string()))?;

        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(None)
            .map_err(|e| EmbeddingError::TokenizerError(e.to_string()))?;

        Ok(Self { tokenizer })
    }

    /// Total number of tokens across `texts`, special tokens included.
    pub fn count(&self, texts: &[String]) -> Result<u64, EmbeddingError> {
        if texts.is_empty() {
            return Ok(0);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbeddingError::TokenizerError(e.to_string()))?;

        Ok(encodings.iter().map(|e| e.get_ids().len() as u64).sum())
    }
}

//! JSONL chunk loading.

use std::path::Path;

use crate::error::ChunkLoadError;
use crate::models::ChunkRecord;

/// Read every non-blank line of `path` as a [`ChunkRecord`].
///
/// The first malformed line aborts the load; the error carries its 1-based
/// line number.
pub fn load_chunks(path: &Path) -> Result<Vec<ChunkRecord>, ChunkLoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| ChunkLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_chunks(&content)
}

pub fn parse_chunks(content: &str) -> Result<Vec<ChunkRecord>, ChunkLoadError> {
    let mut chunks = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let chunk: ChunkRecord = serde_json::from_str(line)
            .map_err(|source| ChunkLoadError::Decode { line: i + 1, source })?;
        chunks.push(chunk);
    }
    tracing::debug!(count = chunks.len(), "loaded chunks");
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_skips_blank_lines() {
        let content = concat!(
            r#"{"id": "a", "text": "first", "source": "a.txt"}"#,
            "\n\n   \n",
            r#"{"id": "b", "text": "second", "source": "b.txt"}"#,
            "\n",
        );
        let chunks = parse_chunks(content).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].id, "b");
    }

    #[test]
    fn test_loader_reports_line_number() {
        let content = concat!(
            r#"{"id": "a", "text": "first", "source": "a.txt"}"#,
            "\n",
            r#"{"id": "b", "text": "missing source"}"#,
            "\n",
        );
        let err = parse_chunks(content).unwrap_err();
        assert!(matches!(err, ChunkLoadError::Decode { line: 2, .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunks.jsonl");
        std::fs::write(&path, "{\"id\": \"x\", \"text\": \"t\", \"source\": \"s\"}\n").unwrap();
        assert_eq!(load_chunks(&path).unwrap().len(), 1);

        let missing = load_chunks(&dir.path().join("nope.jsonl"));
        assert!(matches!(missing, Err(ChunkLoadError::Io { .. })));
    }
}

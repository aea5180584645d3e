//! Embedding task adapters understood by task-aware embedding models.

use serde::{Deserialize, Serialize};

/// Downstream task an embedding is generated for.
///
/// Task-aware models (e.g. jina-embeddings-v3) select a LoRA adapter or
/// instruction prefix based on this value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmbeddingTask {
    /// Encoding a search query.
    #[serde(rename = "retrieval.query")]
    RetrievalQuery,
    /// Encoding a passage to be retrieved.
    #[default]
    #[serde(rename = "retrieval.passage")]
    RetrievalPassage,
    #[serde(rename = "separation")]
    Separation,
    #[serde(rename = "classification")]
    Classification,
    #[serde(rename = "text-matching")]
    TextMatching,
}

impl EmbeddingTask {
    pub const ALL: [EmbeddingTask; 5] = [
        EmbeddingTask::RetrievalQuery,
        EmbeddingTask::RetrievalPassage,
        EmbeddingTask::Separation,
        EmbeddingTask::Classification,
        EmbeddingTask::TextMatching,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingTask::RetrievalQuery => "retrieval.query",
            EmbeddingTask::RetrievalPassage => "retrieval.passage",
            EmbeddingTask::Separation => "separation",
            EmbeddingTask::Classification => "classification",
            EmbeddingTask::TextMatching => "text-matching",
        }
    }
}

impl std::str::FromStr for EmbeddingTask {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|task| task.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(EmbeddingTask::as_str).collect();
                format!("unknown task: {} (expected one of: {})", s, names.join(", "))
            })
    }
}

impl std::fmt::Display for EmbeddingTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_parse() {
        assert_eq!(
            "retrieval.query".parse::<EmbeddingTask>().unwrap(),
            EmbeddingTask::RetrievalQuery
        );
        assert_eq!(
            "Text-Matching".parse::<EmbeddingTask>().unwrap(),
            EmbeddingTask::TextMatching
        );
        assert!("retrieval".parse::<EmbeddingTask>().is_err());
    }

    #[test]
    fn test_task_serde_names() {
        let json = serde_json::to_string(&EmbeddingTask::RetrievalPassage).unwrap();
        assert_eq!(json, "\"retrieval.passage\"");
        let task: EmbeddingTask = serde_json::from_str("\"separation\"").unwrap();
        assert_eq!(task, EmbeddingTask::Separation);
    }
}

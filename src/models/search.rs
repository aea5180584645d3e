//! Similarity query models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
    /// Documentation-friendly Markdown format
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// A single nearest-neighbour hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryHit {
    /// Original chunk id
    pub id: String,

    pub document: String,

    pub metadata: BTreeMap<String, String>,

    /// Cosine similarity reported by the store
    pub similarity: f32,
}

impl QueryHit {
    /// Cosine distance, `1 - similarity`.
    pub fn distance(&self) -> f32 {
        1.0 - self.similarity
    }
}

/// Column-oriented results of one query, the shape returned by the MCP
/// tools.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResults {
    pub ids: Vec<String>,
    pub documents: Vec<String>,
    pub metadatas: Vec<BTreeMap<String, String>>,
    pub distances: Vec<f32>,
}

impl QueryResults {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

impl From<Vec<QueryHit>> for QueryResults {
    fn from(hits: Vec<QueryHit>) -> Self {
        let mut results = QueryResults::default();
        for hit in hits {
            results.distances.push(hit.distance());
            results.ids.push(hit.id);
            results.documents.push(hit.document);
            results.metadatas.push(hit.metadata);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            "md".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_hits_to_columns() {
        let hits = vec![
            QueryHit {
                id: "a".to_string(),
                document: "first".to_string(),
                metadata: BTreeMap::from([("source".to_string(), "a.txt".to_string())]),
                similarity: 0.75,
            },
            QueryHit {
                id: "b".to_string(),
                document: "second".to_string(),
                metadata: BTreeMap::new(),
                similarity: 0.5,
            },
        ];

        let results = QueryResults::from(hits);
        assert_eq!(results.len(), 2);
        assert_eq!(results.ids, vec!["a", "b"]);
        assert_eq!(results.distances, vec![0.25, 0.5]);
        assert_eq!(results.metadatas[0]["source"], "a.txt");
    }
}

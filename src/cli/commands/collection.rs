//! Collection manager commands.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use console::style;

use crate::cli::output::{Formatter, get_formatter};
use crate::models::{Config, OutputFormat};
use crate::services::{
    EmbeddingClient, VectorStore, create_backend, export_collection, inspect_collection,
    search_collection,
};

const DEFAULT_SEARCH_RESULTS: u64 = 5;

#[derive(Debug, Subcommand)]
pub enum CollectionCommand {
    /// List all collections with their sizes
    List,

    /// Show count, metadata and sample rows of a collection
    Inspect {
        /// Collection name
        collection: String,
    },

    /// Run a similarity search against a collection
    Search {
        /// Collection name
        collection: String,

        /// Query text
        query: String,

        /// Number of results
        #[arg(long, short = 'n', default_value_t = DEFAULT_SEARCH_RESULTS)]
        n_results: u64,
    },

    /// Delete a collection
    Delete {
        /// Collection name
        collection: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        force: bool,
    },

    /// Export a collection with its embeddings to a JSON file
    Export {
        /// Collection name
        collection: String,

        /// Output JSON file
        output: PathBuf,

        /// Maximum number of rows to export
        #[arg(long, short = 'n')]
        limit: Option<usize>,
    },
}

/// Handle a collection command. Failures are reported and returned as
/// `Ok(false)`.
pub async fn handle_collection(
    cmd: CollectionCommand,
    config: &Config,
    format: OutputFormat,
) -> Result<bool> {
    let formatter = get_formatter(format);

    let store = match create_backend(&config.vector_store) {
        Ok(store) => store,
        Err(e) => {
            eprint!("{}", formatter.format_error(&e.to_string()));
            return Ok(false);
        }
    };

    match run(cmd, config, store.as_ref(), formatter.as_ref()).await {
        Ok(()) => Ok(true),
        Err(e) => {
            tracing::error!(error = %e, "collection command failed");
            eprint!("{}", formatter.format_error(&format!("{:#}", e)));
            Ok(false)
        }
    }
}

async fn run(
    cmd: CollectionCommand,
    config: &Config,
    store: &dyn VectorStore,
    formatter: &dyn Formatter,
) -> Result<()> {
    match cmd {
        CollectionCommand::List => {
            let collections = store.list_collections().await?;
            print!("{}", formatter.format_collections(&collections));
        }
        CollectionCommand::Inspect { collection } => {
            let inspection = inspect_collection(store, &collection).await?;
            print!("{}", formatter.format_inspection(&inspection));
        }
        CollectionCommand::Search {
            collection,
            query,
            n_results,
        } => {
            let embedder = EmbeddingClient::new(&config.embedding)?;
            let hits =
                search_collection(&embedder, store, &collection, &query, n_results.max(1)).await?;
            print!("{}", formatter.format_search_hits(&collection, &query, &hits));
        }
        CollectionCommand::Delete { collection, force } => {
            if !store.collection_exists(&collection).await? {
                anyhow::bail!("collection '{}' does not exist", collection);
            }
            if !force && !confirm(&format!("Delete collection '{}'?", collection))? {
                print!("{}", formatter.format_message("Cancelled."));
                return Ok(());
            }
            store.delete_collection(&collection).await?;
            print!(
                "{}",
                formatter.format_message(&format!("Deleted collection '{}'", collection))
            );
        }
        CollectionCommand::Export {
            collection,
            output,
            limit,
        } => {
            let summary = export_collection(store, &collection, &output, limit).await?;
            print!("{}", formatter.format_export(&summary));
        }
    }
    Ok(())
}

/// Prompt on stderr so stdout keeps only command output.
fn confirm(question: &str) -> Result<bool> {
    ask(question, &mut std::io::stdin().lock(), &mut std::io::stderr())
}

fn ask(question: &str, input: &mut impl BufRead, prompt: &mut impl Write) -> Result<bool> {
    write!(prompt, "{} [y/N] ", style(question).bold())?;
    prompt.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StoredRow;
    use crate::services::MemoryBackend;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    async fn store() -> MemoryBackend {
        let store = MemoryBackend::new();
        store.create_collection("docs", 2).await.unwrap();
        store
            .add(
                "docs",
                vec![StoredRow {
                    id: "doc_1".to_string(),
                    document: "hello world".to_string(),
                    metadata: BTreeMap::new(),
                    embedding: vec![1.0, 0.0],
                }],
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_forced_delete() {
        let store = store().await;
        let formatter = get_formatter(OutputFormat::Json);
        run(
            CollectionCommand::Delete {
                collection: "docs".to_string(),
                force: true,
            },
            &Config::default(),
            &store,
            formatter.as_ref(),
        )
        .await
        .unwrap();
        assert!(!store.collection_exists("docs").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_collection_is_error() {
        let store = store().await;
        let formatter = get_formatter(OutputFormat::Json);
        let result = run(
            CollectionCommand::Inspect {
                collection: "nope".to_string(),
            },
            &Config::default(),
            &store,
            formatter.as_ref(),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_export() {
        let store = store().await;
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("exports/docs.json");
        let formatter = get_formatter(OutputFormat::Text);
        run(
            CollectionCommand::Export {
                collection: "docs".to_string(),
                output: output.clone(),
                limit: None,
            },
            &Config::default(),
            &store,
            formatter.as_ref(),
        )
        .await
        .unwrap();
        assert!(output.exists());
    }

    #[test]
    fn test_ask_reads_answer() {
        let mut prompt = Vec::new();
        let yes = ask("Delete collection 'docs'?", &mut "y\n".as_bytes(), &mut prompt).unwrap();
        assert!(yes);
        assert!(String::from_utf8(prompt).unwrap().contains("[y/N]"));

        let mut prompt = Vec::new();
        assert!(!ask("Delete?", &mut "\n".as_bytes(), &mut prompt).unwrap());
        assert!(!ask("Delete?", &mut "nope\n".as_bytes(), &mut prompt).unwrap());
    }
}

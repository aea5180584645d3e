//! MCP server command implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use crate::mcp::McpServer;
use crate::models::{Config, DEFAULT_MEMORY_COLLECTION, EmbeddingConfig};
use crate::services::{EmbeddingClient, create_backend};

/// Arguments for the mcp command.
#[derive(Debug, Args)]
pub struct McpArgs {
    /// Collection searched by the `query` tool
    #[arg(long, short = 'c', env = "CHUNKVEC_COLLECTION")]
    pub collection: String,

    /// Collection holding memories stored by the `remember` tool
    #[arg(long, env = "CHUNKVEC_MEMORY_COLLECTION", default_value = DEFAULT_MEMORY_COLLECTION)]
    pub memory_collection: String,

    /// Embedding model used for queries; match the model the collection was built with
    #[arg(long, short = 'm', env = "CHUNKVEC_EMBEDDING_MODEL")]
    pub model: Option<String>,
}

impl McpArgs {
    /// Embedding settings for the server, with `--model` over the config file.
    pub fn embedding_config(&self, config: &Config) -> EmbeddingConfig {
        let mut embedding = config.embedding.clone();
        if let Some(ref model) = self.model {
            embedding.model = model.clone();
        }
        embedding
    }
}

/// Serve the MCP tools over stdio until the client disconnects.
pub async fn handle_mcp(args: McpArgs, config: &Config) -> Result<()> {
    let embedder = EmbeddingClient::new(&args.embedding_config(config))?;
    let store = create_backend(&config.vector_store)?;

    let server = McpServer::connect(
        Arc::new(embedder),
        Arc::from(store),
        &args.collection,
        &args.memory_collection,
    )
    .await
    .with_context(|| format!("failed to start MCP server for '{}'", args.collection))?;

    server.serve_stdio().await
}

use anyhow::Result;
use console::style;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, OutputFormat};
use crate::services::{EmbeddingClient, create_backend};

pub async fn handle_status(config: &Config, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);

    let embedding_healthy = match EmbeddingClient::new(&config.embedding) {
        Ok(client) => match client.health_check().await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "embedding health check failed");
                false
            }
        },
        Err(e) => {
            tracing::debug!(error = %e, "failed to build embedding client");
            false
        }
    };

    let (vector_store_connected, collections) = match create_backend(&config.vector_store) {
        Ok(store) => {
            let connected = store.health_check().await.unwrap_or(false);
            let collections = if connected {
                store.list_collections().await.unwrap_or_default()
            } else {
                Vec::new()
            };
            (connected, collections)
        }
        Err(_) => (false, Vec::new()),
    };

    let status = StatusInfo {
        embedding_url: config.embedding.url.clone(),
        embedding_model: config.embedding.model.clone(),
        embedding_healthy,
        vector_store_url: config.vector_store.url.clone(),
        vector_store_connected,
        collections,
    };

    print!("{}", formatter.format_status(&status));

    if !embedding_healthy || !vector_store_connected {
        eprintln!();
        if !embedding_healthy {
            eprintln!(
                "{} embedding service not reachable at {}.",
                style("Hint:").yellow(),
                config.embedding.url
            );
            eprintln!(
                "      Start one serving {} (e.g. docker run -p 8080:80 ghcr.io/huggingface/text-embeddings-inference --model-id {})",
                config.embedding.model, config.embedding.model
            );
        }
        if !vector_store_connected {
            eprintln!(
                "{} Qdrant not running. Start with: docker run -p 6333:6333 -p 6334:6334 qdrant/qdrant",
                style("Warning:").yellow()
            );
        }
    }

    Ok(())
}

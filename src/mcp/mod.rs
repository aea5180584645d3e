//! MCP server exposing the vector store to AI tools over stdio.
//!
//! Four tools are registered: `list_collections`, `query` (the configured
//! collection), `search_memory` and `remember` (a separate memory
//! collection created on first write). Tool results are JSON text content.

pub mod tools;

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, ServiceExt};

use crate::error::{AppError, VectorStoreError};
use crate::services::{Embedder, VectorStore};

pub use tools::ToolBackend;

/// Handler shared by every request of a session.
#[derive(Clone)]
pub struct McpServer {
    backend: Arc<ToolBackend>,
}

impl McpServer {
    /// Build a server, failing if the main collection does not exist.
    pub async fn connect(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        collection: &str,
        memory_collection: &str,
    ) -> Result<Self, AppError> {
        if !store.collection_exists(collection).await? {
            return Err(VectorStoreError::CollectionNotFound(collection.to_string()).into());
        }
        tracing::info!(
            collection = collection,
            memory_collection = memory_collection,
            store = store.location(),
            "MCP server ready"
        );
        Ok(Self {
            backend: Arc::new(ToolBackend::new(
                embedder,
                store,
                collection,
                memory_collection,
            )),
        })
    }

    pub fn backend(&self) -> &ToolBackend {
        &self.backend
    }

    fn to_mcp_tool(name: &'static str) -> Tool {
        let input_schema = match tools::input_schema(name) {
            serde_json::Value::Object(map) => Arc::new(map),
            _ => Arc::new(serde_json::Map::new()),
        };

        Tool {
            name: Cow::Borrowed(name),
            title: None,
            description: Some(Cow::Borrowed(tools::description(name))),
            input_schema,
            output_schema: None,
            annotations: Some(ToolAnnotations::new().read_only(name != tools::REMEMBER)),
            execution: None,
            icons: None,
            meta: None,
        }
    }

    /// Serve over stdin/stdout until the client disconnects.
    pub async fn serve_stdio(self) -> anyhow::Result<()> {
        let service = self.serve(rmcp::transport::stdio()).await?;
        let reason = service.waiting().await?;
        tracing::info!(?reason, "MCP session closed");
        Ok(())
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "chunkvec".to_string(),
                title: Some("chunkvec".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(format!(
                "Semantic search over the '{}' collection. Use query to find related text, \
                 remember to store a memory and search_memory to recall memories.",
                self.backend.collection()
            )),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools: Vec<Tool> = tools::TOOL_NAMES
            .into_iter()
            .map(Self::to_mcp_tool)
            .collect();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let params = request
            .arguments
            .map(serde_json::Value::Object)
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));

        tracing::debug!(tool = %request.name, "tool call");
        let result = self
            .backend
            .call(&request.name, params)
            .await
            .ok_or_else(|| {
                McpError::new(
                    ErrorCode::METHOD_NOT_FOUND,
                    format!("no tool registered with name: {}", request.name),
                    None,
                )
            })?;

        let text = serde_json::to_string_pretty(&result).unwrap_or_default();
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmbeddingError;
    use crate::models::EmbeddingTask;
    use crate::services::{EmbeddingBatch, MemoryBackend};
    use async_trait::async_trait;

    struct ConstEmbedder;

    #[async_trait]
    impl Embedder for ConstEmbedder {
        async fn embed(
            &self,
            texts: &[String],
            _task: EmbeddingTask,
        ) -> Result<EmbeddingBatch, EmbeddingError> {
            Ok(EmbeddingBatch {
                vectors: texts.iter().map(|_| vec![1.0, 0.0]).collect(),
                tokens: None,
            })
        }

        fn model(&self) -> &str {
            "const"
        }
    }

    #[tokio::test]
    async fn test_connect_requires_collection() {
        let store = Arc::new(MemoryBackend::new());
        let missing =
            McpServer::connect(Arc::new(ConstEmbedder), store.clone(), "docs", "mem").await;
        assert!(matches!(
            missing,
            Err(AppError::VectorStore(VectorStoreError::CollectionNotFound(_)))
        ));

        store.create_collection("docs", 2).await.unwrap();
        let server = McpServer::connect(Arc::new(ConstEmbedder), store, "docs", "mem")
            .await
            .unwrap();
        assert_eq!(server.backend().collection(), "docs");
        assert_eq!(server.backend().memory_collection(), "mem");
    }

    #[test]
    fn test_tool_descriptors() {
        let tool = McpServer::to_mcp_tool(tools::QUERY);
        assert_eq!(tool.name, "query");
        assert!(tool.input_schema.contains_key("properties"));

        let remember = McpServer::to_mcp_tool(tools::REMEMBER);
        assert_eq!(remember.annotations.and_then(|a| a.read_only_hint), Some(false));
    }
}

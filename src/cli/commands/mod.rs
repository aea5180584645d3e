mod collection;
mod config;
mod generate;
mod mcp;
mod status;
mod validate;
mod vectorize;
mod visualize;

pub use collection::CollectionCommand;
pub use config::ConfigCommand;
pub use generate::GenerateArgs;
pub use mcp::McpArgs;
pub use validate::ValidateArgs;
pub use vectorize::VectorizeArgs;
pub use visualize::VisualizeArgs;

pub use collection::handle_collection;
pub use config::handle_config;
pub use generate::handle_generate;
pub use mcp::handle_mcp;
pub use status::handle_status;
pub use validate::handle_validate;
pub use vectorize::handle_vectorize;
pub use visualize::handle_visualize;

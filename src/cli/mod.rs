//! CLI module for chunkvec.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Prepare, embed, store, inspect and visualize JSONL text chunks.
#[derive(Debug, Parser)]
#[command(name = "chunkvec")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(
        long,
        short = 'd',
        global = true,
        help = "Vector database URL (overrides configuration)"
    )]
    pub db: Option<String>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a sample JSONL data set
    Generate(commands::GenerateArgs),

    /// Validate a JSONL file of chunk records
    Validate(commands::ValidateArgs),

    /// Embed a JSONL file and store it in a fresh collection
    Vectorize(commands::VectorizeArgs),

    /// Render an interactive 2-D/3-D plot of a collection
    Visualize(commands::VisualizeArgs),

    /// Manage collections (list, inspect, search, delete, export)
    #[command(subcommand)]
    Collection(commands::CollectionCommand),

    /// Serve query and memory tools over MCP (stdio)
    Mcp(commands::McpArgs),

    /// Check infrastructure status (embedding service, Qdrant)
    Status,

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_collection_search() {
        let cli = Cli::parse_from([
            "chunkvec", "-f", "json", "collection", "search", "docs", "hello", "-n", "3",
        ]);
        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Commands::Collection(commands::CollectionCommand::Search {
                collection,
                query,
                n_results,
            }) => {
                assert_eq!(collection, "docs");
                assert_eq!(query, "hello");
                assert_eq!(n_results, 3);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_db_flag() {
        let cli = Cli::parse_from(["chunkvec", "status", "--db", "http://qdrant:6334"]);
        assert_eq!(cli.db.as_deref(), Some("http://qdrant:6334"));
    }
}

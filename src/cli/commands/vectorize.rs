//! Vectorize command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::get_formatter;
use crate::models::{Config, EmbeddingTask, OutputFormat, RunConfig};
use crate::services::{
    DEFAULT_SAMPLE_INTERVAL, EmbeddingClient, ResourceMonitor, VectorizeOptions, create_backend,
    vectorize,
};

/// Arguments for the vectorize command.
#[derive(Debug, Args)]
pub struct VectorizeArgs {
    /// JSONL file of chunk records
    pub input: Option<PathBuf>,

    /// Run file (JSON or TOML) with input, db, model, task and batch settings
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Embedding model name
    #[arg(long, short = 'm')]
    pub model: Option<String>,

    /// Embedding task (retrieval.query, retrieval.passage, separation, classification, text-matching)
    #[arg(long, short = 't')]
    pub task: Option<EmbeddingTask>,

    /// Keep only the first N embedding components
    #[arg(long)]
    pub truncate_dim: Option<u32>,

    /// Maximum input length in tokens
    #[arg(long)]
    pub max_length: Option<u32>,

    /// Chunks per embedding request
    #[arg(long, short = 'b')]
    pub batch_size: Option<u32>,

    /// Disable CPU/memory/GPU sampling
    #[arg(long)]
    pub no_monitor: bool,
}

impl VectorizeArgs {
    /// Layer the run file and flags over the loaded configuration and
    /// resolve the input path. `db` is the global `--db` flag.
    pub fn resolve(&self, config: &mut Config, db: Option<&str>) -> Result<PathBuf> {
        let run = match self.config {
            Some(ref path) => Some(
                RunConfig::from_file(path)
                    .with_context(|| format!("failed to read run file {}", path.display()))?,
            ),
            None => None,
        };
        if let Some(ref run) = run {
            run.apply_to(config);
        }

        if let Some(db) = db {
            config.vector_store.url = db.to_string();
        }
        if let Some(ref model) = self.model {
            config.embedding.model = model.clone();
        }
        if let Some(task) = self.task {
            config.embedding.task = task;
        }
        if self.truncate_dim.is_some() {
            config.embedding.truncate_dim = self.truncate_dim;
        }
        if let Some(max_length) = self.max_length {
            config.embedding.max_length = max_length;
        }
        if let Some(batch_size) = self.batch_size {
            config.embedding.batch_size = batch_size;
        }
        config.validate()?;

        self.input
            .clone()
            .or_else(|| run.map(|r| r.input))
            .ok_or_else(|| anyhow::anyhow!("no input file given; pass FILE or --config"))
    }
}

pub async fn handle_vectorize(
    args: VectorizeArgs,
    mut config: Config,
    db: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let formatter = get_formatter(format);
    let input = args.resolve(&mut config, db)?;
    if !input.exists() {
        anyhow::bail!("input file not found: {}", input.display());
    }

    let embedder = EmbeddingClient::new(&config.embedding)?;
    let store = create_backend(&config.vector_store)?;

    let monitor = (!args.no_monitor).then(|| ResourceMonitor::start(DEFAULT_SAMPLE_INTERVAL));

    let options = VectorizeOptions {
        input,
        task: config.embedding.task,
        batch_size: config.embedding.batch_size as usize,
        artifacts_dir: config.paths.artifacts_dir.clone(),
        show_progress: format == OutputFormat::Text,
    };

    let result = vectorize(&embedder, store.as_ref(), &options, monitor.as_ref()).await;
    let resources = monitor.map(ResourceMonitor::stop);
    let stats = result?;

    print!("{}", formatter.format_vectorize(&stats, resources.as_ref()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args() -> VectorizeArgs {
        VectorizeArgs {
            input: None,
            config: None,
            model: None,
            task: None,
            truncate_dim: None,
            max_length: None,
            batch_size: None,
            no_monitor: true,
        }
    }

    #[test]
    fn test_flags_override_run_file() {
        let dir = TempDir::new().unwrap();
        let run_file = dir.path().join("run.json");
        std::fs::write(
            &run_file,
            r#"{"input": "data/x.jsonl", "model": "org/a", "batch_size": 8, "device": "cuda"}"#,
        )
        .unwrap();

        let mut config = Config::default();
        let args = VectorizeArgs {
            config: Some(run_file),
            model: Some("org/b".to_string()),
            ..args()
        };
        let input = args.resolve(&mut config, None).unwrap();

        assert_eq!(input, PathBuf::from("data/x.jsonl"));
        assert_eq!(config.embedding.model, "org/b");
        assert_eq!(config.embedding.batch_size, 8);
    }

    #[test]
    fn test_db_flag_beats_run_file() {
        let dir = TempDir::new().unwrap();
        let run_file = dir.path().join("run.json");
        std::fs::write(
            &run_file,
            r#"{"input": "data/x.jsonl", "db": "http://run-file:6334"}"#,
        )
        .unwrap();
        let args = VectorizeArgs {
            config: Some(run_file),
            ..args()
        };

        let mut config = Config::default();
        args.resolve(&mut config, Some("http://cli-flag:6334")).unwrap();
        assert_eq!(config.vector_store.url, "http://cli-flag:6334");

        let mut config = Config::default();
        args.resolve(&mut config, None).unwrap();
        assert_eq!(config.vector_store.url, "http://run-file:6334");
    }

    #[test]
    fn test_input_required() {
        let mut config = Config::default();
        assert!(args().resolve(&mut config, None).is_err());

        let explicit = VectorizeArgs {
            input: Some(PathBuf::from("chunks.jsonl")),
            ..args()
        };
        assert_eq!(
            explicit.resolve(&mut config, None).unwrap(),
            PathBuf::from("chunks.jsonl")
        );
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = Config::default();
        let args = VectorizeArgs {
            input: Some(PathBuf::from("chunks.jsonl")),
            batch_size: Some(0),
            ..args()
        };
        assert!(args.resolve(&mut config, None).is_err());
    }
}

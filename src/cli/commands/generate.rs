//! Generate command implementation.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::cli::output::get_formatter;
use crate::models::OutputFormat;
use crate::services::{
    DEFAULT_NUM_DOCS, DEFAULT_OUTPUT, GenerateOptions, generate_samples, validate_file,
};

/// Arguments for the generate command.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Number of documents to generate
    #[arg(long, short = 'n', default_value_t = DEFAULT_NUM_DOCS)]
    pub num_docs: usize,

    /// Output JSONL file
    #[arg(long, short = 'o', default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Validate the generated file
    #[arg(long)]
    pub validate: bool,
}

/// Handle the generate command. Returns `false` only when `--validate` was
/// given and validation failed.
pub async fn handle_generate(args: GenerateArgs, format: OutputFormat) -> Result<bool> {
    let formatter = get_formatter(format);

    let summary = generate_samples(&GenerateOptions {
        num_docs: args.num_docs,
        output: args.output,
        seed: args.seed,
    })?;
    print!("{}", formatter.format_generate(&summary));

    if !args.validate {
        return Ok(true);
    }

    let report = validate_file(&summary.output, false);
    print!("{}", formatter.format_validation(&report));
    Ok(report.validation_passed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_generate_and_validate() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("data/sample.jsonl");

        let passed = handle_generate(
            GenerateArgs {
                num_docs: 25,
                output: output.clone(),
                seed: Some(7),
                validate: true,
            },
            OutputFormat::Json,
        )
        .await
        .unwrap();

        assert!(passed);
        let content = std::fs::read_to_string(output).unwrap();
        assert_eq!(content.lines().count(), 25);
    }
}

//! Validate command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::get_formatter;
use crate::models::OutputFormat;
use crate::services::{ValidationReport, validate_file};
use crate::utils::ensure_parent_dir;

/// Arguments for the validate command.
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// JSONL file to validate
    pub file: PathBuf,

    /// Write the full report as JSON to this file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Fail validation on lines that are not valid JSON
    #[arg(long)]
    pub strict: bool,
}

/// Handle the validate command. Returns whether validation passed.
pub async fn handle_validate(args: ValidateArgs, format: OutputFormat) -> Result<bool> {
    let formatter = get_formatter(format);

    let report = validate_file(&args.file, args.strict);
    print!("{}", formatter.format_validation(&report));

    if let Some(ref output) = args.output {
        write_report(&report, output)?;
        eprintln!("Report saved to {}", output.display());
    }

    Ok(report.validation_passed)
}

pub fn write_report(report: &ValidationReport, output: &std::path::Path) -> Result<()> {
    ensure_parent_dir(output)
        .with_context(|| format!("failed to create directory for {}", output.display()))?;
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(output, json).with_context(|| format!("failed to write {}", output.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_validate_writes_report() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("data.jsonl");
        std::fs::write(
            &input,
            "{\"id\": \"doc_1\", \"text\": \"a sufficiently long text\", \"source\": \"a.txt\"}\n",
        )
        .unwrap();
        let output = dir.path().join("reports/report.json");

        let passed = handle_validate(
            ValidateArgs {
                file: input,
                output: Some(output.clone()),
                strict: false,
            },
            OutputFormat::Json,
        )
        .await
        .unwrap();
        assert!(passed);

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(saved["stats"]["valid_docs"], 1);
    }

    #[tokio::test]
    async fn test_validate_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let passed = handle_validate(
            ValidateArgs {
                file: dir.path().join("missing.jsonl"),
                output: None,
                strict: false,
            },
            OutputFormat::Text,
        )
        .await
        .unwrap();
        assert!(!passed);
    }
}

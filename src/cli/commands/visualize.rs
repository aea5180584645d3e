//! Visualize command implementation.

use anyhow::Result;
use clap::Args;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::visualize::{
    DEFAULT_CLUSTERS, DEFAULT_MAX_POINTS, DEFAULT_OUTLIER_THRESHOLD, DEFAULT_SEED, visualize,
};
use crate::services::{VisualizeOptions, create_backend, open_in_browser};

/// Arguments for the visualize command.
#[derive(Debug, Args)]
pub struct VisualizeArgs {
    /// Collection to visualize
    pub collection: String,

    /// Maximum number of points to plot
    #[arg(long, default_value_t = DEFAULT_MAX_POINTS)]
    pub max_points: usize,

    /// Seed for sampling, projection and clustering
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Number of k-means clusters
    #[arg(long, short = 'k', default_value_t = DEFAULT_CLUSTERS)]
    pub clusters: usize,

    /// Drop points whose z-score exceeds this on any projected axis
    #[arg(long, default_value_t = DEFAULT_OUTLIER_THRESHOLD)]
    pub outlier_threshold: f64,

    /// Do not open the page in a browser
    #[arg(long)]
    pub no_open: bool,
}

pub async fn handle_visualize(
    args: VisualizeArgs,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let formatter = get_formatter(format);
    let store = create_backend(&config.vector_store)?;

    let options = VisualizeOptions {
        collection: args.collection,
        max_points: args.max_points,
        seed: args.seed,
        clusters: args.clusters,
        outlier_threshold: args.outlier_threshold,
        output_dir: config.visualizations_dir(),
    };

    let summary = visualize(store.as_ref(), &options).await?;
    print!("{}", formatter.format_visualization(&summary));

    if !args.no_open
        && let Err(e) = open_in_browser(&summary.output)
    {
        tracing::warn!(error = %e, "failed to open browser");
        eprintln!("Open {} in a browser to view it.", summary.output.display());
    }

    Ok(())
}

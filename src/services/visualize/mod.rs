//! Embedding visualization: sample, project, cluster, filter, render.

mod cluster;
mod plot;
mod reduce;

pub use cluster::{DEFAULT_MAX_ITERS, kmeans};
pub use plot::{PlotPoint, build_figure, hover_text, render_html};
pub use reduce::pca;

use std::path::{Path, PathBuf};

use ndarray::{Array2, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use super::vector_store::VectorStore;
use crate::error::{AppError, VectorStoreError, VisualizeError};
use crate::models::{SOURCE_KEY, StoredRow};

pub const DEFAULT_MAX_POINTS: usize = 2000;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_CLUSTERS: usize = 10;
pub const DEFAULT_OUTLIER_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone)]
pub struct VisualizeOptions {
    pub collection: String,
    pub max_points: usize,
    pub seed: u64,
    pub clusters: usize,
    pub outlier_threshold: f64,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisualizeSummary {
    pub collection: String,
    pub output: PathBuf,
    pub total_points: usize,
    pub sampled_points: usize,
    pub plotted_points: usize,
    pub outliers: usize,
    pub dimension: usize,
    pub clusters: usize,
}

/// `visualization_<collection>_<seed>_<max_points>_<k>_<threshold>.html`
pub fn output_path(options: &VisualizeOptions) -> PathBuf {
    options.output_dir.join(format!(
        "visualization_{}_{}_{}_{}_{:?}.html",
        options.collection,
        options.seed,
        options.max_points,
        options.clusters,
        options.outlier_threshold
    ))
}

/// Pick `max_points` rows without replacement, keeping storage order.
pub fn sample_rows(rows: Vec<StoredRow>, max_points: usize, seed: u64) -> Vec<StoredRow> {
    if rows.len() <= max_points {
        return rows;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = rand::seq::index::sample(&mut rng, rows.len(), max_points).into_vec();
    picked.sort_unstable();

    let mut rows: Vec<Option<StoredRow>> = rows.into_iter().map(Some).collect();
    picked.into_iter().filter_map(|i| rows[i].take()).collect()
}

/// Rows whose absolute z-score stays within `threshold` on every axis.
/// Axes with zero spread never flag a point.
pub fn within_threshold(coords: &Array2<f64>, threshold: f64) -> Vec<bool> {
    let n = coords.nrows();
    let mut keep = vec![true; n];
    if n == 0 {
        return keep;
    }

    for column in coords.axis_iter(Axis(1)) {
        let mean = column.sum() / n as f64;
        let std = (column.mapv(|x| (x - mean).powi(2)).sum() / n as f64).sqrt();
        if std == 0.0 {
            continue;
        }
        for (i, x) in column.iter().enumerate() {
            if ((x - mean) / std).abs() > threshold {
                keep[i] = false;
            }
        }
    }
    keep
}

fn to_matrix(rows: &[StoredRow]) -> Result<Array2<f64>, VisualizeError> {
    let dim = rows.first().map_or(0, |r| r.embedding.len());
    let mut matrix = Array2::<f64>::zeros((rows.len(), dim));
    for (i, row) in rows.iter().enumerate() {
        if row.embedding.len() != dim {
            return Err(VisualizeError::RaggedEmbeddings(dim, row.embedding.len()));
        }
        for (j, x) in row.embedding.iter().enumerate() {
            matrix[[i, j]] = f64::from(*x);
        }
    }
    Ok(matrix)
}

fn select_rows(coords: &Array2<f64>, keep: &[usize]) -> Array2<f64> {
    coords.select(Axis(0), keep)
}

/// Build the visualization page for a collection and write it to disk.
pub async fn visualize(
    store: &dyn VectorStore,
    options: &VisualizeOptions,
) -> Result<VisualizeSummary, AppError> {
    if !store.collection_exists(&options.collection).await? {
        return Err(VectorStoreError::CollectionNotFound(options.collection.clone()).into());
    }

    let rows = store.get(&options.collection, None, true).await?;
    let total_points = rows.len();
    let rows: Vec<StoredRow> = rows.into_iter().filter(|r| !r.embedding.is_empty()).collect();
    if rows.is_empty() {
        return Err(VisualizeError::Empty(options.collection.clone()).into());
    }
    tracing::info!(points = total_points, "retrieved embeddings");

    let rows = sample_rows(rows, options.max_points, options.seed);
    let matrix = to_matrix(&rows)?;
    let dimension = matrix.ncols();

    let coords_3d = pca(&matrix, 3, options.seed);
    let coords_2d = pca(&matrix, 2, options.seed);

    let embeddings: Vec<Vec<f32>> = rows.iter().map(|r| r.embedding.clone()).collect();
    let clusters = options.clusters.clamp(1, rows.len());
    let assignments = kmeans(&embeddings, clusters, options.seed, DEFAULT_MAX_ITERS);

    let keep_2d = within_threshold(&coords_2d, options.outlier_threshold);
    let keep_3d = within_threshold(&coords_3d, options.outlier_threshold);
    let kept: Vec<usize> = (0..rows.len()).filter(|&i| keep_2d[i] && keep_3d[i]).collect();
    let outliers = rows.len() - kept.len();
    tracing::info!(outliers, "filtered outliers");

    let points: Vec<PlotPoint<'_>> = kept
        .iter()
        .map(|&i| PlotPoint {
            id: &rows[i].id,
            document: &rows[i].document,
            source: rows[i]
                .metadata
                .get(SOURCE_KEY)
                .map(String::as_str)
                .unwrap_or(""),
            cluster: assignments[i],
        })
        .collect();

    let figure = build_figure(
        &options.collection,
        dimension,
        &points,
        &select_rows(&coords_2d, &kept),
        &select_rows(&coords_3d, &kept),
        clusters,
    );
    let html = render_html(&options.collection, &figure).map_err(VisualizeError::from)?;

    let output = output_path(options);
    write_page(&output, &html)?;

    Ok(VisualizeSummary {
        collection: options.collection.clone(),
        output,
        total_points,
        sampled_points: rows.len(),
        plotted_points: kept.len(),
        outliers,
        dimension,
        clusters,
    })
}

fn write_page(output: &Path, html: &str) -> Result<(), VisualizeError> {
    crate::utils::ensure_parent_dir(output)?;
    if output.exists() {
        std::fs::remove_file(output)?;
    }
    std::fs::write(output, html)?;
    Ok(())
}

/// Open `path` with the platform's default handler.
pub fn open_in_browser(path: &Path) -> std::io::Result<()> {
    let path = std::fs::canonicalize(path)?;

    #[cfg(target_os = "macos")]
    let mut command = std::process::Command::new("open");
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut c = std::process::Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut command = std::process::Command::new("xdg-open");

    command.arg(path).spawn().map(|_| ())
}

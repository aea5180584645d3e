//! Sample JSONL data generation.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::models::ChunkRecord;
use crate::utils::ensure_parent_dir;

pub const DEFAULT_NUM_DOCS: usize = 1000;
pub const DEFAULT_OUTPUT: &str = "data/sample_chunks.jsonl";

const CATEGORIES: usize = 4;

const BASE_TEXTS: [&str; 20] = [
    // technology
    "Artificial intelligence is advancing quickly, and machine learning has become a major driver of technical progress.",
    "Cloud computing gives companies flexible, scalable infrastructure while lowering operating costs.",
    "Blockchain systems are decentralized and tamper resistant, with applications in finance and supply chains.",
    "The Internet of Things connects billions of devices and underpins smart cities and modern manufacturing.",
    "Fifth generation mobile networks raise transfer speeds enough to enable remote surgery and autonomous driving.",
    // science
    "Quantum computing applies quantum mechanics to information processing and promises exponential speedups on some problems.",
    "Gene editing with CRISPR offers new tools for treating inherited diseases and improving crops.",
    "Renewable energy is reshaping the global energy mix as the cost of solar and wind power keeps falling.",
    "Progress in space technology makes ideas such as settling Mars or mining asteroids more realistic.",
    "Nanotechnology shows great potential in materials science, medicine and electronics.",
    // business
    "Digital transformation has become a key strategy for staying competitive, touching processes and customer experience alike.",
    "The rise of online marketplaces changed shopping habits and blurred the line between online and offline retail.",
    "Analytics and business intelligence tools help companies extract useful insight from large volumes of data.",
    "Investors and consumers pay growing attention to sustainability and environmental, social and governance standards.",
    "The spread of remote work changed office culture and created new challenges for management.",
    // culture
    "Blending traditional culture with modern technology creates new forms of artistic expression.",
    "Cultural exchange in a globalized world fosters understanding between different civilizations.",
    "Creative industries in the digital age face both opportunity and risk, with copyright protection a central issue.",
    "Educational technology opens new possibilities for personalized and lifelong learning.",
    "Social media changed how information spreads and how people interact, with lasting effects on culture.",
];

/// Options for [`generate_samples`].
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub num_docs: usize,
    pub output: PathBuf,
    /// Fixed seed for reproducible output
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateSummary {
    pub output: PathBuf,
    pub num_docs: usize,
    pub size_bytes: u64,
    /// First records written, for display
    pub preview: Vec<ChunkRecord>,
}

fn vary(base: &str, rng: &mut StdRng) -> String {
    let variations = [
        format!("In today's fast-moving world, {}", lowercase_first(base)),
        format!("Research shows that {}", lowercase_first(base)),
        format!("Experts believe that {}", lowercase_first(base)),
        format!("According to recent reports, {}", lowercase_first(base)),
        format!("As technology keeps improving, {}", lowercase_first(base)),
        base.to_string(),
        format!("{} This trend deserves careful thought.", base),
        format!("{} The outlook for the future is promising.", base),
    ];
    variations
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| base.to_string())
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn sample_record(i: usize, rng: &mut StdRng) -> ChunkRecord {
    let base = BASE_TEXTS.choose(rng).copied().unwrap_or(BASE_TEXTS[0]);
    ChunkRecord {
        id: format!("doc_{:06}", i),
        text: vary(base, rng),
        source: format!("sample_data/category_{}/document_{}.txt", i % CATEGORIES, i),
    }
}

/// Write `num_docs` sample records to the output file, replacing it.
pub fn generate_samples(options: &GenerateOptions) -> Result<GenerateSummary> {
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let output: &Path = &options.output;
    ensure_parent_dir(output)
        .with_context(|| format!("failed to create directory for {}", output.display()))?;
    let file = std::fs::File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let mut writer = BufWriter::new(file);

    let mut preview = Vec::new();
    for i in 0..options.num_docs {
        let record = sample_record(i, &mut rng);
        serde_json::to_writer(&mut writer, &record)?;
        writer.write_all(b"\n")?;
        if preview.len() < 3 {
            preview.push(record);
        }
    }
    writer.flush()?;

    let size_bytes = std::fs::metadata(output)?.len();
    tracing::info!(num_docs = options.num_docs, output = %output.display(), "generated samples");

    Ok(GenerateSummary {
        output: options.output.clone(),
        num_docs: options.num_docs,
        size_bytes,
        preview,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::loader::load_chunks;
    use crate::services::validator::validate_file;

    #[test]
    fn test_generate_samples() {
        let dir = tempfile::tempdir().unwrap();
        let options = GenerateOptions {
            num_docs: 25,
            output: dir.path().join("data").join("samples.jsonl"),
            seed: Some(7),
        };

        let summary = generate_samples(&options).unwrap();
        assert_eq!(summary.num_docs, 25);
        assert_eq!(summary.preview.len(), 3);
        assert_eq!(summary.preview[0].id, "doc_000000");

        let chunks = load_chunks(&options.output).unwrap();
        assert_eq!(chunks.len(), 25);
        assert_eq!(chunks[5].source, "sample_data/category_1/document_5.txt");

        let report = validate_file(&options.output, true);
        assert!(report.validation_passed);
        assert_eq!(report.stats.valid_docs, 25);
    }

    #[test]
    fn test_seed_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.jsonl");
        let second = dir.path().join("b.jsonl");
        for output in [&first, &second] {
            generate_samples(&GenerateOptions {
                num_docs: 10,
                output: output.clone(),
                seed: Some(42),
            })
            .unwrap();
        }
        assert_eq!(
            std::fs::read_to_string(first).unwrap(),
            std::fs::read_to_string(second).unwrap()
        );
    }

    #[test]
    fn test_lowercase_first() {
        assert_eq!(lowercase_first("Cloud computing"), "cloud computing");
        assert_eq!(lowercase_first(""), "");
    }
}

use std::fmt::Write as FmtWrite;

use serde::Serialize;

use crate::models::{CollectionInfo, OutputFormat, QueryHit};
use crate::services::{
    CollectionInspection, ExportSummary, GenerateSummary, ResourceSnapshot, ValidationReport,
    VectorizeStats, VisualizeSummary, top_patterns,
};
use crate::utils::{format_size, preview, size_in_mb};

/// Errors and warnings listed in a validation report.
const REPORT_ITEMS_SHOWN: usize = 10;
/// Id and source patterns listed in a validation report.
const PATTERNS_SHOWN: usize = 5;
const SEARCH_PREVIEW_CHARS: usize = 200;
const SAMPLE_PREVIEW_CHARS: usize = 100;

pub trait Formatter {
    fn format_vectorize(&self, stats: &VectorizeStats, resources: Option<&ResourceSnapshot>)
    -> String;
    fn format_validation(&self, report: &ValidationReport) -> String;
    fn format_collections(&self, collections: &[CollectionInfo]) -> String;
    fn format_inspection(&self, inspection: &CollectionInspection) -> String;
    fn format_search_hits(&self, collection: &str, query: &str, hits: &[QueryHit]) -> String;
    fn format_export(&self, summary: &ExportSummary) -> String;
    fn format_visualization(&self, summary: &VisualizeSummary) -> String;
    fn format_generate(&self, summary: &GenerateSummary) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub embedding_url: String,
    pub embedding_model: String,
    pub embedding_healthy: bool,
    pub vector_store_url: String,
    pub vector_store_connected: bool,
    pub collections: Vec<CollectionInfo>,
}

fn format_duration(duration_ms: u64) -> String {
    if duration_ms < 1000 {
        format!("{}ms", duration_ms)
    } else {
        format!("{:.2}s", duration_ms as f64 / 1000.0)
    }
}

fn format_metadata(metadata: &std::collections::BTreeMap<String, String>) -> String {
    metadata
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct TextFormatter;

impl TextFormatter {
    fn write_resources(output: &mut String, resources: &ResourceSnapshot) {
        writeln!(output).unwrap();
        writeln!(output, "🖥️  Resources").unwrap();
        writeln!(output, "  CPU:         {:.1}%", resources.cpu_percent).unwrap();
        writeln!(
            output,
            "  Memory:      {:.1}/{:.1} GB ({:.1}%)",
            resources.memory_used_gb(),
            resources.memory_total_gb(),
            resources.memory_percent()
        )
        .unwrap();
        if resources.gpus.is_empty() {
            writeln!(output, "  GPU:         not available").unwrap();
        }
        for gpu in &resources.gpus {
            let mut line = format!(
                "  GPU {}:       {} | {:.0}% | {}/{} MB",
                gpu.index, gpu.name, gpu.load_percent, gpu.memory_used_mb, gpu.memory_total_mb
            );
            if let Some(temp) = gpu.temperature_c {
                line.push_str(&format!(" | {:.0}°C", temp));
            }
            writeln!(output, "{}", line).unwrap();
        }
    }
}

impl Formatter for TextFormatter {
    fn format_vectorize(
        &self,
        stats: &VectorizeStats,
        resources: Option<&ResourceSnapshot>,
    ) -> String {
        let mut output = String::new();
        if stats.chunks == 0 {
            writeln!(output, "⚠️  No chunks found in {}", stats.input.display()).unwrap();
            return output;
        }

        writeln!(output, "✅ Vectorization complete").unwrap();
        writeln!(output, "-------------------------").unwrap();
        writeln!(output, "Input:        {}", stats.input.display()).unwrap();
        writeln!(output, "Collection:   {}", stats.collection).unwrap();
        writeln!(output, "Model:        {} ({})", stats.model, stats.task).unwrap();
        writeln!(
            output,
            "Chunks:       {} in {} batches",
            stats.chunks, stats.batches
        )
        .unwrap();
        writeln!(
            output,
            "Text length:  avg {:.1} chars, max {}",
            stats.avg_text_length, stats.max_text_length
        )
        .unwrap();
        match (stats.tokens, stats.tokens_per_sec()) {
            (Some(tokens), Some(rate)) => {
                writeln!(output, "Tokens:       {} ({:.1} tokens/s)", tokens, rate).unwrap();
            }
            _ => writeln!(output, "Tokens:       not available").unwrap(),
        }
        if let Some(dimension) = stats.dimension {
            writeln!(output, "Dimension:    {}", dimension).unwrap();
        }
        writeln!(
            output,
            "Stored:       {} rows in {}",
            stats.stored_count, stats.store_location
        )
        .unwrap();
        writeln!(
            output,
            "Duration:     {} ({:.1} chunks/s)",
            format_duration(stats.duration_ms),
            stats.chunks_per_sec()
        )
        .unwrap();

        if let Some(resources) = resources {
            Self::write_resources(&mut output, resources);
        }
        output
    }

    fn format_validation(&self, report: &ValidationReport) -> String {
        let mut output = String::new();
        let stats = &report.stats;
        writeln!(output, "📋 Validation report: {}", report.file_path.display()).unwrap();
        writeln!(output, "------------------------------------------").unwrap();
        writeln!(output, "Total lines:     {}", stats.total_lines).unwrap();
        writeln!(output, "Valid documents: {}", stats.valid_docs).unwrap();
        writeln!(output, "Empty lines:     {}", stats.empty_lines).unwrap();
        writeln!(output, "JSON errors:     {}", stats.json_errors).unwrap();
        writeln!(output, "Missing fields:  {}", stats.missing_fields).unwrap();
        writeln!(output, "Duplicate ids:   {}", stats.duplicate_ids).unwrap();

        if let Some(lengths) = stats.text_length_stats {
            writeln!(output).unwrap();
            writeln!(output, "📏 Text length (chars)").unwrap();
            writeln!(
                output,
                "  min {} | max {} | avg {:.1} | median {}",
                lengths.min, lengths.max, lengths.avg, lengths.median
            )
            .unwrap();
        }

        for (title, patterns) in [
            ("🔤 Id patterns", &stats.id_patterns),
            ("📁 Source patterns", &stats.source_patterns),
        ] {
            if patterns.is_empty() {
                continue;
            }
            writeln!(output).unwrap();
            writeln!(output, "{}", title).unwrap();
            for (pattern, count) in top_patterns(patterns, PATTERNS_SHOWN) {
                writeln!(output, "  {} ({})", pattern, count).unwrap();
            }
        }

        for (title, items) in [("❌ Errors", &report.errors), ("⚠️  Warnings", &report.warnings)] {
            if items.is_empty() {
                continue;
            }
            writeln!(output).unwrap();
            writeln!(output, "{} ({})", title, items.len()).unwrap();
            for item in items.iter().take(REPORT_ITEMS_SHOWN) {
                writeln!(output, "  - {}", item).unwrap();
            }
            if items.len() > REPORT_ITEMS_SHOWN {
                writeln!(output, "  ... and {} more", items.len() - REPORT_ITEMS_SHOWN).unwrap();
            }
        }

        if !report.suggestions.is_empty() {
            writeln!(output).unwrap();
            writeln!(output, "💡 Suggestions").unwrap();
            for suggestion in &report.suggestions {
                writeln!(output, "  - {}", suggestion).unwrap();
            }
        }

        writeln!(output).unwrap();
        if report.validation_passed {
            writeln!(output, "✅ Validation passed").unwrap();
        } else {
            writeln!(output, "❌ Validation failed").unwrap();
        }
        output
    }

    fn format_collections(&self, collections: &[CollectionInfo]) -> String {
        if collections.is_empty() {
            return "No collections found.\n".to_string();
        }

        let mut output = String::new();
        writeln!(output, "📚 Collections ({})", collections.len()).unwrap();
        writeln!(output, "----------------").unwrap();
        for info in collections {
            writeln!(output, "  {} ({} items)", info.name, info.count).unwrap();
            let metadata = info.metadata();
            if !metadata.is_empty() {
                writeln!(output, "    {}", format_metadata(&metadata)).unwrap();
            }
        }
        output
    }

    fn format_inspection(&self, inspection: &CollectionInspection) -> String {
        let mut output = String::new();
        writeln!(output, "🔍 Collection: {}", inspection.name).unwrap();
        writeln!(output, "Count:     {}", inspection.count).unwrap();
        if !inspection.metadata.is_empty() {
            writeln!(output, "Metadata:  {}", format_metadata(&inspection.metadata)).unwrap();
        }
        if inspection.is_empty() {
            writeln!(output, "⚠️  Collection is empty").unwrap();
            return output;
        }

        if let Some(dim) = inspection.embedding_dim {
            writeln!(output, "Dimension: {}", dim).unwrap();
        }
        if let Some(ref lengths) = inspection.document_lengths {
            writeln!(
                output,
                "Documents: min {} | max {} | avg {:.1} chars (first {} rows)",
                lengths.min, lengths.max, lengths.avg, lengths.sampled
            )
            .unwrap();
        }

        writeln!(output).unwrap();
        writeln!(output, "Sample rows").unwrap();
        for (i, row) in inspection.samples.iter().enumerate() {
            writeln!(output, "{}. {}", i + 1, row.id).unwrap();
            writeln!(output, "   {}", preview(&row.document, SAMPLE_PREVIEW_CHARS)).unwrap();
            if !row.metadata.is_empty() {
                writeln!(output, "   {}", format_metadata(&row.metadata)).unwrap();
            }
        }
        output
    }

    fn format_search_hits(&self, collection: &str, query: &str, hits: &[QueryHit]) -> String {
        if hits.is_empty() {
            return format!("No results found for: {}\n", query);
        }

        let mut output = String::new();
        writeln!(output, "🔎 Results for \"{}\" in {}\n", query, collection).unwrap();
        for (i, hit) in hits.iter().enumerate() {
            writeln!(
                output,
                "{}. [Similarity: {:.4} | Distance: {:.4}] {}",
                i + 1,
                hit.similarity,
                hit.distance(),
                hit.id
            )
            .unwrap();
            if !hit.metadata.is_empty() {
                writeln!(output, "   {}", format_metadata(&hit.metadata)).unwrap();
            }
            writeln!(output, "   ---").unwrap();
            for line in preview(&hit.document, SEARCH_PREVIEW_CHARS).lines() {
                writeln!(output, "   {}", line).unwrap();
            }
            writeln!(output).unwrap();
        }
        output
    }

    fn format_export(&self, summary: &ExportSummary) -> String {
        format!(
            "✅ Exported {} items from '{}' to {} ({:.2} MB)\n",
            summary.count,
            summary.collection,
            summary.output.display(),
            size_in_mb(summary.size_bytes)
        )
    }

    fn format_visualization(&self, summary: &VisualizeSummary) -> String {
        let mut output = String::new();
        writeln!(output, "🎨 Visualization: {}", summary.collection).unwrap();
        writeln!(
            output,
            "Points:    {} plotted ({} sampled of {}, {} outliers removed)",
            summary.plotted_points, summary.sampled_points, summary.total_points, summary.outliers
        )
        .unwrap();
        writeln!(output, "Dimension: {}", summary.dimension).unwrap();
        writeln!(output, "Clusters:  {}", summary.clusters).unwrap();
        writeln!(output, "Saved to:  {}", summary.output.display()).unwrap();
        output
    }

    fn format_generate(&self, summary: &GenerateSummary) -> String {
        let mut output = String::new();
        writeln!(
            output,
            "✅ Generated {} documents in {} ({})",
            summary.num_docs,
            summary.output.display(),
            format_size(summary.size_bytes)
        )
        .unwrap();
        if !summary.preview.is_empty() {
            writeln!(output).unwrap();
            writeln!(output, "Preview").unwrap();
            for record in &summary.preview {
                writeln!(output, "  {} | {}", record.id, record.source).unwrap();
                writeln!(output, "    {}", preview(&record.text, SAMPLE_PREVIEW_CHARS)).unwrap();
            }
        }
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();

        let embedding_status = if status.embedding_healthy {
            "[RUNNING]"
        } else {
            "[STOPPED]"
        };
        writeln!(output, "Embedding:     {}", embedding_status).unwrap();
        writeln!(output, "  URL:         {}", status.embedding_url).unwrap();
        writeln!(output, "  Model:       {}", status.embedding_model).unwrap();
        writeln!(output).unwrap();

        let vector_status = if status.vector_store_connected {
            "[CONNECTED]"
        } else {
            "[DISCONNECTED]"
        };
        writeln!(output, "Vector Store:  {}", vector_status).unwrap();
        writeln!(output, "  URL:         {}", status.vector_store_url).unwrap();
        if status.vector_store_connected {
            writeln!(output, "  Collections: {}", status.collections.len()).unwrap();
            for info in &status.collections {
                writeln!(output, "    {} ({})", info.name, info.count).unwrap();
            }
        }
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("❌ Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|e| serde_json::json!({"error": e.to_string()}).to_string())
    }
}

impl Formatter for JsonFormatter {
    fn format_vectorize(
        &self,
        stats: &VectorizeStats,
        resources: Option<&ResourceSnapshot>,
    ) -> String {
        let json = serde_json::json!({
            "stats": stats,
            "chunks_per_sec": stats.chunks_per_sec(),
            "tokens_per_sec": stats.tokens_per_sec(),
            "resources": resources,
        });
        self.render(&json)
    }

    fn format_validation(&self, report: &ValidationReport) -> String {
        self.render(report)
    }

    fn format_collections(&self, collections: &[CollectionInfo]) -> String {
        self.render(&serde_json::json!({"collections": collections}))
    }

    fn format_inspection(&self, inspection: &CollectionInspection) -> String {
        self.render(inspection)
    }

    fn format_search_hits(&self, collection: &str, query: &str, hits: &[QueryHit]) -> String {
        let results: Vec<serde_json::Value> = hits
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                serde_json::json!({
                    "rank": i + 1,
                    "id": hit.id,
                    "similarity": hit.similarity,
                    "distance": hit.distance(),
                    "document": hit.document,
                    "metadata": hit.metadata,
                })
            })
            .collect();

        self.render(&serde_json::json!({
            "collection": collection,
            "query": query,
            "results": results,
        }))
    }

    fn format_export(&self, summary: &ExportSummary) -> String {
        self.render(summary)
    }

    fn format_visualization(&self, summary: &VisualizeSummary) -> String {
        self.render(summary)
    }

    fn format_generate(&self, summary: &GenerateSummary) -> String {
        self.render(summary)
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let collections: Vec<serde_json::Value> = status
            .collections
            .iter()
            .map(|c| serde_json::json!({"name": c.name, "count": c.count}))
            .collect();

        self.render(&serde_json::json!({
            "embedding": {
                "url": status.embedding_url,
                "model": status.embedding_model,
                "healthy": status.embedding_healthy,
            },
            "vector_store": {
                "url": status.vector_store_url,
                "connected": status.vector_store_connected,
                "collections": collections,
            }
        }))
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_vectorize(
        &self,
        stats: &VectorizeStats,
        resources: Option<&ResourceSnapshot>,
    ) -> String {
        let mut output = String::new();
        writeln!(output, "## Vectorization Complete\n").unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Input | `{}` |", stats.input.display()).unwrap();
        writeln!(output, "| Collection | `{}` |", stats.collection).unwrap();
        writeln!(output, "| Model | {} |", stats.model).unwrap();
        writeln!(output, "| Task | {} |", stats.task).unwrap();
        writeln!(output, "| Chunks | {} |", stats.chunks).unwrap();
        writeln!(output, "| Batches | {} |", stats.batches).unwrap();
        writeln!(output, "| Avg text length | {:.1} |", stats.avg_text_length).unwrap();
        let tokens = stats
            .tokens
            .map_or_else(|| "n/a".to_string(), |t| t.to_string());
        writeln!(output, "| Tokens | {} |", tokens).unwrap();
        if let Some(dimension) = stats.dimension {
            writeln!(output, "| Dimension | {} |", dimension).unwrap();
        }
        writeln!(output, "| Stored | {} |", stats.stored_count).unwrap();
        writeln!(output, "| Duration | {} |", format_duration(stats.duration_ms)).unwrap();

        if let Some(resources) = resources {
            writeln!(output, "\n### Resources\n").unwrap();
            writeln!(output, "- **CPU:** {:.1}%", resources.cpu_percent).unwrap();
            writeln!(
                output,
                "- **Memory:** {:.1}/{:.1} GB",
                resources.memory_used_gb(),
                resources.memory_total_gb()
            )
            .unwrap();
            for gpu in &resources.gpus {
                writeln!(
                    output,
                    "- **GPU {}:** {} ({:.0}%, {}/{} MB)",
                    gpu.index, gpu.name, gpu.load_percent, gpu.memory_used_mb, gpu.memory_total_mb
                )
                .unwrap();
            }
        }
        output
    }

    fn format_validation(&self, report: &ValidationReport) -> String {
        let mut output = String::new();
        let stats = &report.stats;
        let status = if report.validation_passed { "✅" } else { "❌" };
        writeln!(output, "## Validation {}\n", status).unwrap();
        writeln!(output, "**File:** `{}`\n", report.file_path.display()).unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Total lines | {} |", stats.total_lines).unwrap();
        writeln!(output, "| Valid documents | {} |", stats.valid_docs).unwrap();
        writeln!(output, "| Empty lines | {} |", stats.empty_lines).unwrap();
        writeln!(output, "| JSON errors | {} |", stats.json_errors).unwrap();
        writeln!(output, "| Missing fields | {} |", stats.missing_fields).unwrap();
        writeln!(output, "| Duplicate ids | {} |", stats.duplicate_ids).unwrap();

        for (title, items) in [("Errors", &report.errors), ("Warnings", &report.warnings)] {
            if items.is_empty() {
                continue;
            }
            writeln!(output, "\n### {} ({})\n", title, items.len()).unwrap();
            for item in items.iter().take(REPORT_ITEMS_SHOWN) {
                writeln!(output, "- {}", item).unwrap();
            }
        }

        if !report.suggestions.is_empty() {
            writeln!(output, "\n### Suggestions\n").unwrap();
            for suggestion in &report.suggestions {
                writeln!(output, "- {}", suggestion).unwrap();
            }
        }
        output
    }

    fn format_collections(&self, collections: &[CollectionInfo]) -> String {
        if collections.is_empty() {
            return "## Collections\n\n*No collections found.*\n".to_string();
        }

        let mut output = String::new();
        writeln!(output, "## Collections\n").unwrap();
        writeln!(output, "| Name | Count | Dimension | Distance |").unwrap();
        writeln!(output, "|------|-------|-----------|----------|").unwrap();
        for info in collections {
            let dimension = info.dimension.map_or_else(String::new, |d| d.to_string());
            writeln!(
                output,
                "| `{}` | {} | {} | {} |",
                info.name,
                info.count,
                dimension,
                info.distance.as_deref().unwrap_or("")
            )
            .unwrap();
        }
        output
    }

    fn format_inspection(&self, inspection: &CollectionInspection) -> String {
        let mut output = String::new();
        writeln!(output, "## Collection `{}`\n", inspection.name).unwrap();
        writeln!(output, "- **Count:** {}", inspection.count).unwrap();
        for (key, value) in &inspection.metadata {
            writeln!(output, "- **{}:** {}", key, value).unwrap();
        }
        if let Some(dim) = inspection.embedding_dim {
            writeln!(output, "- **Embedding dimension:** {}", dim).unwrap();
        }
        if let Some(ref lengths) = inspection.document_lengths {
            writeln!(
                output,
                "- **Document length:** min {}, max {}, avg {:.1}",
                lengths.min, lengths.max, lengths.avg
            )
            .unwrap();
        }
        if inspection.is_empty() {
            writeln!(output, "\n> ⚠️ Collection is empty").unwrap();
            return output;
        }

        writeln!(output, "\n### Sample rows\n").unwrap();
        for row in &inspection.samples {
            writeln!(output, "#### `{}`\n", row.id).unwrap();
            writeln!(output, "```").unwrap();
            writeln!(output, "{}", preview(&row.document, SAMPLE_PREVIEW_CHARS)).unwrap();
            writeln!(output, "```\n").unwrap();
        }
        output
    }

    fn format_search_hits(&self, collection: &str, query: &str, hits: &[QueryHit]) -> String {
        if hits.is_empty() {
            return format!("## No results found\n\nQuery: `{}`\n", query);
        }

        let mut output = String::new();
        writeln!(output, "## Search Results\n").unwrap();
        writeln!(output, "**Collection:** `{}`\n", collection).unwrap();
        writeln!(output, "**Query:** `{}`\n", query).unwrap();
        for (i, hit) in hits.iter().enumerate() {
            writeln!(
                output,
                "### {}. Similarity: {:.4} (distance {:.4})\n",
                i + 1,
                hit.similarity,
                hit.distance()
            )
            .unwrap();
            writeln!(output, "**Id:** `{}`\n", hit.id).unwrap();
            if !hit.metadata.is_empty() {
                writeln!(output, "**Metadata:** {}\n", format_metadata(&hit.metadata)).unwrap();
            }
            writeln!(output, "```").unwrap();
            writeln!(output, "{}", preview(&hit.document, SEARCH_PREVIEW_CHARS)).unwrap();
            writeln!(output, "```\n").unwrap();
        }
        output
    }

    fn format_export(&self, summary: &ExportSummary) -> String {
        format!(
            "> ✅ Exported **{}** items from `{}` to `{}` ({:.2} MB)\n",
            summary.count,
            summary.collection,
            summary.output.display(),
            size_in_mb(summary.size_bytes)
        )
    }

    fn format_visualization(&self, summary: &VisualizeSummary) -> String {
        let mut output = String::new();
        writeln!(output, "## Visualization `{}`\n", summary.collection).unwrap();
        writeln!(output, "- **Plotted:** {}", summary.plotted_points).unwrap();
        writeln!(output, "- **Sampled:** {}", summary.sampled_points).unwrap();
        writeln!(output, "- **Total:** {}", summary.total_points).unwrap();
        writeln!(output, "- **Outliers:** {}", summary.outliers).unwrap();
        writeln!(output, "- **Clusters:** {}", summary.clusters).unwrap();
        writeln!(output, "- **File:** `{}`", summary.output.display()).unwrap();
        output
    }

    fn format_generate(&self, summary: &GenerateSummary) -> String {
        let mut output = String::new();
        writeln!(output, "## Sample Data\n").unwrap();
        writeln!(output, "- **File:** `{}`", summary.output.display()).unwrap();
        writeln!(output, "- **Documents:** {}", summary.num_docs).unwrap();
        writeln!(output, "- **Size:** {}", format_size(summary.size_bytes)).unwrap();
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "## Status\n").unwrap();

        let embedding_status = if status.embedding_healthy { "✅" } else { "❌" };
        writeln!(output, "### Embedding Service {}\n", embedding_status).unwrap();
        writeln!(output, "- **URL:** `{}`", status.embedding_url).unwrap();
        writeln!(output, "- **Model:** {}", status.embedding_model).unwrap();
        writeln!(output).unwrap();

        let vector_status = if status.vector_store_connected {
            "✅"
        } else {
            "❌"
        };
        writeln!(output, "### Vector Store {}\n", vector_status).unwrap();
        writeln!(output, "- **URL:** `{}`", status.vector_store_url).unwrap();
        writeln!(output, "- **Collections:** {}", status.collections.len()).unwrap();

        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use crate::services::ValidationStats;

    fn hit(id: &str, similarity: f32) -> QueryHit {
        QueryHit {
            id: id.to_string(),
            document: "x".repeat(300),
            metadata: BTreeMap::from([("source".to_string(), "a.txt".to_string())]),
            similarity,
        }
    }

    fn report(passed: bool, errors: usize) -> ValidationReport {
        ValidationReport {
            file_path: PathBuf::from("data.jsonl"),
            validation_passed: passed,
            stats: ValidationStats {
                total_lines: 12,
                valid_docs: 10,
                ..Default::default()
            },
            errors: (0..errors).map(|i| format!("error {}", i)).collect(),
            warnings: Vec::new(),
            suggestions: vec!["add more data".to_string()],
        }
    }

    #[test]
    fn test_text_search_hits() {
        let output = TextFormatter.format_search_hits("docs", "rust", &[hit("doc_1", 0.75)]);
        assert!(output.contains("1. [Similarity: 0.7500 | Distance: 0.2500] doc_1"));
        assert!(output.contains("source=a.txt"));
        assert!(output.contains(&format!("{}...", "x".repeat(200))));
        assert!(!output.contains(&"x".repeat(201)));

        let empty = TextFormatter.format_search_hits("docs", "rust", &[]);
        assert_eq!(empty, "No results found for: rust\n");
    }

    #[test]
    fn test_json_search_hits() {
        let output = JsonFormatter::new(false).format_search_hits("docs", "q", &[hit("a", 0.5)]);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["results"][0]["rank"], 1);
        assert_eq!(value["results"][0]["distance"], 0.5);
        assert_eq!(value["results"][0]["document"].as_str().unwrap().len(), 300);
    }

    #[test]
    fn test_text_validation_truncates_errors() {
        let output = TextFormatter.format_validation(&report(false, 12));
        assert!(output.contains("❌ Errors (12)"));
        assert!(output.contains("  - error 9"));
        assert!(!output.contains("  - error 10"));
        assert!(output.contains("... and 2 more"));
        assert!(output.contains("💡 Suggestions"));
        assert!(output.ends_with("❌ Validation failed\n"));

        let passed = TextFormatter.format_validation(&report(true, 0));
        assert!(passed.ends_with("✅ Validation passed\n"));
    }

    #[test]
    fn test_json_validation_report() {
        let output = JsonFormatter::new(true).format_validation(&report(true, 1));
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["validation_passed"], true);
        assert_eq!(value["stats"]["valid_docs"], 10);
        assert_eq!(value["errors"][0], "error 0");
    }

    #[test]
    fn test_collections_output() {
        let collections = vec![CollectionInfo {
            name: "docs_model".to_string(),
            count: 42,
            dimension: Some(1024),
            distance: Some("Cosine".to_string()),
        }];

        let text = TextFormatter.format_collections(&collections);
        assert!(text.contains("docs_model (42 items)"));
        assert!(text.contains("dimension=1024"));

        let markdown = MarkdownFormatter.format_collections(&collections);
        assert!(markdown.contains("| `docs_model` | 42 | 1024 | Cosine |"));

        assert_eq!(TextFormatter.format_collections(&[]), "No collections found.\n");
    }

    #[test]
    fn test_status_output() {
        let status = StatusInfo {
            embedding_url: "http://localhost:8080".to_string(),
            embedding_model: "org/model".to_string(),
            embedding_healthy: true,
            vector_store_url: "http://localhost:6334".to_string(),
            vector_store_connected: false,
            collections: Vec::new(),
        };
        let text = TextFormatter.format_status(&status);
        assert!(text.contains("Embedding:     [RUNNING]"));
        assert!(text.contains("Vector Store:  [DISCONNECTED]"));

        let json: serde_json::Value =
            serde_json::from_str(&JsonFormatter::new(true).format_status(&status)).unwrap();
        assert_eq!(json["embedding"]["healthy"], true);
        assert_eq!(json["vector_store"]["connected"], false);
    }

    #[test]
    fn test_messages() {
        assert_eq!(TextFormatter.format_error("boom"), "❌ Error: boom\n");
        assert_eq!(
            JsonFormatter::new(true).format_message("ok"),
            r#"{"message":"ok"}"#
        );
        assert_eq!(MarkdownFormatter.format_message("ok"), "> ok\n");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(250), "250ms");
        assert_eq!(format_duration(1500), "1.50s");
    }
}

//! JSONL data validation: format checks, quality warnings and statistics.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::utils::extract_pattern;

const REQUIRED_FIELDS: [&str; 3] = ["id", "text", "source"];
const MIN_TEXT_LENGTH: usize = 10;
const MAX_TEXT_LENGTH: usize = 16384;
const SUGGESTED_MIN_DOCS: usize = 1000;

static ID_FORMAT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextLengthStats {
    pub min: usize,
    pub max: usize,
    pub avg: f64,
    pub median: usize,
}

impl TextLengthStats {
    /// `None` for an empty slice. The median is the upper middle element.
    pub fn from_lengths(lengths: &[usize]) -> Option<Self> {
        if lengths.is_empty() {
            return None;
        }
        let mut sorted = lengths.to_vec();
        sorted.sort_unstable();
        Some(Self {
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            avg: sorted.iter().sum::<usize>() as f64 / sorted.len() as f64,
            median: sorted[sorted.len() / 2],
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationStats {
    pub total_lines: usize,
    pub valid_docs: usize,
    pub empty_lines: usize,
    pub json_errors: usize,
    pub missing_fields: usize,
    pub duplicate_ids: usize,
    pub text_length_stats: Option<TextLengthStats>,
    pub id_patterns: BTreeMap<String, usize>,
    pub source_patterns: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub file_path: PathBuf,
    pub validation_passed: bool,
    pub stats: ValidationStats,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Most frequent patterns first, ties broken alphabetically.
pub fn top_patterns(patterns: &BTreeMap<String, usize>, n: usize) -> Vec<(&str, usize)> {
    let mut sorted: Vec<(&str, usize)> = patterns.iter().map(|(p, c)| (p.as_str(), *c)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    sorted.truncate(n);
    sorted
}

/// String form of a field for length and pattern checks; non-strings use
/// their JSON text.
fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Default)]
struct Validator {
    stats: ValidationStats,
    errors: Vec<String>,
    warnings: Vec<String>,
    lengths: Vec<usize>,
    seen_ids: HashSet<String>,
    file_error: bool,
}

impl Validator {
    fn check_line(&mut self, line_num: usize, line: &str) {
        self.stats.total_lines += 1;

        if line.trim().is_empty() {
            self.stats.empty_lines += 1;
            return;
        }

        let data: Value = match serde_json::from_str(line) {
            Ok(data) => data,
            Err(e) => {
                self.stats.json_errors += 1;
                self.errors
                    .push(format!("line {}: JSON parse error: {}", line_num, e));
                return;
            }
        };

        let empty = serde_json::Map::new();
        let object = data.as_object().unwrap_or(&empty);

        let mut missing = Vec::new();
        for field in REQUIRED_FIELDS {
            match object.get(field) {
                None => missing.push(field),
                Some(Value::String(s)) if s.trim().is_empty() => {
                    self.warnings
                        .push(format!("line {}: field '{}' is empty", line_num, field));
                }
                Some(Value::String(_)) => {}
                Some(_) => {
                    self.warnings.push(format!(
                        "line {}: field '{}' should be a string",
                        line_num, field
                    ));
                }
            }
        }

        if !missing.is_empty() {
            self.stats.missing_fields += 1;
            self.errors.push(format!(
                "line {}: missing fields: {}",
                line_num,
                missing.join(", ")
            ));
            return;
        }

        let id = field_text(&object["id"]);
        let text = field_text(&object["text"]);
        let source = field_text(&object["source"]);

        let text_length = text.chars().count();
        if text_length < MIN_TEXT_LENGTH {
            self.warnings.push(format!(
                "line {}: text too short ({} characters)",
                line_num, text_length
            ));
        } else if text_length > MAX_TEXT_LENGTH {
            self.warnings.push(format!(
                "line {}: text too long ({} characters)",
                line_num, text_length
            ));
        }

        if !ID_FORMAT.is_match(&id) {
            self.warnings.push(format!(
                "line {}: id contains special characters: {}",
                line_num, id
            ));
        }

        self.stats.valid_docs += 1;
        if !self.seen_ids.insert(id.clone()) {
            self.stats.duplicate_ids += 1;
            self.errors
                .push(format!("line {}: duplicate id: {}", line_num, id));
        }

        self.lengths.push(text_length);
        *self.stats.id_patterns.entry(extract_pattern(&id)).or_insert(0) += 1;
        *self
            .stats
            .source_patterns
            .entry(extract_pattern(&source))
            .or_insert(0) += 1;
    }

    fn finish(mut self, file_path: &Path, strict: bool) -> ValidationReport {
        self.stats.text_length_stats = TextLengthStats::from_lengths(&self.lengths);

        let hard_errors = self.file_error
            || self.stats.missing_fields > 0
            || self.stats.duplicate_ids > 0
            || (strict && self.stats.json_errors > 0);

        let suggestions = suggestions(&self.stats);

        ValidationReport {
            file_path: file_path.to_path_buf(),
            validation_passed: !hard_errors,
            stats: self.stats,
            errors: self.errors,
            warnings: self.warnings,
            suggestions,
        }
    }
}

fn suggestions(stats: &ValidationStats) -> Vec<String> {
    let mut suggestions = Vec::new();
    if stats.valid_docs < SUGGESTED_MIN_DOCS {
        suggestions.push(format!(
            "at least {} valid documents are recommended for useful vectorization",
            SUGGESTED_MIN_DOCS
        ));
    }
    if let Some(ref lengths) = stats.text_length_stats {
        if lengths.avg < 100.0 {
            suggestions
                .push("average text length is short, which may reduce embedding quality".to_string());
        } else if lengths.avg > 8000.0 {
            suggestions.push("average text length is long, consider splitting documents".to_string());
        }
    }
    suggestions
}

/// Validate the JSONL content of `file_path`.
///
/// Missing fields, duplicate ids and an unreadable file fail validation.
/// Lines that are not valid JSON are reported as errors but only fail
/// validation when `strict` is set.
pub fn validate_file(file_path: &Path, strict: bool) -> ValidationReport {
    let mut validator = Validator::default();

    match std::fs::read_to_string(file_path) {
        Ok(content) => {
            for (i, line) in content.lines().enumerate() {
                validator.check_line(i + 1, line);
            }
        }
        Err(e) => {
            validator.file_error = true;
            let message = if e.kind() == std::io::ErrorKind::NotFound {
                format!("file not found: {}", file_path.display())
            } else {
                format!("failed to read {}: {}", file_path.display(), e)
            };
            validator.errors.push(message);
        }
    }

    let report = validator.finish(file_path, strict);
    tracing::debug!(
        valid = report.stats.valid_docs,
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "validated file"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, lines: &[String]) -> PathBuf {
        let path = dir.join("data.jsonl");
        std::fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    fn good(i: usize) -> String {
        serde_json::json!({
            "id": format!("doc_{:06}", i),
            "text": format!("This is a reasonably long document number {}.", i),
            "source": format!("sample_data/category_{}/document_{}.txt", i % 4, i),
        })
        .to_string()
    }

    #[test]
    fn test_malformed_line_does_not_fail() {
        let dir = tempfile::tempdir().unwrap();
        let mut lines: Vec<String> = (1..=9).map(good).collect();
        lines.insert(3, "{not json".to_string());
        let path = write(dir.path(), &lines);

        let report = validate_file(&path, false);
        assert_eq!(report.stats.total_lines, 10);
        assert_eq!(report.stats.json_errors, 1);
        assert_eq!(report.stats.valid_docs, 9);
        assert!(report.validation_passed);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("line 4:"));

        let strict = validate_file(&path, true);
        assert!(!strict.validation_passed);
    }

    #[test]
    fn test_duplicate_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), &[good(1), good(2), good(1)]);

        let report = validate_file(&path, false);
        assert_eq!(report.stats.duplicate_ids, 1);
        assert_eq!(report.stats.valid_docs, 3);
        assert!(!report.validation_passed);
    }

    #[test]
    fn test_missing_fields_and_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let lines = vec![
            r#"{"id": "a", "text": "short"}"#.to_string(),
            r#"{"id": "bad id!", "text": "short", "source": ""}"#.to_string(),
            r#"{"id": "n1", "text": 12345678901, "source": "x"}"#.to_string(),
            String::new(),
        ];
        let path = write(dir.path(), &lines);

        let report = validate_file(&path, false);
        assert_eq!(report.stats.missing_fields, 1);
        assert_eq!(report.stats.valid_docs, 2);
        assert_eq!(report.stats.empty_lines, 0);
        assert!(!report.validation_passed);
        assert!(report.warnings.iter().any(|w| w.contains("'source' is empty")));
        assert!(report.warnings.iter().any(|w| w.contains("special characters")));
        assert!(report.warnings.iter().any(|w| w.contains("too short")));
        assert!(report.warnings.iter().any(|w| w.contains("should be a string")));
    }

    #[test]
    fn test_empty_lines_counted() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), &[good(1), String::new(), good(2)]);
        let report = validate_file(&path, false);
        assert_eq!(report.stats.total_lines, 3);
        assert_eq!(report.stats.empty_lines, 1);
    }

    #[test]
    fn test_missing_file() {
        let report = validate_file(Path::new("/nonexistent/data.jsonl"), false);
        assert!(!report.validation_passed);
        assert!(report.errors[0].contains("file not found"));
        assert_eq!(report.stats.total_lines, 0);
    }

    #[test]
    fn test_length_stats_and_patterns() {
        let stats = TextLengthStats::from_lengths(&[10, 40, 20, 30]).unwrap();
        assert_eq!(stats.min, 10);
        assert_eq!(stats.max, 40);
        assert_eq!(stats.avg, 25.0);
        assert_eq!(stats.median, 30);
        assert!(TextLengthStats::from_lengths(&[]).is_none());

        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), &[good(1), good(2), good(3)]);
        let report = validate_file(&path, false);
        let top = top_patterns(&report.stats.id_patterns, 5);
        assert_eq!(top, vec![("A_N", 3)]);
        assert!(report.suggestions.iter().any(|s| s.contains("1000")));
    }
}

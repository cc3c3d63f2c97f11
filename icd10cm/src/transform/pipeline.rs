//! High-level pipeline API for order file to term rows extraction.
//!
//! This module combines all steps: decoding, line parsing, the leaf filter,
//! row assembly with enrichment, and counting.
//!
//! # Example
//!
//! ```rust,no_run
//! use icd10cm::{builtin_rules, transform_file, TransformOptions};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let rules = builtin_rules()?;
//!     let result = transform_file(
//!         Path::new("icd10cm_order_2026.txt"),
//!         &TransformOptions::default(),
//!         &rules,
//!     )?;
//!
//!     println!("Extracted {} rows", result.rows.len());
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::assembler::emit_rows;
use super::rules::{EnrichmentStats, RuleSet};
use crate::error::{ParseError, PipelineError, PipelineResult};
use crate::logs::{log_info, log_success, log_warning};
use crate::models::{Record, TermRow};
use crate::parser::{decode_bytes_auto, parse_line, read_input_file, DecodedInput, ParseMode};
use crate::report::TypeCounts;

/// Default bound on enriched rows per canonical term.
pub const DEFAULT_ENRICHED_MAX_PER_TERM: usize = 25;

/// What to do with a line that cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Record the line in [`ExtractionResult::skipped`] and go on.
    #[default]
    Skip,
    /// Stop with [`PipelineError::Malformed`].
    Abort,
}

/// Options for the extraction pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    /// Keep only billable (flag `1`) records
    pub leaf_only: bool,

    /// Also emit the short description as `official+abbr`
    pub include_official_abbr: bool,

    /// Emit canonical rows that differ from the base terms
    pub include_canonical: bool,

    /// Run the enrichment rules
    pub include_enriched: bool,

    /// Enriched rows kept per canonical term
    pub enriched_max_per_term: usize,

    /// Line parser tolerance
    pub parse_mode: ParseMode,

    /// Malformed line handling
    pub on_malformed: MalformedPolicy,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            leaf_only: false,
            include_official_abbr: false,
            include_canonical: true,
            include_enriched: true,
            enriched_max_per_term: DEFAULT_ENRICHED_MAX_PER_TERM,
            parse_mode: ParseMode::Strict,
            on_malformed: MalformedPolicy::Skip,
        }
    }
}

impl TransformOptions {
    /// Parse options from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> PipelineResult<Self> {
        serde_json::from_str(json).map_err(|e| PipelineError::Config(e.to_string()))
    }

    /// Load options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }
}

/// A line dropped under [`MalformedPolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedLine {
    /// 1-based line number in the input.
    pub line_number: usize,
    pub reason: String,
}

/// Result of a complete extraction run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    /// Output rows, in record order then generation order
    pub rows: Vec<TermRow>,

    /// Records parsed successfully
    pub parsed_records: usize,

    /// Records left after the leaf filter
    pub kept_records: usize,

    /// Malformed lines that were skipped
    pub skipped: Vec<SkippedLine>,

    /// Rows per provenance type
    pub counts: TypeCounts,

    /// Rule impact; `None` when enrichment is disabled
    pub enrichment: Option<EnrichmentStats>,

    /// Input encoding
    pub encoding: String,
}

impl ExtractionResult {
    fn new(options: &TransformOptions, encoding: impl Into<String>) -> Self {
        Self {
            rows: Vec::new(),
            parsed_records: 0,
            kept_records: 0,
            skipped: Vec::new(),
            counts: TypeCounts::default(),
            enrichment: options.include_enriched.then(EnrichmentStats::new),
            encoding: encoding.into(),
        }
    }

    /// Filter, expand and count one parsed record.
    fn push_record(&mut self, record: &Record, options: &TransformOptions, rules: &RuleSet) {
        self.parsed_records += 1;
        if options.leaf_only && !record.leaf {
            return;
        }
        self.kept_records += 1;

        let rows = emit_rows(record, options, rules, self.enrichment.as_mut());
        for row in &rows {
            self.counts.add(&row.term_type);
        }
        self.rows.extend(rows);
    }
}

/// Extract term rows from an order file.
///
/// This is the main entry point for the pipeline. It:
/// 1. Reads the file with encoding auto-detection
/// 2. Parses each line, applying the malformed-line policy
/// 3. Applies the leaf filter
/// 4. Emits base, canonical and enriched rows per record
///
/// # Errors
/// [`PipelineError::Input`] when the file is missing or unreadable;
/// [`PipelineError::Malformed`] under [`MalformedPolicy::Abort`].
pub fn transform_file(
    path: &Path,
    options: &TransformOptions,
    rules: &RuleSet,
) -> PipelineResult<ExtractionResult> {
    log_info(format!("Reading {}...", path.display()));
    let decoded = read_input_file(path)?;
    transform_decoded(decoded, options, rules)
}

/// Same as [`transform_file`] but accepts raw bytes instead of a file path.
pub fn transform_bytes(
    bytes: &[u8],
    options: &TransformOptions,
    rules: &RuleSet,
) -> PipelineResult<ExtractionResult> {
    transform_decoded(decode_bytes_auto(bytes), options, rules)
}

fn transform_decoded(
    decoded: DecodedInput,
    options: &TransformOptions,
    rules: &RuleSet,
) -> PipelineResult<ExtractionResult> {
    log_success(format!("Detected encoding: {}", decoded.encoding));
    let mut result = transform_lines(decoded.content.lines(), options, rules)?;
    result.encoding = decoded.encoding;
    Ok(result)
}

/// Extract term rows from already-decoded lines.
///
/// Line numbers in errors and skipped entries are 1-based positions in
/// `lines`, blank lines included.
pub fn transform_lines<'a, I>(
    lines: I,
    options: &TransformOptions,
    rules: &RuleSet,
) -> PipelineResult<ExtractionResult>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut result = ExtractionResult::new(options, "utf-8");

    for (idx, line) in lines.into_iter().enumerate() {
        let line_number = idx + 1;
        let record = match parse_line(line, options.parse_mode) {
            Ok(record) => record,
            Err(ParseError::Blank) => continue,
            Err(source) => match options.on_malformed {
                MalformedPolicy::Abort => {
                    return Err(PipelineError::Malformed {
                        line: line_number,
                        source,
                    })
                }
                MalformedPolicy::Skip => {
                    tracing::debug!(line = line_number, error = %source, "skipping malformed line");
                    result.skipped.push(SkippedLine {
                        line_number,
                        reason: source.to_string(),
                    });
                    continue;
                }
            },
        };
        result.push_record(&record, options, rules);
    }

    log_result(&result);
    Ok(result)
}

/// Extract term rows from already-parsed records.
pub fn transform_records(
    records: &[Record],
    options: &TransformOptions,
    rules: &RuleSet,
) -> ExtractionResult {
    let mut result = ExtractionResult::new(options, "utf-8");
    for record in records {
        result.push_record(record, options, rules);
    }
    log_result(&result);
    result
}

fn log_result(result: &ExtractionResult) {
    log_success(format!("Parsed {} records", result.parsed_records));
    if result.kept_records != result.parsed_records {
        log_info(format!("{} records kept by the leaf filter", result.kept_records));
    }
    if !result.skipped.is_empty() {
        let sample: Vec<String> = result
            .skipped
            .iter()
            .take(5)
            .map(|s| s.line_number.to_string())
            .collect();
        let more = if result.skipped.len() > 5 {
            format!("... +{}", result.skipped.len() - 5)
        } else {
            String::new()
        };
        log_warning(format!(
            "{} malformed lines skipped (lines: {}{})",
            result.skipped.len(),
            sample.join(", "),
            more
        ));
    }
    if result.parsed_records == 0 {
        log_warning("No records parsed");
    }
    log_success(format!("Generated {} rows", result.rows.len()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InputError;
    use crate::models::TermType;
    use crate::transform::rules::builtin_rules;
    use std::io::Write;

    fn fixed_line(order: &str, code: &str, flag: &str, short: &str, long: &str) -> String {
        format!("{:<5} {:<7} {} {:<60}{}", order, code, flag, short, long)
    }

    fn sample_lines() -> Vec<String> {
        vec![
            fixed_line("00001", "A00", "0", "Cholera", "Cholera"),
            fixed_line(
                "00002",
                "A000",
                "1",
                "Cholera due to Vibrio cholerae 01, biovar cholerae",
                "Cholera due to Vibrio cholerae 01, biovar cholerae",
            ),
            String::new(),
            fixed_line("00003", "R52", "1", "Pain, unsp", "Pain, unspecified"),
        ]
    }

    #[test]
    fn test_default_options() {
        let opts = TransformOptions::default();
        assert!(!opts.leaf_only);
        assert!(!opts.include_official_abbr);
        assert!(opts.include_canonical);
        assert!(opts.include_enriched);
        assert_eq!(opts.enriched_max_per_term, 25);
        assert_eq!(opts.parse_mode, ParseMode::Strict);
        assert_eq!(opts.on_malformed, MalformedPolicy::Skip);
    }

    #[test]
    fn test_options_from_partial_json() {
        let opts = TransformOptions::from_json(r#"{"leaf_only": true, "on_malformed": "abort"}"#).unwrap();
        assert!(opts.leaf_only);
        assert_eq!(opts.on_malformed, MalformedPolicy::Abort);
        assert_eq!(opts.enriched_max_per_term, 25);

        assert!(matches!(
            TransformOptions::from_json("{not json"),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_transform_lines() {
        let rules = builtin_rules().unwrap();
        let lines = sample_lines();
        let result = transform_lines(lines.iter().map(String::as_str), &TransformOptions::default(), &rules).unwrap();

        assert_eq!(result.parsed_records, 3);
        assert_eq!(result.kept_records, 3);
        assert!(result.skipped.is_empty());

        let r52: Vec<_> = result.rows.iter().filter(|r| r.code == "R52").collect();
        assert_eq!(r52[0].term, "pain, unspecified");
        assert_eq!(r52[0].term_type, TermType::official());
        assert_eq!(r52[1].term, "unspecified pain");

        let a000: Vec<_> = result.rows.iter().filter(|r| r.code == "A000").collect();
        assert!(a000.iter().any(|r| r.term == "cholera because of vibrio cholerae 01, biovar cholerae"));

        assert_eq!(result.counts.get(&TermType::official()), 3);
        assert_eq!(result.counts.total(), result.rows.len());
    }

    #[test]
    fn test_leaf_only_filter() {
        let rules = builtin_rules().unwrap();
        let lines = sample_lines();
        let options = TransformOptions {
            leaf_only: true,
            ..TransformOptions::default()
        };
        let result = transform_lines(lines.iter().map(String::as_str), &options, &rules).unwrap();
        assert_eq!(result.parsed_records, 3);
        assert_eq!(result.kept_records, 2);
        assert!(result.rows.iter().all(|r| r.code != "A00"));
    }

    #[test]
    fn test_leaf_only_on_header_file_yields_no_rows() {
        let rules = builtin_rules().unwrap();
        let line = fixed_line("00001", "A00", "0", "Cholera", "Cholera");
        let options = TransformOptions {
            leaf_only: true,
            ..TransformOptions::default()
        };
        let result = transform_lines([line.as_str()], &options, &rules).unwrap();
        assert_eq!(result.parsed_records, 1);
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_skip_policy_records_line_numbers() {
        let rules = builtin_rules().unwrap();
        let mut lines = sample_lines();
        lines.insert(1, "garbage".to_string());
        let result = transform_lines(lines.iter().map(String::as_str), &TransformOptions::default(), &rules).unwrap();

        assert_eq!(result.parsed_records, 3);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].line_number, 2);
    }

    #[test]
    fn test_abort_policy_reports_line() {
        let rules = builtin_rules().unwrap();
        let mut lines = sample_lines();
        lines.insert(2, "00009 X00     7 broken".to_string());
        let options = TransformOptions {
            on_malformed: MalformedPolicy::Abort,
            ..TransformOptions::default()
        };
        let err = transform_lines(lines.iter().map(String::as_str), &options, &rules).unwrap_err();
        assert!(matches!(err, PipelineError::Malformed { line: 3, .. }));
    }

    #[test]
    fn test_enrichment_disabled_has_no_stats() {
        let rules = builtin_rules().unwrap();
        let lines = sample_lines();
        let options = TransformOptions {
            include_enriched: false,
            ..TransformOptions::default()
        };
        let result = transform_lines(lines.iter().map(String::as_str), &options, &rules).unwrap();
        assert!(result.enrichment.is_none());
        assert!(result.rows.iter().all(|r| r.term_type.rule_id().is_none()));
    }

    #[test]
    fn test_transform_file() {
        let rules = builtin_rules().unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in sample_lines() {
            writeln!(file, "{}", line).unwrap();
        }

        let result = transform_file(file.path(), &TransformOptions::default(), &rules).unwrap();
        assert_eq!(result.parsed_records, 3);
        assert_eq!(result.encoding, "utf-8");
        let stats = result.enrichment.unwrap();
        assert_eq!(stats.added("C2"), 1);
        assert_eq!(stats.added("C1"), 2);
    }

    #[test]
    fn test_transform_empty_file() {
        let rules = builtin_rules().unwrap();
        let file = tempfile::NamedTempFile::new().unwrap();

        let result = transform_file(file.path(), &TransformOptions::default(), &rules).unwrap();
        assert_eq!(result.parsed_records, 0);
        assert!(result.rows.is_empty());
        assert_eq!(result.counts.total(), 0);
        assert_eq!(result.enrichment.map(|s| s.terms_seen), Some(0));
    }

    #[test]
    fn test_transform_file_missing() {
        let rules = builtin_rules().unwrap();
        let err = transform_file(
            Path::new("/nonexistent/icd10cm_order.txt"),
            &TransformOptions::default(),
            &rules,
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Input(InputError::NotFound(_))));
    }

    #[test]
    fn test_transform_records() {
        let rules = builtin_rules().unwrap();
        let record = Record {
            order: 1,
            code: "C911".to_string(),
            leaf: true,
            short_description: "B-cell leukemia".to_string(),
            long_description: "B-cell leukemia".to_string(),
        };
        let result = transform_records(&[record], &TransformOptions::default(), &rules);
        let terms: Vec<_> = result.rows.iter().map(|r| r.term.as_str()).collect();
        assert_eq!(terms, vec!["b-cell leukemia", "b cell leukemia", "bcell leukemia"]);
    }
}

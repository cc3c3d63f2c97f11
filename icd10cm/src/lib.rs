//! # icd10cm - ICD-10-CM term extraction and enrichment
//!
//! Turns the CMS fixed-width order file (`icd10cm_order_YYYY.txt`) into a
//! `(code, term, provenance)` table for search and synonym matching.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Order file  │────▶│   Parser    │────▶│  Canonical  │────▶│   Rules     │────▶│  CSV rows   │
//! │ (fixed-w.)  │     │ (auto-enc)  │     │  (lc/trim)  │     │ (A1..P1)    │     │ (deduped)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use icd10cm::{builtin_rules, transform_file, write_terms_csv, TransformOptions};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let rules = builtin_rules()?;
//!     let result = transform_file(Path::new("icd10cm_order_2026.txt"), &TransformOptions::default(), &rules)?;
//!     write_terms_csv(Path::new("icd10cm_terms_2026.csv"), &result.rows)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (Record, TermRow, TermType)
//! - [`parser`] - Fixed-width line parsing and input decoding
//! - [`transform`] - Canonicalization, enrichment rules, row assembly, pipeline
//! - [`report`] - Per-type counts and rule impact
//! - [`output`] - CSV writer
//! - [`logs`] - Progress logging on top of `tracing`

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Reporting and output
pub mod output;
pub mod report;

// Logging
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    InputError, InputResult, OutputError, OutputResult, ParseError, ParseResult, PipelineError, PipelineResult,
    RuleError, RuleResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{BaseKind, Record, TermRow, TermType};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_bytes_auto, decode_content, detect_encoding, parse_line, parse_lines, read_input_file, DecodedInput,
    ParseMode, MIN_LINE_WIDTH,
};

// =============================================================================
// Re-exports - Canonicalization and rules
// =============================================================================

pub use transform::{
    builtin_rules, canonicalize, dedupe_terms, emit_rows, enrich, enrich_term, normalize_spaces, EnrichmentRule,
    EnrichmentStats, RuleSet, RuleSpec, Transform, Variant,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    transform_bytes, transform_file, transform_lines, transform_records, ExtractionResult, MalformedPolicy,
    SkippedLine, TransformOptions, DEFAULT_ENRICHED_MAX_PER_TERM,
};

// =============================================================================
// Re-exports - Report and output
// =============================================================================

pub use output::{write_terms, write_terms_csv, CSV_HEADER};
pub use report::{print_summary, rule_report, RuleReportEntry, RunSummary, TypeCounts};

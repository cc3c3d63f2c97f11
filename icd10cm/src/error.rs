//! Error types for the ICD-10-CM term pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`ParseError`] - One malformed line of the order file
//! - [`RuleError`] - Rule set assembly errors (fatal at startup)
//! - [`InputError`] - Reading and decoding the input file
//! - [`OutputError`] - Writing the CSV table or the JSON report
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Parse Errors
// =============================================================================

/// Why a single line of the order file could not be turned into a record.
///
/// The parser only reports; whether a failure skips the line or aborts the
/// run is decided by the pipeline's [`crate::MalformedPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Empty or whitespace-only line.
    #[error("Blank line")]
    Blank,

    /// Line is shorter than the fixed-width layout requires.
    #[error("Line too short: {len} characters, at least {min} required")]
    TooShort { len: usize, min: usize },

    /// Order column is not a 5-digit number.
    #[error("Invalid order field: '{0}'")]
    InvalidOrder(String),

    /// Flag column is neither `0` nor `1`.
    #[error("Invalid leaf flag: '{0}'")]
    InvalidFlag(String),

    /// Code column is blank.
    #[error("Empty code field")]
    EmptyCode,

    /// Both description columns are blank.
    #[error("Empty description for code {0}")]
    EmptyDescription(String),
}

// =============================================================================
// Rule Errors
// =============================================================================

/// Errors while assembling an enrichment rule set.
#[derive(Debug, Error)]
pub enum RuleError {
    /// A rule has a blank id.
    #[error("Rule with empty id")]
    EmptyId,

    /// Two rules share an id.
    #[error("Duplicate rule id: {0}")]
    DuplicateId(String),

    /// A referenced rule id is not in the rule set.
    #[error("Unknown rule id: {0}")]
    UnknownRule(String),

    /// A rule has no description to report with.
    #[error("Rule {0} has no description")]
    MissingDescription(String),

    /// A rule has no transforms or a zero variant bound.
    #[error("Rule {0} can never produce a variant")]
    EmptyRule(String),

    /// A regex pattern failed to compile.
    #[error("Invalid pattern in rule {rule}: {message}")]
    InvalidPattern { rule: String, message: String },

    /// Rules file could not be read.
    #[error("Rules file IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Rules file is not valid JSON.
    #[error("Rules file JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Input Errors
// =============================================================================

/// Errors while reading the order file.
#[derive(Debug, Error)]
pub enum InputError {
    /// Input path does not exist.
    #[error("Input not found: {0}")]
    NotFound(String),

    /// Failed to read file.
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Output Errors
// =============================================================================

/// Errors while writing results.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Failed to create or write a file.
    #[error("Output IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Report serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::transform_file`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input error.
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// Rule set error.
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    /// Output error.
    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    /// Malformed line under the abort policy.
    #[error("Malformed line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: ParseError,
    },

    /// Options file could not be loaded.
    #[error("Invalid options: {0}")]
    Config(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for line parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for rule set assembly.
pub type RuleResult<T> = Result<T, RuleError>;

/// Result type for input operations.
pub type InputResult<T> = Result<T, InputError>;

/// Result type for output operations.
pub type OutputResult<T> = Result<T, OutputError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // InputError -> PipelineError
        let input_err = InputError::NotFound("order.txt".into());
        let pipeline_err: PipelineError = input_err.into();
        assert!(pipeline_err.to_string().contains("order.txt"));

        // RuleError -> PipelineError
        let rule_err = RuleError::DuplicateId("B1".into());
        let pipeline_err: PipelineError = rule_err.into();
        assert!(pipeline_err.to_string().contains("B1"));
    }

    #[test]
    fn test_malformed_error_format() {
        let err = PipelineError::Malformed {
            line: 42,
            source: ParseError::InvalidFlag("x".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("42"));
        assert!(msg.contains("'x'"));
    }

    #[test]
    fn test_too_short_format() {
        let err = ParseError::TooShort { len: 20, min: 76 };
        assert_eq!(err.to_string(), "Line too short: 20 characters, at least 76 required");
    }
}

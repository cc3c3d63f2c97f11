//! Transformation module.
//!
//! This module turns parsed records into term rows:
//! - Canonical: Term normalization
//! - Rules: Enrichment rules and engine
//! - Assembler: Per-record rows with de-dup
//! - Pipeline: Main transformation pipeline

pub mod assembler;
pub mod canonical;
pub mod pipeline;
pub mod rules;

pub use assembler::{dedupe_terms, emit_rows};
pub use canonical::{canonicalize, normalize_spaces};
pub use pipeline::*;
pub use rules::*;

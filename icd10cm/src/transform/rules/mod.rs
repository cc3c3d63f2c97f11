//! Enrichment rules for term expansion.
//!
//! This module provides:
//! - `operations`: Transform building blocks (character, phrase, regex, suffix, parenthesis)
//! - `rule_set`: Named rules and the ordered, validated [`RuleSet`]
//! - `builtin`: The default rules (A1..A5, B1..B4, C1, C2, P1)
//! - `engine`: Run a rule set over one canonical term with de-dup and a cap
//!
//! ## Usage Flow
//!
//! ```text
//! canonical term → every rule in declaration order → candidates → de-dup + cap → variants
//! ```
//!
//! ## Example
//!
//! ```
//! use icd10cm::transform::rules::{builtin_rules, enrich_term};
//!
//! let rules = builtin_rules().unwrap();
//! let variants = enrich_term("pain, unspecified", &rules, 25);
//! assert_eq!(variants[0].term, "unspecified pain");
//! assert_eq!(variants[0].rule_id, "C2");
//! ```

pub mod builtin;
pub mod engine;
pub mod operations;
pub mod rule_set;

// Re-exports for convenience
pub use builtin::builtin_rules;
pub use engine::{enrich, enrich_term, EnrichmentStats, Variant};
pub use operations::{CompiledTransform, Transform};
pub use rule_set::{EnrichmentRule, RuleSet, RuleSpec, DEFAULT_RULE_MAX_VARIANTS};

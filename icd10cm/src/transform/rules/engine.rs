//! Rule engine
//!
//! Runs every rule of a [`RuleSet`] over one canonical term and keeps the
//! candidates that are new for the current code, up to a per-term cap.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::rule_set::RuleSet;
use crate::transform::canonical::normalize_spaces;

/// A surviving enrichment variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub term: String,
    pub rule_id: String,
}

/// Rule impact accumulated across a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentStats {
    /// Canonical terms passed to the engine.
    pub terms_seen: usize,
    /// Per rule: canonical terms with at least one surviving variant.
    pub terms_affected: BTreeMap<String, usize>,
    /// Per rule: variants that survived de-dup and the cap.
    pub variants_added: BTreeMap<String, usize>,
}

impl EnrichmentStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn affected(&self, rule_id: &str) -> usize {
        self.terms_affected.get(rule_id).copied().unwrap_or(0)
    }

    pub fn added(&self, rule_id: &str) -> usize {
        self.variants_added.get(rule_id).copied().unwrap_or(0)
    }

    fn record(&mut self, variants: &[Variant]) {
        self.terms_seen += 1;
        let fired: BTreeSet<&str> = variants.iter().map(|v| v.rule_id.as_str()).collect();
        for rule_id in fired {
            *self.terms_affected.entry(rule_id.to_string()).or_default() += 1;
        }
        for variant in variants {
            *self.variants_added.entry(variant.rule_id.clone()).or_default() += 1;
        }
    }
}

/// Enrich one canonical term.
///
/// `seen` holds the terms already accepted for the current code; accepted
/// variants are added to it. Candidates are lowercased and
/// whitespace-normalized, then dropped when empty or already seen, which
/// does not count against `max_variants`.
pub fn enrich(
    term: &str,
    rules: &RuleSet,
    seen: &mut HashSet<String>,
    max_variants: usize,
    stats: Option<&mut EnrichmentStats>,
) -> Vec<Variant> {
    let mut variants = Vec::new();

    'rules: for rule in rules.iter() {
        for candidate in rule.apply(term) {
            if variants.len() >= max_variants {
                break 'rules;
            }
            let candidate = normalize_spaces(&candidate.to_lowercase());
            if candidate.is_empty() || seen.contains(&candidate) {
                continue;
            }
            seen.insert(candidate.clone());
            variants.push(Variant {
                term: candidate,
                rule_id: rule.id().to_string(),
            });
        }
    }

    if let Some(stats) = stats {
        stats.record(&variants);
    }

    variants
}

/// Enrich a standalone term, with only the term itself counted as seen.
pub fn enrich_term(term: &str, rules: &RuleSet, max_variants: usize) -> Vec<Variant> {
    let mut seen = HashSet::from([term.to_string()]);
    enrich(term, rules, &mut seen, max_variants, None)
}

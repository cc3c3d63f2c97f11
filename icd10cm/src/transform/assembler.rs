//! Turn one parsed record into its de-duplicated term rows.
//!
//! # Generation order
//!
//! ```text
//! Record                           →  Rows (first provenance wins)
//! ┌──────────────────────────────┐    ┌───────────────────────────────────────┐
//! │ long  "Pain, unspecified."   │    │ pain, unspecified.  official          │
//! │ short "Pain, unsp."          │ →  │ pain, unsp.         official+abbr     │
//! └──────────────────────────────┘    │ pain, unspecified   canonical:official│
//!                                     │ pain, unsp          canonical:...abbr │
//!                                     │ unspecified pain    enriched:C2       │
//!                                     └───────────────────────────────────────┘
//! ```
//!
//! Base rows, then canonical rows, then enriched rows with rules in
//! declaration order. De-dup keeps the first occurrence of each term, so this
//! order decides every provenance tie.

use std::collections::HashSet;

use super::canonical::canonicalize;
use super::pipeline::TransformOptions;
use super::rules::{enrich, EnrichmentStats, RuleSet};
use crate::models::{BaseKind, Record, TermRow, TermType};

/// Generate the final rows for one record.
pub fn emit_rows(
    record: &Record,
    options: &TransformOptions,
    rules: &RuleSet,
    mut stats: Option<&mut EnrichmentStats>,
) -> Vec<TermRow> {
    let mut output: Vec<(String, TermType)> = Vec::new();

    // 1-2. Base terms
    let official = record.long_description.to_lowercase();
    let mut bases = vec![(official.clone(), BaseKind::Official)];
    if options.include_official_abbr {
        let abbr = record.short_description.to_lowercase();
        if !abbr.trim().is_empty() && abbr != official {
            bases.push((abbr, BaseKind::OfficialAbbr));
        }
    }
    output.extend(bases.iter().map(|(term, kind)| (term.clone(), TermType::Base(*kind))));

    // 3. Canonical forms; one equal to a base term collapses into it
    let mut enrichment_sources: Vec<String> = Vec::new();
    for (term, kind) in &bases {
        let source = if options.include_canonical {
            let Some(canon) = canonicalize(term) else {
                continue;
            };
            if !bases.iter().any(|(base, _)| *base == canon) {
                output.push((canon.clone(), TermType::Canonical(*kind)));
            }
            canon
        } else {
            term.trim().to_string()
        };
        if !source.is_empty() && !enrichment_sources.contains(&source) {
            enrichment_sources.push(source);
        }
    }

    // 4. Enriched variants, capped per source term after de-dup
    if options.include_enriched {
        let mut seen: HashSet<String> = output.iter().map(|(term, _)| dedupe_key(term)).collect();
        for source in &enrichment_sources {
            let variants = enrich(
                source,
                rules,
                &mut seen,
                options.enriched_max_per_term,
                stats.as_deref_mut(),
            );
            output.extend(
                variants
                    .into_iter()
                    .map(|v| (v.term, TermType::Enriched(v.rule_id))),
            );
        }
    }

    // 5. Global de-dup
    dedupe_terms(&record.code, output)
}

/// Keep the first occurrence of each term (trimmed, lowercased) and drop
/// empty terms, preserving order.
pub fn dedupe_terms(code: &str, rows: Vec<(String, TermType)>) -> Vec<TermRow> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter_map(|(term, term_type)| {
            let key = dedupe_key(&term);
            if key.is_empty() || !seen.insert(key.clone()) {
                return None;
            }
            Some(TermRow::new(code, key, term_type))
        })
        .collect()
}

fn dedupe_key(term: &str) -> String {
    term.trim().to_lowercase()
}

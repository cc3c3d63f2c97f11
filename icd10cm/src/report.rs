//! Run summary: per-type row counts and per-rule enrichment impact.
//!
//! The same [`RunSummary`] feeds the console printout and the optional JSON
//! report.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{OutputError, OutputResult};
use crate::models::TermType;
use crate::transform::{EnrichmentStats, ExtractionResult, RuleSet, TransformOptions};

// =============================================================================
// Type counts
// =============================================================================

/// Output rows per provenance type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TypeCounts(BTreeMap<String, usize>);

impl TypeCounts {
    pub fn add(&mut self, term_type: &TermType) {
        *self.0.entry(term_type.to_string()).or_default() += 1;
    }

    pub fn get(&self, term_type: &TermType) -> usize {
        self.0.get(&term_type.to_string()).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    /// Most common first; ties by type name.
    pub fn most_common(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self.0.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

// =============================================================================
// Rule report
// =============================================================================

/// Impact of one enrichment rule over a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleReportEntry {
    pub rule_id: String,
    pub description: String,
    /// Canonical terms with at least one surviving variant from the rule.
    pub terms_affected: usize,
    /// Variants that survived de-dup and the per-term cap.
    pub variants_added: usize,
}

/// Build the per-rule report.
///
/// Rules with no effect are omitted. Entries are sorted by
/// `(terms_affected, variants_added, rule_id)`, all descending.
pub fn rule_report(stats: &EnrichmentStats, rules: &RuleSet) -> Vec<RuleReportEntry> {
    let mut entries: Vec<RuleReportEntry> = rules
        .iter()
        .map(|rule| RuleReportEntry {
            rule_id: rule.id().to_string(),
            description: rule.description().replace('\n', " ").trim().to_string(),
            terms_affected: stats.affected(rule.id()),
            variants_added: stats.added(rule.id()),
        })
        .filter(|e| e.terms_affected > 0 || e.variants_added > 0)
        .collect();

    entries.sort_by(|a, b| {
        (b.terms_affected, b.variants_added, &b.rule_id).cmp(&(a.terms_affected, a.variants_added, &a.rule_id))
    });
    entries
}

// =============================================================================
// Run summary
// =============================================================================

/// Everything reported at the end of an `extract` run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub input: String,
    pub output: String,
    pub encoding: String,
    pub options: TransformOptions,
    pub parsed_records: usize,
    pub kept_records: usize,
    pub skipped_lines: usize,
    pub rows_written: usize,
    pub counts: TypeCounts,
    /// `None` when enrichment is disabled.
    pub canonical_terms_processed: Option<usize>,
    pub rules: Vec<RuleReportEntry>,
}

impl RunSummary {
    pub fn new(
        result: &ExtractionResult,
        rules: &RuleSet,
        options: &TransformOptions,
        input: &Path,
        output: &Path,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            input: input.display().to_string(),
            output: output.display().to_string(),
            encoding: result.encoding.clone(),
            options: options.clone(),
            parsed_records: result.parsed_records,
            kept_records: result.kept_records,
            skipped_lines: result.skipped.len(),
            rows_written: result.rows.len(),
            counts: result.counts.clone(),
            canonical_terms_processed: result.enrichment.as_ref().map(|s| s.terms_seen),
            rules: result
                .enrichment
                .as_ref()
                .map(|stats| rule_report(stats, rules))
                .unwrap_or_default(),
        }
    }

    /// Console rendering. The rule section is left out when `show_rules` is
    /// false or enrichment was disabled.
    pub fn render(&self, show_rules: bool) -> String {
        let mut out = String::new();
        out.push_str(&format!("Parsed ICD rows: {}\n", self.parsed_records));
        if self.options.leaf_only {
            out.push_str("Filter: leaf-only (FLAG == 1)\n");
        }
        if self.skipped_lines > 0 {
            out.push_str(&format!("Malformed lines skipped: {}\n", self.skipped_lines));
        }
        out.push_str(&format!("Output rows written: {}\n", self.rows_written));
        for (term_type, n) in self.counts.most_common() {
            out.push_str(&format!("  {}: {}\n", term_type, n));
        }

        if let (true, Some(terms_seen)) = (show_rules, self.canonical_terms_processed) {
            out.push_str("\nEnrichment rule impact (canonical terms only):\n");
            out.push_str(&format!("  Canonical terms processed for enrichment: {}\n", terms_seen));
            for entry in &self.rules {
                let line = format!(
                    "  {:<3} terms_affected={:<6} variants_added={:<6} {}",
                    entry.rule_id, entry.terms_affected, entry.variants_added, entry.description
                );
                out.push_str(line.trim_end());
                out.push('\n');
            }
        }
        out
    }

    /// Write the summary as pretty JSON.
    pub fn write_json(&self, path: &Path) -> OutputResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(OutputError::Io)
    }
}

/// Print the summary to stdout.
pub fn print_summary(summary: &RunSummary, show_rules: bool) {
    print!("{}", summary.render(show_rules));
}

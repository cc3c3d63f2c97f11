//! Enrichment rules and ordered rule sets.
//!
//! A [`RuleSet`] is built once at startup and passed by reference. Its
//! declaration order is observable: it decides which rule wins a term
//! collision during de-dup and which variants survive the per-term cap.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::operations::{CompiledTransform, Transform};
use crate::error::{RuleError, RuleResult};

/// Variant bound used when a rule does not set one.
pub const DEFAULT_RULE_MAX_VARIANTS: usize = 8;

fn default_max_variants() -> usize {
    DEFAULT_RULE_MAX_VARIANTS
}

/// Serializable rule definition, as found in a rules file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSpec {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_max_variants")]
    pub max_variants: usize,
    pub transforms: Vec<Transform>,
}

/// A named, pure transform from a canonical term to candidate variants.
#[derive(Debug, Clone)]
pub struct EnrichmentRule {
    id: String,
    description: String,
    max_variants: usize,
    steps: Vec<CompiledTransform>,
}

impl EnrichmentRule {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        transforms: Vec<Transform>,
    ) -> RuleResult<Self> {
        Self::from_spec(RuleSpec {
            id: id.into(),
            description: description.into(),
            max_variants: DEFAULT_RULE_MAX_VARIANTS,
            transforms,
        })
    }

    /// Compile a rule definition.
    pub fn from_spec(spec: RuleSpec) -> RuleResult<Self> {
        let id = spec.id.trim().to_string();
        let steps = spec
            .transforms
            .iter()
            .map(|t| {
                t.compile().map_err(|e| RuleError::InvalidPattern {
                    rule: id.clone(),
                    message: e.to_string(),
                })
            })
            .collect::<RuleResult<Vec<_>>>()?;

        Ok(Self {
            id,
            description: spec.description.trim().to_string(),
            max_variants: spec.max_variants,
            steps,
        })
    }

    #[must_use]
    pub fn with_max_variants(mut self, max_variants: usize) -> Self {
        self.max_variants = max_variants;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn max_variants(&self) -> usize {
        self.max_variants
    }

    pub fn transforms(&self) -> impl Iterator<Item = &Transform> {
        self.steps.iter().map(CompiledTransform::transform)
    }

    /// Candidates for a canonical term, in transform order, at most
    /// `max_variants` of them.
    pub fn apply(&self, term: &str) -> Vec<String> {
        let mut candidates: Vec<String> = self.steps.iter().flat_map(|step| step.apply(term)).collect();
        candidates.truncate(self.max_variants);
        candidates
    }

    pub fn to_spec(&self) -> RuleSpec {
        RuleSpec {
            id: self.id.clone(),
            description: self.description.clone(),
            max_variants: self.max_variants,
            transforms: self.transforms().cloned().collect(),
        }
    }

    fn validate(&self) -> RuleResult<()> {
        if self.id.is_empty() {
            return Err(RuleError::EmptyId);
        }
        if self.description.is_empty() {
            return Err(RuleError::MissingDescription(self.id.clone()));
        }
        if self.max_variants == 0 || !self.transforms().any(Transform::is_productive) {
            return Err(RuleError::EmptyRule(self.id.clone()));
        }
        Ok(())
    }
}

/// Immutable, ordered collection of rules with unique ids.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<EnrichmentRule>,
}

impl RuleSet {
    /// Validate and build a rule set, keeping the given order.
    pub fn new(rules: Vec<EnrichmentRule>) -> RuleResult<Self> {
        let mut seen = HashSet::new();
        for rule in &rules {
            rule.validate()?;
            if !seen.insert(rule.id().to_string()) {
                return Err(RuleError::DuplicateId(rule.id().to_string()));
            }
        }
        Ok(Self { rules })
    }

    /// Parse rule definitions from JSON (an array of [`RuleSpec`]).
    pub fn rules_from_json(json: &str) -> RuleResult<Vec<EnrichmentRule>> {
        let specs: Vec<RuleSpec> = serde_json::from_str(json)?;
        specs.into_iter().map(EnrichmentRule::from_spec).collect()
    }

    /// Load rule definitions from a JSON file.
    pub fn load_rules_file(path: impl AsRef<Path>) -> RuleResult<Vec<EnrichmentRule>> {
        let content = std::fs::read_to_string(path)?;
        Self::rules_from_json(&content)
    }

    /// Append rules after the existing ones.
    pub fn extend(self, extra: Vec<EnrichmentRule>) -> RuleResult<Self> {
        let mut rules = self.rules;
        rules.extend(extra);
        Self::new(rules)
    }

    /// Keep only the listed rules, in this set's declaration order.
    pub fn select<S: AsRef<str>>(&self, ids: &[S]) -> RuleResult<Self> {
        let wanted = self.resolve(ids)?;
        Ok(Self {
            rules: self
                .rules
                .iter()
                .filter(|r| wanted.contains(r.id()))
                .cloned()
                .collect(),
        })
    }

    /// Drop the listed rules.
    pub fn without<S: AsRef<str>>(&self, ids: &[S]) -> RuleResult<Self> {
        let unwanted = self.resolve(ids)?;
        Ok(Self {
            rules: self
                .rules
                .iter()
                .filter(|r| !unwanted.contains(r.id()))
                .cloned()
                .collect(),
        })
    }

    fn resolve<S: AsRef<str>>(&self, ids: &[S]) -> RuleResult<HashSet<String>> {
        ids.iter()
            .map(|id| {
                let id = id.as_ref().trim();
                self.get(id)
                    .map(|r| r.id().to_string())
                    .ok_or_else(|| RuleError::UnknownRule(id.to_string()))
            })
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&EnrichmentRule> {
        self.rules.iter().find(|r| r.id() == id)
    }

    /// Description for reporting.
    pub fn description(&self, id: &str) -> Option<&str> {
        self.get(id).map(EnrichmentRule::description)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnrichmentRule> {
        self.rules.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(EnrichmentRule::id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

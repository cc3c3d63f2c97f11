//! Domain models for the term extraction pipeline.
//!
//! - [`Record`] - One parsed line of the order file
//! - [`TermRow`] - One output row (code, term, provenance)
//! - [`TermType`] - Provenance tag of a row

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Record
// =============================================================================

/// One row of `icd10cm_order_YYYY.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Advisory ordering key (first column).
    pub order: u32,
    /// ICD-10-CM code without the dot, e.g. `A000`.
    pub code: String,
    /// `true` for billable (leaf) codes, `false` for headers.
    pub leaf: bool,
    /// Abbreviated description, up to 60 characters.
    pub short_description: String,
    /// Full official description.
    pub long_description: String,
}

// =============================================================================
// Term Type
// =============================================================================

/// Base term a canonical row was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseKind {
    /// Long description.
    Official,
    /// Short (abbreviated) description.
    OfficialAbbr,
}

impl BaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseKind::Official => "official",
            BaseKind::OfficialAbbr => "official+abbr",
        }
    }
}

/// Provenance of an output row.
///
/// Serialized as the `Type` column: `official`, `official+abbr`,
/// `canonical:official`, `canonical:official+abbr` or `enriched:<ruleId>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TermType {
    Base(BaseKind),
    Canonical(BaseKind),
    Enriched(String),
}

impl TermType {
    pub fn official() -> Self {
        TermType::Base(BaseKind::Official)
    }

    pub fn official_abbr() -> Self {
        TermType::Base(BaseKind::OfficialAbbr)
    }

    /// Rule id for enriched rows.
    pub fn rule_id(&self) -> Option<&str> {
        match self {
            TermType::Enriched(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for TermType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermType::Base(kind) => f.write_str(kind.as_str()),
            TermType::Canonical(kind) => write!(f, "canonical:{}", kind.as_str()),
            TermType::Enriched(rule_id) => write!(f, "enriched:{}", rule_id),
        }
    }
}

impl FromStr for TermType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let base = |name: &str| match name {
            "official" => Some(BaseKind::Official),
            "official+abbr" => Some(BaseKind::OfficialAbbr),
            _ => None,
        };

        if let Some(kind) = base(s) {
            return Ok(TermType::Base(kind));
        }
        if let Some(kind) = s.strip_prefix("canonical:").and_then(base) {
            return Ok(TermType::Canonical(kind));
        }
        match s.strip_prefix("enriched:") {
            Some(rule_id) if !rule_id.is_empty() => Ok(TermType::Enriched(rule_id.to_string())),
            _ => Err(format!("Unknown term type: {}", s)),
        }
    }
}

impl Serialize for TermType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TermType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Term Row
// =============================================================================

/// One output row. Field names match the CSV header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRow {
    #[serde(rename = "ICD10CMCode")]
    pub code: String,
    #[serde(rename = "Term")]
    pub term: String,
    #[serde(rename = "Type")]
    pub term_type: TermType,
}

impl TermRow {
    pub fn new(code: impl Into<String>, term: impl Into<String>, term_type: TermType) -> Self {
        Self {
            code: code.into(),
            term: term.into(),
            term_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_type_display() {
        assert_eq!(TermType::official().to_string(), "official");
        assert_eq!(TermType::official_abbr().to_string(), "official+abbr");
        assert_eq!(
            TermType::Canonical(BaseKind::OfficialAbbr).to_string(),
            "canonical:official+abbr"
        );
        assert_eq!(TermType::Enriched("B4".into()).to_string(), "enriched:B4");
    }

    #[test]
    fn test_term_type_parse() {
        for tag in ["official", "official+abbr", "canonical:official", "enriched:P1"] {
            let parsed: TermType = tag.parse().unwrap();
            assert_eq!(parsed.to_string(), tag);
        }
        assert!("enriched:".parse::<TermType>().is_err());
        assert!("canonical:enriched:A1".parse::<TermType>().is_err());
    }

    #[test]
    fn test_rule_id() {
        assert_eq!(TermType::Enriched("C2".into()).rule_id(), Some("C2"));
        assert_eq!(TermType::official().rule_id(), None);
    }

    #[test]
    fn test_term_row_json_uses_column_names() {
        let row = TermRow::new("A000", "cholera", TermType::official());
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["ICD10CMCode"], "A000");
        assert_eq!(json["Term"], "cholera");
        assert_eq!(json["Type"], "official");
    }
}

//! Built-in enrichment rules.
//!
//! Rule ids are published in the `Type` column (`enriched:<id>`) and
//! downstream consumers key on them. Never reuse an id for a different
//! transform; add a new one instead.

use super::operations::Transform;
use super::rule_set::{EnrichmentRule, RuleSet};
use crate::error::RuleResult;

const DASHES: &str = "-\u{2013}\u{2014}";
const APOSTROPHES: &str = "'\u{2019}";

/// The default rule set, in declaration order.
///
/// | id | effect |
/// |----|--------|
/// | A1 | hyphens to spaces |
/// | A2 | hyphens removed |
/// | A3 | apostrophes removed |
/// | A4 | `and` <-> `&` |
/// | A5 | `or` <-> `/` |
/// | B1 | `syndrome` <-> `synd` |
/// | B2 | `chronic` <-> `chr` |
/// | B3 | `acute` <-> `acu` |
/// | B4 | `left`/`right` <-> `lt`/`rt` |
/// | C1 | `due to` -> `because of` / `caused by` |
/// | C2 | `x, unspecified` -> `unspecified x` |
/// | P1 | parenthetical split |
pub fn builtin_rules() -> RuleResult<RuleSet> {
    RuleSet::new(vec![
        EnrichmentRule::new("A1", "Replace hyphens with spaces", vec![Transform::chars(DASHES, " ")])?
            .with_max_variants(1),
        EnrichmentRule::new("A2", "Remove hyphens", vec![Transform::chars(DASHES, "")])?.with_max_variants(1),
        EnrichmentRule::new("A3", "Remove apostrophes", vec![Transform::chars(APOSTROPHES, "")])?
            .with_max_variants(1),
        EnrichmentRule::new(
            "A4",
            "Swap 'and' <-> '&'",
            vec![Transform::phrase(" and ", " & "), Transform::phrase(" & ", " and ")],
        )?
        .with_max_variants(2),
        EnrichmentRule::new(
            "A5",
            "Swap 'or' <-> '/'",
            vec![Transform::phrase(" or ", " / "), Transform::phrase(" / ", " or ")],
        )?
        .with_max_variants(2),
        abbreviation("B1", "syndrome <-> synd", &[("syndrome", "synd")])?,
        abbreviation("B2", "chronic <-> chr", &[("chronic", "chr")])?,
        abbreviation("B3", "acute <-> acu", &[("acute", "acu")])?,
        abbreviation("B4", "left/right <-> lt/rt", &[("left", "lt"), ("right", "rt")])?,
        EnrichmentRule::new(
            "C1",
            "due to -> because of|caused by",
            vec![Transform::Substitute {
                pattern: r"\bdue\s+to\b".to_string(),
                replacements: vec!["because of".to_string(), "caused by".to_string()],
            }],
        )?
        .with_max_variants(2),
        EnrichmentRule::new(
            "C2",
            "suffix ', unspecified' -> prefix 'unspecified'",
            vec![Transform::SuffixToPrefix {
                suffix: ", unspecified".to_string(),
                prefix: "unspecified".to_string(),
            }],
        )?
        .with_max_variants(1),
        EnrichmentRule::new("P1", "Split parenthetical qualifier", vec![Transform::ParenthesisSplit])?
            .with_max_variants(3),
    ])
}

/// Bidirectional word abbreviations, registered as one directional
/// substitution per side under a single id.
fn abbreviation(id: &str, description: &str, pairs: &[(&str, &str)]) -> RuleResult<EnrichmentRule> {
    let mut transforms: Vec<Transform> = pairs.iter().map(|(full, abbr)| Transform::word(full, abbr)).collect();
    transforms.extend(pairs.iter().map(|(full, abbr)| Transform::word(abbr, full)));
    let max_variants = transforms.len();
    Ok(EnrichmentRule::new(id, description, transforms)?.with_max_variants(max_variants))
}

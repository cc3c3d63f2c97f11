//! Rule transforms
//!
//! The building blocks enrichment rules are made of. Each transform maps a
//! canonical term to zero or more candidate variants.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::transform::canonical::normalize_spaces;

/// Characters that attach to the preceding word after a group is removed.
const CLOSING_PUNCTUATION: [char; 7] = [',', ';', ':', '.', '!', '?', ')'];

/// First parenthetical group without nested parentheses.
static PARENTHETICAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^()]*)\)").expect("valid parenthetical regex"));

/// All available rule transforms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transform {
    /// Replace every listed character; fires only if one is present
    ReplaceChars {
        chars: String,
        #[serde(default)]
        with: String,
    },

    /// Replace a literal phrase everywhere; fires only if present
    ReplacePhrase {
        from: String,
        to: String,
    },

    /// Regex substitution, one candidate per replacement
    Substitute {
        pattern: String,
        replacements: Vec<String>,
    },

    /// Move a trailing qualifier to the front: "x, unspecified" -> "unspecified x"
    SuffixToPrefix {
        suffix: String,
        prefix: String,
    },

    /// Term, term without its first parenthetical, and the parenthetical alone
    ParenthesisSplit,
}

impl Transform {
    /// Whole-word substitution of `word` by `replacement`.
    pub fn word(word: &str, replacement: &str) -> Self {
        Transform::Substitute {
            pattern: format!(r"\b{}\b", regex::escape(word)),
            replacements: vec![replacement.to_string()],
        }
    }

    pub fn phrase(from: &str, to: &str) -> Self {
        Transform::ReplacePhrase {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn chars(chars: &str, with: &str) -> Self {
        Transform::ReplaceChars {
            chars: chars.to_string(),
            with: with.to_string(),
        }
    }

    /// Compile into an executable transform.
    pub fn compile(&self) -> Result<CompiledTransform, regex::Error> {
        let regex = match self {
            Transform::Substitute { pattern, .. } => Some(Regex::new(pattern)?),
            _ => None,
        };
        Ok(CompiledTransform {
            transform: self.clone(),
            regex,
        })
    }

    /// Whether the transform can ever produce a candidate.
    pub(crate) fn is_productive(&self) -> bool {
        match self {
            Transform::ReplaceChars { chars, .. } => !chars.is_empty(),
            Transform::ReplacePhrase { from, .. } => !from.is_empty(),
            Transform::Substitute { pattern, replacements } => !pattern.is_empty() && !replacements.is_empty(),
            Transform::SuffixToPrefix { suffix, .. } => !suffix.is_empty(),
            Transform::ParenthesisSplit => true,
        }
    }
}

/// A [`Transform`] with its regex compiled once.
#[derive(Debug, Clone)]
pub struct CompiledTransform {
    transform: Transform,
    regex: Option<Regex>,
}

impl CompiledTransform {
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Apply this transform to a canonical term
    pub fn apply(&self, term: &str) -> Vec<String> {
        match &self.transform {
            Transform::ReplaceChars { chars, with } => apply_replace_chars(term, chars, with),
            Transform::ReplacePhrase { from, to } => apply_replace_phrase(term, from, to),
            Transform::Substitute { replacements, .. } => match &self.regex {
                Some(re) => apply_substitute(term, re, replacements),
                None => Vec::new(),
            },
            Transform::SuffixToPrefix { suffix, prefix } => apply_suffix_to_prefix(term, suffix, prefix),
            Transform::ParenthesisSplit => apply_parenthesis_split(term),
        }
    }
}

fn apply_replace_chars(term: &str, chars: &str, with: &str) -> Vec<String> {
    if !term.contains(|c: char| chars.contains(c)) {
        return Vec::new();
    }
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if chars.contains(c) {
            out.push_str(with);
        } else {
            out.push(c);
        }
    }
    vec![out]
}

fn apply_replace_phrase(term: &str, from: &str, to: &str) -> Vec<String> {
    if from.is_empty() || !term.contains(from) {
        return Vec::new();
    }
    vec![term.replace(from, to)]
}

fn apply_substitute(term: &str, re: &Regex, replacements: &[String]) -> Vec<String> {
    if !re.is_match(term) {
        return Vec::new();
    }
    replacements
        .iter()
        .map(|replacement| re.replace_all(term, replacement.as_str()).into_owned())
        .collect()
}

fn apply_suffix_to_prefix(term: &str, suffix: &str, prefix: &str) -> Vec<String> {
    let Some(stem) = term.strip_suffix(suffix) else {
        return Vec::new();
    };
    let stem = stem.trim_end();
    let stem = stem.strip_suffix(',').unwrap_or(stem).trim_end();
    if stem.is_empty() {
        return Vec::new();
    }
    vec![format!("{} {}", prefix.trim_end(), stem)]
}

fn apply_parenthesis_split(term: &str) -> Vec<String> {
    let Some(caps) = PARENTHETICAL_RE.captures(term) else {
        return Vec::new();
    };
    let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
        return Vec::new();
    };

    let left = term[..whole.start()].trim_end();
    let right = term[whole.end()..].trim_start();
    let joined = match right.chars().next() {
        Some(c) if !left.is_empty() && !CLOSING_PUNCTUATION.contains(&c) => format!("{} {}", left, right),
        _ => format!("{}{}", left, right),
    };

    vec![
        term.to_string(),
        normalize_spaces(&joined),
        normalize_spaces(inner.as_str()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(transform: Transform, term: &str) -> Vec<String> {
        transform.compile().unwrap().apply(term)
    }

    #[test]
    fn test_replace_chars() {
        assert_eq!(run(Transform::chars("-–—", " "), "b-cell"), vec!["b cell"]);
        assert_eq!(run(Transform::chars("-–—", ""), "b–cell"), vec!["bcell"]);
        assert!(run(Transform::chars("-–—", " "), "t cell").is_empty());
    }

    #[test]
    fn test_replace_phrase() {
        assert_eq!(
            run(Transform::phrase(" and ", " & "), "nausea and vomiting"),
            vec!["nausea & vomiting"]
        );
        assert!(run(Transform::phrase(" and ", " & "), "andes virus").is_empty());
    }

    #[test]
    fn test_word_boundaries() {
        assert_eq!(run(Transform::word("synd", "syndrome"), "down synd"), vec!["down syndrome"]);
        assert!(run(Transform::word("synd", "syndrome"), "down syndrome").is_empty());
        assert!(run(Transform::word("rt", "right"), "heart failure").is_empty());
    }

    #[test]
    fn test_substitute_multiple_replacements() {
        let t = Transform::Substitute {
            pattern: r"\bdue\s+to\b".into(),
            replacements: vec!["because of".into(), "caused by".into()],
        };
        assert_eq!(
            run(t, "anemia due to blood loss"),
            vec!["anemia because of blood loss", "anemia caused by blood loss"]
        );
    }

    #[test]
    fn test_suffix_to_prefix() {
        let t = Transform::SuffixToPrefix {
            suffix: ", unspecified".into(),
            prefix: "unspecified".into(),
        };
        assert_eq!(run(t.clone(), "pain, unspecified"), vec!["unspecified pain"]);
        assert!(run(t.clone(), ", unspecified").is_empty());
        assert!(run(t, "unspecified pain").is_empty());
    }

    #[test]
    fn test_parenthesis_split() {
        assert_eq!(
            run(Transform::ParenthesisSplit, "diabetes (type 2)"),
            vec!["diabetes (type 2)", "diabetes", "type 2"]
        );
        assert_eq!(
            run(Transform::ParenthesisSplit, "fracture ( left ) of femur"),
            vec!["fracture ( left ) of femur", "fracture of femur", "left"]
        );
        assert_eq!(
            run(Transform::ParenthesisSplit, "otitis (acute), right ear"),
            vec!["otitis (acute), right ear", "otitis, right ear", "acute"]
        );
        assert!(run(Transform::ParenthesisSplit, "no group here").is_empty());
        assert!(run(Transform::ParenthesisSplit, "unbalanced (group").is_empty());
    }

    #[test]
    fn test_parenthesis_split_keeps_space_before_symbols() {
        let removed = |term: &str| run(Transform::ParenthesisSplit, term)[1].clone();
        assert_eq!(removed("a (b) (c)"), "a (c)");
        assert_eq!(removed("nausea (severe) & vomiting"), "nausea & vomiting");
        assert_eq!(removed("fracture (left) - healed"), "fracture - healed");
        assert_eq!(removed("cyst (simple) / abscess"), "cyst / abscess");
        assert_eq!(removed("pain (left); chronic"), "pain; chronic");
        assert_eq!(removed("(left) knee"), "knee");
    }

    #[test]
    fn test_parenthesis_split_first_group_only() {
        let out = run(Transform::ParenthesisSplit, "a (b) c (d)");
        assert_eq!(out, vec!["a (b) c (d)", "a c (d)", "b"]);
    }

    #[test]
    fn test_invalid_pattern() {
        let t = Transform::Substitute {
            pattern: "(".into(),
            replacements: vec!["x".into()],
        };
        assert!(t.compile().is_err());
    }

    #[test]
    fn test_transform_json_shape() {
        let json = r#"{"type": "replace_phrase", "from": " w/ ", "to": " with "}"#;
        let t: Transform = serde_json::from_str(json).unwrap();
        assert_eq!(t, Transform::phrase(" w/ ", " with "));
    }
}

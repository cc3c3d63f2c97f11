//! Canonical term form: the stable input to enrichment rules.

/// Trailing punctuation removed by [`canonicalize`].
pub const TRAILING_PUNCTUATION: [char; 6] = ['.', '!', '?', ',', ';', ':'];

/// Canonicalize a term.
///
/// 1. lowercase
/// 2. trim and collapse whitespace runs to a single space
/// 3. strip trailing `. ! ? , ; :` (any number, mixed)
///
/// Returns `None` when nothing is left.
///
/// ```
/// use icd10cm::canonicalize;
///
/// assert_eq!(canonicalize("  Cholera,  UNSPECIFIED;. ").as_deref(), Some("cholera, unspecified"));
/// assert_eq!(canonicalize(" .. "), None);
/// ```
pub fn canonicalize(term: &str) -> Option<String> {
    let lowered = term.to_lowercase();
    let collapsed = normalize_spaces(&lowered);
    let stripped = collapsed.trim_end_matches(|c: char| TRAILING_PUNCTUATION.contains(&c) || c.is_whitespace());

    if stripped.is_empty() {
        None
    } else {
        Some(stripped.to_string())
    }
}

/// Trim and collapse every whitespace run to one space.
pub fn normalize_spaces(term: &str) -> String {
    term.split_whitespace().collect::<Vec<_>>().join(" ")
}

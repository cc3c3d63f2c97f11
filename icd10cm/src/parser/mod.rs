//! Fixed-width parser for the CMS `icd10cm_order_YYYY.txt` file.
//!
//! Each line has the layout:
//!
//! ```text
//! 00001 A00     0 Cholera                                                      Cholera
//! ^     ^       ^ ^                                                           ^
//! 0     6       14 16                                                         76
//! order code    flag short description (60 chars)                             long description
//! ```
//!
//! Columns are sliced by character position. Splitting on whitespace is not
//! an option: a short description that fills its 60-character field is
//! followed by a single space before the long description.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;

use crate::error::{InputError, InputResult, ParseError, ParseResult};
use crate::models::Record;

const ORDER_COLUMNS: Range<usize> = 0..5;
const CODE_COLUMNS: Range<usize> = 6..13;
const FLAG_COLUMN: usize = 14;
const SHORT_DESC_COLUMNS: Range<usize> = 16..76;
const LONG_DESC_START: usize = 76;

/// Shortest line the fixed-width layout can describe. A line that ends at
/// the long description column has an empty long description.
pub const MIN_LINE_WIDTH: usize = LONG_DESC_START;

/// `order code flag short<2+ spaces>long`
static SPACED_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<order>\d{5})\s+(?P<code>\S+)\s+(?P<flag>[01])\s+(?P<short>.*?)\s{2,}(?P<long>.*?)\s*$")
        .expect("valid spaced line regex")
});

/// `order code flag rest`, rest used for both descriptions.
static REST_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<order>\d{5})\s+(?P<code>\S+)\s+(?P<flag>[01])\s+(?P<rest>.*)$")
        .expect("valid rest line regex")
});

/// How tolerant [`parse_line`] is of lines that do not fit the fixed layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Fixed-width slicing only; anything else is malformed.
    #[default]
    Strict,
    /// Fall back to whitespace-delimited layouts when slicing fails.
    Lenient,
}

/// Parse one line of the order file.
///
/// # Example
/// ```
/// use icd10cm::parser::{parse_line, ParseMode};
///
/// let line = "00001 A00     0 Cholera                                                      Cholera";
/// let record = parse_line(line, ParseMode::Strict).unwrap();
/// assert_eq!(record.code, "A00");
/// assert!(!record.leaf);
/// ```
pub fn parse_line(line: &str, mode: ParseMode) -> ParseResult<Record> {
    let raw = line.trim_end_matches(['\r', '\n']);
    if raw.trim().is_empty() {
        return Err(ParseError::Blank);
    }

    match parse_fixed_width(raw) {
        Ok(record) => Ok(record),
        Err(err) if mode == ParseMode::Lenient => parse_spaced(raw).ok_or(err),
        Err(err) => Err(err),
    }
}

fn parse_fixed_width(raw: &str) -> ParseResult<Record> {
    let len = raw.chars().count();
    if len < MIN_LINE_WIDTH {
        return Err(ParseError::TooShort {
            len,
            min: MIN_LINE_WIDTH,
        });
    }

    let order_field = char_slice(raw, ORDER_COLUMNS);
    if !order_field.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseError::InvalidOrder(order_field.to_string()));
    }
    let order = order_field
        .parse::<u32>()
        .map_err(|_| ParseError::InvalidOrder(order_field.to_string()))?;

    let flag_field = char_slice(raw, FLAG_COLUMN..FLAG_COLUMN + 1);
    let leaf = parse_flag(flag_field)?;

    let code = char_slice(raw, CODE_COLUMNS).trim();
    if code.is_empty() {
        return Err(ParseError::EmptyCode);
    }

    let short = char_slice(raw, SHORT_DESC_COLUMNS).trim();
    let long = char_slice(raw, LONG_DESC_START..len).trim();

    build_record(order, code, leaf, short, long)
}

fn parse_spaced(raw: &str) -> Option<Record> {
    if let Some(caps) = SPACED_LINE_RE.captures(raw) {
        let order = caps["order"].parse().ok()?;
        let leaf = parse_flag(&caps["flag"]).ok()?;
        return build_record(order, &caps["code"], leaf, caps["short"].trim(), caps["long"].trim()).ok();
    }

    let caps = REST_LINE_RE.captures(raw)?;
    let order = caps["order"].parse().ok()?;
    let leaf = parse_flag(&caps["flag"]).ok()?;
    let rest = caps["rest"].trim();
    build_record(order, &caps["code"], leaf, rest, rest).ok()
}

fn parse_flag(field: &str) -> ParseResult<bool> {
    match field {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(ParseError::InvalidFlag(other.to_string())),
    }
}

fn build_record(order: u32, code: &str, leaf: bool, short: &str, long: &str) -> ParseResult<Record> {
    if long.is_empty() && short.is_empty() {
        return Err(ParseError::EmptyDescription(code.to_string()));
    }
    let long = if long.is_empty() { short } else { long };

    Ok(Record {
        order,
        code: code.to_string(),
        leaf,
        short_description: short.to_string(),
        long_description: long.to_string(),
    })
}

/// Slice by character positions, clamped to the line.
fn char_slice(s: &str, range: Range<usize>) -> &str {
    let byte_at = |idx: usize| s.char_indices().nth(idx).map(|(b, _)| b).unwrap_or(s.len());
    let start = byte_at(range.start);
    let end = byte_at(range.end).max(start);
    &s[start..end]
}

// =============================================================================
// Input decoding
// =============================================================================

/// Decoded input file with metadata.
#[derive(Debug, Clone)]
pub struct DecodedInput {
    /// Full decoded text.
    pub content: String,
    /// Detected or used encoding.
    pub encoding: String,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes using the specified encoding, replacing invalid sequences.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match encoding.to_lowercase().as_str() {
        // windows-1252 agrees with Latin-1 on 0xA0..=0xFF
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Decode raw bytes with encoding auto-detection.
pub fn decode_bytes_auto(bytes: &[u8]) -> DecodedInput {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    DecodedInput { content, encoding }
}

/// Read and decode an order file. An empty file decodes to no lines.
pub fn read_input_file<P: AsRef<Path>>(path: P) -> InputResult<DecodedInput> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(InputError::NotFound(path.display().to_string()));
    }
    let bytes = std::fs::read(path)?;
    if bytes.is_empty() {
        return Ok(DecodedInput {
            content: String::new(),
            encoding: "utf-8".to_string(),
        });
    }
    Ok(decode_bytes_auto(&bytes))
}

/// Parse every line of a decoded file, keeping 1-based line numbers.
///
/// Blank lines are dropped silently; other failures are returned in place so
/// the caller can apply its own policy.
pub fn parse_lines(content: &str, mode: ParseMode) -> Vec<(usize, ParseResult<Record>)> {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, parse_line(line, mode)))
        .filter(|(_, result)| !matches!(result, Err(ParseError::Blank)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHOLERA: &str =
        "00001 A00     0 Cholera                                                      Cholera";

    fn fixed_line(order: &str, code: &str, flag: &str, short: &str, long: &str) -> String {
        format!("{:<5} {:<7} {} {:<60}{}", order, code, flag, short, long)
    }

    #[test]
    fn test_cholera_example() {
        let record = parse_line(CHOLERA, ParseMode::Strict).unwrap();
        assert_eq!(record.order, 1);
        assert_eq!(record.code, "A00");
        assert!(!record.leaf);
        assert_eq!(record.short_description, "Cholera");
        assert_eq!(record.long_description, "Cholera");
    }

    #[test]
    fn test_full_short_description_single_space() {
        let short = "Cholera due to Vibrio cholerae 01, biovar cholerae, unspec.";
        let short = format!("{:<59}X", short);
        assert_eq!(short.chars().count(), 60);
        let line = format!("00002 A000    1 {} Cholera due to Vibrio cholerae 01, biovar cholerae", short);

        let record = parse_line(&line, ParseMode::Strict).unwrap();
        assert!(record.leaf);
        assert_eq!(record.code, "A000");
        assert_eq!(record.short_description, short.trim());
        assert_eq!(record.long_description, "Cholera due to Vibrio cholerae 01, biovar cholerae");
    }

    #[test]
    fn test_internal_whitespace_preserved() {
        let line = fixed_line("00010", "A011", "1", "Paratyphoid  fever A", "Paratyphoid  fever A");
        let record = parse_line(&line, ParseMode::Strict).unwrap();
        assert_eq!(record.long_description, "Paratyphoid  fever A");
    }

    #[test]
    fn test_crlf_stripped() {
        let line = format!("{}\r\n", CHOLERA);
        let record = parse_line(&line, ParseMode::Strict).unwrap();
        assert_eq!(record.long_description, "Cholera");
    }

    #[test]
    fn test_short_line_strict_fails() {
        let result = parse_line("00001 A00     0 Cholera", ParseMode::Strict);
        assert!(matches!(result, Err(ParseError::TooShort { len: 23, min: 76 })));
    }

    #[test]
    fn test_short_line_lenient_recovers() {
        let record = parse_line("00001 A00     0 Cholera", ParseMode::Lenient).unwrap();
        assert_eq!(record.code, "A00");
        assert_eq!(record.short_description, "Cholera");
        assert_eq!(record.long_description, "Cholera");

        let record = parse_line("00003 A001 1 Cholera, unsp    Cholera, unspecified", ParseMode::Lenient).unwrap();
        assert_eq!(record.short_description, "Cholera, unsp");
        assert_eq!(record.long_description, "Cholera, unspecified");
    }

    #[test]
    fn test_invalid_order() {
        let line = fixed_line("0A001", "A00", "0", "Cholera", "Cholera");
        assert!(matches!(
            parse_line(&line, ParseMode::Strict),
            Err(ParseError::InvalidOrder(_))
        ));
    }

    #[test]
    fn test_invalid_flag() {
        let line = fixed_line("00001", "A00", "7", "Cholera", "Cholera");
        assert_eq!(
            parse_line(&line, ParseMode::Strict),
            Err(ParseError::InvalidFlag("7".into()))
        );
        // Lenient mode cannot rescue a bad flag either
        assert!(parse_line(&line, ParseMode::Lenient).is_err());
    }

    #[test]
    fn test_empty_code() {
        let line = fixed_line("00001", "", "0", "Cholera", "Cholera");
        assert_eq!(parse_line(&line, ParseMode::Strict), Err(ParseError::EmptyCode));
    }

    #[test]
    fn test_blank_long_falls_back_to_short() {
        let line = format!("{}   ", fixed_line("00001", "A00", "0", "Cholera", ""));
        let record = parse_line(&line, ParseMode::Strict).unwrap();
        assert_eq!(record.long_description, "Cholera");
    }

    #[test]
    fn test_line_ending_at_long_column() {
        let line = fixed_line("00001", "A00", "0", "Cholera", "");
        assert_eq!(line.chars().count(), 76);
        let record = parse_line(&line, ParseMode::Strict).unwrap();
        assert_eq!(record.short_description, "Cholera");
        assert_eq!(record.long_description, "Cholera");

        let truncated = &line[..75];
        assert!(matches!(
            parse_line(truncated, ParseMode::Strict),
            Err(ParseError::TooShort { len: 75, min: 76 })
        ));
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(parse_line("   \r\n", ParseMode::Strict), Err(ParseError::Blank));
    }

    #[test]
    fn test_non_ascii_slices_by_character() {
        let line = fixed_line("00005", "A02", "0", "Salmonella infection – other", "Other salmonella infections");
        let record = parse_line(&line, ParseMode::Strict).unwrap();
        assert_eq!(record.short_description, "Salmonella infection – other");
        assert_eq!(record.long_description, "Other salmonella infections");
    }

    #[test]
    fn test_parse_lines_numbers_and_skips_blank() {
        let content = format!("{}\n\nnot a record\n", CHOLERA);
        let parsed = parse_lines(&content, ParseMode::Strict);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].0, 1);
        assert!(parsed[0].1.is_ok());
        assert_eq!(parsed[1].0, 3);
        assert!(parsed[1].1.is_err());
    }

    #[test]
    fn test_decode_strips_bom() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice(CHOLERA.as_bytes());
        let decoded = decode_bytes_auto(&bytes);
        assert!(decoded.content.starts_with("00001"));
    }

    #[test]
    fn test_latin1_decoding() {
        // "Sjögren" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6A, 0xF6, 0x67, 0x72, 0x65, 0x6E];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Sjögren");

        // Bytes where ISO-8859-15 differs from Latin-1
        let bytes: &[u8] = &[0xBD, 0xA4, 0xBC];
        assert_eq!(decode_content(bytes, "iso-8859-1"), "½¤¼");
    }

    #[test]
    fn test_read_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let decoded = read_input_file(file.path()).unwrap();
        assert!(decoded.content.is_empty());
        assert!(parse_lines(&decoded.content, ParseMode::Strict).is_empty());
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_input_file("/definitely/not/here.txt");
        assert!(matches!(result, Err(InputError::NotFound(_))));
    }
}

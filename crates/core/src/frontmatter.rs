//! YAML frontmatter extraction and validation.
//!
//! Slide documents open with a `---`-delimited YAML block. The deck
//! driver only needs its line boundary (the block passes through
//! verbatim); the poster pipeline parses and validates it.

use serde_json::Value as JsonValue;

use crate::error::FrontmatterError;

/// Result returned after extracting frontmatter from a document.
#[derive(Debug)]
pub struct FrontmatterExtraction {
    /// Parsed frontmatter as a JSON value.
    pub value: JsonValue,
    /// Byte offset inside the original document where the body begins.
    pub body_start: usize,
}

impl FrontmatterExtraction {
    fn empty() -> Self {
        Self {
            value: JsonValue::Object(Default::default()),
            body_start: 0,
        }
    }
}

/// Extract YAML frontmatter from an input document.
///
/// Documents without a leading fence yield an empty mapping with a body
/// starting at offset zero.
pub fn extract_frontmatter(input: &str) -> Result<FrontmatterExtraction, FrontmatterError> {
    match find_yaml_block(input)? {
        Some((block, body_start)) => {
            let value = parse_yaml_block(&block)?;
            Ok(FrontmatterExtraction { value, body_start })
        }
        None => Ok(FrontmatterExtraction::empty()),
    }
}

/// Index of the line closing the frontmatter block, given the document as
/// lines. Returns `None` when the document does not open with a fence.
pub fn frontmatter_end_line(lines: &[&str]) -> Option<usize> {
    // The opening fence must be the first non-blank line; later `---`
    // lines are slide separators, not a frontmatter block.
    let open = lines
        .iter()
        .position(|line| !line.trim().is_empty())
        .filter(|&idx| lines[idx].trim() == "---")?;
    lines[open + 1..]
        .iter()
        .position(|line| line.trim() == "---")
        .map(|offset| open + 1 + offset)
}

/// Validated frontmatter for a poster document.
#[derive(Debug, Clone)]
pub struct PosterFrontmatter {
    /// Theme name; must reference a poster theme.
    pub theme: String,
    /// Page size token (`A0`, `A1`, `36x48`, ...).
    pub size: String,
    /// Poster title, empty when absent.
    pub title: String,
    /// Author list, possibly empty.
    pub authors: Vec<String>,
}

const VALID_POSTER_SIZES: &[&str] = &["A0", "A0-landscape", "A1", "36x48", "48x36"];

/// Parse and validate poster frontmatter.
///
/// Requires `marp: true`, a theme containing "poster", and a size from
/// the known set or a `WxH` inch pattern.
pub fn parse_poster_frontmatter(input: &str) -> Result<PosterFrontmatter, FrontmatterError> {
    let extraction = extract_frontmatter(input)?;
    if extraction.body_start == 0 {
        return Err(FrontmatterError::Invalid(
            "Missing or malformed YAML frontmatter (expected --- delimiters)".into(),
        ));
    }
    let fm = &extraction.value;

    if !fm.get("marp").and_then(JsonValue::as_bool).unwrap_or(false) {
        return Err(FrontmatterError::Invalid(
            "Frontmatter must contain 'marp: true'".into(),
        ));
    }

    let theme = fm
        .get("theme")
        .and_then(JsonValue::as_str)
        .unwrap_or("")
        .to_string();
    if !theme.contains("poster") {
        return Err(FrontmatterError::Invalid(format!(
            "Theme must contain 'poster', got '{theme}'"
        )));
    }

    let size = match fm.get("size") {
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "A0".to_string(),
    };
    if !VALID_POSTER_SIZES.contains(&size.as_str()) && !is_dimension_pair(&size) {
        return Err(FrontmatterError::Invalid(format!(
            "Invalid size '{size}'. Must be one of {VALID_POSTER_SIZES:?} or WxH pattern (e.g. '36x48')"
        )));
    }

    let title = fm
        .get("title")
        .and_then(JsonValue::as_str)
        .unwrap_or("")
        .to_string();
    let authors = fm
        .get("authors")
        .and_then(JsonValue::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(JsonValue::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(PosterFrontmatter {
        theme,
        size,
        title,
        authors,
    })
}

fn is_dimension_pair(size: &str) -> bool {
    let mut parts = size.splitn(2, 'x');
    match (parts.next(), parts.next()) {
        (Some(w), Some(h)) => {
            !w.is_empty()
                && !h.is_empty()
                && w.bytes().all(|b| b.is_ascii_digit())
                && h.bytes().all(|b| b.is_ascii_digit())
        }
        _ => false,
    }
}

fn parse_yaml_block(block: &str) -> Result<JsonValue, FrontmatterError> {
    if block.trim().is_empty() {
        return Ok(JsonValue::Object(Default::default()));
    }

    let yaml_value: serde_yaml::Value =
        serde_yaml::from_str(block).map_err(|err| FrontmatterError::Parse(err.to_string()))?;
    let json_value =
        serde_json::to_value(yaml_value).map_err(|err| FrontmatterError::Parse(err.to_string()))?;

    match json_value {
        JsonValue::Null => Ok(JsonValue::Object(Default::default())),
        JsonValue::Object(_) => Ok(json_value),
        _ => Err(FrontmatterError::InvalidRootType),
    }
}

fn find_yaml_block(input: &str) -> Result<Option<(String, usize)>, FrontmatterError> {
    let mut cursor = 0usize;

    // The opening fence must be the first non-blank line.
    loop {
        match next_line(input, cursor) {
            Some((line, next_cursor)) => {
                if line.trim().is_empty() {
                    cursor = next_cursor;
                    continue;
                }
                if line.trim_end_matches('\r') != "---" {
                    return Ok(None);
                }

                let block_start = next_cursor;
                let mut scan_cursor = next_cursor;

                loop {
                    match next_line(input, scan_cursor) {
                        Some((block_line, next_line_cursor)) => {
                            if block_line.trim_end_matches('\r') == "---" {
                                let raw_block = &input[block_start..scan_cursor];
                                let trimmed = raw_block.trim_end_matches(['\r', '\n']);
                                return Ok(Some((trimmed.to_string(), next_line_cursor)));
                            }
                            scan_cursor = next_line_cursor;
                        }
                        None => return Err(FrontmatterError::Unterminated),
                    }
                }
            }
            None => return Ok(None),
        }
    }
}

fn next_line(input: &str, start: usize) -> Option<(&str, usize)> {
    if start >= input.len() {
        return None;
    }

    let bytes = &input.as_bytes()[start..];
    if let Some(pos) = bytes.iter().position(|b| *b == b'\n') {
        let line_end = start + pos;
        Some((&input[start..line_end], line_end + 1))
    } else {
        Some((&input[start..], input.len()))
    }
}

//! Enclosing callout-box detection.
//!
//! When a split point sits inside an unclosed `<div class="...-box">`,
//! each continuation slide must reopen and close that container. Rather
//! than parse HTML, we scan backward through the lines already emitted,
//! balancing `</div>` against `<div ...>`: a closing tag marks a box that
//! is already finished relative to the split point, so the matching
//! opener is skipped. The first unbalanced opener decides the outcome.

use once_cell::sync::Lazy;
use regex::Regex;

/// How many emitted lines to look back through. Callout boxes are short;
/// anything further back cannot plausibly still enclose the split point.
const SCAN_WINDOW: usize = 30;

static BOX_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"class="[^"]*\b\w+-box\b"#).expect("box class pattern"));

/// Scan backward from `from_idx` (exclusive) for an unclosed callout box.
///
/// Returns the opening `<div ...>` line verbatim when the split point is
/// inside a callout box. Stops at a slide separator (a box never spans
/// slides) and resolves any ambiguity to `None`: a still-open div that is
/// not a callout box blocks attribution rather than guessing.
pub fn detect_enclosing_box(emitted: &[String], from_idx: usize) -> Option<String> {
    let stop = from_idx.saturating_sub(SCAN_WINDOW);
    let mut div_depth = 0usize;

    for idx in (stop..from_idx).rev() {
        let stripped = emitted[idx].trim();
        if stripped == "---" {
            return None;
        }
        if stripped == "</div>" {
            div_depth += 1;
        } else if stripped.starts_with("<div ") || stripped == "<div>" {
            if div_depth > 0 {
                div_depth -= 1;
            } else if BOX_CLASS.is_match(stripped) {
                return Some(stripped.to_string());
            } else {
                return None;
            }
        }
    }
    None
}

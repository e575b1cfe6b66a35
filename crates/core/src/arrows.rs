//! Arrow shorthand substitution.
//!
//! Authors write `--[80]->` or `--[lg]->` in prose to get a themed SVG
//! arrow. Plain `-->` is left alone since it collides with markdown and
//! code syntax; the bracket form is the explicit opt-in.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static ARROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"--\[([^\]]*)\]->").expect("arrow pattern"));

const SIZE_VARIANTS: &[&str] = &["sm", "md", "lg", "xl"];
const DIRECTIONS: &[&str] = &["up", "down", "left"];
const COLORS: &[&str] = &["gray", "light"];

/// Replace arrow shorthand in one line, returning the rewritten line and
/// the number of arrows replaced.
pub fn rewrite_arrows(line: &str) -> (Cow<'_, str>, usize) {
    if !line.contains("--[") {
        return (Cow::Borrowed(line), 0);
    }

    let mut count = 0usize;
    let rewritten = ARROW.replace_all(line, |caps: &Captures<'_>| {
        count += 1;
        render_arrow(&caps[1])
    });
    (rewritten, count)
}

fn render_arrow(spec: &str) -> String {
    let mut classes = vec!["svg-arrow".to_string()];
    let mut style = String::new();

    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if part.bytes().all(|b| b.is_ascii_digit()) {
            style = format!("--arrow-width: {part}px;");
        } else if SIZE_VARIANTS.contains(&part) || DIRECTIONS.contains(&part) || COLORS.contains(&part)
        {
            classes.push(format!("svg-arrow-{part}"));
        } else if part.contains("px") || part.contains("em") || part.contains("rem") {
            style = format!("--arrow-width: {part};");
        } else {
            // Unrecognized token: pass through as a custom class.
            classes.push(part.to_string());
        }
    }

    let class_str = classes.join(" ");
    if style.is_empty() {
        format!("<span class=\"{class_str}\"></span>")
    } else {
        format!("<span class=\"{class_str}\" style=\"{style}\"></span>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_width_becomes_style() {
        let (out, n) = rewrite_arrows("A --[90]-> B");
        assert_eq!(n, 1);
        assert!(out.contains("class=\"svg-arrow\""));
        assert!(out.contains("--arrow-width: 90px;"));
        assert!(out.starts_with("A "));
        assert!(out.ends_with(" B"));
    }

    #[test]
    fn preset_width_is_still_a_pixel_style() {
        let (out, _) = rewrite_arrows("--[80]->");
        assert!(out.contains("--arrow-width: 80px;"));
    }

    #[test]
    fn named_size_variant() {
        let (out, _) = rewrite_arrows("X --[lg]-> Y");
        assert!(out.contains("svg-arrow-lg"));
    }

    #[test]
    fn direction_variant() {
        let (out, _) = rewrite_arrows("--[up]->");
        assert!(out.contains("svg-arrow-up"));
    }

    #[test]
    fn width_with_units() {
        let (out, _) = rewrite_arrows("--[3em]->");
        assert!(out.contains("--arrow-width: 3em;"));
    }

    #[test]
    fn combined_spec() {
        let (out, _) = rewrite_arrows("--[90,lg]->");
        assert!(out.contains("svg-arrow-lg"));
        assert!(out.contains("--arrow-width: 90px;"));
    }

    #[test]
    fn plain_arrows_untouched() {
        let line = "Just some text with --> plain arrow";
        let (out, n) = rewrite_arrows(line);
        assert_eq!(n, 0);
        assert_eq!(out, line);
    }

    #[test]
    fn multiple_arrows_in_one_line() {
        let (out, n) = rewrite_arrows("A --[sm]-> B --[xl]-> C");
        assert_eq!(n, 2);
        assert!(out.contains("svg-arrow-sm"));
        assert!(out.contains("svg-arrow-xl"));
    }

    #[test]
    fn empty_spec_gives_default_arrow() {
        let (out, n) = rewrite_arrows("--[]->");
        assert_eq!(n, 1);
        assert_eq!(out, "<span class=\"svg-arrow\"></span>");
    }
}

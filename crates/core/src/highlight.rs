//! Per-line syntax highlighting.
//!
//! Code blocks are re-emitted one `<span>` per source line so line
//! numbers survive splitting; each line is highlighted independently.
//! Output uses `hl-`-prefixed CSS classes so the theme controls colors.
//! An unknown language tag, or any highlighter failure, degrades to
//! plain escaped text.

use once_cell::sync::Lazy;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

/// Highlight a single line of code as HTML.
///
/// Blank and whitespace-only lines are returned escaped without invoking
/// the highlighter, matching the surrounding markup's expectations.
pub fn highlight_code_line(code_line: &str, lang: &str) -> String {
    if code_line.trim().is_empty() {
        return escape(code_line);
    }

    let syntax = if lang.is_empty() {
        None
    } else {
        SYNTAX_SET
            .find_syntax_by_token(lang)
            .or_else(|| SYNTAX_SET.find_syntax_by_extension(lang))
    };

    let Some(syntax) = syntax else {
        return escape(code_line);
    };

    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAX_SET, CLASS_STYLE);
    let mut with_newline = String::with_capacity(code_line.len() + 1);
    with_newline.push_str(code_line);
    with_newline.push('\n');

    match generator.parse_html_for_line_which_includes_newline(&with_newline) {
        Ok(()) => {
            let html = generator.finalize();
            html.trim_end_matches('\n').to_string()
        }
        Err(err) => {
            log::debug!("highlighter failed for lang {lang:?}: {err}");
            escape(code_line)
        }
    }
}

fn escape(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

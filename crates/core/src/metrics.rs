//! Slide content analysis for compile-time scaling decisions.
//!
//! One slide's raw markdown is reduced to a feature vector and a scalar
//! height estimate. The analyzer is a pure function; nothing here looks
//! outside the slide text it is given.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{HeightModel, TWO_COLUMN_DISCOUNT_MANY, TWO_COLUMN_DISCOUNT_PAIR};
use crate::scale::ScaleClass;

pub(crate) static CALLOUT_BOX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<div\s+class="([^"]*(?:note|warning|tip|example|definition|important|callout)[^"]*)""#)
        .expect("callout pattern")
});
static FLEX_CONTAINER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<div[^>]*style="[^"]*display:\s*flex[^"]*""#).expect("flex pattern"));
static CODE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```\w*\n(.*?)```").expect("code block pattern"));
static TABLE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\|.*\|$").expect("table pattern"));
pub(crate) static SCALE_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!--\s*_class:\s*[^>]*scale-\d+[^>]*\s*-->").expect("scale pattern"));
static SCALE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"scale-\d+").expect("scale token"));
static NO_AUTOSCALE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<!--\s*no-autoscale\s*-->").expect("no-autoscale pattern"));
static EMOJI_FIGURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<div\s+class="emoji-figure""#).expect("emoji figure pattern"));
static FLOW_DIAGRAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```flow\n.*?```").expect("flow pattern"));
static BULLET_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*[-*+]\s").expect("bullet"));
static NUMBERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*\d+\.\s").expect("numbered"));
static H1_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#\s+").expect("h1"));
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("html tag"));
static FENCED_ANY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").expect("fenced"));

/// Callout-box class suffixes checked by the table-in-callout heuristic.
const CALLOUT_CLASS_NAMES: &[&str] = &[
    "note-box",
    "warning-box",
    "tip-box",
    "example-box",
    "definition-box",
];

/// Forward character window used by the table-in-callout heuristic. A
/// deliberately loose substring check, not nesting-aware.
const TABLE_IN_CALLOUT_WINDOW: usize = 2000;

/// Feature vector and height estimate for one slide.
#[derive(Debug, Clone, Default)]
pub struct SlideMetrics {
    /// Slide already carries an explicit scale-class directive.
    pub has_scale_class: bool,
    /// The explicit scale class, when parseable.
    pub existing_scale_class: Option<ScaleClass>,
    /// Slide opted out of auto-scaling.
    pub no_autoscale: bool,
    /// Number of callout boxes in the slide.
    pub callout_count: usize,
    /// Class attributes of the callout boxes found.
    pub callout_types: Vec<String>,
    /// A flex container suggests a side-by-side column layout.
    pub has_two_column: bool,
    /// An H1 title line is present.
    pub has_title: bool,
    /// At least one complete fenced code block.
    pub has_code_block: bool,
    /// Code lines summed across all fenced blocks.
    pub code_block_lines: usize,
    /// At least one pipe-table line pair.
    pub has_table: bool,
    /// Table data rows (total table lines minus header and separator).
    pub table_rows: usize,
    /// Heuristic: a table sits inside a callout box.
    pub table_in_callout: bool,
    /// An emoji-figure block is present.
    pub has_emoji_figure: bool,
    /// Number of emoji-figure columns.
    pub emoji_columns: usize,
    /// A flow-diagram block is present.
    pub has_flow_diagram: bool,
    /// Bulleted plus numbered list items.
    pub list_items: usize,
    /// Visible text length with HTML tags and fenced code stripped.
    pub text_length: usize,
    /// Estimated content height in model units.
    pub estimated_height: f64,
    /// Advisory overflow findings for this slide.
    pub overflow_warnings: Vec<String>,
}

impl SlideMetrics {
    /// Height of everything except code lines and the table-in-callout
    /// penalty: title, callouts and lists (with the two-column discount),
    /// table, body text, and special figures. This is the "other content"
    /// the code-line budget computation subtracts from the slide budget.
    pub fn base_height(&self, model: &HeightModel) -> f64 {
        let mut height = 0.0;
        if self.has_title {
            height += model.h1;
        }

        let mut callout_height = self.callout_count as f64 * model.callout_box_base;
        let mut list_height = self.list_items as f64 * model.list_item;

        // Side-by-side regions share vertical space; sum overshoots, so
        // approximate max(col1, col2) with a discounted sum.
        if self.has_two_column && self.callout_count >= 2 {
            let multiplier = if self.callout_count == 2 {
                TWO_COLUMN_DISCOUNT_PAIR
            } else {
                TWO_COLUMN_DISCOUNT_MANY
            };
            callout_height *= multiplier;
            list_height *= multiplier;
            height += model.flex_container_overhead;
        }
        height += callout_height + list_height;

        if self.has_table {
            height += model.table_header;
            height += self.table_rows as f64 * model.table_row;
        }

        height += (self.text_length as f64 / 50.0) * model.paragraph_per_50_chars;

        if self.has_emoji_figure {
            height += model.emoji_figure;
        }
        if self.has_flow_diagram {
            height += model.flow_diagram;
        }

        height
    }
}

/// Analyze one slide's raw markdown.
pub fn analyze_slide_content(slide_content: &str, model: &HeightModel) -> SlideMetrics {
    let mut metrics = SlideMetrics {
        no_autoscale: NO_AUTOSCALE.is_match(slide_content),
        ..Default::default()
    };

    if let Some(m) = SCALE_CLASS.find(slide_content) {
        metrics.has_scale_class = true;
        metrics.existing_scale_class = SCALE_TOKEN
            .find(m.as_str())
            .and_then(|tok| ScaleClass::from_token(tok.as_str()));
    }

    for caps in CALLOUT_BOX.captures_iter(slide_content) {
        metrics.callout_types.push(caps[1].to_string());
    }
    metrics.callout_count = metrics.callout_types.len();

    metrics.has_two_column = FLEX_CONTAINER.is_match(slide_content);
    metrics.has_title = H1_HEADING.is_match(slide_content);

    for caps in CODE_BLOCK.captures_iter(slide_content) {
        metrics.has_code_block = true;
        metrics.code_block_lines += caps[1].lines().count();
    }

    let table_line_count = TABLE_LINE.find_iter(slide_content).count();
    if table_line_count > 0 {
        metrics.has_table = true;
        metrics.table_rows = table_line_count.saturating_sub(2);
    }

    if metrics.has_table && metrics.callout_count > 0 {
        detect_table_in_callout(slide_content, &mut metrics);
    }

    if EMOJI_FIGURE.is_match(slide_content) {
        metrics.has_emoji_figure = true;
        metrics.emoji_columns = slide_content.matches("emoji-col").count();
    }

    metrics.has_flow_diagram = FLOW_DIAGRAM.is_match(slide_content);

    metrics.list_items = BULLET_ITEM.find_iter(slide_content).count()
        + NUMBERED_ITEM.find_iter(slide_content).count();

    let text_only = HTML_TAG.replace_all(slide_content, "");
    let text_only = FENCED_ANY.replace_all(&text_only, "");
    metrics.text_length = text_only.chars().count();

    let mut height = metrics.base_height(model);
    height += metrics.code_block_lines as f64 * model.code_block_line;
    if metrics.table_in_callout {
        height += model.table_in_callout_penalty;
    }
    metrics.estimated_height = height;

    push_overflow_warnings(&mut metrics, model);
    metrics
}

fn detect_table_in_callout(slide_content: &str, metrics: &mut SlideMetrics) {
    for box_name in CALLOUT_CLASS_NAMES {
        if let Some(box_pos) = slide_content.find(box_name) {
            let mut end = (box_pos + TABLE_IN_CALLOUT_WINDOW).min(slide_content.len());
            while !slide_content.is_char_boundary(end) {
                end -= 1;
            }
            let section = &slide_content[box_pos..end];
            if section.contains('|') && section.contains("---") {
                metrics.table_in_callout = true;
                metrics
                    .overflow_warnings
                    .push("TABLE INSIDE CALLOUT BOX detected - high overflow risk".to_string());
                return;
            }
        }
    }
}

fn push_overflow_warnings(metrics: &mut SlideMetrics, model: &HeightModel) {
    let height = metrics.estimated_height;
    if height > model.budget * 1.5 {
        metrics.overflow_warnings.push(format!(
            "Estimated height ({height:.1}) exceeds budget ({:.1}) by >50%",
            model.budget
        ));
    } else if height > model.budget {
        metrics.overflow_warnings.push(format!(
            "Estimated height ({height:.1}) exceeds budget ({:.1})",
            model.budget
        ));
    }

    if metrics.callout_count >= 3 {
        metrics.overflow_warnings.push(format!(
            "Multiple callout boxes ({}) may cause overflow",
            metrics.callout_count
        ));
    }

    if metrics.emoji_columns >= 4 {
        metrics.overflow_warnings.push(format!(
            "Emoji figure with {} columns may overflow horizontally",
            metrics.emoji_columns
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(content: &str) -> SlideMetrics {
        analyze_slide_content(content, &HeightModel::default())
    }

    #[test]
    fn counts_list_items_and_estimates_height() {
        let metrics = analyze("# Title\n\n- Item 1\n- Item 2\n- Item 3\n");
        assert_eq!(metrics.list_items, 3);
        assert!(metrics.estimated_height > 0.0);
        assert!(!metrics.has_code_block);
        assert!(!metrics.has_table);
    }

    #[test]
    fn detects_callout_boxes() {
        let metrics = analyze("<div class=\"note-box\" data-title=\"Note\">\nContent\n</div>");
        assert_eq!(metrics.callout_count, 1);
        assert_eq!(metrics.callout_types[0], "note-box");
    }

    #[test]
    fn three_callouts_warn() {
        let content = "<div class=\"note-box\">\n</div>\n<div class=\"tip-box\">\n</div>\n<div class=\"warning-box\">\n</div>";
        let metrics = analyze(content);
        assert_eq!(metrics.callout_count, 3);
        assert!(metrics
            .overflow_warnings
            .iter()
            .any(|w| w.contains("Multiple callout boxes")));
    }

    #[test]
    fn sums_code_lines_across_blocks() {
        let metrics = analyze("```python\nx = 1\ny = 2\n```\n\n```rust\nlet a = 1;\n```");
        assert!(metrics.has_code_block);
        assert_eq!(metrics.code_block_lines, 3);
    }

    #[test]
    fn table_rows_exclude_header_and_separator() {
        let metrics = analyze("| A | B |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |\n");
        assert!(metrics.has_table);
        assert_eq!(metrics.table_rows, 2);
    }

    #[test]
    fn single_table_line_floors_at_zero_rows() {
        let metrics = analyze("| lonely |");
        assert!(metrics.has_table);
        assert_eq!(metrics.table_rows, 0);
    }

    #[test]
    fn no_autoscale_directive_detected() {
        let metrics = analyze("<!-- no-autoscale -->\n# Title\n");
        assert!(metrics.no_autoscale);
    }

    #[test]
    fn existing_scale_class_detected() {
        let metrics = analyze("<!-- _class: scale-80 -->\n# Title\n");
        assert!(metrics.has_scale_class);
        assert_eq!(metrics.existing_scale_class, Some(ScaleClass::Scale80));
    }

    #[test]
    fn scale_token_found_inside_combined_class() {
        let metrics = analyze("<!-- _class: lead scale-70 -->\n# Title\n");
        assert!(metrics.has_scale_class);
        assert_eq!(metrics.existing_scale_class, Some(ScaleClass::Scale70));
    }

    #[test]
    fn table_in_callout_heuristic_fires() {
        let content = "<div class=\"note-box\">\n\n| A | B |\n|---|---|\n| 1 | 2 |\n\n</div>";
        let metrics = analyze(content);
        assert!(metrics.table_in_callout);
        assert!(metrics
            .overflow_warnings
            .iter()
            .any(|w| w.contains("TABLE INSIDE CALLOUT")));
    }

    #[test]
    fn table_far_from_callout_does_not_fire() {
        let mut content = String::from("<div class=\"note-box\">\nshort note\n</div>\n");
        content.push_str(&"padding line\n".repeat(200));
        content.push_str("| A | B |\n|---|---|\n| 1 | 2 |\n");
        let metrics = analyze(&content);
        assert!(metrics.has_table);
        assert!(!metrics.table_in_callout);
    }

    #[test]
    fn two_column_discount_reduces_height() {
        let stacked = "<div class=\"note-box\">\n</div>\n<div class=\"tip-box\">\n</div>";
        let side_by_side = format!("<div style=\"display: flex\">\n{stacked}\n</div>");
        let tall = analyze(stacked);
        let wide = analyze(&side_by_side);
        // Discounted callouts plus the container overhead still total less.
        let tall_callouts = tall.callout_count as f64 * HeightModel::default().callout_box_base;
        let wide_callouts = tall_callouts * TWO_COLUMN_DISCOUNT_PAIR
            + HeightModel::default().flex_container_overhead;
        assert!(wide_callouts < tall_callouts);
        assert!(wide.has_two_column);
        assert!(!tall.has_two_column);
    }

    #[test]
    fn text_length_strips_tags_and_code() {
        let metrics = analyze("<b>hi</b>\n```\nsecret code\n```\nplain");
        assert!(metrics.text_length < 15);
    }

    #[test]
    fn emoji_figure_columns_counted() {
        let content = "<div class=\"emoji-figure\">\n<div class=\"emoji-col\"></div>\n<div class=\"emoji-col\"></div>\n<div class=\"emoji-col\"></div>\n<div class=\"emoji-col\"></div>\n</div>";
        let metrics = analyze(content);
        assert!(metrics.has_emoji_figure);
        assert_eq!(metrics.emoji_columns, 4);
        assert!(metrics
            .overflow_warnings
            .iter()
            .any(|w| w.contains("overflow horizontally")));
    }
}

//! Processing options and the content-height model.
//!
//! The weight table started life as module-level constants tuned against
//! rendered decks; it lives in an immutable struct here so the analyzer
//! and the scale engine receive it explicitly instead of reading ambient
//! state.

/// Options controlling how code blocks and tables are paginated.
#[derive(Debug, Clone, Copy)]
pub struct SplitOptions {
    /// Maximum code lines per slide before a block is split.
    pub max_code_lines: usize,
    /// Maximum table data rows per slide before a table is split.
    pub max_table_rows: usize,
    /// Disable splitting entirely (blocks still get numbering/highlighting).
    pub no_split: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        SplitOptions {
            max_code_lines: 20,
            max_table_rows: 8,
            no_split: false,
        }
    }
}

/// Weighted-sum model for estimating how much vertical space a slide's
/// content occupies, in abstract units where one unit is roughly 30px.
///
/// The values only need to be internally consistent; they were calibrated
/// so that a slide with an H1, two callout boxes, and four list items
/// estimates at about half of [`HeightModel::budget`].
#[derive(Debug, Clone, Copy)]
pub struct HeightModel {
    /// Height of one full slide's worth of content.
    pub budget: f64,
    /// H1 heading.
    pub h1: f64,
    /// H2 heading.
    pub h2: f64,
    /// H3 heading.
    pub h3: f64,
    /// Body text, per 50 characters of visible text.
    pub paragraph_per_50_chars: f64,
    /// One bulleted or numbered list item.
    pub list_item: f64,
    /// Fixed overhead of one callout box.
    pub callout_box_base: f64,
    /// Callout body text, per 50 characters.
    pub callout_content_per_50_chars: f64,
    /// One line inside a fenced code block.
    pub code_block_line: f64,
    /// Table header plus separator.
    pub table_header: f64,
    /// One table data row.
    pub table_row: f64,
    /// Fixed overhead of a flex (two-column) container.
    pub flex_container_overhead: f64,
    /// An emoji figure block.
    pub emoji_figure: f64,
    /// A flow diagram block.
    pub flow_diagram: f64,
    /// Extra space required when a table sits inside a callout box.
    pub table_in_callout_penalty: f64,
}

impl Default for HeightModel {
    fn default() -> Self {
        HeightModel {
            budget: 20.0,
            h1: 2.0,
            h2: 1.8,
            h3: 1.5,
            paragraph_per_50_chars: 0.4,
            list_item: 0.7,
            callout_box_base: 2.5,
            callout_content_per_50_chars: 0.3,
            code_block_line: 0.6,
            table_header: 1.2,
            table_row: 1.0,
            flex_container_overhead: 1.0,
            emoji_figure: 4.0,
            flow_diagram: 3.0,
            table_in_callout_penalty: 1.5,
        }
    }
}

/// Discount applied to callout/list heights when exactly two regions sit
/// side by side in a flex container.
pub const TWO_COLUMN_DISCOUNT_PAIR: f64 = 0.55;

/// Discount for three or more side-by-side regions.
pub const TWO_COLUMN_DISCOUNT_MANY: f64 = 0.45;

/// Character length above which a table cell is considered likely to wrap.
pub const LONG_COLUMN_THRESHOLD: usize = 25;

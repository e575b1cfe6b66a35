//! Pipe-delimited table parsing and HTML serialization.
//!
//! Tables are re-emitted as HTML so split chunks can carry styling
//! classes and per-column alignment that survives pagination. Long
//! columns are detected over the whole table, not per chunk, so every
//! continuation slide of one table aligns the same way.

use std::collections::BTreeSet;

use crate::config::LONG_COLUMN_THRESHOLD;

/// A parsed pipe-delimited table.
#[derive(Debug, Clone)]
pub struct Table {
    /// The raw header row.
    pub header: String,
    /// The raw alignment/separator row, when present.
    pub separator: Option<String>,
    /// Raw data rows in order.
    pub data_rows: Vec<String>,
    /// Number of non-empty cells in the header.
    pub column_count: usize,
}

/// Per-column alignment derived from the separator row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// `:---`
    Left,
    /// `:---:` or no markers; matches the renderer's visual default.
    Center,
    /// `---:`
    Right,
}

impl Alignment {
    fn css(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }
}

/// Parse table lines into a [`Table`].
///
/// Fewer than two lines is not a table; the caller passes the lines
/// through verbatim in that case.
pub fn parse_table(lines: &[String]) -> Option<Table> {
    if lines.len() < 2 {
        return None;
    }

    let header = lines[0].clone();
    let separator = Some(lines[1].clone());
    let data_rows = lines.get(2..).unwrap_or_default().to_vec();
    let column_count = split_cells(&header).len();

    Some(Table {
        header,
        separator,
        data_rows,
        column_count,
    })
}

/// Find columns whose content anywhere in the table exceeds `threshold`
/// characters. Those columns get forced left alignment so wrapped text
/// reads naturally.
pub fn detect_long_columns(data_rows: &[String], threshold: usize) -> BTreeSet<usize> {
    let mut long = BTreeSet::new();
    for row in data_rows {
        for (i, cell) in split_cells(row).iter().enumerate() {
            if cell.chars().count() > threshold {
                long.insert(i);
            }
        }
    }
    long
}

/// Options for table HTML generation.
#[derive(Debug, Default, Clone)]
pub struct TableHtmlOptions {
    /// Whether the chunk continues a table from a previous slide.
    pub is_continuation: bool,
    /// Whether the table is part of a split sequence.
    pub is_split: bool,
    /// Column indices forced to left alignment.
    pub left_align_columns: BTreeSet<usize>,
}

/// Serialize table rows as an HTML `<table>`.
pub fn table_to_html(
    header: &str,
    separator: Option<&str>,
    data_rows: &[String],
    opts: &TableHtmlOptions,
) -> Vec<String> {
    let header_cells = split_cells(header);
    let mut alignments = separator.map(parse_alignments).unwrap_or_default();
    while alignments.len() < header_cells.len() {
        alignments.push(Alignment::Center);
    }

    let mut classes = Vec::new();
    if opts.is_split {
        classes.push("split-table");
    }
    if opts.is_continuation {
        classes.push("table-continuation");
    }
    let class_attr = if classes.is_empty() {
        String::new()
    } else {
        format!(" class=\"{}\"", classes.join(" "))
    };

    let mut out = Vec::new();
    out.push(format!("<table{class_attr}>"));

    // Headers stay centered-by-alignment regardless of long columns.
    out.push("<thead>".to_string());
    out.push("<tr>".to_string());
    for (i, cell) in header_cells.iter().enumerate() {
        let align = alignments.get(i).copied().unwrap_or(Alignment::Center);
        out.push(format!(
            "<th style=\"text-align: {}\">{}</th>",
            align.css(),
            cell
        ));
    }
    out.push("</tr>".to_string());
    out.push("</thead>".to_string());

    out.push("<tbody>".to_string());
    for row in data_rows {
        out.push("<tr>".to_string());
        for (i, cell) in split_cells(row).iter().enumerate() {
            let align = if opts.left_align_columns.contains(&i) {
                Alignment::Left
            } else {
                alignments.get(i).copied().unwrap_or(Alignment::Center)
            };
            out.push(format!(
                "<td style=\"text-align: {}\">{}</td>",
                align.css(),
                cell
            ));
        }
        out.push("</tr>".to_string());
    }
    out.push("</tbody>".to_string());

    out.push("</table>".to_string());
    out
}

/// Whether a line looks like a table row (starts and ends with `|`).
pub fn is_table_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 2 && trimmed.starts_with('|') && trimmed.ends_with('|')
}

fn split_cells(row: &str) -> Vec<String> {
    row.split('|')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_alignments(separator: &str) -> Vec<Alignment> {
    split_cells(separator)
        .iter()
        .map(|part| {
            if part.starts_with(':') && part.ends_with(':') {
                Alignment::Center
            } else if part.ends_with(':') {
                Alignment::Right
            } else if part.starts_with(':') {
                Alignment::Left
            } else {
                Alignment::Center
            }
        })
        .collect()
}

/// Re-export of the default long-column threshold for callers that chunk
/// tables themselves.
pub fn default_long_columns(data_rows: &[String]) -> BTreeSet<usize> {
    detect_long_columns(data_rows, LONG_COLUMN_THRESHOLD)
}

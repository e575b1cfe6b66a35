//! Chunked emission of oversized code blocks and tables.
//!
//! A block that exceeds its row or line budget is cut into chunks and
//! each continuation chunk lands on a fresh slide, reopening the
//! surrounding callout box and repeating the slide title so the reader
//! keeps their bearings. Continuation indicators mark where a block was
//! cut.

use std::collections::BTreeSet;

use crate::highlight::highlight_code_line;
use crate::table::{self, TableHtmlOptions};

/// Row/line budgets for one split: the first chunk may get a different
/// budget than the continuations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkBudget {
    /// Budget for the first chunk.
    pub first: usize,
    /// Budget for every continuation chunk.
    pub cont: usize,
}

impl ChunkBudget {
    /// Same budget for every chunk.
    pub fn uniform(max: usize) -> Self {
        ChunkBudget { first: max, cont: max }
    }

    /// Number of chunks `len` items will produce. Never zero.
    pub fn chunk_count(&self, len: usize) -> usize {
        if len <= self.first {
            return 1;
        }
        let remaining = len - self.first;
        1 + remaining.div_ceil(self.cont.max(1))
    }
}

fn chunk_slices<'a, T>(items: &'a [T], budget: ChunkBudget) -> Vec<&'a [T]> {
    let mut chunks = Vec::new();
    let mut pos = 0;
    while pos < items.len() {
        let max = if chunks.is_empty() { budget.first } else { budget.cont };
        let max = max.max(1);
        let end = (pos + max).min(items.len());
        chunks.push(&items[pos..end]);
        pos = end;
    }
    chunks
}

/// Preamble for a continuation slide: separator, repeated title, and the
/// reopened box when the block lived inside one.
fn push_continuation_preamble(out: &mut Vec<String>, title: &str, enclosing_box: Option<&str>) {
    out.push(String::new());
    out.push("---".to_string());
    out.push(String::new());
    if !title.is_empty() {
        out.push(title.to_string());
        out.push(String::new());
    }
    if let Some(open_div) = enclosing_box {
        out.push(open_div.to_string());
        out.push(String::new());
    }
}

fn push_continuation_indicator(out: &mut Vec<String>, kind: &str, is_first: bool, is_last: bool) {
    let marker = match (is_first, is_last) {
        (true, true) => return,
        (true, false) => format!("<div class=\"{kind}-continued-indicator\">continued...</div>"),
        (false, false) => format!("<div class=\"{kind}-continued-indicator\">...continued...</div>"),
        (false, true) => format!("<div class=\"{kind}-continued-indicator-last\">...continued</div>"),
    };
    out.push(String::new());
    out.push(marker);
}

fn code_open_tag(lang: &str, start_line: usize) -> String {
    if lang.is_empty() {
        format!("<pre><code class=\"has-line-numbers\" data-start-line=\"{start_line}\">")
    } else {
        format!(
            "<pre><code class=\"language-{lang} has-line-numbers\" data-start-line=\"{start_line}\">"
        )
    }
}

fn push_code_chunk(out: &mut Vec<String>, chunk: &[String], lang: &str, start_line: usize) {
    out.push(code_open_tag(lang, start_line));
    for (offset, code_line) in chunk.iter().enumerate() {
        let line_num = start_line + offset;
        let highlighted = highlight_code_line(code_line, lang);
        out.push(format!(
            "<span class=\"line\"><span class=\"line-num\">{line_num}</span><span class=\"line-code\">{highlighted}</span></span>"
        ));
    }
    out.push("</code></pre>".to_string());
}

/// Render a code block that fits on its slide: one `<pre><code>` with
/// per-line numbering and highlighting, starting at line 1.
pub fn render_code_block(code_lines: &[String], lang: &str) -> Vec<String> {
    let mut out = Vec::with_capacity(code_lines.len() + 2);
    push_code_chunk(&mut out, code_lines, lang, 1);
    out
}

/// Split an oversized code block across slides.
///
/// Line numbers run continuously across chunks. When `enclosing_box` is
/// set, every chunk is closed with `</div>` and continuations reopen the
/// box, so the caller must drop the source's own closing `</div>`.
pub fn split_code_block(
    code_lines: &[String],
    lang: &str,
    budget: ChunkBudget,
    current_title: &str,
    enclosing_box: Option<&str>,
) -> Vec<String> {
    let chunks = chunk_slices(code_lines, budget);
    let mut out = Vec::new();
    let mut cumulative = 0usize;

    for (chunk_idx, chunk) in chunks.iter().enumerate() {
        if chunk_idx > 0 {
            push_continuation_preamble(&mut out, current_title, enclosing_box);
        }

        push_code_chunk(&mut out, chunk, lang, cumulative + 1);
        cumulative += chunk.len();

        let is_first = chunk_idx == 0;
        let is_last = chunk_idx == chunks.len() - 1;
        push_continuation_indicator(&mut out, "code", is_first, is_last);

        if enclosing_box.is_some() {
            out.push(String::new());
            out.push("</div>".to_string());
        }
    }

    out
}

/// Split a table across slides, or return the source lines unchanged
/// when the table fits or does not parse.
///
/// Long-column detection runs over the WHOLE table, so every chunk
/// left-aligns the same columns and the split reads as one table.
pub fn split_table(
    table_lines: &[String],
    budget: ChunkBudget,
    current_title: &str,
    enclosing_box: Option<&str>,
) -> Vec<String> {
    let Some(parsed) = table::parse_table(table_lines) else {
        return table_lines.to_vec();
    };
    if parsed.data_rows.len() <= budget.first {
        return table_lines.to_vec();
    }

    let long_columns: BTreeSet<usize> = table::default_long_columns(&parsed.data_rows);
    let chunks = chunk_slices(&parsed.data_rows, budget);
    let mut out = Vec::new();

    for (chunk_idx, chunk) in chunks.iter().enumerate() {
        if chunk_idx > 0 {
            push_continuation_preamble(&mut out, current_title, enclosing_box);
        }

        let html = table::table_to_html(
            &parsed.header,
            parsed.separator.as_deref(),
            chunk,
            &TableHtmlOptions {
                is_continuation: chunk_idx > 0,
                is_split: true,
                left_align_columns: long_columns.clone(),
            },
        );
        out.extend(html);

        let is_first = chunk_idx == 0;
        let is_last = chunk_idx == chunks.len() - 1;
        push_continuation_indicator(&mut out, "table", is_first, is_last);

        if enclosing_box.is_some() {
            out.push(String::new());
            out.push("</div>".to_string());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn chunk_count_matches_budgets() {
        let budget = ChunkBudget { first: 4, cont: 4 };
        assert_eq!(budget.chunk_count(3), 1);
        assert_eq!(budget.chunk_count(4), 1);
        assert_eq!(budget.chunk_count(10), 3);
        let uneven = ChunkBudget { first: 6, cont: 4 };
        assert_eq!(uneven.chunk_count(10), 2);
        assert_eq!(uneven.chunk_count(11), 3);
    }

    #[test]
    fn line_numbers_run_continuously_across_chunks() {
        let code: Vec<String> = (1..=25).map(|i| format!("line {i}")).collect();
        let out = split_code_block(&code, "python", ChunkBudget::uniform(10), "# Title", None);

        let nums: Vec<usize> = out
            .iter()
            .filter_map(|l| {
                let rest = l.split("line-num\">").nth(1)?;
                rest.split('<').next()?.parse().ok()
            })
            .collect();
        assert_eq!(nums, (1..=25).collect::<Vec<usize>>());

        assert!(out.contains(&"<pre><code class=\"language-python has-line-numbers\" data-start-line=\"1\">".to_string()));
        assert!(out.contains(&"<pre><code class=\"language-python has-line-numbers\" data-start-line=\"11\">".to_string()));
        assert!(out.contains(&"<pre><code class=\"language-python has-line-numbers\" data-start-line=\"21\">".to_string()));
    }

    #[test]
    fn continuation_slides_repeat_the_title() {
        let code: Vec<String> = (1..=12).map(|i| format!("x{i}")).collect();
        let out = split_code_block(&code, "", ChunkBudget::uniform(10), "## Setup", None);
        assert_eq!(out.iter().filter(|l| l.as_str() == "---").count(), 1);
        assert_eq!(out.iter().filter(|l| l.as_str() == "## Setup").count(), 1);
    }

    #[test]
    fn indicator_sequence_first_middle_last() {
        let code: Vec<String> = (1..=30).map(|i| format!("x{i}")).collect();
        let out = split_code_block(&code, "rust", ChunkBudget::uniform(10), "", None);
        let indicators: Vec<&String> = out.iter().filter(|l| l.contains("continued")).collect();
        assert_eq!(indicators.len(), 3);
        assert!(indicators[0].contains("\"code-continued-indicator\">continued...<"));
        assert!(indicators[1].contains("\"code-continued-indicator\">...continued...<"));
        assert!(indicators[2].contains("\"code-continued-indicator-last\">...continued<"));
    }

    #[test]
    fn single_chunk_gets_no_indicator() {
        let code = lines(&["a", "b"]);
        let out = split_code_block(&code, "", ChunkBudget::uniform(10), "", None);
        assert!(!out.iter().any(|l| l.contains("continued")));
        assert!(!out.iter().any(|l| l == "---"));
    }

    #[test]
    fn enclosing_box_reopens_on_each_continuation() {
        let open_div = "<div class=\"note-box\">";
        let code: Vec<String> = (1..=25).map(|i| format!("x{i}")).collect();
        let out = split_code_block(&code, "python", ChunkBudget::uniform(10), "# T", Some(open_div));

        // Two continuation reopens plus three closes, one per chunk.
        assert_eq!(out.iter().filter(|l| l.as_str() == open_div).count(), 2);
        assert_eq!(out.iter().filter(|l| l.as_str() == "</div>").count(), 3);
    }

    #[test]
    fn table_split_markers_for_ten_rows_budget_four() {
        let mut table = lines(&["| A | B |", "|---|---|"]);
        for i in 0..10 {
            table.push(format!("| a{i} | b{i} |"));
        }
        let out = split_table(&table, ChunkBudget::uniform(4), "", None);

        let chunk_sizes: Vec<usize> = {
            let mut sizes = Vec::new();
            let mut current = 0usize;
            for line in &out {
                if line.starts_with("<td") {
                    current += 1;
                } else if line.starts_with("</table>") {
                    sizes.push(current / 2);
                    current = 0;
                }
            }
            sizes
        };
        assert_eq!(chunk_sizes, vec![4, 4, 2]);

        let indicators: Vec<&String> = out.iter().filter(|l| l.contains("continued")).collect();
        assert_eq!(indicators.len(), 3);
        assert!(indicators[0].contains("table-continued-indicator\">continued...<"));
        assert!(indicators[1].contains("table-continued-indicator\">...continued...<"));
        assert!(indicators[2].contains("table-continued-indicator-last\">...continued<"));
    }

    #[test]
    fn fitting_table_passes_through_unchanged() {
        let table = lines(&["| A |", "|---|", "| 1 |"]);
        let out = split_table(&table, ChunkBudget::uniform(8), "", None);
        assert_eq!(out, table);
    }

    #[test]
    fn whole_table_long_columns_align_every_chunk() {
        let long = "x".repeat(30);
        let mut table = lines(&["| K | V |", "|---|---|"]);
        for i in 0..5 {
            table.push(format!("| k{i} | short |"));
        }
        // The long cell sits in the second chunk only.
        table.push(format!("| k5 | {long} |"));
        let out = split_table(&table, ChunkBudget::uniform(3), "", None);

        // Column 1 is forced left in the first chunk too.
        let first_table_end = out.iter().position(|l| l == "</table>").unwrap();
        let first_chunk = &out[..first_table_end];
        assert!(
            first_chunk
                .iter()
                .filter(|l| l.contains("<td"))
                .skip(1)
                .step_by(2)
                .all(|l| l.contains("text-align: left"))
        );
    }
}

//! The full preprocessing pipeline over one document.
//!
//! Three passes run in order: per-slide analysis with scale-class
//! injection, flow-diagram rendering, and the main line loop that
//! paginates code blocks and tables, rewrites arrow shorthand, and
//! honors one-shot split directives.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::boxes::detect_enclosing_box;
use crate::code_fence::{FenceOpening, detect_fence_opening, is_fence_close};
use crate::config::{HeightModel, SplitOptions};
use crate::flow::process_flow_blocks;
use crate::metrics::analyze_slide_content;
use crate::scale::{compute_available_code_lines, determine_scale_class, inject_scale_class};
use crate::split::{ChunkBudget, render_code_block, split_code_block, split_table};
use crate::table::{is_table_line, parse_table};
use crate::arrows::rewrite_arrows;

/// Counters describing what one processing run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Stats {
    /// Lines in the input document.
    pub input_lines: usize,
    /// Lines in the output document.
    pub output_lines: usize,
    /// Fenced code blocks encountered.
    pub code_blocks_found: usize,
    /// Code blocks that were split across slides.
    pub code_blocks_split: usize,
    /// Pipe tables encountered.
    pub tables_found: usize,
    /// Tables that were split across slides.
    pub tables_split: usize,
    /// Continuation slides created by splitting.
    pub slides_added: usize,
    /// Arrow shorthand occurrences rewritten.
    pub arrows_processed: usize,
    /// Flow diagrams rendered to SVG.
    pub flow_diagrams_processed: usize,
    /// One-shot split directives consumed.
    pub split_directives_found: usize,
    /// Overflow-related warnings raised by slide analysis.
    pub overflow_warnings: usize,
    /// Scale classes auto-injected by slide analysis.
    pub scale_classes_injected: usize,
    /// Human-readable analysis warnings, one per finding.
    pub warnings: Vec<String>,
}

/// Result of a processing run: the rewritten document plus counters.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// The transformed Markdown.
    pub content: String,
    /// What happened along the way.
    pub stats: Stats,
}

static TITLE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#{1,2}\s+.+$").expect("title pattern"));

static SPLIT_DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<!--\s*split:\s*(\d+)(?:\s*,\s*(\d+))?\s*-->").expect("split directive pattern")
});

/// Analyze every slide and inject scale classes where content will not
/// fit at full size.
///
/// Slides are the `\n---\n` separated parts; the first part holds the
/// frontmatter and title slide and is never touched, so slide numbering
/// in warnings starts at 2.
pub fn analyze_and_inject_scaling(content: &str, model: &HeightModel) -> (String, Vec<String>) {
    let mut warnings = Vec::new();

    let parts: Vec<&str> = content.split("\n---\n").collect();
    if parts.len() < 2 {
        return (content.to_string(), warnings);
    }

    let mut modified: Vec<String> = vec![parts[0].to_string()];
    for (i, slide) in parts[1..].iter().enumerate() {
        let slide_num = i + 2;
        let metrics = analyze_slide_content(slide, model);

        for warning in &metrics.overflow_warnings {
            warnings.push(format!("Slide {slide_num}: {warning}"));
        }

        if let Some(scale) = determine_scale_class(&metrics, model) {
            warnings.push(format!(
                "Slide {slide_num}: Auto-injecting {scale} (estimated height: {:.1})",
                metrics.estimated_height
            ));
            modified.push(inject_scale_class(slide, scale));
        } else {
            modified.push(slide.to_string());
        }
    }

    (modified.join("\n---\n"), warnings)
}

/// A split directive read but not yet consumed by a block.
#[derive(Debug, Clone, Copy)]
struct PendingSplit {
    first: usize,
    cont: Option<usize>,
}

impl PendingSplit {
    fn budget(self) -> ChunkBudget {
        ChunkBudget {
            first: self.first,
            cont: self.cont.unwrap_or(self.first),
        }
    }
}

/// Run the whole pipeline over `content`.
pub fn process_markdown(
    content: &str,
    options: &SplitOptions,
    model: &HeightModel,
) -> ProcessOutput {
    let mut stats = Stats {
        input_lines: content.split('\n').count(),
        ..Stats::default()
    };

    let (content, warnings) = analyze_and_inject_scaling(content, model);
    for warning in &warnings {
        log::warn!("{warning}");
    }
    stats.overflow_warnings = warnings
        .iter()
        .filter(|w| {
            let lower = w.to_lowercase();
            lower.contains("overflow") || lower.contains("exceeds")
        })
        .count();
    stats.scale_classes_injected = warnings
        .iter()
        .filter(|w| w.contains("Auto-injecting"))
        .count();
    stats.warnings = warnings;

    let (content, flow_diagrams) = process_flow_blocks(&content);
    stats.flow_diagrams_processed = flow_diagrams;

    let lines: Vec<&str> = content.split('\n').collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());

    // The document body starts after the closing frontmatter fence.
    let frontmatter_end = crate::frontmatter::frontmatter_end_line(&lines);

    let mut fence: Option<FenceOpening> = None;
    let mut fence_open_line = String::new();
    let mut fence_open_input_idx = 0usize;
    let mut code_block_start = 0usize;
    let mut code_buffer: Vec<String> = Vec::new();

    let mut table_buffer: Vec<String> = Vec::new();
    let mut table_start = 0usize;
    let mut in_table = false;

    let mut current_title = String::new();
    let mut current_slide_start = frontmatter_end.map(|idx| idx + 1).unwrap_or(0);
    let mut pending_split: Option<PendingSplit> = None;
    let mut skip_next_closing_div = false;

    for (i, &line) in lines.iter().enumerate() {
        if fence.is_none() && line.trim() == "---" {
            current_slide_start = i + 1;
            pending_split = None;
            skip_next_closing_div = false;
        }

        if fence.is_none() && TITLE_LINE.is_match(line) {
            current_title = line.to_string();
        }

        if let Some(opening) = fence.take() {
            if is_fence_close(line, &opening) {
                close_code_block(
                    &mut out,
                    &mut stats,
                    &code_buffer,
                    &opening,
                    code_block_start,
                    &lines[current_slide_start..fence_open_input_idx],
                    &current_title,
                    &mut pending_split,
                    &mut skip_next_closing_div,
                    options,
                    model,
                );
                code_buffer.clear();
            } else {
                code_buffer.push(line.to_string());
                fence = Some(opening);
            }
            continue;
        }

        if let Some(opening) = detect_fence_opening(line) {
            fence = Some(opening);
            fence_open_line = line.to_string();
            fence_open_input_idx = i;
            code_block_start = out.len();
            code_buffer.clear();
            stats.code_blocks_found += 1;
            continue;
        }

        if is_table_line(line) {
            if !in_table {
                in_table = true;
                table_start = out.len();
                table_buffer.clear();
                stats.tables_found += 1;
            }
            table_buffer.push(line.to_string());
            continue;
        }

        if in_table {
            in_table = false;
            flush_table(
                &mut out,
                &mut stats,
                &table_buffer,
                table_start,
                &current_title,
                &mut pending_split,
                &mut skip_next_closing_div,
                options,
            );
            table_buffer.clear();
        }

        if skip_next_closing_div && line.trim() == "</div>" {
            skip_next_closing_div = false;
            continue;
        }

        if let Some(caps) = SPLIT_DIRECTIVE.captures(line.trim()) {
            let first = caps[1].parse().unwrap_or(1usize).max(1);
            let cont = caps.get(2).and_then(|m| m.as_str().parse().ok());
            pending_split = Some(PendingSplit { first, cont });
            stats.split_directives_found += 1;
        }

        let (rewritten, arrow_count) = rewrite_arrows(line);
        stats.arrows_processed += arrow_count;
        out.push(rewritten.into_owned());
    }

    // A table at end of document still gets paginated.
    if in_table && !table_buffer.is_empty() {
        flush_table(
            &mut out,
            &mut stats,
            &table_buffer,
            table_start,
            &current_title,
            &mut pending_split,
            &mut skip_next_closing_div,
            options,
        );
    }

    // An unterminated fence passes through untouched.
    if fence.is_some() {
        out.push(fence_open_line);
        out.extend(code_buffer);
    }

    let result = out.join("\n");
    stats.output_lines = result.split('\n').count();

    ProcessOutput {
        content: result,
        stats,
    }
}

#[allow(clippy::too_many_arguments)]
fn close_code_block(
    out: &mut Vec<String>,
    stats: &mut Stats,
    code_buffer: &[String],
    opening: &FenceOpening,
    code_block_start: usize,
    slide_other_lines: &[&str],
    current_title: &str,
    pending_split: &mut Option<PendingSplit>,
    skip_next_closing_div: &mut bool,
    options: &SplitOptions,
    model: &HeightModel,
) {
    let budget = if let Some(pending) = pending_split.take() {
        pending.budget()
    } else if options.no_split {
        ChunkBudget::uniform(options.max_code_lines)
    } else {
        let slide_other = slide_other_lines.join("\n");
        ChunkBudget::uniform(compute_available_code_lines(
            &slide_other,
            options.max_code_lines,
            model,
        ))
    };

    if !options.no_split && code_buffer.len() > budget.first {
        out.truncate(code_block_start);
        let enclosing_box = detect_enclosing_box(out, out.len());

        let chunks = budget.chunk_count(code_buffer.len());
        stats.code_blocks_split += 1;
        stats.slides_added += chunks - 1;

        let split = split_code_block(
            code_buffer,
            &opening.lang,
            budget,
            current_title,
            enclosing_box.as_deref(),
        );
        out.extend(split);

        if enclosing_box.is_some() {
            *skip_next_closing_div = true;
        }
    } else {
        out.truncate(code_block_start);
        out.extend(render_code_block(code_buffer, &opening.lang));
    }
}

#[allow(clippy::too_many_arguments)]
fn flush_table(
    out: &mut Vec<String>,
    stats: &mut Stats,
    table_buffer: &[String],
    table_start: usize,
    current_title: &str,
    pending_split: &mut Option<PendingSplit>,
    skip_next_closing_div: &mut bool,
    options: &SplitOptions,
) {
    let budget = match pending_split.take() {
        Some(pending) => pending.budget(),
        None => ChunkBudget::uniform(options.max_table_rows),
    };

    let needs_split = !options.no_split
        && parse_table(table_buffer)
            .map(|t| t.data_rows.len() > budget.first)
            .unwrap_or(false);

    if needs_split {
        out.truncate(table_start);
        let enclosing_box = detect_enclosing_box(out, out.len());

        let data_rows = table_buffer.len().saturating_sub(2);
        stats.tables_split += 1;
        stats.slides_added += budget.chunk_count(data_rows) - 1;

        let split = split_table(table_buffer, budget, current_title, enclosing_box.as_deref());
        out.extend(split);

        if enclosing_box.is_some() {
            *skip_next_closing_div = true;
        }
    } else {
        out.extend(table_buffer.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn process(content: &str) -> ProcessOutput {
        process_markdown(content, &SplitOptions::default(), &HeightModel::default())
    }

    fn doc(body: &str) -> String {
        format!("---\nmarp: true\n---\n\n# Title\n\n---\n\n{body}")
    }

    #[test]
    fn short_document_passes_through() {
        let input = doc("# Slide\n\nHello.\n");
        let out = process(&input);
        assert_eq!(out.content, input);
        assert_eq!(out.stats.slides_added, 0);
        assert_eq!(out.stats.code_blocks_found, 0);
    }

    #[test]
    fn fitting_code_block_still_gets_numbering() {
        let input = doc("# Code\n\n```python\nx = 1\ny = 2\n```\n");
        let out = process(&input);
        assert_eq!(out.stats.code_blocks_found, 1);
        assert_eq!(out.stats.code_blocks_split, 0);
        assert!(out.content.contains("data-start-line=\"1\""));
        assert!(out.content.contains("<span class=\"line-num\">2</span>"));
        assert!(!out.content.contains("```python"));
    }

    #[test]
    fn long_code_block_is_split_with_continuous_numbering() {
        let mut body = String::from("# Code\n\n```python\n");
        for i in 1..=45 {
            body.push_str(&format!("line_{i} = {i}\n"));
        }
        body.push_str("```\n");
        let out = process(&doc(&body));

        assert_eq!(out.stats.code_blocks_split, 1);
        assert!(out.stats.slides_added >= 1);
        assert!(out.content.contains("<div class=\"code-continued-indicator\">continued...</div>"));
        // Continuation slide repeats the title.
        let after_split = out.content.split("continued...").nth(1).unwrap();
        assert!(after_split.contains("# Code"));
    }

    #[test]
    fn no_split_disables_pagination_but_not_rendering() {
        let mut body = String::from("```python\n");
        for i in 1..=40 {
            body.push_str(&format!("x{i} = {i}\n"));
        }
        body.push_str("```\n");
        let options = SplitOptions {
            no_split: true,
            ..SplitOptions::default()
        };
        let out = process_markdown(&doc(&body), &options, &HeightModel::default());
        assert_eq!(out.stats.code_blocks_split, 0);
        assert_eq!(out.stats.slides_added, 0);
        assert!(out.content.contains("<pre><code class=\"language-python has-line-numbers\""));
        assert!(!out.content.contains("continued"));
    }

    #[test]
    fn long_table_is_split() {
        let mut body = String::from("# Table\n\n| A | B |\n|---|---|\n");
        for i in 0..12 {
            body.push_str(&format!("| a{i} | b{i} |\n"));
        }
        let out = process(&doc(&body));
        assert_eq!(out.stats.tables_found, 1);
        assert_eq!(out.stats.tables_split, 1);
        assert_eq!(out.stats.slides_added, 1);
        assert!(out.content.contains("<table class=\"split-table\">"));
        assert!(out.content.contains("<table class=\"split-table table-continuation\">"));
    }

    #[test]
    fn table_at_end_of_document_is_flushed() {
        let mut body = String::from("| A |\n|---|\n");
        for i in 0..12 {
            body.push_str(&format!("| r{i} |\n"));
        }
        let input = doc(body.trim_end());
        let out = process(&input);
        assert_eq!(out.stats.tables_split, 1);
    }

    #[test]
    fn split_directive_overrides_budget_once() {
        let mut body = String::from("<!-- split: 3 -->\n\n| A |\n|---|\n");
        for i in 0..6 {
            body.push_str(&format!("| r{i} |\n"));
        }
        // A second table on the same slide falls back to the default.
        body.push_str("\ntext\n\n| B |\n|---|\n| 1 |\n| 2 |\n| 3 |\n| 4 |\n");
        let out = process(&doc(&body));
        assert_eq!(out.stats.split_directives_found, 1);
        // 6 rows at 3 per chunk: one extra slide; second table fits.
        assert_eq!(out.stats.tables_split, 1);
        assert_eq!(out.stats.slides_added, 1);
    }

    #[test]
    fn split_directive_with_continuation_budget() {
        let mut body = String::from("<!-- split: 2, 4 -->\n\n```rust\n");
        for i in 0..10 {
            body.push_str(&format!("let x{i} = {i};\n"));
        }
        body.push_str("```\n");
        let out = process(&doc(&body));
        assert_eq!(out.stats.code_blocks_split, 1);
        // Chunks of 2, 4, 4.
        assert_eq!(out.stats.slides_added, 2);
        assert!(out.content.contains("data-start-line=\"3\""));
        assert!(out.content.contains("data-start-line=\"7\""));
    }

    #[test]
    fn directive_resets_at_slide_boundary() {
        let mut body = String::from("<!-- split: 2 -->\n\ntext\n\n---\n\n| A |\n|---|\n");
        for i in 0..5 {
            body.push_str(&format!("| r{i} |\n"));
        }
        let out = process(&doc(&body));
        // 5 rows fit the default budget of 8; the stale directive is gone.
        assert_eq!(out.stats.tables_split, 0);
    }

    #[test]
    fn box_split_swallows_source_closing_div_once() {
        let mut body = String::from("# Boxed\n\n<div class=\"note-box\">\n\n```python\n");
        for i in 0..25 {
            body.push_str(&format!("x{i} = {i}\n"));
        }
        body.push_str("```\n\n</div>\n\nafter\n");
        let out = process(&doc(&body));

        assert_eq!(out.stats.code_blocks_split, 1);
        let opens = out.content.matches("<div class=\"note-box\">").count();
        let closes = out.content.matches("</div>").count();
        assert_eq!(opens, closes);
        assert!(out.content.contains("after"));
    }

    #[test]
    fn arrows_are_rewritten_and_counted() {
        let out = process(&doc("A --[80]-> B and C --[lg]-> D\n"));
        assert_eq!(out.stats.arrows_processed, 2);
        assert!(out.content.contains("--arrow-width: 80px;"));
        assert!(out.content.contains("svg-arrow-lg"));
    }

    #[test]
    fn arrows_inside_code_blocks_are_left_alone() {
        let out = process(&doc("```text\nA --[80]-> B\n```\n"));
        assert_eq!(out.stats.arrows_processed, 0);
        assert!(!out.content.contains("svg-arrow"));
        assert!(out.content.contains("--[80]"));
    }

    #[test]
    fn dense_slide_gets_scale_class_injected() {
        let mut body = String::from("# Dense\n\n");
        for i in 0..40 {
            body.push_str(&format!("- Item number {i} with some extra words\n"));
        }
        let out = process(&doc(&body));
        assert_eq!(out.stats.scale_classes_injected, 1);
        assert!(out.content.contains("<!-- _class: scale-"));
        assert!(out.stats.warnings.iter().any(|w| w.contains("Auto-injecting")));
    }

    #[test]
    fn scale_injection_is_idempotent_across_runs() {
        let mut body = String::from("# Dense\n\n");
        for i in 0..40 {
            body.push_str(&format!("- Item number {i} with some extra words\n"));
        }
        let first = process(&doc(&body));
        let second = process(&first.content);
        assert_eq!(second.stats.scale_classes_injected, 0);
        assert_eq!(
            first.content.matches("scale-").count(),
            second.content.matches("scale-").count()
        );
    }

    #[test]
    fn flow_blocks_are_rendered_before_the_line_loop() {
        let out = process(&doc("```flow\n[A] --> [B]\n```\n"));
        assert_eq!(out.stats.flow_diagrams_processed, 1);
        assert_eq!(out.stats.code_blocks_found, 0);
        assert!(out.content.contains("diagram-container"));
    }

    #[test]
    fn frontmatter_less_deck_splits_code_before_first_separator() {
        // The first `---` lines here are slide separators, not a YAML
        // fence, so the opening slide starts at line zero.
        let mut input = String::from("# Title\n\n```python\n");
        for i in 0..25 {
            input.push_str(&format!("x{i} = {i}\n"));
        }
        input.push_str("```\n\n---\n\n## Next\n\n---\n\n## More\n");
        let out = process(&input);

        assert_eq!(out.stats.code_blocks_found, 1);
        assert_eq!(out.stats.code_blocks_split, 1);
        assert!(out.content.contains("## Next"));
        assert!(out.content.contains("## More"));
    }

    #[test]
    fn unterminated_fence_passes_through() {
        let input = doc("```python\nx = 1\n");
        let out = process(&input);
        assert!(out.content.contains("```python"));
        assert!(out.content.contains("x = 1"));
    }
}

//! Poster documents: ASCII grid layouts expanded to CSS Grid markup.
//!
//! A poster source declares its layout as an ASCII grid inside a
//! ```poster-layout``` fence, where each letter names a region and `.`
//! leaves a hole. Content arrives as `## X: Section Title` sections
//! keyed by the same letters. The output is a single Marp page whose
//! `<style scoped>` block maps regions onto `grid-template-areas`.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::{PosterError, PreprocessError};
use crate::frontmatter::{PosterFrontmatter, extract_frontmatter, parse_poster_frontmatter};

/// Bounding box of one labelled grid region, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridArea {
    /// First row of the region.
    pub row_start: usize,
    /// Last row of the region.
    pub row_end: usize,
    /// First column of the region.
    pub col_start: usize,
    /// Last column of the region.
    pub col_end: usize,
}

/// A validated ASCII layout.
#[derive(Debug, Clone)]
pub struct PosterLayout {
    /// The grid, row-major, exactly as written.
    pub grid: Vec<Vec<char>>,
    /// Region labels in sorted order.
    pub labels: Vec<char>,
    /// Bounding box per label.
    pub areas: BTreeMap<char, GridArea>,
    /// Row count.
    pub rows: usize,
    /// Column count.
    pub cols: usize,
}

/// One `## X: Title` content section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosterSection {
    /// Section heading text, without the label prefix.
    pub title: String,
    /// Markdown body up to the next section header.
    pub content: String,
}

/// Counters and findings from one poster run.
#[derive(Debug, Clone, Serialize)]
pub struct PosterStats {
    /// Content sections found in the source.
    pub sections: usize,
    /// Grid dimensions as `RxC`.
    pub grid_size: String,
    /// Label-mismatch warnings.
    pub warnings: Vec<String>,
}

/// Result of a poster run.
#[derive(Debug, Clone)]
pub struct PosterOutput {
    /// The generated Marp markdown.
    pub content: String,
    /// What the run found.
    pub stats: PosterStats,
}

/// Parse an ASCII grid into labelled rectangular regions.
///
/// Every row must have the same length and every label's cells must
/// fill the label's bounding box exactly. `.` cells are holes and carry
/// no label.
pub fn parse_ascii_layout(layout_text: &str) -> Result<PosterLayout, PosterError> {
    let lines: Vec<&str> = layout_text
        .trim()
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if lines.is_empty() {
        return Err(PosterError::EmptyLayout);
    }

    let row_lengths: Vec<usize> = lines.iter().map(|l| l.chars().count()).collect();
    if row_lengths.iter().any(|len| *len != row_lengths[0]) {
        return Err(PosterError::RaggedRows(row_lengths));
    }

    let grid: Vec<Vec<char>> = lines.iter().map(|l| l.chars().collect()).collect();

    let mut coords: BTreeMap<char, Vec<(usize, usize)>> = BTreeMap::new();
    for (r, row) in grid.iter().enumerate() {
        for (c, &ch) in row.iter().enumerate() {
            if ch != '.' {
                coords.entry(ch).or_default().push((r, c));
            }
        }
    }

    let mut labels = Vec::with_capacity(coords.len());
    let mut areas = BTreeMap::new();
    for (ch, points) in &coords {
        let row_start = points.iter().map(|p| p.0).min().unwrap_or(0);
        let row_end = points.iter().map(|p| p.0).max().unwrap_or(0);
        let col_start = points.iter().map(|p| p.1).min().unwrap_or(0);
        let col_end = points.iter().map(|p| p.1).max().unwrap_or(0);

        let expected = (row_end - row_start + 1) * (col_end - col_start + 1);
        if points.len() != expected {
            return Err(PosterError::NonRectangular(*ch));
        }

        labels.push(*ch);
        areas.insert(
            *ch,
            GridArea {
                row_start,
                row_end,
                col_start,
                col_end,
            },
        );
    }

    let rows = grid.len();
    let cols = row_lengths[0];
    Ok(PosterLayout {
        grid,
        labels,
        areas,
        rows,
        cols,
    })
}

static SECTION_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^## ([A-Z]):[ \t]*(.+)$").expect("section header pattern"));

/// Extract `## X: Title` sections from the document body.
pub fn extract_poster_sections(body: &str) -> BTreeMap<char, PosterSection> {
    let matches: Vec<regex::Captures<'_>> = SECTION_HEADER.captures_iter(body).collect();
    let mut sections = BTreeMap::new();

    for (i, caps) in matches.iter().enumerate() {
        let letter = caps[1].chars().next().unwrap_or('?');
        let title = caps[2].trim().to_string();
        let start = caps.get(0).map(|m| m.end()).unwrap_or(0);
        let end = matches
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(body.len());
        let content = body[start..end].trim().to_string();
        sections.insert(letter, PosterSection { title, content });
    }

    sections
}

/// Render the final Marp markdown: frontmatter, scoped grid CSS, and one
/// positioned div per section.
fn generate_poster_markdown(
    frontmatter: &PosterFrontmatter,
    layout: &PosterLayout,
    sections: &BTreeMap<char, PosterSection>,
) -> String {
    let mut parts = vec![
        "---".to_string(),
        "marp: true".to_string(),
        format!("theme: {}", frontmatter.theme),
        format!("size: {}", frontmatter.size),
        "---".to_string(),
        String::new(),
    ];

    let area_rows: Vec<String> = layout
        .grid
        .iter()
        .map(|row| {
            let spaced: Vec<String> = row.iter().map(char::to_string).collect();
            format!("\"{}\"", spaced.join(" "))
        })
        .collect();
    let grid_template = area_rows.join("\n    ");

    parts.push(format!(
        "<style scoped>\nsection {{\n  display: grid;\n  grid-template-areas:\n    {grid_template};\n  grid-template-rows: repeat({}, 1fr);\n  grid-template-columns: repeat({}, 1fr);\n  gap: 1em;\n  padding: 2em;\n}}\n</style>",
        layout.rows, layout.cols
    ));
    parts.push(String::new());

    for label in &layout.labels {
        let Some(section) = sections.get(label) else {
            continue;
        };
        // The 'T' region is the poster's title banner.
        let (css_class, heading) = if *label == 'T' {
            ("poster-title", format!("# {}", section.title))
        } else {
            ("poster-section", format!("### {}", section.title))
        };
        parts.push(format!(
            "<div style=\"grid-area: {label};\" class=\"{css_class}\">\n\n{heading}\n\n{}\n\n</div>",
            section.content
        ));
    }

    let mut out = parts.join("\n");
    out.push('\n');
    out
}

static LAYOUT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```poster-layout\s*\n(.*?)```").expect("layout block pattern"));

/// Process one poster document end to end.
pub fn process_poster(content: &str) -> Result<PosterOutput, PreprocessError> {
    let frontmatter = parse_poster_frontmatter(content)?;

    let layout_text = LAYOUT_BLOCK
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or(PosterError::MissingLayout)?;
    let layout = parse_ascii_layout(layout_text)?;

    let body_start = extract_frontmatter(content)?.body_start;
    let sections = extract_poster_sections(&content[body_start..]);

    let mut warnings = Vec::new();
    for label in &layout.labels {
        if !sections.contains_key(label) {
            warnings.push(format!(
                "Grid label '{label}' has no matching ## {label}: section"
            ));
        }
    }
    for label in sections.keys() {
        if !layout.areas.contains_key(label) {
            warnings.push(format!("Section '{label}' not found in grid layout"));
        }
    }
    for warning in &warnings {
        log::warn!("{warning}");
    }

    let rendered = generate_poster_markdown(&frontmatter, &layout, &sections);
    Ok(PosterOutput {
        content: rendered,
        stats: PosterStats {
            sections: sections.len(),
            grid_size: format!("{}x{}", layout.rows, layout.cols),
            warnings,
        },
    })
}

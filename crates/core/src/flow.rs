//! Flow-diagram blocks rendered as inline SVG.
//!
//! A fenced block tagged `flow` holds rows of `[Node]` tokens joined by
//! `-->` (horizontal) or `==>` (vertical) arrows. Each block becomes a
//! self-contained SVG inside a `diagram-container` div, with an optional
//! caption taken from a `<!-- caption: ... -->` comment right after the
//! closing fence.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Fill, stroke, and label colors for one node theme.
#[derive(Debug, Clone, Copy)]
pub struct ColorScheme {
    /// Background fill, at low opacity so labels stay readable.
    pub fill: &'static str,
    /// Border stroke.
    pub stroke: &'static str,
    /// Label text color.
    pub text: &'static str,
}

const GREEN: ColorScheme = ColorScheme {
    fill: "rgba(0, 105, 62, 0.15)",
    stroke: "#00693e",
    text: "#00693e",
};
const BLUE: ColorScheme = ColorScheme {
    fill: "rgba(38, 122, 186, 0.15)",
    stroke: "#267aba",
    text: "#003c73",
};
const NAVY: ColorScheme = ColorScheme {
    fill: "rgba(0, 60, 115, 0.15)",
    stroke: "#003c73",
    text: "#003c73",
};
const SPRING: ColorScheme = ColorScheme {
    fill: "rgba(196, 221, 136, 0.15)",
    stroke: "#c4dd88",
    text: "#6a8a3a",
};
const RICH_SPRING: ColorScheme = ColorScheme {
    fill: "rgba(165, 215, 95, 0.15)",
    stroke: "#a5d75f",
    text: "#5a8a2a",
};
const TEAL: ColorScheme = ColorScheme {
    fill: "rgba(0, 128, 128, 0.15)",
    stroke: "#008080",
    text: "#006666",
};
const YELLOW: ColorScheme = ColorScheme {
    fill: "rgba(245, 220, 105, 0.15)",
    stroke: "#f5dc69",
    text: "#8a7a30",
};
const ORANGE: ColorScheme = ColorScheme {
    fill: "rgba(255, 160, 15, 0.15)",
    stroke: "#ffa00f",
    text: "#d94415",
};
const TUCK: ColorScheme = ColorScheme {
    fill: "rgba(217, 68, 21, 0.15)",
    stroke: "#d94415",
    text: "#d94415",
};
const RED: ColorScheme = ColorScheme {
    fill: "rgba(157, 22, 46, 0.15)",
    stroke: "#9d162e",
    text: "#9d162e",
};
const VIOLET: ColorScheme = ColorScheme {
    fill: "rgba(138, 105, 150, 0.15)",
    stroke: "#8a6996",
    text: "#6a4d7a",
};
const BROWN: ColorScheme = ColorScheme {
    fill: "rgba(100, 60, 32, 0.15)",
    stroke: "#643c20",
    text: "#643c20",
};
const GRAY: ColorScheme = ColorScheme {
    fill: "rgba(66, 65, 65, 0.15)",
    stroke: "#424141",
    text: "#424141",
};

/// Look up a named color theme. Aliases share their base scheme.
pub fn color_scheme(name: &str) -> Option<ColorScheme> {
    match name {
        "green" => Some(GREEN),
        "blue" | "river-blue" => Some(BLUE),
        "navy" | "river-navy" => Some(NAVY),
        "spring" | "spring-green" => Some(SPRING),
        "rich-spring" => Some(RICH_SPRING),
        "teal" => Some(TEAL),
        "yellow" | "summer" => Some(YELLOW),
        "orange" | "bonfire" => Some(ORANGE),
        "tuck" | "tuck-orange" => Some(TUCK),
        "red" | "bonfire-red" => Some(RED),
        "violet" | "purple" => Some(VIOLET),
        "brown" | "autumn" => Some(BROWN),
        "gray" | "granite" => Some(GRAY),
        _ => None,
    }
}

/// Rotation for nodes that did not name a color.
const DEFAULT_COLOR_SEQUENCE: [&str; 5] = ["green", "teal", "blue", "orange", "gray"];

const MIN_NODE_WIDTH: i64 = 120;
const NODE_HEIGHT: i64 = 70;
const NODE_PADDING: i64 = 40;
const ARROW_WIDTH: i64 = 50;
const SVG_BORDER: i64 = 25;
const FONT_SIZE: f64 = 22.0;

/// One token of a diagram row.
#[derive(Debug, Clone, PartialEq)]
enum FlowElement {
    Node { label: String, color: Option<String> },
    ArrowH,
    ArrowV,
}

fn parse_flow_node(node_text: &str) -> FlowElement {
    if let Some((label, color)) = node_text.rsplit_once(':') {
        let color = color.trim().to_ascii_lowercase();
        let color = color_scheme(&color).map(|_| color);
        FlowElement::Node {
            label: label.trim().to_string(),
            color,
        }
    } else {
        FlowElement::Node {
            label: node_text.trim().to_string(),
            color: None,
        }
    }
}

fn parse_flow_line(line: &str) -> Vec<FlowElement> {
    let mut elements = Vec::new();
    let mut rest = line.trim();

    while !rest.is_empty() {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        if let Some(after_open) = rest.strip_prefix('[') {
            if let Some(close) = after_open.find(']') {
                if close > 0 {
                    elements.push(parse_flow_node(&after_open[..close]));
                    rest = &after_open[close + 1..];
                    continue;
                }
            }
        }
        if let Some(after) = rest.strip_prefix("-->") {
            elements.push(FlowElement::ArrowH);
            rest = after;
            continue;
        }
        if let Some(after) = rest.strip_prefix("==>") {
            elements.push(FlowElement::ArrowV);
            rest = after;
            continue;
        }

        // Skip anything unrecognized, one char at a time.
        let mut chars = rest.chars();
        chars.next();
        rest = chars.as_str();
    }

    elements
}

/// Conservative width estimate for a bold label. Wide glyphs and the
/// deck theme's font push the per-character factor well above a typical
/// average, which is the price of never clipping.
fn text_width(label: &str) -> i64 {
    (label.chars().count() as f64 * FONT_SIZE * 0.85) as i64
}

fn node_width(label: &str) -> i64 {
    MIN_NODE_WIDTH.max(text_width(label) + NODE_PADDING * 2)
}

/// Render parsed diagram rows as an SVG wrapped in a container div.
fn generate_flow_svg(flow_lines: &[&str], caption: Option<&str>) -> String {
    let mut rows: Vec<Vec<FlowElement>> = flow_lines
        .iter()
        .map(|line| parse_flow_line(line))
        .filter(|elems| !elems.is_empty())
        .collect();

    if rows.is_empty() {
        return String::new();
    }

    // Nodes without an explicit color rotate through the default sequence.
    let mut color_idx = 0usize;
    for row in rows.iter_mut() {
        for elem in row.iter_mut() {
            if let FlowElement::Node { color, .. } = elem {
                if color.is_none() {
                    *color = Some(
                        DEFAULT_COLOR_SEQUENCE[color_idx % DEFAULT_COLOR_SEQUENCE.len()]
                            .to_string(),
                    );
                    color_idx += 1;
                }
            }
        }
    }

    let mut row_widths = Vec::with_capacity(rows.len());
    let mut max_row_width = 0i64;
    for row in &rows {
        let mut width = 0i64;
        for elem in row {
            match elem {
                FlowElement::Node { label, .. } => width += node_width(label),
                FlowElement::ArrowH | FlowElement::ArrowV => width += ARROW_WIDTH + 20,
            }
        }
        max_row_width = max_row_width.max(width);
        row_widths.push(width);
    }

    let row_height = NODE_HEIGHT + 20;
    let content_height = rows.len() as i64 * row_height - 20;
    let svg_width = max_row_width + SVG_BORDER * 2;
    let svg_height = content_height + SVG_BORDER * 2;

    // No explicit width/height attributes: the viewBox carries the aspect
    // ratio and the theme CSS controls on-slide sizing.
    let mut svg = Vec::new();
    svg.push(format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {svg_width} {svg_height}\">"
    ));
    svg.push(
        r##"  <defs>
    <symbol id="flow-arrow" viewBox="0 0 76.41 27.12">
      <path d="M43.3,1.69c-.92-.1-1.78.32-2.08,1.1-.3.79.06,1.69.83,2.23l1.19.46s0,0,0,0c0,0,0,0,0,0l15.39,5.94H2.98c-1.1,0-2,.9-2,2s.9,2,2,2h55.64l-15.4,5.94s0,0,0,0c0,0,0,0,0,0l-1.17.45c-.77.54-1.14,1.45-.83,2.24.3.78,1.16,1.2,2.09,1.1l1.15-.42s0,0,.01,0c0,0,0,0,0,0l24.98-9.1c2.07-.75,2.06-3.67,0-4.42L44.45,2.11" fill="currentColor"/>
    </symbol>
  </defs>"##
            .to_string(),
    );

    let mut y_offset = SVG_BORDER + NODE_HEIGHT / 2;
    for (row_idx, row) in rows.iter().enumerate() {
        let mut x_offset = (svg_width - row_widths[row_idx]) / 2;

        for elem in row {
            match elem {
                FlowElement::Node { label, color } => {
                    let color_name = color.as_deref().unwrap_or("green");
                    let colors = color_scheme(color_name).unwrap_or(GREEN);
                    let width = node_width(label);

                    let rect_y = y_offset - NODE_HEIGHT / 2;
                    svg.push(format!(
                        "  <rect x=\"{x_offset}\" y=\"{rect_y}\" width=\"{width}\" height=\"{NODE_HEIGHT}\" rx=\"12\" ry=\"12\""
                    ));
                    svg.push(format!(
                        "        fill=\"{}\" stroke=\"{}\" stroke-width=\"3\"/>",
                        colors.fill, colors.stroke
                    ));

                    let text_x = x_offset + width / 2;
                    let text_y = y_offset + 7;
                    svg.push(format!(
                        "  <text x=\"{text_x}\" y=\"{text_y}\" font-family=\"'Avenir LT Std', Avenir, 'Avenir Next', sans-serif\" font-size=\"22\""
                    ));
                    svg.push(format!(
                        "        font-weight=\"600\" fill=\"{}\" text-anchor=\"middle\">{}</text>",
                        colors.text,
                        html_escape::encode_text(label)
                    ));

                    x_offset += width + 10;
                }
                FlowElement::ArrowH => {
                    let arrow_y = y_offset - 14;
                    svg.push(format!(
                        "  <use href=\"#flow-arrow\" x=\"{x_offset}\" y=\"{arrow_y}\" width=\"{ARROW_WIDTH}\" height=\"28\" style=\"color: #0a2518\"/>"
                    ));
                    x_offset += ARROW_WIDTH + 10;
                }
                FlowElement::ArrowV => {
                    // Row break carries the flow downward; the arrow only
                    // reserves horizontal space.
                    x_offset += 20;
                }
            }
        }

        y_offset += row_height;
    }
    svg.push("</svg>".to_string());

    let mut result = format!("<div class=\"diagram-container\">\n{}\n</div>", svg.join("\n"));
    if let Some(caption) = caption {
        result.push_str(&format!(
            "\n<div class=\"diagram-caption\">{}</div>",
            html_escape::encode_text(caption)
        ));
    }
    result
}

static FLOW_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```flow\n(.*?)```(?:\s*\n\s*<!--\s*caption:\s*(.*?)\s*-->)?")
        .expect("flow block pattern")
});

/// Replace every ` ```flow ` block in `content` with a rendered SVG.
///
/// Returns the rewritten content and the number of diagrams produced.
/// Empty blocks are dropped without counting.
pub fn process_flow_blocks(content: &str) -> (String, usize) {
    let mut diagrams = 0usize;
    let processed = FLOW_BLOCK.replace_all(content, |caps: &Captures<'_>| {
        let body = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let caption = caps.get(2).map(|m| m.as_str());

        let lines: Vec<&str> = body
            .trim()
            .split('\n')
            .filter(|l| !l.trim().is_empty())
            .collect();
        if lines.is_empty() {
            return String::new();
        }

        diagrams += 1;
        generate_flow_svg(&lines, caption)
    });
    (processed.into_owned(), diagrams)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_with_explicit_color() {
        let node = parse_flow_node("Process:teal");
        assert_eq!(
            node,
            FlowElement::Node {
                label: "Process".to_string(),
                color: Some("teal".to_string()),
            }
        );
    }

    #[test]
    fn unknown_color_falls_back_to_auto() {
        let node = parse_flow_node("Process:chartreuse");
        assert_eq!(
            node,
            FlowElement::Node {
                label: "Process".to_string(),
                color: None,
            }
        );
    }

    #[test]
    fn line_tokenizes_nodes_and_arrows() {
        let elems = parse_flow_line("[A] --> [B] ==> [C]");
        assert_eq!(elems.len(), 5);
        assert_eq!(elems[1], FlowElement::ArrowH);
        assert_eq!(elems[3], FlowElement::ArrowV);
    }

    #[test]
    fn diagram_renders_nodes_arrows_and_auto_colors() {
        let (out, count) = process_flow_blocks("```flow\n[Input] --> [Output]\n```\n");
        assert_eq!(count, 1);
        assert!(out.contains("<div class=\"diagram-container\">"));
        assert!(out.contains(">Input</text>"));
        assert!(out.contains(">Output</text>"));
        assert!(out.contains("href=\"#flow-arrow\""));
        // First two auto-colors in sequence.
        assert!(out.contains(GREEN.stroke));
        assert!(out.contains(TEAL.stroke));
    }

    #[test]
    fn caption_comment_becomes_caption_div() {
        let input = "```flow\n[A] --> [B]\n```\n<!-- caption: Data pipeline -->\n";
        let (out, count) = process_flow_blocks(input);
        assert_eq!(count, 1);
        assert!(out.contains("<div class=\"diagram-caption\">Data pipeline</div>"));
        assert!(!out.contains("caption:"));
    }

    #[test]
    fn labels_are_html_escaped() {
        let (out, _) = process_flow_blocks("```flow\n[A <b> & c]\n```\n");
        assert!(out.contains("A &lt;b&gt; &amp; c"));
    }

    #[test]
    fn empty_block_is_removed_and_not_counted() {
        let (out, count) = process_flow_blocks("before\n```flow\n\n```\nafter\n");
        assert_eq!(count, 0);
        assert!(!out.contains("```flow"));
        assert!(!out.contains("<svg"));
    }

    #[test]
    fn non_flow_fences_are_untouched() {
        let input = "```python\nx = 1\n```\n";
        let (out, count) = process_flow_blocks(input);
        assert_eq!(count, 0);
        assert_eq!(out, input);
    }

    #[test]
    fn wide_label_widens_its_node() {
        let narrow = node_width("AB");
        let wide = node_width("A Much Longer Node Label");
        assert_eq!(narrow, MIN_NODE_WIDTH);
        assert!(wide > MIN_NODE_WIDTH);
    }
}

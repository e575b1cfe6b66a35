//! Scale-class decisions and directive injection.
//!
//! A scale class is a Marp `_class` token that shrinks a slide's font by
//! a known percentage, which multiplies the amount of content that fits.
//! The decision rules run from most to least aggressive and the first
//! match wins; slides that opted out or were scaled by hand are left
//! alone.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::HeightModel;
use crate::metrics::{SCALE_CLASS, SlideMetrics, analyze_slide_content};

/// Discrete font-shrink levels, named by the resulting font percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleClass {
    /// 50% font size.
    Scale50,
    /// 55% font size.
    Scale55,
    /// 60% font size.
    Scale60,
    /// 65% font size.
    Scale65,
    /// 70% font size.
    Scale70,
    /// 75% font size.
    Scale75,
    /// 78% font size.
    Scale78,
    /// 80% font size.
    Scale80,
    /// 85% font size.
    Scale85,
    /// 90% font size.
    Scale90,
    /// 95% font size.
    Scale95,
}

impl ScaleClass {
    /// Space multiplier: smaller font means proportionally more content
    /// fits (roughly 100 / font percentage).
    pub fn space_factor(self) -> f64 {
        match self {
            ScaleClass::Scale50 => 2.0,
            ScaleClass::Scale55 => 1.8,
            ScaleClass::Scale60 => 1.67,
            ScaleClass::Scale65 => 1.54,
            ScaleClass::Scale70 => 1.43,
            ScaleClass::Scale75 => 1.33,
            ScaleClass::Scale78 => 1.28,
            ScaleClass::Scale80 => 1.25,
            ScaleClass::Scale85 => 1.18,
            ScaleClass::Scale90 => 1.11,
            ScaleClass::Scale95 => 1.05,
        }
    }

    /// The CSS class token, e.g. `scale-78`.
    pub fn as_str(self) -> &'static str {
        match self {
            ScaleClass::Scale50 => "scale-50",
            ScaleClass::Scale55 => "scale-55",
            ScaleClass::Scale60 => "scale-60",
            ScaleClass::Scale65 => "scale-65",
            ScaleClass::Scale70 => "scale-70",
            ScaleClass::Scale75 => "scale-75",
            ScaleClass::Scale78 => "scale-78",
            ScaleClass::Scale80 => "scale-80",
            ScaleClass::Scale85 => "scale-85",
            ScaleClass::Scale90 => "scale-90",
            ScaleClass::Scale95 => "scale-95",
        }
    }

    /// Parse a `scale-NN` token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "scale-50" => Some(ScaleClass::Scale50),
            "scale-55" => Some(ScaleClass::Scale55),
            "scale-60" => Some(ScaleClass::Scale60),
            "scale-65" => Some(ScaleClass::Scale65),
            "scale-70" => Some(ScaleClass::Scale70),
            "scale-75" => Some(ScaleClass::Scale75),
            "scale-78" => Some(ScaleClass::Scale78),
            "scale-80" => Some(ScaleClass::Scale80),
            "scale-85" => Some(ScaleClass::Scale85),
            "scale-90" => Some(ScaleClass::Scale90),
            "scale-95" => Some(ScaleClass::Scale95),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScaleClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick a scale class for a slide, or `None` when no scaling is needed
/// or allowed.
pub fn determine_scale_class(metrics: &SlideMetrics, model: &HeightModel) -> Option<ScaleClass> {
    if metrics.has_scale_class || metrics.no_autoscale {
        return None;
    }

    let height = metrics.estimated_height;

    // A table inside a callout overflows its box well before the slide
    // itself fills up.
    if metrics.table_in_callout {
        return Some(ScaleClass::Scale78);
    }

    if metrics.has_two_column && metrics.callout_count >= 2 && height > model.budget * 0.9 {
        return Some(ScaleClass::Scale78);
    }

    if metrics.callout_count >= 3 {
        return Some(ScaleClass::Scale80);
    }

    if height > model.budget * 2.0 {
        Some(ScaleClass::Scale50)
    } else if height > model.budget * 1.7 {
        Some(ScaleClass::Scale60)
    } else if height > model.budget * 1.4 {
        Some(ScaleClass::Scale70)
    } else if height > model.budget * 1.2 {
        Some(ScaleClass::Scale78)
    } else if height > model.budget * 1.1 {
        Some(ScaleClass::Scale80)
    } else if height > model.budget {
        Some(ScaleClass::Scale90)
    } else {
        None
    }
}

/// Compute how many code lines fit on a slide, given everything on the
/// slide that is not the code block itself.
///
/// The scale-adjusted budget minus the other content's height converts
/// back to a line count through the code-line weight, with a 0.9 safety
/// factor against edge overflow. Clamped to at least 8 lines and at most
/// `default_max` scaled by the slide's space factor.
pub fn compute_available_code_lines(
    slide_other_content: &str,
    default_max: usize,
    model: &HeightModel,
) -> usize {
    let metrics = analyze_slide_content(slide_other_content, model);

    let scale_factor = metrics
        .existing_scale_class
        .or_else(|| determine_scale_class(&metrics, model))
        .map(ScaleClass::space_factor)
        .unwrap_or(1.0);

    let effective_budget = model.budget * scale_factor;
    let other_height = metrics.base_height(model);

    let available_height = effective_budget - other_height;
    let available_lines = ((available_height / model.code_block_line) * 0.9) as i64;

    let min_lines: i64 = 8;
    let max_lines = (default_max as f64 * scale_factor) as i64;
    available_lines.clamp(min_lines.min(max_lines), max_lines).max(min_lines) as usize
}

static CLASS_DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<!--\s*_class:\s*([^>]*?)\s*-->").expect("class directive"));

/// Inject a scale-class directive at the top of a slide.
///
/// Idempotent: a slide that already carries a scale token is returned
/// unchanged. An existing `_class` directive without a scale token gets
/// the token appended; otherwise a fresh directive is inserted before
/// the first non-blank line.
pub fn inject_scale_class(slide_content: &str, scale_class: ScaleClass) -> String {
    if SCALE_CLASS.is_match(slide_content) {
        return slide_content.to_string();
    }

    if let Some(caps) = CLASS_DIRECTIVE.captures(slide_content) {
        let old_directive = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        let old_classes = caps[1].trim();
        let new_directive = format!("<!-- _class: {old_classes} {scale_class} -->");
        return slide_content.replacen(old_directive, &new_directive, 1);
    }

    let lines: Vec<&str> = slide_content.split('\n').collect();
    let insert_idx = lines
        .iter()
        .position(|line| !line.trim().is_empty())
        .unwrap_or(0);

    let mut out: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
    out.insert(insert_idx, format!("<!-- _class: {scale_class} -->"));
    out.join("\n")
}

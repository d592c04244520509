//! Utility functions for SVG layout: escaping, text metrics and paint helpers.

use super::{constants::*, error::Result};
use crate::models::colors::Gradient;
use std::fmt::Write;

// --- Text Escaping ---

/// Escapes special XML characters for use in SVG text content.
pub fn escape_svg_text(text: &str) -> String {
    htmlize::escape_text(text).into_owned()
}

/// Escapes text for a double-quoted SVG attribute.
pub fn escape_svg_attr(text: &str) -> String {
    htmlize::escape_attribute(text).into_owned()
}

// --- Text Metrics ---

/// Approximate advance width of `text` in pixels.
///
/// No font shaping happens at layout time, so widths come from an average
/// glyph width per em. Wide glyphs (`m`, `w`, capitals) and narrow ones
/// (`i`, `l`, punctuation) are weighted to keep wrapping conservative.
pub fn text_width_px(text: &str, font_px: f64, bold: bool) -> f64 {
    let ems: f64 = text
        .chars()
        .map(|c| match c {
            ' ' => 0.28,
            'i' | 'l' | 'j' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' => 0.28,
            'f' | 't' | 'r' | '(' | ')' | '-' => 0.36,
            'm' | 'w' => 0.84,
            'M' | 'W' => 0.92,
            c if c.is_ascii_uppercase() || c.is_ascii_digit() => 0.64,
            c if c.is_ascii() => AVERAGE_GLYPH_EM,
            // Non-Latin scripts and symbols tend to be wider.
            _ => 0.7,
        })
        .sum();
    let weight = if bold { BOLD_WIDTH_FACTOR } else { 1.0 };
    ems * font_px * weight
}

/// Height of one text line for a font size.
pub fn line_height(font_px: f64) -> f64 {
    font_px * LINE_HEIGHT_FACTOR
}

// --- Paint ---

/// Writes a `<linearGradient>` definition for `gradient` with the given id.
/// Stops are spread evenly from left to right, matching the CSS `to right` direction.
pub fn write_gradient_def(id: &str, gradient: &Gradient, defs: &mut String) -> Result<()> {
    writeln!(
        defs,
        r#"    <linearGradient id="{id}" x1="0" y1="0" x2="1" y2="0">"#
    )?;
    let last = gradient.stops.len().saturating_sub(1).max(1) as f64;
    for (index, stop) in gradient.stops.iter().enumerate() {
        writeln!(
            defs,
            r#"      <stop offset="{:.0}%" stop-color="{}" />"#,
            index as f64 / last * 100.0,
            stop.to_hex()
        )?;
    }
    writeln!(defs, "    </linearGradient>")?;
    Ok(())
}

//! Draws individual fragment nodes onto the canvas, advancing the vertical cursor.

use std::fmt::Write;

use super::{
    constants::*,
    error::Result,
    structure::Canvas,
    text::{flatten_rich_text, wrap_plain, wrap_runs, Line},
    utils::{escape_svg_text, line_height},
};
use crate::converters::html::{FragmentNode, Level, NodeKind, TableBlock, NO_DATA_LABEL};
use crate::converters::style::Band;
use crate::models::rich_text::RichText;

/// Lays out `node` and its subtree starting at horizontal offset `x`.
///
/// Hidden nodes are skipped with their subtree, and controls are never drawn.
pub(crate) fn convert_node_to_svg(node: &FragmentNode, x: f64, canvas: &mut Canvas) -> Result<()> {
    if !node.visible {
        return Ok(());
    }
    match &node.kind {
        NodeKind::Section { level, name, band } => {
            let x = match level {
                Level::Cycle | Level::Group => x,
                Level::Subgroup => x + SUBGROUP_INDENT,
                Level::Category => x + CATEGORY_INDENT,
            };
            convert_heading_to_svg(*level, name, band.as_ref(), x, canvas)?;
            for child in &node.children {
                convert_node_to_svg(child, x, canvas)?;
            }
        }
        NodeKind::Preparations(text) => convert_rich_text_to_svg(text, x, canvas)?,
        NodeKind::Table(table) => convert_table_to_svg(table, x, canvas)?,
        NodeKind::Control { .. } => {}
    }
    Ok(())
}

fn heading_scale(level: Level) -> f64 {
    match level {
        Level::Cycle => CYCLE_HEADING_SCALE,
        Level::Group => GROUP_HEADING_SCALE,
        Level::Subgroup => SUBGROUP_HEADING_SCALE,
        Level::Category => CATEGORY_HEADING_SCALE,
    }
}

fn convert_heading_to_svg(
    level: Level,
    name: &str,
    band: Option<&Band>,
    x: f64,
    canvas: &mut Canvas,
) -> Result<()> {
    let font_px = canvas.style.base_font_px * heading_scale(level);
    let lh = line_height(font_px);
    let width = canvas.right() - x;

    match band {
        Some(band) => {
            let lines = wrap_plain(name, width - 2.0 * BAND_PADDING_X, font_px);
            let height = lines.len().max(1) as f64 * lh + 2.0 * BAND_PADDING_Y;
            canvas.y += BLOCK_GAP;
            let fill = canvas.paint(band)?;
            writeln!(
                canvas.body,
                r#"  <rect x="{x:.2}" y="{:.2}" width="{width:.2}" height="{height:.2}" rx="{BAND_RADIUS}" fill="{fill}" />"#,
                canvas.y
            )?;
            let text_x = x + BAND_PADDING_X;
            let mut baseline = canvas.y + BAND_PADDING_Y;
            for line in &lines {
                baseline += lh;
                write_text_line(
                    canvas,
                    text_x,
                    baseline - lh * 0.28,
                    font_px,
                    &band.foreground.to_hex(),
                    true,
                    line,
                )?;
            }
            canvas.y += height;
        }
        None => {
            let lines = wrap_plain(name, width, font_px);
            canvas.y += BLOCK_GAP / 2.0;
            let color = canvas.style.text_color.clone();
            for line in &lines {
                canvas.y += lh;
                let baseline = canvas.y - lh * 0.28;
                write_text_line(canvas, x, baseline, font_px, &color, true, line)?;
            }
        }
    }
    canvas.y += BLOCK_GAP / 2.0;
    Ok(())
}

fn write_text_line(
    canvas: &mut Canvas,
    x: f64,
    baseline: f64,
    font_px: f64,
    fill: &str,
    bold: bool,
    text: &str,
) -> Result<()> {
    writeln!(
        canvas.body,
        r#"  <text x="{x:.2}" y="{baseline:.2}" font-size="{font_px:.2}"{} fill="{fill}">{}</text>"#,
        if bold { r#" font-weight="bold""# } else { "" },
        escape_svg_text(text)
    )?;
    Ok(())
}

fn write_styled_line(
    canvas: &mut Canvas,
    x: f64,
    baseline: f64,
    font_px: f64,
    line: &Line,
) -> Result<()> {
    write!(
        canvas.body,
        r#"  <text x="{x:.2}" y="{baseline:.2}" font-size="{font_px:.2}" xml:space="preserve">"#
    )?;
    for run in line {
        write!(
            canvas.body,
            "<tspan{}{}>{}</tspan>",
            if run.bold { r#" font-weight="bold""# } else { "" },
            if run.italic { r#" font-style="italic""# } else { "" },
            escape_svg_text(&run.text)
        )?;
    }
    writeln!(canvas.body, "</text>")?;
    Ok(())
}

fn convert_rich_text_to_svg(text: &RichText, x: f64, canvas: &mut Canvas) -> Result<()> {
    let font_px = canvas.style.base_font_px;
    let lh = line_height(font_px);
    let base_x = x + BLOCK_GAP;

    canvas.y += BLOCK_GAP / 2.0;
    for paragraph in flatten_rich_text(text.as_str()) {
        let text_x = base_x + paragraph.depth as f64 * LIST_INDENT;
        let lines = wrap_runs(&paragraph.runs, canvas.right() - text_x, font_px);
        for (index, line) in lines.iter().enumerate() {
            canvas.y += lh;
            let baseline = canvas.y - lh * 0.28;
            if index == 0 {
                if let Some(marker) = &paragraph.marker {
                    let color = canvas.style.text_color.clone();
                    write_text_line(
                        canvas,
                        text_x - LIST_INDENT + 4.0,
                        baseline,
                        font_px,
                        &color,
                        false,
                        marker,
                    )?;
                }
            }
            write_styled_line(canvas, text_x, baseline, font_px, line)?;
        }
    }
    canvas.y += BLOCK_GAP / 2.0;
    Ok(())
}

/// Draws the title band and a literal grid of `rows × column_count` cells.
/// A table without rows draws one placeholder row spanning the full width.
fn convert_table_to_svg(table: &TableBlock, x: f64, canvas: &mut Canvas) -> Result<()> {
    let font_px = canvas.style.base_font_px;
    let lh = line_height(font_px);
    let width = canvas.right() - x;
    let columns = table.column_count.max(1);
    let column_width = width / columns as f64;

    // --- Title band ---
    canvas.y += BLOCK_GAP / 2.0;
    let title_lines = wrap_plain(&table.name, width - 2.0 * CELL_PADDING_X, font_px);
    let title_height = title_lines.len().max(1) as f64 * lh + 2.0 * CELL_PADDING_Y;
    let fill = canvas.paint(&table.band)?;
    writeln!(
        canvas.body,
        r#"  <rect x="{x:.2}" y="{:.2}" width="{width:.2}" height="{title_height:.2}" fill="{fill}" />"#,
        canvas.y
    )?;
    let mut baseline = canvas.y + CELL_PADDING_Y;
    let title_color = table.band.foreground.to_hex();
    for line in &title_lines {
        baseline += lh;
        write_text_line(
            canvas,
            x + CELL_PADDING_X,
            baseline - lh * 0.28,
            font_px,
            &title_color,
            true,
            line,
        )?;
    }
    canvas.y += title_height;

    // --- Grid ---
    if table.is_empty() {
        let height = lh + 2.0 * CELL_PADDING_Y;
        writeln!(
            canvas.body,
            r#"  <rect x="{x:.2}" y="{:.2}" width="{width:.2}" height="{height:.2}" fill="none" stroke="{TABLE_BORDER_COLOR}" />"#,
            canvas.y
        )?;
        writeln!(
            canvas.body,
            r#"  <text x="{:.2}" y="{:.2}" font-size="{font_px:.2}" font-style="italic" text-anchor="middle" fill="{MUTED_TEXT_COLOR}">{NO_DATA_LABEL}</text>"#,
            x + width / 2.0,
            canvas.y + CELL_PADDING_Y + lh * 0.72
        )?;
        canvas.y += height;
    }

    let text_color = canvas.style.text_color.clone();
    for row in &table.rows {
        let wrapped: Vec<Vec<String>> = row
            .iter()
            .map(|cell| wrap_plain(cell, column_width - 2.0 * CELL_PADDING_X, font_px))
            .collect();
        let line_count = wrapped.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let row_height = line_count as f64 * lh + 2.0 * CELL_PADDING_Y;

        for column in 0..columns {
            let cell_x = x + column as f64 * column_width;
            writeln!(
                canvas.body,
                r#"  <rect x="{cell_x:.2}" y="{:.2}" width="{column_width:.2}" height="{row_height:.2}" fill="none" stroke="{TABLE_BORDER_COLOR}" />"#,
                canvas.y
            )?;
            let mut baseline = canvas.y + CELL_PADDING_Y;
            for line in wrapped.get(column).map(Vec::as_slice).unwrap_or_default() {
                baseline += lh;
                write_text_line(
                    canvas,
                    cell_x + CELL_PADDING_X,
                    baseline - lh * 0.28,
                    font_px,
                    &text_color,
                    false,
                    line,
                )?;
            }
        }
        canvas.y += row_height;
    }
    canvas.y += BLOCK_GAP;
    Ok(())
}

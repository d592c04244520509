//! Handles the overall canvas: document header, gradient definitions, background
//! and the vertical cursor shared by every element writer.

use std::fmt::Write;

use super::{
    constants::*,
    elements::convert_node_to_svg,
    error::{Result, SvgConversionError},
    utils::{escape_svg_attr, write_gradient_def},
};
use crate::converters::html::VisualFragment;
use crate::converters::style::Band;
use crate::models::page::PageStyle;

/// Canvas geometry and typography for one layout pass.
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Canvas width in CSS pixels (page content width).
    pub width_px: f64,
    pub style: PageStyle,
}

impl LayoutOptions {
    /// Canvas as wide as the printable area of a page, `page_width_mm - 2 * margin_mm`.
    pub fn for_page(page_width_mm: f64, margin_mm: f64, style: PageStyle) -> Self {
        LayoutOptions {
            width_px: (page_width_mm - 2.0 * margin_mm) * PX_PER_MM,
            style,
        }
    }
}

/// A finished SVG document with its intrinsic size in CSS pixels.
#[derive(Debug, Clone)]
pub struct SvgCanvas {
    pub svg: String,
    pub width: f64,
    pub height: f64,
}

/// Mutable layout state: body markup, gradient definitions and the vertical cursor.
pub(crate) struct Canvas<'a> {
    pub body: String,
    pub defs: String,
    /// Top of the next block.
    pub y: f64,
    pub width: f64,
    pub style: &'a PageStyle,
    gradient_count: usize,
}

impl<'a> Canvas<'a> {
    fn new(width: f64, style: &'a PageStyle) -> Self {
        Canvas {
            body: String::new(),
            defs: String::new(),
            y: CANVAS_PADDING,
            width,
            style,
            gradient_count: 0,
        }
    }

    /// Right edge of the content area.
    pub fn right(&self) -> f64 {
        self.width - CANVAS_PADDING
    }

    /// Fill value for a band: a plain color, or a reference to a new gradient definition.
    pub fn paint(&mut self, band: &Band) -> Result<String> {
        if !band.scale.is_gradient() {
            return Ok(band.scale.base().to_hex());
        }
        let id = format!("band-{}", self.gradient_count);
        self.gradient_count += 1;
        write_gradient_def(&id, &band.scale, &mut self.defs)?;
        Ok(format!("url(#{id})"))
    }

    fn finish(self) -> Result<SvgCanvas> {
        let height = (self.y + CANVAS_PADDING).ceil();
        let width = self.width.ceil();
        let mut svg = String::with_capacity(self.body.len() + self.defs.len() + 512);

        // --- SVG Header ---
        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
        )?;
        if !self.defs.is_empty() {
            writeln!(svg, "  <defs>")?;
            svg.push_str(&self.defs);
            writeln!(svg, "  </defs>")?;
        }
        writeln!(
            svg,
            r#"  <rect width="100%" height="100%" fill="{}" />"#,
            escape_svg_attr(&self.style.background)
        )?;
        writeln!(
            svg,
            r#"  <g font-family="{}">"#,
            escape_svg_attr(&self.style.font_family)
        )?;
        svg.push_str(&self.body);
        writeln!(svg, "  </g>")?;
        writeln!(svg, "</svg>")?;

        Ok(SvgCanvas { svg, width, height })
    }
}

/// Lays out one fragment onto its own canvas.
///
/// # Arguments
/// * `fragment` - The fragment to draw. Hidden nodes are skipped, so callers
///   normally pass fragments that went through visibility normalization.
/// * `options` - Canvas width and page style.
///
/// # Returns
/// The SVG document and its size, or `SvgConversionError::MissingData` when the
/// canvas is too narrow to hold any content.
pub fn convert_fragment_to_svg(
    fragment: &VisualFragment,
    options: &LayoutOptions,
) -> Result<SvgCanvas> {
    if options.width_px <= 2.0 * CANVAS_PADDING + CATEGORY_INDENT {
        return Err(SvgConversionError::MissingData(format!(
            "canvas width {:.1}px is too narrow",
            options.width_px
        )));
    }
    let mut canvas = Canvas::new(options.width_px, &options.style);
    convert_node_to_svg(&fragment.root, CANVAS_PADDING, &mut canvas)?;
    canvas.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::html::{prepare_for_capture, render};
    use crate::models::classification::{Cycle, Group};
    use crate::models::rich_text::RichText;
    use crate::models::table::Table;

    fn fragment(tables: Vec<Table>) -> VisualFragment {
        let cycles = vec![Cycle {
            id: 1,
            name: "Antibiotics".into(),
            color_scale: "from-blue-500 via-indigo-500 to-purple-600".into(),
            children: vec![Group {
                id: 1,
                name: "Penicillins".into(),
                color_scale: Some("emerald-100".into()),
                preparations_html: Some(RichText::from("<ul><li>Amoxicillin</li></ul>")),
                subgroups: vec![],
                tables: Some(tables),
            }],
        }];
        prepare_for_capture(&render(&cycles)).remove(0)
    }

    fn options() -> LayoutOptions {
        LayoutOptions::for_page(210.0, 10.0, PageStyle::default())
    }

    #[test]
    fn draws_headers_preparations_and_gradient() {
        let canvas = convert_fragment_to_svg(&fragment(vec![]), &options()).unwrap();
        assert!(canvas.svg.starts_with("<svg"));
        assert!(canvas.svg.contains(">Antibiotics</text>"));
        assert!(canvas.svg.contains(">Penicillins</text>"));
        assert!(canvas.svg.contains(">Amoxicillin</tspan>"));
        assert!(canvas.svg.contains(">•</text>"));
        assert!(canvas.svg.contains("<linearGradient id=\"band-0\""));
        assert!(canvas.svg.contains("fill=\"url(#band-0)\""));
        assert!(canvas.height > 0.0);
    }

    #[test]
    fn empty_table_draws_placeholder_and_full_table_grows_canvas() {
        let empty = convert_fragment_to_svg(&fragment(vec![Table::empty(1, "T", 2)]), &options())
            .unwrap();
        assert!(empty.svg.contains(">No data</text>"));

        let rows: Vec<[&str; 2]> = (0..20).map(|_| ["cell", "value"]).collect();
        let full = convert_fragment_to_svg(&fragment(vec![Table::from_rows(1, "T", rows)]), &options())
            .unwrap();
        assert!(full.height > empty.height);
        assert!(!full.svg.contains(">No data</text>"));
    }

    #[test]
    fn parses_as_svg() {
        let canvas = convert_fragment_to_svg(
            &fragment(vec![Table::from_rows(1, "A & B", [["<x>", "y"]])]),
            &options(),
        )
        .unwrap();
        let tree = usvg::Tree::from_str(&canvas.svg, &usvg::Options::default());
        assert!(tree.is_ok());
    }

    #[test]
    fn rejects_narrow_canvas() {
        let narrow = LayoutOptions {
            width_px: 10.0,
            style: PageStyle::default(),
        };
        assert!(convert_fragment_to_svg(&fragment(vec![]), &narrow).is_err());
    }
}

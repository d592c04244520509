//! Assembles fragments into a standalone HTML document.

use std::fmt::Write;

use super::{
    constants::PRINT_STYLESHEET,
    elements::convert_fragment_to_html,
    error::{HtmlConversionError, Result},
    fragment::VisualFragment,
    utils::escape_html_text,
};
use crate::models::page::{PageFormat, PageStyle};

/// Document-level settings: page geometry, typography and print behaviour.
#[derive(Debug, Clone)]
pub struct DocumentOptions {
    pub style: PageStyle,
    pub page_format: PageFormat,
    pub landscape: bool,
    pub margin_mm: f64,
    /// Emit `@page` margin boxes with the title and "Page N of M".
    pub running_header: bool,
    /// Open the platform print flow once the document has loaded, after this many milliseconds.
    pub auto_print_after_ms: Option<u64>,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        DocumentOptions {
            style: PageStyle::default(),
            page_format: PageFormat::A4,
            landscape: false,
            margin_mm: 10.0,
            running_header: true,
            auto_print_after_ms: None,
        }
    }
}

/// Serializes `fragments` into a complete HTML document with the print stylesheet embedded.
///
/// # Arguments
/// * `fragments` - Prepared fragments, in output order.
/// * `options` - Page geometry and computed page style.
///
/// # Returns
/// The document markup, or an `HtmlConversionError` if formatting fails.
pub fn render_document(fragments: &[VisualFragment], options: &DocumentOptions) -> Result<String> {
    if !options.margin_mm.is_finite() || options.margin_mm < 0.0 {
        return Err(HtmlConversionError::MissingData(format!(
            "invalid page margin {}",
            options.margin_mm
        )));
    }
    let style = &options.style;
    let mut html = String::with_capacity(4096);

    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, r#"<html lang="en">"#)?;
    writeln!(html, "<head>")?;
    writeln!(html, r#"<meta charset="utf-8">"#)?;
    writeln!(html, "<title>{}</title>", escape_html_text(&style.title))?;
    writeln!(html, "<style>")?;
    write_page_rules(options, &mut html)?;
    writeln!(
        html,
        "body {{ margin: 0; font-family: {}; font-size: {}px; color: {}; background: {}; }}",
        style.font_family, style.base_font_px, style.text_color, style.background
    )?;
    html.push_str(BASE_STYLESHEET);
    html.push_str(PRINT_STYLESHEET);
    writeln!(html, "</style>")?;
    writeln!(html, "</head>")?;
    writeln!(html, r#"<body data-print-mode="true">"#)?;
    writeln!(html, r#"<main class="classification">"#)?;

    for fragment in fragments {
        convert_fragment_to_html(fragment, &mut html)?;
    }

    writeln!(html, "</main>")?;
    if let Some(delay) = options.auto_print_after_ms {
        writeln!(
            html,
            "<script>window.addEventListener('load', function () {{ setTimeout(function () {{ window.print(); }}, {delay}); }});</script>"
        )?;
    }
    writeln!(html, "</body>")?;
    writeln!(html, "</html>")?;
    Ok(html)
}

fn write_page_rules(options: &DocumentOptions, html: &mut String) -> Result<()> {
    let orientation = if options.landscape {
        "landscape"
    } else {
        "portrait"
    };
    writeln!(html, "@page {{")?;
    writeln!(
        html,
        "  size: {} {orientation};",
        options.page_format.css_name()
    )?;
    writeln!(html, "  margin: {}mm;", options.margin_mm)?;
    if options.running_header {
        write_running_boxes(&options.style.title, html)?;
    }
    writeln!(html, "}}")?;
    Ok(())
}

/// Writes the `@page` margin boxes: `title` on top, "Page N of M" at the bottom.
/// Must be written inside an `@page { ... }` block.
pub(crate) fn write_running_boxes(title: &str, out: &mut String) -> std::fmt::Result {
    // CSS string literal: quotes and backslashes need escaping.
    let title = title.replace('\\', "\\\\").replace('"', "\\\"");
    writeln!(
        out,
        "  @top-center {{ content: \"{title}\"; font-size: 9px; color: #6b7280; }}"
    )?;
    writeln!(
        out,
        "  @bottom-center {{ content: \"Page \" counter(page) \" of \" counter(pages); font-size: 9px; color: #6b7280; }}"
    )
}

const BASE_STYLESHEET: &str = r#"
.classification { padding: 8px; }
.band { padding: 8px 12px; border-radius: 6px; margin: 8px 0; }
.band h1, .band h2 { margin: 0; }
.cycle-section h1 { font-size: 1.6em; }
.group-section h2 { font-size: 1.3em; }
.subgroup-section { margin-left: 12px; }
.category-section { margin-left: 24px; }
.preparations { margin: 6px 0 6px 8px; }
.table-title { font-weight: bold; padding: 4px 8px; margin: 6px 0 0 0; }
table.data-table { border-collapse: collapse; width: 100%; margin-bottom: 8px; }
table.data-table td { border: 1px solid #d1d5db; padding: 4px 6px; vertical-align: top; }
tr.no-data td { color: #6b7280; font-style: italic; text-align: center; }
"#;

//! Serializes individual fragment nodes to HTML markup.

use std::fmt::Write;

use super::{
    constants::*,
    error::Result,
    fragment::{FragmentNode, Level, NodeKind, TableBlock, VisualFragment},
    utils::{escape_html_attr, escape_html_text},
};
use crate::converters::style::Band;

/// Writes one cycle fragment as a `<section>` element.
pub(crate) fn convert_fragment_to_html(fragment: &VisualFragment, out: &mut String) -> Result<()> {
    let break_style = if fragment.break_before {
        PAGE_BREAK_STYLE
    } else {
        ""
    };
    convert_node_to_html(&fragment.root, break_style, out)
}

fn visibility_attrs(node: &FragmentNode) -> &'static str {
    if node.visible {
        ""
    } else {
        r#" hidden data-collapsed="true""#
    }
}

/// Writes `node` and its subtree. `extra_style` is prepended to the element's inline style.
fn convert_node_to_html(node: &FragmentNode, extra_style: &str, out: &mut String) -> Result<()> {
    let key = escape_html_attr(node.key.as_str());
    match &node.kind {
        NodeKind::Section { level, name, band } => {
            let (tag, class, heading) = match level {
                Level::Cycle => ("section", CYCLE_CLASS, "h1"),
                Level::Group => ("section", GROUP_CLASS, "h2"),
                Level::Subgroup => ("div", SUBGROUP_CLASS, "h3"),
                Level::Category => ("div", CATEGORY_CLASS, "h4"),
            };
            write!(out, r#"<{tag} class="{class}" data-node="{key}""#)?;
            if !extra_style.is_empty() {
                write!(out, r#" style="{extra_style}""#)?;
            }
            writeln!(out, "{}>", visibility_attrs(node))?;
            write_heading(heading, name, band.as_ref(), out)?;
            for child in &node.children {
                convert_node_to_html(child, "", out)?;
            }
            writeln!(out, "</{tag}>")?;
        }
        NodeKind::Preparations(text) => {
            // Trusted markup goes in untouched.
            writeln!(
                out,
                r#"<div class="preparations" data-node="{key}"{}>{text}</div>"#,
                visibility_attrs(node)
            )?;
        }
        NodeKind::Table(table) => {
            writeln!(
                out,
                r#"<div class="table-block" data-node="{key}"{}>"#,
                visibility_attrs(node)
            )?;
            convert_table_to_html(table, out)?;
            for child in &node.children {
                convert_node_to_html(child, "", out)?;
            }
            writeln!(out, "</div>")?;
        }
        NodeKind::Control { label } => {
            writeln!(
                out,
                r#"<button type="button" class="{CONTROL_CLASS}" data-control="{key}">{}</button>"#,
                escape_html_text(label)
            )?;
        }
    }
    Ok(())
}

fn write_heading(tag: &str, name: &str, band: Option<&Band>, out: &mut String) -> Result<()> {
    match band {
        Some(band) => writeln!(
            out,
            r#"<header class="band{}" style="{}"><{tag}>{}</{tag}></header>"#,
            if band.light { " band-light" } else { " band-dark" },
            escape_html_attr(&band.css()),
            escape_html_text(name)
        )?,
        None => writeln!(out, "<{tag}>{}</{tag}>", escape_html_text(name))?,
    }
    Ok(())
}

/// Writes the literal grid: one `<tr>` per row, one `<td>` per cell.
/// A table without rows gets a single placeholder row spanning every column.
fn convert_table_to_html(table: &TableBlock, out: &mut String) -> Result<()> {
    writeln!(
        out,
        r#"<div class="table-title band" style="{}">{}</div>"#,
        escape_html_attr(&table.band.css()),
        escape_html_text(&table.name)
    )?;
    writeln!(
        out,
        r#"<table class="{TABLE_CLASS}" data-columns="{}" data-rows="{}"><tbody>"#,
        table.column_count,
        table.rows.len()
    )?;
    if table.is_empty() {
        writeln!(
            out,
            r#"<tr class="{NO_DATA_CLASS}"><td colspan="{}">{NO_DATA_LABEL}</td></tr>"#,
            table.column_count.max(1)
        )?;
    }
    for row in &table.rows {
        out.push_str("<tr>");
        for cell in row {
            write!(out, "<td>{}</td>", escape_html_text(cell))?;
        }
        out.push_str("</tr>\n");
    }
    writeln!(out, "</tbody></table>")?;
    Ok(())
}

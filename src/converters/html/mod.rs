//! Flattens the classification tree into printable fragments and serializes them to HTML.
//!
//! This module provides the flattener (`render`, `render_with`), the fragment model
//! shared by every capture strategy, and the standalone document writer.
//!
//! # Output guarantees
//! *   One fragment per cycle, in source order; every fragment after the first starts on a new page.
//! *   Inside a fragment: header, preparations, tables, then nested sections, depth-first.
//! *   Preparations are embedded verbatim. Names and cell contents are escaped.
//! *   A table without rows renders a visible "No data" row.
//! *   The embedded print stylesheet forces collapsed regions open and hides editor controls.

mod constants;
mod document;
mod elements;
mod error;
mod fragment;
mod structure;
mod utils;

pub use constants::{
    CYCLE_CLASS, GROUP_CLASS, NO_DATA_LABEL, PAGE_BREAK_STYLE, PRINT_STYLESHEET, TABLE_CLASS,
};
pub use document::{render_document, DocumentOptions};
pub(crate) use document::write_running_boxes;
pub use error::{HtmlConversionError, Result};
pub use fragment::{
    is_content_empty, prepare_for_capture, DepthFirst, FragmentNode, Level, NodeKey, NodeKind,
    TableBlock, VisualFragment,
};
pub use structure::{render, render_with, RenderOptions};
pub use utils::{escape_html_attr, escape_html_text};

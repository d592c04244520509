//! Lays visual fragments out on an SVG canvas for rasterization.
//!
//! The HTML output relies on a browser for layout. The in-process capture path
//! has no browser, so this module performs a simple block layout of its own:
//! colored header bands, wrapped rich text and table grids, stacked top to bottom.
//!
//! # Current Features & Limitations:
//! *   One canvas per fragment; the canvas grows vertically with the content.
//! *   Gradient bands become `<linearGradient>` definitions with evenly spaced stops.
//! *   Rich text keeps paragraphs, list markers, nesting, bold and italic.
//! *   Text widths are estimated, not shaped, so wrapping is approximate.

mod constants;
mod elements;
mod error;
mod structure;
mod text;
mod utils;

pub use constants::PX_PER_MM;
pub use error::{Result, SvgConversionError};
pub use structure::{convert_fragment_to_svg, LayoutOptions, SvgCanvas};

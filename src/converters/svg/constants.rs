//! Defines constants used throughout the SVG layout process.

// CSS reference pixel: 96 per inch.
pub const PX_PER_INCH: f64 = 96.0;
pub const MM_PER_INCH: f64 = 25.4;
pub const PX_PER_MM: f64 = PX_PER_INCH / MM_PER_INCH;

// Text metrics used by the width estimator.
pub const AVERAGE_GLYPH_EM: f64 = 0.55;
pub const BOLD_WIDTH_FACTOR: f64 = 1.08;
pub const LINE_HEIGHT_FACTOR: f64 = 1.4;

// Heading sizes relative to the base font size.
pub const CYCLE_HEADING_SCALE: f64 = 1.6;
pub const GROUP_HEADING_SCALE: f64 = 1.3;
pub const SUBGROUP_HEADING_SCALE: f64 = 1.15;
pub const CATEGORY_HEADING_SCALE: f64 = 1.05;

// Box model (px).
pub const CANVAS_PADDING: f64 = 8.0;
pub const BAND_PADDING_X: f64 = 12.0;
pub const BAND_PADDING_Y: f64 = 8.0;
pub const BAND_RADIUS: f64 = 6.0;
pub const BLOCK_GAP: f64 = 8.0;
pub const SUBGROUP_INDENT: f64 = 12.0;
pub const CATEGORY_INDENT: f64 = 24.0;
pub const LIST_INDENT: f64 = 18.0;
pub const CELL_PADDING_X: f64 = 6.0;
pub const CELL_PADDING_Y: f64 = 4.0;

pub const TABLE_BORDER_COLOR: &str = "#d1d5db";
pub const MUTED_TEXT_COLOR: &str = "#6b7280";

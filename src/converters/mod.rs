pub mod html;
pub mod style;
pub mod svg;

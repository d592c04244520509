use thiserror::Error;

/// Errors that can occur while laying fragments out on an SVG canvas.
#[derive(Error, Debug)]
pub enum SvgConversionError {
    #[error("Formatting error during SVG generation: {0}")]
    FormatError(#[from] std::fmt::Error),
    #[error("Missing expected data necessary for layout: {0}")]
    MissingData(String),
    #[error("An internal error occurred during layout: {0}")]
    Internal(String),
}

/// A specialized Result type for SVG layout operations.
pub type Result<T> = std::result::Result<T, SvgConversionError>;

use thiserror::Error;

/// Errors that can occur while serializing fragments to HTML.
#[derive(Error, Debug)]
pub enum HtmlConversionError {
    #[error("Formatting error during HTML generation: {0}")]
    FormatError(#[from] std::fmt::Error),
    #[error("Missing expected data necessary for conversion: {0}")]
    MissingData(String),
    #[error("An internal error occurred during conversion: {0}")]
    Internal(String),
}

/// A specialized Result type for HTML conversion operations.
pub type Result<T> = std::result::Result<T, HtmlConversionError>;

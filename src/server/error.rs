use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors of the print service, each mapped onto an HTTP status.
#[derive(Error, Debug)]
pub enum PrintServiceError {
    /// The request body is missing a source or carries invalid options.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// The page never showed any group or table content.
    #[error("No content to print: {0}")]
    ZeroContent(String),

    /// Content readiness or the browser run exceeded its bound.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The printable page could not be fetched.
    #[error("Failed to load printable page: {0}")]
    Upstream(#[from] reqwest::Error),

    /// The headless browser failed or produced no PDF.
    #[error("Browser failed: {0}")]
    Browser(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PrintServiceError>;

impl PrintServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            PrintServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            PrintServiceError::ZeroContent(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PrintServiceError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            PrintServiceError::Upstream(_) | PrintServiceError::Browser(_) => StatusCode::BAD_GATEWAY,
            PrintServiceError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            PrintServiceError::BadRequest(_) => "Invalid request",
            PrintServiceError::ZeroContent(_) => "No content to print",
            PrintServiceError::Timeout(_) => "PDF generation timed out",
            PrintServiceError::Upstream(_) => "Printable page unavailable",
            PrintServiceError::Browser(_) => "PDF generation failed",
            PrintServiceError::Io(_) => "Internal error",
        }
    }
}

impl IntoResponse for PrintServiceError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.label(),
            "details": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}

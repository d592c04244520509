//! Remote capture: asks the print service to render the printable page with a
//! headless browser and returns the PDF it produces.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{settle, CaptureFailure, CaptureResult, CaptureStrategy, FailureKind};
use crate::config::ExportConfig;
use crate::converters::html::{
    is_content_empty, prepare_for_capture, render_document, VisualFragment,
};
use crate::models::export::{CaptureOutput, Document};

const NAME: &str = "remote";

/// Smallest payload accepted as a real PDF.
const MIN_PDF_BYTES: usize = 256;

/// Body of `POST /api/pdf/generate`.
///
/// Either `url` (a printable page to load) or `html` (a prepared document) must be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout: u64,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub landscape: bool,
}

fn default_wait_timeout() -> u64 {
    8_000
}

fn default_scale() -> f64 {
    crate::config::DEFAULT_REMOTE_SCALE
}

fn default_format() -> String {
    "a4".to_string()
}

/// Error body returned by the print service.
#[derive(Debug, Deserialize)]
struct ServiceError {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

pub struct RemoteStrategy {
    config: ExportConfig,
    client: Option<reqwest::Client>,
}

impl RemoteStrategy {
    pub fn new(config: ExportConfig) -> Self {
        RemoteStrategy {
            config,
            client: None,
        }
    }

    /// Uses a caller-provided HTTP client instead of building one per attempt.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    fn failure(kind: FailureKind, detail: impl Into<String>) -> CaptureFailure {
        CaptureFailure::new(NAME, kind, detail)
    }

    /// Builds the request body. With a print-page URL configured the service loads
    /// that page in print mode for the selected cycles; otherwise the prepared
    /// document travels inline.
    pub fn build_request(&self, prepared: &[VisualFragment]) -> Result<RemoteRequest, CaptureFailure> {
        let remote = &self.config.remote;
        let (url, html) = match &remote.print_page_url {
            Some(base) => (Some(printable_url(base, prepared)?), None),
            None => {
                let html = render_document(prepared, &self.config.document_options())
                    .map_err(|e| Self::failure(FailureKind::Internal, e.to_string()))?;
                (None, Some(html))
            }
        };
        Ok(RemoteRequest {
            url,
            html,
            debug: remote.debug,
            wait_timeout: remote.wait_timeout_ms,
            scale: remote.scale,
            format: self.config.page_format.css_name().to_string(),
            landscape: self.config.landscape,
        })
    }

    async fn send(&self, endpoint: &str, request: &RemoteRequest) -> CaptureResult {
        let client = match &self.client {
            Some(client) => client.clone(),
            None => reqwest::Client::builder()
                .timeout(self.config.remote.timeout())
                .connect_timeout(self.config.remote.connect_timeout())
                .build()
                .map_err(|e| Self::failure(FailureKind::Internal, e.to_string()))?,
        };

        let response = client
            .post(endpoint)
            .header(ACCEPT, "application/pdf, application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(classify_transport_error)?;

        if !status.is_success() {
            let message = match serde_json::from_slice::<ServiceError>(&bytes) {
                Ok(body) => match body.details {
                    Some(details) => format!("{}: {}", body.error, details),
                    None => body.error,
                },
                Err(_) => format!(
                    "print service responded {}: {}",
                    status,
                    String::from_utf8_lossy(&bytes[..bytes.len().min(200)])
                ),
            };
            let kind = if status == StatusCode::UNPROCESSABLE_ENTITY {
                FailureKind::ZeroContent
            } else {
                FailureKind::Transport
            };
            return Err(Self::failure(kind, message));
        }

        if !bytes.starts_with(b"%PDF") {
            return Err(Self::failure(
                FailureKind::RenderEmpty,
                "print service response is not a PDF",
            ));
        }
        if bytes.len() < MIN_PDF_BYTES {
            return Err(Self::failure(
                FailureKind::RenderEmpty,
                format!("PDF is only {} bytes", bytes.len()),
            ));
        }
        debug!("Print service returned {} bytes", bytes.len());
        Ok(CaptureOutput::Download(Document::pdf(
            bytes.to_vec(),
            self.config.filename("pdf"),
        )))
    }
}

/// Appends the print-mode flag and the selected cycle ids to the printable page URL.
fn printable_url(base: &str, prepared: &[VisualFragment]) -> Result<String, CaptureFailure> {
    let mut url = url::Url::parse(base).map_err(|e| {
        CaptureFailure::new(NAME, FailureKind::Internal, format!("invalid print page URL '{base}': {e}"))
    })?;
    let ids: Vec<String> = prepared.iter().map(|f| f.cycle_id.to_string()).collect();
    url.query_pairs_mut()
        .append_pair("print", "true")
        .append_pair("expand", "all")
        .append_pair("cycles", &ids.join(","));
    Ok(url.into())
}

/// Connection refused means the backend is not there at all; everything else is transport.
fn classify_transport_error(error: reqwest::Error) -> CaptureFailure {
    let kind = if error.is_connect() {
        FailureKind::BackendUnavailable
    } else {
        FailureKind::Transport
    };
    CaptureFailure::new(NAME, kind, error.to_string())
}

#[async_trait]
impl CaptureStrategy for RemoteStrategy {
    fn name(&self) -> &str {
        NAME
    }

    fn requires_backend(&self) -> bool {
        true
    }

    async fn attempt_capture(&self, fragments: &[VisualFragment]) -> CaptureResult {
        let Some(endpoint) = self.config.remote.endpoint.as_deref() else {
            return Err(Self::failure(
                FailureKind::BackendUnavailable,
                "no print service endpoint configured",
            ));
        };
        let prepared = prepare_for_capture(fragments);
        if is_content_empty(&prepared) {
            return Err(Self::failure(
                FailureKind::ZeroContent,
                "no cycle or table content to print",
            ));
        }
        settle(self.config.settle_delay()).await;

        let request = self.build_request(&prepared)?;
        let limit = self.config.remote.timeout();
        match tokio::time::timeout(limit, self.send(endpoint, &request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Print service did not answer within {:?}", limit);
                Err(Self::failure(
                    FailureKind::Transport,
                    format!("timed out after {:?}", limit),
                ))
            }
        }
    }
}

//! Remote print service.
//!
//! Receives a printable page (URL or inline HTML), waits until it shows content,
//! injects the print overrides and has a headless browser render it to PDF.
//!
//! Routes:
//! * `POST /api/pdf/generate`: body [`RemoteRequest`], answers `application/pdf`.
//! * `GET /api/pdf/status`: diagnostics of the last run ([`StatusReport`]).
//! * `GET /health`

use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::capture::RemoteRequest;
use crate::models::page::PageFormat;

mod browser;
mod config;
mod error;
mod printable;
mod status;

pub use browser::{BrowserEngine, ChromiumEngine, PrintOptions};
pub use config::ServerConfig;
pub use error::{PrintServiceError, Result};
pub use printable::{content_stats, inject_print_overrides, PrintSetup};
pub use status::{ContentStats, StatusReport};

/// Shared state of the print service handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
    engine: Arc<dyn BrowserEngine>,
    client: reqwest::Client,
    status: Arc<Mutex<StatusReport>>,
}

impl AppState {
    pub fn new(config: ServerConfig, engine: impl BrowserEngine + 'static) -> Self {
        AppState {
            config: Arc::new(config),
            engine: Arc::new(engine),
            client: reqwest::Client::new(),
            status: Arc::new(Mutex::new(StatusReport::default())),
        }
    }

    /// State backed by the configured Chromium executable.
    pub fn chromium(config: ServerConfig) -> Self {
        let engine = ChromiumEngine::new(config.chromium_path.clone());
        AppState::new(config, engine)
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/pdf/status", get(status_handler))
        .route("/api/pdf/generate", post(generate_handler))
        .with_state(state)
}

/// Binds `config.bind_addr` and serves until the process is stopped.
pub async fn serve(state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(&state.config.bind_addr).await?;
    info!("print-server listening on {}", listener.local_addr()?);
    axum::serve(listener, build_router(state)).await
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn status_handler(State(state): State<AppState>) -> Json<StatusReport> {
    Json(state.status.lock().await.clone())
}

async fn generate_handler(
    State(state): State<AppState>,
    Json(request): Json<RemoteRequest>,
) -> std::result::Result<Response, PrintServiceError> {
    info!(
        "PDF requested: source={}, scale={}, format={}, landscape={}",
        request.url.as_deref().unwrap_or("inline html"),
        request.scale,
        request.format,
        request.landscape
    );
    state.status.lock().await.begin();

    let result = generate(&state, &request).await;
    let mut status = state.status.lock().await;
    match result {
        Ok(pdf) => {
            status.finish(None);
            info!("PDF generated: {} bytes", pdf.len());
            Ok((
                [
                    (CONTENT_TYPE, "application/pdf"),
                    (CONTENT_DISPOSITION, "attachment; filename=\"classification.pdf\""),
                ],
                pdf,
            )
                .into_response())
        }
        Err(e) => {
            error!("PDF generation failed: {}", e);
            status.finish(Some(e.to_string()));
            Err(e)
        }
    }
}

async fn generate(state: &AppState, request: &RemoteRequest) -> Result<Vec<u8>> {
    if request.url.is_none() && request.html.is_none() {
        return Err(PrintServiceError::BadRequest(
            "either url or html is required".to_string(),
        ));
    }
    if !(request.scale > 0.0 && request.scale <= 2.0) {
        return Err(PrintServiceError::BadRequest(format!(
            "scale must be in (0, 2], got {}",
            request.scale
        )));
    }
    let format = PageFormat::parse(&request.format).ok_or_else(|| {
        PrintServiceError::BadRequest(format!("unknown page format '{}'", request.format))
    })?;

    let (html, stats) =
        printable::load(&state.client, request, state.config.poll_interval()).await?;
    state.status.lock().await.content_stats = stats;

    let setup = PrintSetup {
        scale: request.scale,
        format,
        landscape: request.landscape,
        // Inline HTML wins over a URL in `load`, so only fetched pages get a base.
        base_url: match request.html {
            Some(_) => None,
            None => request.url.as_deref(),
        },
    };
    let prepared = printable::inject_print_overrides(&html, &setup)?;
    let dump = printable::write_dump(&state.config.dump_dir, &prepared).await?;
    if request.debug {
        state.status.lock().await.last_dump_path = Some(dump.display().to_string());
    }

    let options = PrintOptions {
        viewport: (state.config.viewport_width, state.config.viewport_height),
        settle_ms: request.wait_timeout.min(30_000),
        timeout: state.config.render_timeout(),
    };
    // Dumps stay on disk; cleaning the dump directory is left to the operator.
    state.engine.print_to_pdf(&dump, &options).await
}

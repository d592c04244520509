//! Export orchestrator: the public entry point of the export pipeline.
//!
//! Takes an immutable snapshot (tree + selection), flattens the selected cycles,
//! runs the capture chain and delivers the result. Every invocation owns its own
//! state, so concurrent exports never share anything mutable.

use async_trait::async_trait;
use log::{debug, error, info};
use std::io;
use std::path::PathBuf;

use crate::capture::{AttemptLog, CaptureChain, Captured};
use crate::config::ExportConfig;
use crate::converters::html::{render_with, RenderOptions};
use crate::errors::{ExportError, Result};
use crate::models::classification::{Cycle, TreeStats};
use crate::models::export::{CaptureOutput, Document, ExportRequest};

/// Receives finished documents, standing in for the browser's download mechanism.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Stores `document` and returns where it ended up.
    async fn deliver(&self, document: &Document) -> io::Result<PathBuf>;
}

/// Saves downloads into a directory, creating it when missing.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectorySink { dir: dir.into() }
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn deliver(&self, document: &Document) -> io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(&document.filename);
        tokio::fs::write(&path, &document.bytes).await?;
        Ok(path)
    }
}

/// What a completed export invocation did.
#[derive(Debug)]
pub enum ExportOutcome {
    /// Nothing was selected; no rendering or network work happened.
    Skipped,
    /// A document was produced and handed to the download sink.
    Delivered {
        strategy: String,
        path: PathBuf,
        mime_type: String,
        failures: AttemptLog,
    },
    /// A print-mode view was opened; the platform print flow owns the result.
    PrintOpened {
        strategy: String,
        location: PathBuf,
        failures: AttemptLog,
    },
}

impl ExportOutcome {
    /// Name of the winning strategy, if any ran.
    pub fn strategy(&self) -> Option<&str> {
        match self {
            ExportOutcome::Skipped => None,
            ExportOutcome::Delivered { strategy, .. } | ExportOutcome::PrintOpened { strategy, .. } => {
                Some(strategy)
            }
        }
    }
}

/// Builder for creating an `Exporter`.
#[derive(Default)]
pub struct ExporterBuilder {
    config: Option<ExportConfig>,
    chain: Option<CaptureChain>,
    sink: Option<Box<dyn DownloadSink>>,
    render_options: RenderOptions,
}

impl ExporterBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn set_config(mut self, config: ExportConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replaces the standard strategy chain.
    pub fn set_chain(mut self, chain: CaptureChain) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn set_sink(mut self, sink: impl DownloadSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Live-view state (edit mode, collapsed regions) mirrored by the flattener.
    pub fn set_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Builds the `Exporter`. Missing parts fall back to the configuration:
    /// the standard chain and a `DirectorySink` on `download_dir`.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Config` when the configuration is invalid or the chain is empty,
    /// `ExportError::Network` when the remote step's HTTP client cannot be built.
    pub fn build(self) -> Result<Exporter> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let chain = match self.chain {
            Some(chain) => chain,
            None => CaptureChain::standard(&config)?,
        };
        if chain.is_empty() {
            return Err(ExportError::Config(
                "capture chain has no strategies".to_string(),
            ));
        }
        let sink = self
            .sink
            .unwrap_or_else(|| Box::new(DirectorySink::new(config.download_dir.clone())));
        Ok(Exporter {
            config,
            chain,
            sink,
            render_options: self.render_options,
        })
    }
}

pub struct Exporter {
    config: ExportConfig,
    chain: CaptureChain,
    sink: Box<dyn DownloadSink>,
    render_options: RenderOptions,
}

impl Exporter {
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Exports the selected cycles of `tree`.
    ///
    /// An empty selection is a no-op: nothing is rendered, nothing is sent.
    ///
    /// # Errors
    ///
    /// * `ExportError::TotalFailure` when every capture strategy failed.
    /// * `ExportError::Io` when the produced document cannot be delivered.
    pub async fn export_selection(&self, tree: &[Cycle], selected_ids: &[u32]) -> Result<ExportOutcome> {
        self.export(ExportRequest::new(tree, selected_ids)).await
    }

    /// Runs one export for a prepared request. The request is consumed.
    pub async fn export(&self, request: ExportRequest) -> Result<ExportOutcome> {
        if let Err(ExportError::EmptySelection) = request.validate() {
            debug!("Export requested with an empty selection, nothing to do");
            return Ok(ExportOutcome::Skipped);
        }

        let cycles = request.selected_cycles();
        let stats: TreeStats = cycles.iter().map(Cycle::stats).sum();
        info!(
            "Exporting {} cycle(s): {} groups, {} subgroups, {} categories, {} tables",
            stats.cycles, stats.groups, stats.subgroups, stats.categories, stats.tables
        );

        let fragments = render_with(&cycles, &self.render_options);
        drop(request);

        match self.chain.capture(&fragments).await {
            Ok(captured) => self.deliver(captured).await,
            Err(attempts) => {
                let message = total_failure_message(&attempts);
                error!("{}", message);
                Err(ExportError::TotalFailure {
                    message,
                    attempts: attempts.into_values().collect(),
                })
            }
        }
    }

    async fn deliver(&self, captured: Captured) -> Result<ExportOutcome> {
        let Captured {
            strategy,
            output,
            failures,
        } = captured;
        match output {
            CaptureOutput::Download(document) => {
                let path = self.sink.deliver(&document).await?;
                info!("Export delivered to {} via '{}'", path.display(), strategy);
                Ok(ExportOutcome::Delivered {
                    strategy,
                    path,
                    mime_type: document.mime_type,
                    failures,
                })
            }
            CaptureOutput::PrintContext { location } => Ok(ExportOutcome::PrintOpened {
                strategy,
                location,
                failures,
            }),
        }
    }
}

/// One consolidated, user-facing message for a run where nothing succeeded.
fn total_failure_message(attempts: &AttemptLog) -> String {
    if attempts.is_empty() {
        return "Export failed: no export method is available.".to_string();
    }
    let tried: Vec<&str> = attempts.keys().map(String::as_str).collect();
    format!(
        "Export failed: none of the export methods succeeded (tried {}). Please try again later.",
        tried.join(", ")
    )
}

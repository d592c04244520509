//! Capture strategy chain.
//!
//! A capture strategy turns a fragment set into a deliverable: a finished
//! document or an opened print view. Strategies are tried in order until one
//! succeeds. Each strategy classifies its own errors into a [`CaptureFailure`],
//! so the chain never sees a raw lower-level error.
//!
//! Standard order:
//! 1. [`RasterStrategy`]: in-process layout, rasterization and paginated PDF.
//! 2. [`RemoteStrategy`]: server-side headless-browser print-to-PDF.
//! 3. [`PrintDialogStrategy`]: print-mode view handed to the platform print flow.
//! 4. [`HtmlDownloadStrategy`]: standalone HTML document download.

use async_trait::async_trait;
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::config::ExportConfig;
use crate::converters::html::VisualFragment;
use crate::errors::Result;
use crate::models::export::CaptureOutput;

mod demo;
mod html_download;
mod print_dialog;
mod raster;
mod remote;

pub use demo::demo_tree;
pub use html_download::HtmlDownloadStrategy;
pub use print_dialog::{Launcher, PrintDialogStrategy, SystemLauncher};
pub use raster::RasterStrategy;
pub use remote::{RemoteRequest, RemoteStrategy};

/// Classification of a failed capture attempt. Every kind is recoverable:
/// the chain moves on to the next strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// The artifact came out zero-sized or blank.
    RenderEmpty,
    /// Network failure or timeout talking to the remote backend.
    Transport,
    /// The remote backend cannot be reached at all (connection refused).
    BackendUnavailable,
    /// No cycle or table content was found to capture.
    ZeroContent,
    /// Anything else that went wrong inside the strategy.
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::RenderEmpty => "render empty",
            FailureKind::Transport => "transport",
            FailureKind::BackendUnavailable => "backend unavailable",
            FailureKind::ZeroContent => "zero content",
            FailureKind::Internal => "internal",
        };
        f.write_str(label)
    }
}

/// A classified failure of one strategy attempt.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{strategy} failed ({kind}): {detail}")]
pub struct CaptureFailure {
    pub strategy: String,
    pub kind: FailureKind,
    pub detail: String,
}

impl CaptureFailure {
    pub fn new(strategy: &str, kind: FailureKind, detail: impl Into<String>) -> Self {
        CaptureFailure {
            strategy: strategy.to_string(),
            kind,
            detail: detail.into(),
        }
    }
}

/// Outcome of a single strategy attempt.
pub type CaptureResult = std::result::Result<CaptureOutput, CaptureFailure>;

/// One concrete technique for turning fragments into a deliverable.
#[async_trait]
pub trait CaptureStrategy: Send + Sync {
    /// Short name used in logs and failure reports.
    fn name(&self) -> &str;

    /// True for strategies that depend on the remote print backend. Once the
    /// backend is known to be unreachable, the chain skips the rest of them.
    fn requires_backend(&self) -> bool {
        false
    }

    /// Attempts one capture. Implementations normalize visibility themselves,
    /// wait for the settle delay and never retry internally.
    async fn attempt_capture(&self, fragments: &[VisualFragment]) -> CaptureResult;
}

/// Failures in attempt order, keyed by strategy name.
pub type AttemptLog = IndexMap<String, CaptureFailure>;

/// The winning capture plus the failures that preceded it.
#[derive(Debug)]
pub struct Captured {
    pub strategy: String,
    pub output: CaptureOutput,
    pub failures: AttemptLog,
}

/// Ordered list of strategies; the first success wins.
#[derive(Default)]
pub struct CaptureChain {
    strategies: Vec<Box<dyn CaptureStrategy>>,
}

impl CaptureChain {
    pub fn new() -> Self {
        Default::default()
    }

    /// The standard four-step chain. The remote step is left out when no endpoint is configured.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Network` when the HTTP client for the remote step cannot be built.
    pub fn standard(config: &ExportConfig) -> Result<Self> {
        let mut chain = CaptureChain::new().with(RasterStrategy::new(config.clone()));
        if config.remote.endpoint.is_some() {
            let client = reqwest::Client::builder()
                .timeout(config.remote.timeout())
                .connect_timeout(config.remote.connect_timeout())
                .build()?;
            chain = chain.with(RemoteStrategy::new(config.clone()).with_client(client));
        }
        Ok(chain
            .with(PrintDialogStrategy::new(config.clone(), SystemLauncher))
            .with(HtmlDownloadStrategy::new(config.clone())))
    }

    /// Appends a strategy at the end of the chain.
    pub fn with(mut self, strategy: impl CaptureStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Tries every strategy in order and returns the first success.
    ///
    /// # Errors
    ///
    /// Returns the full attempt log when every strategy failed.
    pub async fn capture(
        &self,
        fragments: &[VisualFragment],
    ) -> std::result::Result<Captured, AttemptLog> {
        let mut failures = AttemptLog::new();
        let mut backend_down = false;

        for strategy in &self.strategies {
            let name = strategy.name().to_string();
            if backend_down && strategy.requires_backend() {
                debug!("Skipping '{}': print backend unavailable", name);
                continue;
            }

            info!("Attempting capture with '{}'", name);
            match strategy.attempt_capture(fragments).await {
                Ok(output) => {
                    info!("Capture with '{}' succeeded: {}", name, output.describe());
                    return Ok(Captured {
                        strategy: name,
                        output,
                        failures,
                    });
                }
                Err(failure) => {
                    warn!("{}", failure);
                    backend_down |= failure.kind == FailureKind::BackendUnavailable;
                    failures.insert(name, failure);
                }
            }
        }
        Err(failures)
    }
}

/// Waits for the settle delay after the expand-all step.
pub(crate) async fn settle(delay: Duration) {
    if !delay.is_zero() {
        debug!("Settling for {:?} before capture", delay);
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::export::Document;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Scripted {
        name: &'static str,
        backend: bool,
        result: std::result::Result<(), FailureKind>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CaptureStrategy for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        fn requires_backend(&self) -> bool {
            self.backend
        }

        async fn attempt_capture(&self, _fragments: &[VisualFragment]) -> CaptureResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.result {
                Ok(()) => Ok(CaptureOutput::Download(Document::pdf(
                    b"%PDF".to_vec(),
                    format!("{}.pdf", self.name),
                ))),
                Err(kind) => Err(CaptureFailure::new(self.name, kind, "scripted")),
            }
        }
    }

    fn scripted(
        name: &'static str,
        backend: bool,
        result: std::result::Result<(), FailureKind>,
    ) -> (Scripted, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Scripted {
                name,
                backend,
                result,
                calls: calls.clone(),
            },
            calls,
        )
    }

    #[tokio::test]
    async fn first_success_wins_and_later_strategies_are_not_called() {
        let (a, _) = scripted("a", false, Err(FailureKind::RenderEmpty));
        let (b, _) = scripted("b", false, Ok(()));
        let (c, c_calls) = scripted("c", false, Ok(()));
        let chain = CaptureChain::new().with(a).with(b).with(c);

        let captured = chain.capture(&[]).await.expect("b succeeds");
        assert_eq!(captured.strategy, "b");
        assert_eq!(captured.failures.len(), 1);
        assert_eq!(captured.failures["a"].kind, FailureKind::RenderEmpty);
        assert_eq!(c_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn total_failure_returns_ordered_log() {
        let (a, _) = scripted("a", false, Err(FailureKind::Internal));
        let (b, _) = scripted("b", true, Err(FailureKind::Transport));
        let chain = CaptureChain::new().with(a).with(b);

        let log = chain.capture(&[]).await.expect_err("all fail");
        let names: Vec<&String> = log.keys().collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn unavailable_backend_skips_other_backend_strategies() {
        let (a, _) = scripted("remote", true, Err(FailureKind::BackendUnavailable));
        let (b, b_calls) = scripted("remote-retry", true, Ok(()));
        let (c, _) = scripted("local", false, Ok(()));
        let chain = CaptureChain::new().with(a).with(b).with(c);

        let captured = chain.capture(&[]).await.expect("local succeeds");
        assert_eq!(captured.strategy, "local");
        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failure_display_names_strategy_and_kind() {
        let failure = CaptureFailure::new("remote", FailureKind::Transport, "timed out");
        assert_eq!(failure.to_string(), "remote failed (transport): timed out");
    }

    #[test]
    fn standard_chain_follows_configured_endpoint() {
        let mut config = ExportConfig::default();
        let chain = CaptureChain::standard(&config).expect("client builds");
        assert_eq!(chain.names(), ["raster", "remote", "print-dialog", "html-download"]);

        config.remote.endpoint = None;
        let chain = CaptureChain::standard(&config).expect("no client needed");
        assert_eq!(chain.names(), ["raster", "print-dialog", "html-download"]);
    }

    #[test]
    fn client_errors_surface_as_network_errors() {
        let err: crate::errors::ExportError = reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err()
            .into();
        assert!(matches!(err, crate::errors::ExportError::Network(_)));
        assert!(err.to_string().starts_with("Network request failed:"));
    }
}

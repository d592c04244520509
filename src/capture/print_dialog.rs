//! Client print flow: writes a print-mode view of the fragments and opens it in
//! a new browsing context, which starts the platform print dialog on load.
//!
//! Success is declared as soon as the view is handed over; the resulting file
//! is owned by the platform print flow and never confirmed.

use async_trait::async_trait;
use log::info;
use std::io;
use std::path::{Path, PathBuf};

use super::{settle, CaptureFailure, CaptureResult, CaptureStrategy, FailureKind};
use crate::config::ExportConfig;
use crate::converters::html::{is_content_empty, prepare_for_capture, render_document, VisualFragment};
use crate::models::export::CaptureOutput;

const NAME: &str = "print-dialog";

/// Delay between load and the print call, so fonts and colors are painted first.
const PRINT_AFTER_LOAD_MS: u64 = 500;

/// Opens a document in a new browsing context.
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn open(&self, path: &Path) -> io::Result<()>;
}

/// Opens files with the desktop's default handler (`xdg-open`, `open`, `start`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

#[async_trait]
impl Launcher for SystemLauncher {
    async fn open(&self, path: &Path) -> io::Result<()> {
        #[cfg(target_os = "windows")]
        let mut command = {
            let mut command = tokio::process::Command::new("cmd");
            command.args(["/C", "start", ""]).arg(path);
            command
        };
        #[cfg(target_os = "macos")]
        let mut command = {
            let mut command = tokio::process::Command::new("open");
            command.arg(path);
            command
        };
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        let mut command = {
            let mut command = tokio::process::Command::new("xdg-open");
            command.arg(path);
            command
        };

        let status = command.status().await?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::Other,
                format!("opener exited with {status}"),
            ))
        }
    }
}

pub struct PrintDialogStrategy<L: Launcher> {
    config: ExportConfig,
    launcher: L,
}

impl<L: Launcher> PrintDialogStrategy<L> {
    pub fn new(config: ExportConfig, launcher: L) -> Self {
        PrintDialogStrategy { config, launcher }
    }

    fn view_path(&self) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%3f");
        self.config
            .temp_dir
            .join(format!("{}-print-{stamp}.html", self.config.filename_stem))
    }
}

#[async_trait]
impl<L: Launcher + 'static> CaptureStrategy for PrintDialogStrategy<L> {
    fn name(&self) -> &str {
        NAME
    }

    async fn attempt_capture(&self, fragments: &[VisualFragment]) -> CaptureResult {
        let prepared = prepare_for_capture(fragments);
        if is_content_empty(&prepared) {
            return Err(CaptureFailure::new(
                NAME,
                FailureKind::ZeroContent,
                "no cycle or table content to print",
            ));
        }

        let mut options = self.config.document_options();
        options.auto_print_after_ms = Some(PRINT_AFTER_LOAD_MS);
        let html = render_document(&prepared, &options)
            .map_err(|e| CaptureFailure::new(NAME, FailureKind::Internal, e.to_string()))?;

        let path = self.view_path();
        let io_failure =
            |e: io::Error| CaptureFailure::new(NAME, FailureKind::Internal, format!("{}: {e}", path.display()));
        tokio::fs::create_dir_all(&self.config.temp_dir)
            .await
            .map_err(&io_failure)?;
        tokio::fs::write(&path, html).await.map_err(&io_failure)?;

        settle(self.config.settle_delay()).await;
        self.launcher.open(&path).await.map_err(&io_failure)?;

        info!("Print view opened at {}", path.display());
        Ok(CaptureOutput::PrintContext { location: path })
    }
}

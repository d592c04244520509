//! Headless browser seam of the print service.

use async_trait::async_trait;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use super::error::{PrintServiceError, Result};

/// Per-run browser settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintOptions {
    pub viewport: (u32, u32),
    /// Budget for scripts and layout before printing, in milliseconds.
    pub settle_ms: u64,
    pub timeout: Duration,
}

/// Prints a local HTML file to PDF bytes.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    async fn print_to_pdf(&self, page: &Path, options: &PrintOptions) -> Result<Vec<u8>>;
}

/// Runs a headless Chromium process per request.
#[derive(Debug, Clone)]
pub struct ChromiumEngine {
    executable: PathBuf,
}

impl ChromiumEngine {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        ChromiumEngine {
            executable: executable.into(),
        }
    }
}

#[async_trait]
impl BrowserEngine for ChromiumEngine {
    async fn print_to_pdf(&self, page: &Path, options: &PrintOptions) -> Result<Vec<u8>> {
        let output = page.with_extension("pdf");
        let page_url = url::Url::from_file_path(page).map_err(|_| {
            PrintServiceError::Browser(format!("not an absolute path: {}", page.display()))
        })?;

        let mut command = tokio::process::Command::new(&self.executable);
        command
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--hide-scrollbars")
            .arg("--no-pdf-header-footer")
            .arg(format!("--window-size={},{}", options.viewport.0, options.viewport.1))
            .arg(format!("--virtual-time-budget={}", options.settle_ms))
            .arg(format!("--print-to-pdf={}", output.display()))
            .arg(page_url.as_str())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Launching {:?}", command);
        let run = tokio::time::timeout(options.timeout, command.output()).await;
        let result = match run {
            Ok(result) => result.map_err(|e| {
                PrintServiceError::Browser(format!("failed to start {}: {e}", self.executable.display()))
            })?,
            Err(_) => {
                return Err(PrintServiceError::Timeout(format!(
                    "browser did not finish within {:?}",
                    options.timeout
                )))
            }
        };
        info!("Browser exited with {}", result.status);
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(PrintServiceError::Browser(format!(
                "exit status {}: {}",
                result.status,
                stderr.trim()
            )));
        }

        let bytes = tokio::fs::read(&output)
            .await
            .map_err(|e| PrintServiceError::Browser(format!("no PDF written: {e}")))?;
        if let Err(e) = tokio::fs::remove_file(&output).await {
            warn!("Could not remove {}: {}", output.display(), e);
        }
        if !bytes.starts_with(b"%PDF") {
            return Err(PrintServiceError::Browser("output is not a PDF".to_string()));
        }
        Ok(bytes)
    }
}

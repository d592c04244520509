//! Last-resort capture: the fully styled fragment set as a standalone HTML file.

use async_trait::async_trait;
use log::warn;

use super::{demo_tree, settle, CaptureFailure, CaptureResult, CaptureStrategy, FailureKind};
use crate::config::ExportConfig;
use crate::converters::html::{
    is_content_empty, prepare_for_capture, render, render_document, VisualFragment,
};
use crate::models::export::{CaptureOutput, Document};

const NAME: &str = "html-download";

pub struct HtmlDownloadStrategy {
    config: ExportConfig,
}

impl HtmlDownloadStrategy {
    pub fn new(config: ExportConfig) -> Self {
        HtmlDownloadStrategy { config }
    }
}

#[async_trait]
impl CaptureStrategy for HtmlDownloadStrategy {
    fn name(&self) -> &str {
        NAME
    }

    async fn attempt_capture(&self, fragments: &[VisualFragment]) -> CaptureResult {
        let mut prepared = prepare_for_capture(fragments);
        if is_content_empty(&prepared) {
            warn!("No live content to export, writing the demonstration structure");
            prepared = prepare_for_capture(&render(&demo_tree()));
        }
        settle(self.config.settle_delay()).await;

        let html = render_document(&prepared, &self.config.document_options())
            .map_err(|e| CaptureFailure::new(NAME, FailureKind::Internal, e.to_string()))?;
        if html.is_empty() {
            return Err(CaptureFailure::new(
                NAME,
                FailureKind::RenderEmpty,
                "serialized document is empty",
            ));
        }
        Ok(CaptureOutput::Download(Document::html(
            html,
            self.config.filename("html"),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy() -> HtmlDownloadStrategy {
        HtmlDownloadStrategy::new(ExportConfig {
            settle_delay_ms: 0,
            ..ExportConfig::default()
        })
    }

    fn download(output: CaptureOutput) -> Document {
        match output {
            CaptureOutput::Download(doc) => doc,
            other => panic!("unexpected output {other:?}"),
        }
    }

    #[tokio::test]
    async fn serializes_fragments_with_print_stylesheet() {
        let fragments = render(&demo_tree());
        let doc = download(strategy().attempt_capture(&fragments).await.unwrap());
        let html = String::from_utf8(doc.bytes).unwrap();
        assert_eq!(doc.mime_type, "text/html; charset=utf-8");
        assert!(doc.filename.ends_with(".html"));
        assert!(html.contains("print-color-adjust: exact"));
        assert!(html.contains("<b>Amoxicillin</b>"));
    }

    #[tokio::test]
    async fn falls_back_to_demonstration_structure() {
        let doc = download(strategy().attempt_capture(&[]).await.unwrap());
        let html = String::from_utf8(doc.bytes).unwrap();
        assert!(html.contains("Antimicrobial agents"));
        assert!(html.contains("No data"));
    }
}

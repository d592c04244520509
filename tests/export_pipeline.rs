use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use drugclass_tools::capture::{
    CaptureResult, HtmlDownloadStrategy, Launcher, PrintDialogStrategy, RasterStrategy,
    RemoteStrategy,
};
use drugclass_tools::converters::html::{render_document, NodeKind, PAGE_BREAK_STYLE};
use drugclass_tools::models::classification::parse_tree;
use drugclass_tools::{
    render, CaptureChain, CaptureFailure, CaptureStrategy, Cycle, DirectorySink, ExportConfig,
    ExportError, ExportOutcome, ExporterBuilder, FailureKind, VisualFragment,
};

const TREE_JSON: &str = r#"[
  {
    "id": 1,
    "name": "Antibiotics",
    "colorScale": "from-blue-500 to-indigo-700",
    "children": [
      {
        "id": 1,
        "name": "Penicillins",
        "preparationsHtml": "<ul><li>Amoxicillin</li></ul>"
      }
    ]
  },
  { "id": 2, "name": "Analgesics", "colorScale": "from-rose-400 to-red-600" }
]"#;

fn tree() -> Vec<Cycle> {
    parse_tree(TREE_JSON).unwrap()
}

fn quiet_config(dir: &Path) -> ExportConfig {
    ExportConfig {
        settle_delay_ms: 0,
        temp_dir: dir.join("tmp"),
        download_dir: dir.join("downloads"),
        ..ExportConfig::default()
    }
}

struct AlwaysFails(&'static str, FailureKind);

#[async_trait]
impl CaptureStrategy for AlwaysFails {
    fn name(&self) -> &str {
        self.0
    }

    async fn attempt_capture(&self, _fragments: &[VisualFragment]) -> CaptureResult {
        Err(CaptureFailure::new(self.0, self.1, "forced"))
    }
}

#[derive(Default)]
struct Recorder {
    opened: Mutex<Vec<PathBuf>>,
    refuse: bool,
}

#[async_trait]
impl Launcher for Recorder {
    async fn open(&self, path: &Path) -> std::io::Result<()> {
        if self.refuse {
            return Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no display"));
        }
        self.opened.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

fn dead_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/api/pdf/generate")
}

#[test]
fn two_cycles_render_as_page_separated_sections() {
    let fragments = render(&tree());
    assert_eq!(fragments.len(), 2);
    assert_eq!(fragments[0].title(), "Antibiotics");
    assert_eq!(fragments[1].title(), "Analgesics");
    assert!(!fragments[0].break_before);
    assert!(fragments[1].break_before);

    let group = &fragments[0].root.children[0];
    match &group.kind {
        NodeKind::Section { name, .. } => assert_eq!(name, "Penicillins"),
        other => panic!("expected the group section, got {other:?}"),
    }
    match &group.children[0].kind {
        NodeKind::Preparations(text) => assert_eq!(text.as_str(), "<ul><li>Amoxicillin</li></ul>"),
        other => panic!("expected preparations, got {other:?}"),
    }
    assert!(fragments[1].root.children.is_empty());

    let html = render_document(&fragments, &ExportConfig::default().document_options()).unwrap();
    let antibiotics = html.find("Antibiotics</h1>").unwrap();
    let penicillins = html.find("Penicillins</h2>").unwrap();
    let amoxicillin = html.find("<li>Amoxicillin</li>").unwrap();
    let analgesics = html.find("Analgesics</h1>").unwrap();
    assert!(antibiotics < penicillins && penicillins < amoxicillin && amoxicillin < analgesics);
    assert_eq!(html.matches(&format!(r#"style="{PAGE_BREAK_STYLE}""#)).count(), 1);
    assert!(!html[analgesics..].contains("group-section"));
}

#[tokio::test]
async fn empty_selection_does_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = quiet_config(dir.path());
    let exporter = ExporterBuilder::new()
        .set_config(config.clone())
        .set_chain(CaptureChain::new().with(AlwaysFails("stub", FailureKind::Internal)))
        .build()
        .unwrap();

    let outcome = exporter.export_selection(&tree(), &[]).await.unwrap();
    assert!(matches!(outcome, ExportOutcome::Skipped));
    assert!(!config.download_dir.exists());
}

#[tokio::test]
async fn falls_through_to_print_dialog() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = quiet_config(dir.path());
    config.remote.endpoint = Some(dead_endpoint());

    let chain = CaptureChain::new()
        .with(AlwaysFails("raster-stub", FailureKind::RenderEmpty))
        .with(RemoteStrategy::new(config.clone()))
        .with(PrintDialogStrategy::new(config.clone(), Recorder::default()))
        .with(HtmlDownloadStrategy::new(config.clone()));
    let exporter = ExporterBuilder::new()
        .set_config(config)
        .set_chain(chain)
        .build()
        .unwrap();

    let outcome = exporter.export_selection(&tree(), &[1, 2]).await.unwrap();
    let ExportOutcome::PrintOpened { strategy, location, failures } = outcome else {
        panic!("expected the print dialog to win");
    };
    assert_eq!(strategy, "print-dialog");
    assert!(location.exists());
    let kinds: Vec<FailureKind> = failures.values().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![FailureKind::RenderEmpty, FailureKind::BackendUnavailable]);
}

#[tokio::test]
async fn falls_through_to_html_download() {
    let dir = tempfile::tempdir().unwrap();
    let config = quiet_config(dir.path());
    let launcher = Recorder {
        refuse: true,
        ..Recorder::default()
    };

    let chain = CaptureChain::new()
        .with(AlwaysFails("raster-stub", FailureKind::RenderEmpty))
        .with(AlwaysFails("remote-stub", FailureKind::Transport))
        .with(PrintDialogStrategy::new(config.clone(), launcher))
        .with(HtmlDownloadStrategy::new(config.clone()));
    let exporter = ExporterBuilder::new()
        .set_config(config.clone())
        .set_chain(chain)
        .set_sink(DirectorySink::new(config.download_dir.clone()))
        .build()
        .unwrap();

    let outcome = exporter.export_selection(&tree(), &[2, 1]).await.unwrap();
    let ExportOutcome::Delivered { strategy, path, mime_type, failures } = outcome else {
        panic!("expected a download");
    };
    assert_eq!(strategy, "html-download");
    assert!(mime_type.starts_with("text/html"));
    let tried: Vec<&str> = failures.keys().map(String::as_str).collect();
    assert_eq!(tried, vec!["raster-stub", "remote-stub", "print-dialog"]);

    let html = std::fs::read_to_string(path).unwrap();
    assert!(html.find("Antibiotics").unwrap() < html.find("Analgesics").unwrap());
}

#[tokio::test]
async fn raster_strategy_delivers_a_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExportConfig {
        pixel_density: 1.0,
        ..quiet_config(dir.path())
    };
    let exporter = ExporterBuilder::new()
        .set_config(config.clone())
        .set_chain(CaptureChain::new().with(RasterStrategy::new(config)))
        .build()
        .unwrap();

    let outcome = exporter.export_selection(&tree(), &[1, 2]).await.unwrap();
    let ExportOutcome::Delivered { path, mime_type, .. } = outcome else {
        panic!("expected a PDF download");
    };
    assert_eq!(mime_type, "application/pdf");
    assert!(std::fs::read(path).unwrap().starts_with(b"%PDF"));
}

#[tokio::test]
async fn total_failure_reports_every_attempt() {
    let dir = tempfile::tempdir().unwrap();
    let exporter = ExporterBuilder::new()
        .set_config(quiet_config(dir.path()))
        .set_chain(CaptureChain::new().with(AlwaysFails("stub", FailureKind::Internal)))
        .build()
        .unwrap();

    match exporter.export_selection(&tree(), &[1]).await {
        Err(ExportError::TotalFailure { message, attempts }) => {
            assert!(message.starts_with("Export failed"));
            assert_eq!(attempts.len(), 1);
            assert_eq!(attempts[0].kind, FailureKind::Internal);
        }
        other => panic!("expected a total failure, got {other:?}"),
    }
}

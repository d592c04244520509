#![cfg(feature = "server")]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};

use drugclass_tools::capture::{demo_tree, RemoteStrategy};
use drugclass_tools::models::export::CaptureOutput;
use drugclass_tools::server::{
    build_router, AppState, BrowserEngine, PrintOptions, PrintServiceError, ServerConfig,
};
use drugclass_tools::{render, CaptureStrategy, ExportConfig};

/// Records the page it was given and answers with a fixed PDF.
#[derive(Clone, Default)]
struct FakeEngine {
    pages: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl BrowserEngine for FakeEngine {
    async fn print_to_pdf(
        &self,
        page: &Path,
        _options: &PrintOptions,
    ) -> Result<Vec<u8>, PrintServiceError> {
        let html = tokio::fs::read_to_string(page).await?;
        self.pages.lock().unwrap().push(html);
        let mut pdf = b"%PDF-1.4\n".to_vec();
        pdf.resize(1024, b' ');
        Ok(pdf)
    }
}

async fn spawn_server(dump_dir: &Path) -> (String, FakeEngine) {
    let engine = FakeEngine::default();
    let config = ServerConfig {
        dump_dir: dump_dir.to_path_buf(),
        ..ServerConfig::default()
    };
    let app = build_router(AppState::new(config, engine.clone()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), engine)
}

#[tokio::test]
async fn health_and_empty_status() {
    let dir = tempfile::tempdir().unwrap();
    let (base, _) = spawn_server(dir.path()).await;
    let client = reqwest::Client::new();

    let health: Value = client.get(format!("{base}/health")).send().await.unwrap().json().await.unwrap();
    assert_eq!(health, json!({"status": "ok"}));

    let status: Value = client
        .get(format!("{base}/api/pdf/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["runs"], 0);
    assert!(status["lastError"].is_null());
    assert_eq!(status["contentStats"]["tables"], 0);
}

#[tokio::test]
async fn remote_strategy_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let (base, engine) = spawn_server(dir.path()).await;

    let mut config = ExportConfig {
        settle_delay_ms: 0,
        ..ExportConfig::default()
    };
    config.remote.endpoint = Some(format!("{base}/api/pdf/generate"));
    config.remote.debug = true;
    let output = RemoteStrategy::new(config)
        .attempt_capture(&render(&demo_tree()))
        .await
        .unwrap();
    let CaptureOutput::Download(document) = output else {
        panic!("expected a PDF download");
    };
    assert_eq!(document.mime_type, "application/pdf");
    assert!(document.bytes.starts_with(b"%PDF"));

    let pages = engine.pages.lock().unwrap().clone();
    assert_eq!(pages.len(), 1);
    assert!(pages[0].contains("print-overrides"));
    assert!(pages[0].contains("html { zoom: 0.5; }"));

    let status: Value = reqwest::get(format!("{base}/api/pdf/status"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["runs"], 1);
    assert_eq!(status["contentStats"], json!({"cycles": 1, "groups": 2, "tables": 2}));
    let dump = status["lastDumpPath"].as_str().unwrap();
    assert!(Path::new(dump).exists());
}

#[tokio::test]
async fn request_errors_map_to_status_codes() {
    let dir = tempfile::tempdir().unwrap();
    let (base, engine) = spawn_server(dir.path()).await;
    let client = reqwest::Client::new();
    let endpoint = format!("{base}/api/pdf/generate");

    let missing = client.post(&endpoint).json(&json!({})).send().await.unwrap();
    assert_eq!(missing.status(), 400);
    let body: Value = missing.json().await.unwrap();
    assert_eq!(body["error"], "Invalid request");

    let empty = client
        .post(&endpoint)
        .json(&json!({"html": "<html><body><p>loading</p></body></html>"}))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status(), 422);

    let bad_format = client
        .post(&endpoint)
        .json(&json!({"html": "<table class=\"data-table\"></table>", "format": "b5"}))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_format.status(), 400);

    assert!(engine.pages.lock().unwrap().is_empty());
    let status: Value = reqwest::get(format!("{base}/api/pdf/status"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["runs"], 3);
    assert!(status["lastError"].as_str().unwrap().contains("b5"));
}

#[tokio::test]
async fn polls_printable_url_until_content_appears() {
    use axum::routing::get;
    use std::sync::atomic::{AtomicUsize, Ordering};

    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let page = axum::Router::new().route(
        "/print",
        get(move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    axum::response::Html("<div id=\"app\">loading</div>".to_string())
                } else {
                    axum::response::Html(
                        "<html><head></head><body><section class=\"group-section\"></section></body></html>"
                            .to_string(),
                    )
                }
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let page_addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, page).await.unwrap();
    });

    let dir = tempfile::tempdir().unwrap();
    let (base, engine) = spawn_server(dir.path()).await;
    let response = reqwest::Client::new()
        .post(format!("{base}/api/pdf/generate"))
        .json(&json!({"url": format!("http://{page_addr}/print"), "waitTimeout": 5000}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/pdf"
    );
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    let pages = engine.pages.lock().unwrap().clone();
    assert_eq!(pages.len(), 1);
    assert!(pages[0].contains(&format!(r#"<base href="http://{page_addr}/print">"#)));
    assert!(pages[0].contains("counter(pages)"));
}

#[tokio::test]
async fn unresponsive_page_answers_gateway_timeout() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let page_addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let dir = tempfile::tempdir().unwrap();
    let (base, engine) = spawn_server(dir.path()).await;
    let response = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        reqwest::Client::new()
            .post(format!("{base}/api/pdf/generate"))
            .json(&json!({"url": format!("http://{page_addr}/print"), "waitTimeout": 200}))
            .send(),
    )
    .await
    .expect("the service must answer within the wait budget")
    .unwrap();
    assert_eq!(response.status(), 504);
    assert!(engine.pages.lock().unwrap().is_empty());
}

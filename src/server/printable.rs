//! Loads and prepares the printable page before it goes to the browser.

use log::debug;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

use super::error::{PrintServiceError, Result};
use super::status::ContentStats;
use crate::capture::RemoteRequest;
use crate::converters::html::{
    escape_html_attr, write_running_boxes, CYCLE_CLASS, GROUP_CLASS, PRINT_STYLESHEET, TABLE_CLASS,
};
use crate::models::page::{PageFormat, PageStyle};

/// Lower bound for a single fetch once the wait budget is used up.
const MIN_FETCH_TIMEOUT: Duration = Duration::from_millis(50);

/// Removes collapse markers once scripts run, for pages that toggle them.
const EXPAND_SCRIPT: &str = r#"<script>document.querySelectorAll('[hidden],[data-collapsed]').forEach(function(el){el.removeAttribute('hidden');el.removeAttribute('data-collapsed');});</script>"#;

/// Counts elements carrying `class` as one of their class tokens.
fn count_class(html: &str, class: &str) -> usize {
    let mut count = 0;
    let mut rest = html;
    while let Some(start) = rest.find("class=\"") {
        rest = &rest[start + 7..];
        let Some(end) = rest.find('"') else { break };
        if rest[..end].split_whitespace().any(|token| token == class) {
            count += 1;
        }
        rest = &rest[end + 1..];
    }
    count
}

pub fn content_stats(html: &str) -> ContentStats {
    ContentStats {
        cycles: count_class(html, CYCLE_CLASS),
        groups: count_class(html, GROUP_CLASS),
        tables: count_class(html, TABLE_CLASS),
    }
}

/// Returns the page HTML once it shows at least one group or table.
///
/// Inline HTML is checked once. A URL is polled every `poll_interval` until
/// content appears or the request's `waitTimeout` elapses. Every fetch is bounded
/// by the time left, so a page that never answers ends in a timeout.
pub async fn load(
    client: &reqwest::Client,
    request: &RemoteRequest,
    poll_interval: Duration,
) -> Result<(String, ContentStats)> {
    if let Some(html) = &request.html {
        let stats = content_stats(html);
        if stats.is_empty() {
            return Err(PrintServiceError::ZeroContent(
                "submitted document has no groups or tables".to_string(),
            ));
        }
        return Ok((html.clone(), stats));
    }

    let url = request
        .url
        .as_deref()
        .ok_or_else(|| PrintServiceError::BadRequest("either url or html is required".to_string()))?;
    let wait = Duration::from_millis(request.wait_timeout);
    let deadline = Instant::now() + wait;
    let fetch_error = |e: reqwest::Error| {
        if e.is_timeout() {
            PrintServiceError::Timeout(format!(
                "printable page did not answer within {} ms",
                request.wait_timeout
            ))
        } else {
            PrintServiceError::Upstream(e)
        }
    };
    loop {
        let remaining = deadline
            .saturating_duration_since(Instant::now())
            .max(MIN_FETCH_TIMEOUT);
        let body = client
            .get(url)
            .timeout(remaining)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(fetch_error)?
            .text()
            .await
            .map_err(fetch_error)?;
        let stats = content_stats(&body);
        if !stats.is_empty() {
            debug!("Printable page ready: {:?}", stats);
            return Ok((body, stats));
        }
        if Instant::now() >= deadline {
            return Err(PrintServiceError::ZeroContent(format!(
                "no groups or tables rendered within {} ms",
                request.wait_timeout
            )));
        }
        tokio::time::sleep(poll_interval).await;
    }
}

/// How the prepared page is printed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintSetup<'a> {
    pub scale: f64,
    pub format: PageFormat,
    pub landscape: bool,
    /// Where the page was fetched from. Relative links resolve against it.
    pub base_url: Option<&'a str>,
}

/// Adds the print overrides: forced visibility, table display roles, page size,
/// running header and footer, zoom, and a `<base>` for pages fetched by URL.
pub fn inject_print_overrides(html: &str, setup: &PrintSetup<'_>) -> Result<String> {
    let title = page_title(html).unwrap_or_else(|| PageStyle::default().title);
    let mut overrides = String::new();
    write_overrides(&mut overrides, setup, &title)
        .map_err(|e| PrintServiceError::BadRequest(e.to_string()))?;

    let html = match setup.base_url {
        Some(base) if !html.to_ascii_lowercase().contains("<base") => {
            insert_base(html, &escape_html_attr(base))
        }
        _ => html.to_string(),
    };

    let lower = html.to_ascii_lowercase();
    let mut prepared = String::with_capacity(html.len() + overrides.len() + EXPAND_SCRIPT.len());
    match lower.find("</head>") {
        Some(at) => {
            prepared.push_str(&html[..at]);
            prepared.push_str(&overrides);
            prepared.push_str(&html[at..]);
        }
        None => {
            prepared.push_str(&overrides);
            prepared.push_str(&html);
        }
    }
    prepared.push_str(EXPAND_SCRIPT);
    Ok(prepared)
}

/// Puts `<base href>` first in `<head>` so it applies to every later link.
fn insert_base(html: &str, href: &str) -> String {
    let base = format!(r#"<base href="{href}">"#);
    let lower = html.to_ascii_lowercase();
    let head_open = lower.match_indices("<head").find_map(|(at, _)| {
        let after = lower[at + 5..].chars().next()?;
        if after == '>' || after.is_whitespace() {
            lower[at..].find('>').map(|end| at + end + 1)
        } else {
            None
        }
    });
    match head_open {
        Some(at) => format!("{}{base}{}", &html[..at], &html[at..]),
        None => format!("{base}{html}"),
    }
}

/// Text of the page's `<title>` element, if it has a non-empty one.
fn page_title(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let open = lower.find("<title")?;
    let start = open + lower[open..].find('>')? + 1;
    let end = start + lower[start..].find("</title>")?;
    let title = htmlize::unescape(html[start..end].trim()).into_owned();
    (!title.is_empty()).then_some(title)
}

fn write_overrides(out: &mut String, setup: &PrintSetup<'_>, title: &str) -> std::fmt::Result {
    let orientation = if setup.landscape { "landscape" } else { "portrait" };
    writeln!(out, r#"<style id="print-overrides">"#)?;
    out.push_str(PRINT_STYLESHEET);
    writeln!(out, "@page {{")?;
    writeln!(out, "  size: {} {};", setup.format.css_name(), orientation)?;
    write_running_boxes(title, out)?;
    writeln!(out, "}}")?;
    writeln!(out, "html {{ zoom: {}; }}", setup.scale)?;
    writeln!(out, "</style>")
}

/// Writes the prepared page to `dir` and returns its path.
pub async fn write_dump(dir: &Path, html: &str) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%3f");
    let path = dir.join(format!("print-{stamp}.html"));
    tokio::fs::write(&path, html).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>x</title></head><body>
<section class="cycle-section" data-node="cycle:1">
<section class="group-section" data-node="cycle:1/group:1"></section>
<table class="data-table other"></table></section></body></html>"#;

    #[test]
    fn counts_class_tokens() {
        let stats = content_stats(PAGE);
        assert_eq!(stats, ContentStats { cycles: 1, groups: 1, tables: 1 });
        assert!(content_stats(r#"<div class="group-sections"></div>"#).is_empty());
    }

    fn setup(base_url: Option<&str>) -> PrintSetup<'_> {
        PrintSetup {
            scale: 0.5,
            format: PageFormat::A3,
            landscape: true,
            base_url,
        }
    }

    #[test]
    fn overrides_go_into_head() {
        let html = inject_print_overrides(PAGE, &setup(None)).unwrap();
        let style_at = html.find("print-overrides").unwrap();
        assert!(style_at < html.find("</head>").unwrap());
        assert!(html.contains("  size: a3 landscape;"));
        assert!(html.contains("html { zoom: 0.5; }"));
        assert!(html.ends_with("</script>"));
        assert!(!html.contains("<base"));
    }

    #[test]
    fn live_pages_get_running_header_and_footer() {
        let live = r#"<html><head><title>Classification &amp; doses</title></head>
<body><section class="group-section"></section></body></html>"#;
        let html = inject_print_overrides(live, &setup(None)).unwrap();
        assert!(html.contains("@top-center { content: \"Classification & doses\";"));
        assert!(html.contains(r#"counter(page) " of " counter(pages)"#));

        let untitled = inject_print_overrides("<section class=\"group-section\"></section>", &setup(None)).unwrap();
        assert!(untitled.contains("content: \"Drug classification\""));
    }

    #[test]
    fn fetched_pages_resolve_links_against_their_url() {
        let live = r#"<html><HEAD lang="en"><link rel="stylesheet" href="/assets/app.css"></HEAD>
<body><header>x</header><section class="group-section"></section></body></html>"#;
        let html = inject_print_overrides(live, &setup(Some("http://app.local/print?a=1&b=2"))).unwrap();
        let base_at = html.find(r#"<base href="http://app.local/print?a=1&amp;b=2">"#).unwrap();
        assert!(html.find(r#"<HEAD lang="en">"#).unwrap() < base_at);
        assert!(base_at < html.find("/assets/app.css").unwrap());
        assert_eq!(html.matches("<base").count(), 1);

        let with_base = r#"<head><base href="/"></head><section class="group-section"></section>"#;
        let kept = inject_print_overrides(with_base, &setup(Some("http://app.local/"))).unwrap();
        assert_eq!(kept.matches("<base").count(), 1);
    }

    #[tokio::test]
    async fn inline_html_without_content_is_rejected() {
        let request: RemoteRequest =
            serde_json::from_str(r#"{"html": "<p>nothing</p>"}"#).unwrap();
        let err = load(&reqwest::Client::new(), &request, Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, PrintServiceError::ZeroContent(_)));
    }

    #[tokio::test]
    async fn silent_page_times_out_within_wait_budget() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let request: RemoteRequest = serde_json::from_value(serde_json::json!({
            "url": format!("http://{addr}/print"),
            "waitTimeout": 200
        }))
        .unwrap();
        let outcome = tokio::time::timeout(
            Duration::from_secs(3),
            load(&reqwest::Client::new(), &request, Duration::from_millis(10)),
        )
        .await
        .expect("load must give up within the wait budget");
        assert!(matches!(outcome, Err(PrintServiceError::Timeout(_))));
    }
}

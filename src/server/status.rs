use serde::Serialize;

/// Counts of top-level content found in the last printed page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContentStats {
    pub cycles: usize,
    pub groups: usize,
    pub tables: usize,
}

impl ContentStats {
    pub fn is_empty(&self) -> bool {
        self.groups == 0 && self.tables == 0
    }
}

/// Diagnostics of the most recent render, served by `GET /api/pdf/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub last_run_started: Option<String>,
    pub last_run_finished: Option<String>,
    pub last_error: Option<String>,
    pub content_stats: ContentStats,
    pub last_dump_path: Option<String>,
    pub runs: u64,
}

impl StatusReport {
    pub fn begin(&mut self) {
        self.runs += 1;
        self.last_run_started = Some(chrono::Local::now().to_rfc3339());
        self.last_run_finished = None;
        self.last_error = None;
    }

    pub fn finish(&mut self, error: Option<String>) {
        self.last_run_finished = Some(chrono::Local::now().to_rfc3339());
        self.last_error = error;
    }
}

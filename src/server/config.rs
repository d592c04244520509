use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{env_parse, env_string};
use crate::errors::{ExportError, Result};

/// Settings of the print service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Chromium (or Chrome) executable used for print-to-PDF.
    pub chromium_path: PathBuf,
    /// Where prepared HTML dumps are written.
    pub dump_dir: PathBuf,
    /// Upper bound for one browser run, in seconds.
    pub render_timeout_secs: u64,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Interval between readiness polls of a printable URL, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "127.0.0.1:3001".to_string(),
            chromium_path: PathBuf::from("chromium"),
            dump_dir: env::temp_dir().join("drugclass-print"),
            render_timeout_secs: 90,
            viewport_width: 1600,
            viewport_height: 1200,
            poll_interval_ms: 250,
        }
    }
}

impl ServerConfig {
    /// Defaults overlaid with `PRINT_SERVER_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = ServerConfig::default();
        if let Some(v) = env_string("PRINT_SERVER_BIND") {
            config.bind_addr = v;
        }
        if let Some(v) = env_string("PRINT_SERVER_CHROMIUM") {
            config.chromium_path = PathBuf::from(v);
        }
        if let Some(v) = env_string("PRINT_SERVER_DUMP_DIR") {
            config.dump_dir = PathBuf::from(v);
        }
        if let Some(v) = env_parse("PRINT_SERVER_RENDER_TIMEOUT_SECS")? {
            config.render_timeout_secs = v;
        }
        if let Some(v) = env_parse("PRINT_SERVER_VIEWPORT_WIDTH")? {
            config.viewport_width = v;
        }
        if let Some(v) = env_parse("PRINT_SERVER_VIEWPORT_HEIGHT")? {
            config.viewport_height = v;
        }
        if let Some(v) = env_parse("PRINT_SERVER_POLL_INTERVAL_MS")? {
            config.poll_interval_ms = v;
        }
        if config.viewport_width == 0 || config.viewport_height == 0 {
            return Err(ExportError::Config("viewport must not be empty".to_string()));
        }
        Ok(config)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }
}

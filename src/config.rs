//! Runtime configuration for the export pipeline.
//!
//! Values start from [`ExportConfig::default`] and can be overridden through
//! `DRUGCLASS_*` environment variables (see [`ExportConfig::from_env`]).

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::converters::html::DocumentOptions;
use crate::errors::{ExportError, Result};
use crate::models::page::{PageFormat, PageStyle};

/// Default scale passed to the remote print service.
pub const DEFAULT_REMOTE_SCALE: f64 = 0.5;

/// Settings for the remote headless-browser capture strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteConfig {
    /// Full URL of the print service endpoint (`POST`). `None` disables the strategy.
    pub endpoint: Option<String>,
    /// Printable page of the web app; selection and print-mode parameters are appended.
    pub print_page_url: Option<String>,
    /// How long the service waits for rendered content, in milliseconds.
    pub wait_timeout_ms: u64,
    /// Render scale requested from the service.
    pub scale: f64,
    /// Overall bound for one remote attempt, in seconds.
    pub timeout_secs: u64,
    /// Bound for establishing the connection, in milliseconds.
    pub connect_timeout_ms: u64,
    /// Ask the service to keep its HTML dump for inspection.
    pub debug: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            endpoint: Some("http://127.0.0.1:3001/api/pdf/generate".to_string()),
            print_page_url: None,
            wait_timeout_ms: 8_000,
            scale: DEFAULT_REMOTE_SCALE,
            timeout_secs: 120,
            connect_timeout_ms: 3_000,
            debug: false,
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Top-level export configuration shared by every capture strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportConfig {
    /// Delay after forcing every region open, before capturing, in milliseconds.
    pub settle_delay_ms: u64,
    /// Raster pixels per CSS pixel for the in-process strategy.
    pub pixel_density: f32,
    pub page_format: PageFormat,
    pub landscape: bool,
    /// Page margin on every side, in millimetres.
    pub margin_mm: f64,
    /// Downloads are named `<stem>-YYYY-MM-DD.<ext>`.
    pub filename_stem: String,
    /// Computed page typography and colors embedded into every output.
    pub page_style: PageStyle,
    /// Where print-mode views and other temporary artifacts are written.
    pub temp_dir: PathBuf,
    /// Where delivered documents are saved.
    pub download_dir: PathBuf,
    pub remote: RemoteConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            settle_delay_ms: 2_000,
            pixel_density: 2.0,
            page_format: PageFormat::A4,
            landscape: false,
            margin_mm: 10.0,
            filename_stem: "drug-classification".to_string(),
            page_style: PageStyle::default(),
            temp_dir: env::temp_dir().join("drugclass-export"),
            download_dir: PathBuf::from("downloads"),
            remote: RemoteConfig::default(),
        }
    }
}

impl ExportConfig {
    /// Builds a configuration from defaults overlaid with `DRUGCLASS_*` environment variables.
    ///
    /// Call `dotenvy::dotenv()` beforehand to pick up a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Config` when a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let mut config = ExportConfig::default();

        if let Some(v) = env_parse("DRUGCLASS_SETTLE_DELAY_MS")? {
            config.settle_delay_ms = v;
        }
        if let Some(v) = env_parse("DRUGCLASS_PIXEL_DENSITY")? {
            config.pixel_density = v;
        }
        if let Some(name) = env_string("DRUGCLASS_PAGE_FORMAT") {
            config.page_format = PageFormat::parse(&name).ok_or_else(|| {
                ExportError::Config(format!("DRUGCLASS_PAGE_FORMAT: unknown page format '{name}'"))
            })?;
        }
        if let Some(v) = env_bool("DRUGCLASS_LANDSCAPE")? {
            config.landscape = v;
        }
        if let Some(v) = env_parse("DRUGCLASS_MARGIN_MM")? {
            config.margin_mm = v;
        }
        if let Some(v) = env_string("DRUGCLASS_FILENAME_STEM") {
            config.filename_stem = v;
        }
        if let Some(v) = env_string("DRUGCLASS_DOCUMENT_TITLE") {
            config.page_style.title = v;
        }
        if let Some(v) = env_string("DRUGCLASS_FONT_FAMILY") {
            config.page_style.font_family = v;
        }
        if let Some(v) = env_string("DRUGCLASS_TEMP_DIR") {
            config.temp_dir = PathBuf::from(v);
        }
        if let Some(v) = env_string("DRUGCLASS_DOWNLOAD_DIR") {
            config.download_dir = PathBuf::from(v);
        }

        // --- Remote print service ---
        if let Some(v) = env_string("DRUGCLASS_REMOTE_ENDPOINT") {
            // An explicit empty value (or "off") disables the remote strategy.
            config.remote.endpoint = match v.as_str() {
                "" | "off" | "none" => None,
                _ => Some(v),
            };
        }
        if let Some(v) = env_string("DRUGCLASS_PRINT_PAGE_URL") {
            config.remote.print_page_url = Some(v);
        }
        if let Some(v) = env_parse("DRUGCLASS_REMOTE_WAIT_TIMEOUT_MS")? {
            config.remote.wait_timeout_ms = v;
        }
        if let Some(v) = env_parse("DRUGCLASS_REMOTE_SCALE")? {
            config.remote.scale = v;
        }
        if let Some(v) = env_parse("DRUGCLASS_REMOTE_TIMEOUT_SECS")? {
            config.remote.timeout_secs = v;
        }
        if let Some(v) = env_parse("DRUGCLASS_REMOTE_CONNECT_TIMEOUT_MS")? {
            config.remote.connect_timeout_ms = v;
        }
        if let Some(v) = env_bool("DRUGCLASS_REMOTE_DEBUG")? {
            config.remote.debug = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if !(self.pixel_density > 0.0 && self.pixel_density <= 8.0) {
            return Err(ExportError::Config(format!(
                "pixel density must be in (0, 8], got {}",
                self.pixel_density
            )));
        }
        if !(self.remote.scale > 0.0 && self.remote.scale <= 2.0) {
            return Err(ExportError::Config(format!(
                "remote scale must be in (0, 2], got {}",
                self.remote.scale
            )));
        }
        let (w, h) = self.page_format.size_mm(self.landscape);
        if self.margin_mm < 0.0 || self.margin_mm * 2.0 >= w.min(h) {
            return Err(ExportError::Config(format!(
                "margin {}mm does not fit a {}x{}mm page",
                self.margin_mm, w, h
            )));
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Page geometry and style for HTML documents built from this configuration.
    pub fn document_options(&self) -> DocumentOptions {
        DocumentOptions {
            style: self.page_style.clone(),
            page_format: self.page_format,
            landscape: self.landscape,
            margin_mm: self.margin_mm,
            running_header: true,
            auto_print_after_ms: None,
        }
    }

    /// Suggested download filename for today's date.
    pub fn filename(&self, extension: &str) -> String {
        format!(
            "{}-{}.{}",
            self.filename_stem,
            chrono::Local::now().format("%Y-%m-%d"),
            extension
        )
    }
}

// --- Environment helpers ---

pub(crate) fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string())
}

pub(crate) fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env_string(key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| ExportError::Config(format!("{key}: invalid value '{raw}': {e}"))),
        None => Ok(None),
    }
}

pub(crate) fn env_bool(key: &str) -> Result<Option<bool>> {
    match env_string(key) {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ExportError::Config(format!("{key}: invalid boolean '{raw}'"))),
        },
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ExportConfig::default();
        config.validate().expect("default config validates");
        assert_eq!(config.remote.scale, DEFAULT_REMOTE_SCALE);
        assert_eq!(config.page_format, PageFormat::A4);
    }

    #[test]
    fn rejects_out_of_range_scale() {
        let mut config = ExportConfig::default();
        config.remote.scale = 0.0;
        assert!(matches!(config.validate(), Err(ExportError::Config(_))));
    }

    #[test]
    fn rejects_margin_larger_than_page() {
        let config = ExportConfig {
            margin_mm: 150.0,
            ..ExportConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn filename_has_stem_date_and_extension() {
        let name = ExportConfig::default().filename("pdf");
        assert!(name.starts_with("drug-classification-"));
        assert!(name.ends_with(".pdf"));
        // stem + '-' + YYYY-MM-DD + ".pdf"
        assert_eq!(name.len(), "drug-classification-".len() + 10 + 4);
    }

    #[test]
    fn deserializes_partial_json_over_defaults() {
        let config: ExportConfig =
            serde_json::from_str(r#"{"landscape": true, "remote": {"scale": 0.375}}"#).unwrap();
        assert!(config.landscape);
        assert_eq!(config.remote.scale, 0.375);
        assert_eq!(config.remote.wait_timeout_ms, 8_000);
        assert_eq!(config.settle_delay_ms, 2_000);
    }
}

pub mod capture;
pub mod config;
pub mod converters;
pub mod errors;
pub mod export;
pub mod models;

#[cfg(feature = "server")]
pub mod server;

pub use capture::{CaptureChain, CaptureFailure, CaptureStrategy, FailureKind};
pub use config::{ExportConfig, RemoteConfig};
pub use converters::html::{render, render_with, RenderOptions, VisualFragment};
pub use errors::{ExportError, Result};
pub use export::{DirectorySink, DownloadSink, ExportOutcome, Exporter, ExporterBuilder};
pub use models::classification::Cycle;

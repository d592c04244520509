use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::{ExportError, Result};
use crate::models::classification::Cycle;

/// An immutable snapshot of what the user asked to export.
///
/// Built synchronously from the editor state when the user confirms the export,
/// consumed once by the orchestrator and dropped afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub source_tree: Vec<Cycle>,
    pub selected_cycle_ids: Vec<u32>,
}

impl ExportRequest {
    pub fn new(source_tree: &[Cycle], selected_cycle_ids: &[u32]) -> Self {
        ExportRequest {
            source_tree: source_tree.to_vec(),
            selected_cycle_ids: selected_cycle_ids.to_vec(),
        }
    }

    /// Fails with `ExportError::EmptySelection` when no selected id names a cycle of the tree.
    pub fn validate(&self) -> Result<()> {
        let any = self
            .source_tree
            .iter()
            .any(|cycle| self.selected_cycle_ids.contains(&cycle.id));
        if any {
            Ok(())
        } else {
            Err(ExportError::EmptySelection)
        }
    }

    /// The selected cycles in source-tree order (not selection order).
    pub fn selected_cycles(&self) -> Vec<Cycle> {
        self.source_tree
            .iter()
            .filter(|cycle| self.selected_cycle_ids.contains(&cycle.id))
            .cloned()
            .collect()
    }
}

/// A binary document ready to be offered as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub filename: String,
}

impl Document {
    pub fn pdf(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Document {
            bytes,
            mime_type: "application/pdf".to_string(),
            filename: filename.into(),
        }
    }

    pub fn html(markup: String, filename: impl Into<String>) -> Self {
        Document {
            bytes: markup.into_bytes(),
            mime_type: "text/html; charset=utf-8".to_string(),
            filename: filename.into(),
        }
    }
}

/// What a successful capture strategy hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutput {
    /// A finished document for the download mechanism.
    Download(Document),
    /// A print-mode view was opened in a new browsing context; the platform print flow owns the result.
    PrintContext { location: PathBuf },
}

impl CaptureOutput {
    pub fn describe(&self) -> String {
        match self {
            CaptureOutput::Download(doc) => {
                format!("{} ({}, {} bytes)", doc.filename, doc.mime_type, doc.bytes.len())
            }
            CaptureOutput::PrintContext { location } => {
                format!("print view at {}", location.display())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle(id: u32, name: &str) -> Cycle {
        Cycle {
            id,
            name: name.into(),
            color_scale: String::new(),
            children: Vec::new(),
        }
    }

    #[test]
    fn selection_keeps_source_order() {
        let tree = vec![cycle(1, "A"), cycle(2, "B"), cycle(3, "C")];
        let request = ExportRequest::new(&tree, &[3, 1]);
        let names: Vec<String> = request.selected_cycles().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let tree = vec![cycle(1, "A")];
        assert!(ExportRequest::new(&tree, &[9]).selected_cycles().is_empty());
    }

    #[test]
    fn empty_or_unmatched_selection_does_not_validate() {
        let tree = vec![cycle(1, "A")];
        assert!(matches!(
            ExportRequest::new(&tree, &[]).validate(),
            Err(ExportError::EmptySelection)
        ));
        assert!(ExportRequest::new(&tree, &[9]).validate().is_err());
        assert!(ExportRequest::new(&tree, &[1, 9]).validate().is_ok());
    }
}

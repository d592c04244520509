// src/models/page.rs

use serde::{Deserialize, Serialize};

/// Standard paper sizes supported by the paginated outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    A3,
    #[default]
    A4,
    Letter,
    Legal,
}

impl PageFormat {
    /// Portrait `(width, height)` in millimetres.
    pub fn portrait_mm(&self) -> (f64, f64) {
        match self {
            PageFormat::A3 => (297.0, 420.0),
            PageFormat::A4 => (210.0, 297.0),
            PageFormat::Letter => (215.9, 279.4),
            PageFormat::Legal => (215.9, 355.6),
        }
    }

    /// `(width, height)` in millimetres for the requested orientation.
    pub fn size_mm(&self, landscape: bool) -> (f64, f64) {
        let (w, h) = self.portrait_mm();
        if landscape {
            (h, w)
        } else {
            (w, h)
        }
    }

    /// Name used in CSS `@page { size: ... }` rules and in the remote request body.
    pub fn css_name(&self) -> &'static str {
        match self {
            PageFormat::A3 => "a3",
            PageFormat::A4 => "a4",
            PageFormat::Letter => "letter",
            PageFormat::Legal => "legal",
        }
    }

    /// Parses a case-insensitive page format name (`"a3"`, `"A4"`, `"letter"`, ...).
    pub fn parse(name: &str) -> Option<PageFormat> {
        match name.trim().to_ascii_lowercase().as_str() {
            "a3" => Some(PageFormat::A3),
            "a4" => Some(PageFormat::A4),
            "letter" => Some(PageFormat::Letter),
            "legal" => Some(PageFormat::Legal),
            _ => None,
        }
    }
}

/// Snapshot of the page's computed typography and colors, embedded into every produced document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageStyle {
    /// CSS font-family stack; the first family is used for rasterization.
    pub font_family: String,
    /// Base font size in CSS pixels.
    pub base_font_px: f64,
    /// Body text color (`#rrggbb`).
    pub text_color: String,
    /// Page background color (`#rrggbb`).
    pub background: String,
    /// Document title shown in the running header.
    pub title: String,
}

impl Default for PageStyle {
    fn default() -> Self {
        PageStyle {
            font_family: "Arial, Helvetica, sans-serif".to_string(),
            base_font_px: 14.0,
            text_color: "#1f2937".to_string(),
            background: "#ffffff".to_string(),
            title: "Drug classification".to_string(),
        }
    }
}

impl PageStyle {
    /// First family of the font stack with quotes stripped.
    pub fn primary_font(&self) -> &str {
        self.font_family
            .split(',')
            .next()
            .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\''))
            .filter(|f| !f.is_empty())
            .unwrap_or("Arial")
    }
}

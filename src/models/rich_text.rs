use serde::{Deserialize, Serialize};
use std::fmt;

/// A trusted, pre-sanitized rich-text fragment produced by the editor.
///
/// Renderers embed the markup verbatim. `Display` writes the raw markup, never an escaped form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(String);

impl RichText {
    pub fn new(markup: impl Into<String>) -> Self {
        RichText(markup.into())
    }

    /// The raw markup.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the fragment is empty, whitespace, or only empty `<p>`/`<br>` tags.
    ///
    /// Any other element (images, rules, tables) counts as content even without text.
    pub fn is_blank(&self) -> bool {
        let mut rest = self.0.as_str();
        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                return true;
            }
            let Some(tag) = rest.strip_prefix('<') else {
                return false;
            };
            let Some(end) = tag.find('>') else {
                return false;
            };
            let name = tag[..end]
                .trim_start_matches('/')
                .trim_end_matches('/')
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_ascii_lowercase();
            if name != "p" && name != "br" {
                return false;
            }
            rest = &tag[end + 1..];
        }
    }
}

impl From<&str> for RichText {
    fn from(value: &str) -> Self {
        RichText::new(value)
    }
}

impl From<String> for RichText {
    fn from(value: String) -> Self {
        RichText(value)
    }
}

impl fmt::Display for RichText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_detection_ignores_markup() {
        assert!(RichText::new("").is_blank());
        assert!(RichText::new("<p> </p><br>").is_blank());
        assert!(!RichText::new("<ul><li>Amoxicillin</li></ul>").is_blank());
        assert!(RichText::new("  <p><br/></p>\n<BR>").is_blank());
    }

    #[test]
    fn textless_elements_are_content() {
        assert!(!RichText::new(r#"<p><img src="data:image/png;base64,AA=="></p><hr>"#).is_blank());
        assert!(!RichText::new("<hr>").is_blank());
        assert!(!RichText::new("<table><tr><td></td></tr></table>").is_blank());
    }

    #[test]
    fn serializes_as_plain_string() {
        let text = RichText::new("<b>x</b>");
        assert_eq!(serde_json::to_string(&text).unwrap(), r#""<b>x</b>""#);
    }
}

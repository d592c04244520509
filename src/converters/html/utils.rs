//! Escaping helpers. Structural text (names, cell contents) is escaped;
//! rich text never passes through here.

/// Escapes `&`, `<`, `>` for HTML text content.
pub fn escape_html_text(text: &str) -> String {
    htmlize::escape_text(text).into_owned()
}

/// Escapes text for use inside a double-quoted HTML attribute.
pub fn escape_html_attr(text: &str) -> String {
    htmlize::escape_attribute(text).into_owned()
}

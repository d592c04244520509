//! Rich-text flattening and line wrapping for the SVG canvas.
//!
//! Preparations arrive as trusted HTML. SVG has no flow layout, so the markup is
//! reduced to styled runs grouped into paragraphs (list items keep their marker
//! and nesting depth), then wrapped to the available width.

use super::utils::text_width_px;

/// A span of text sharing one style.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

/// A block-level unit of rich text: a paragraph or a list item.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Paragraph {
    /// List marker (`•`, `1.`) for list items.
    pub marker: Option<String>,
    /// List nesting depth, 0 outside lists.
    pub depth: usize,
    pub runs: Vec<Run>,
}

impl Paragraph {
    fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }

    /// Plain text of the paragraph (markers excluded).
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

enum ListKind {
    Bullet,
    Ordered(usize),
}

#[derive(Default)]
struct Flattener {
    paragraphs: Vec<Paragraph>,
    current: Paragraph,
    lists: Vec<ListKind>,
    bold: usize,
    italic: usize,
}

impl Flattener {
    /// Ends the current paragraph. An empty one is kept open so a pending list marker survives.
    fn break_paragraph(&mut self) {
        if self.current.is_empty() {
            self.current.runs.clear();
            return;
        }
        let finished = std::mem::take(&mut self.current);
        self.paragraphs.push(finished);
        self.current.depth = self.lists.len();
    }

    fn push_text(&mut self, text: &str) {
        let decoded = htmlize::unescape(text);
        // Collapse whitespace like HTML does.
        let mut collapsed = String::with_capacity(decoded.len());
        let mut last_space = self
            .current
            .runs
            .last()
            .map_or(true, |r| r.text.ends_with(' '));
        for c in decoded.chars() {
            if c.is_whitespace() {
                if !last_space {
                    collapsed.push(' ');
                }
                last_space = true;
            } else {
                collapsed.push(c);
                last_space = false;
            }
        }
        if collapsed.is_empty() {
            return;
        }
        let (bold, italic) = (self.bold > 0, self.italic > 0);
        match self.current.runs.last_mut() {
            Some(last) if last.bold == bold && last.italic == italic => last.text.push_str(&collapsed),
            _ => self.current.runs.push(Run {
                text: collapsed,
                bold,
                italic,
            }),
        }
    }

    fn open_tag(&mut self, name: &str) {
        match name {
            "b" | "strong" => self.bold += 1,
            "i" | "em" => self.italic += 1,
            "ul" => {
                self.break_paragraph();
                self.lists.push(ListKind::Bullet);
            }
            "ol" => {
                self.break_paragraph();
                self.lists.push(ListKind::Ordered(0));
            }
            "li" => {
                self.break_paragraph();
                let marker = match self.lists.last_mut() {
                    Some(ListKind::Ordered(n)) => {
                        *n += 1;
                        format!("{n}.")
                    }
                    _ => "•".to_string(),
                };
                self.current.marker = Some(marker);
                self.current.depth = self.lists.len().max(1);
            }
            "br" | "p" | "div" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "tr" => {
                self.break_paragraph()
            }
            _ => {}
        }
    }

    fn close_tag(&mut self, name: &str) {
        match name {
            "b" | "strong" => self.bold = self.bold.saturating_sub(1),
            "i" | "em" => self.italic = self.italic.saturating_sub(1),
            "ul" | "ol" => {
                self.break_paragraph();
                self.lists.pop();
                self.current.depth = self.lists.len();
            }
            "li" | "p" | "div" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "tr" => {
                self.break_paragraph()
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Paragraph> {
        self.break_paragraph();
        for paragraph in &mut self.paragraphs {
            if let Some(last) = paragraph.runs.last_mut() {
                let trimmed = last.text.trim_end().len();
                last.text.truncate(trimmed);
            }
            if let Some(first) = paragraph.runs.first_mut() {
                if first.text.starts_with(' ') {
                    first.text.remove(0);
                }
            }
        }
        self.paragraphs
    }
}

/// Reduces rich-text markup to paragraphs of styled runs.
///
/// Unknown tags are ignored but their text content is kept, so nothing the
/// editor stored is dropped from the output.
pub(crate) fn flatten_rich_text(markup: &str) -> Vec<Paragraph> {
    let mut flattener = Flattener::default();
    let mut rest = markup;

    while let Some(start) = rest.find('<') {
        flattener.push_text(&rest[..start]);
        let Some(end) = rest[start..].find('>') else {
            // Unterminated tag: treat the remainder as text.
            flattener.push_text(&rest[start..]);
            rest = "";
            break;
        };
        let tag = &rest[start + 1..start + end];
        rest = &rest[start + end + 1..];

        if tag.starts_with('!') || tag.starts_with('?') {
            continue;
        }
        let (closing, body) = match tag.strip_prefix('/') {
            Some(body) => (true, body),
            None => (false, tag),
        };
        let name = body
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        if closing {
            flattener.close_tag(&name);
        } else {
            flattener.open_tag(&name);
            if tag.ends_with('/') && name != "br" {
                flattener.close_tag(&name);
            }
        }
    }
    flattener.push_text(rest);
    flattener.finish()
}

/// One wrapped visual line: words with their style.
pub(crate) type Line = Vec<Run>;

/// Greedy word wrap of `runs` into lines no wider than `max_width` pixels.
/// Lines only break at spaces; a single word wider than the line is placed alone.
pub(crate) fn wrap_runs(runs: &[Run], max_width: f64, font_px: f64) -> Vec<Line> {
    let space_width = text_width_px(" ", font_px, false);
    let mut lines: Vec<Line> = Vec::new();
    let mut line: Line = Vec::new();
    let mut width = 0.0;
    let mut pending_space = false;

    for run in runs {
        for (index, word) in run.text.split(' ').enumerate() {
            if index > 0 {
                pending_space = true;
            }
            if word.is_empty() {
                continue;
            }
            let word_width = text_width_px(word, font_px, run.bold);
            if !line.is_empty() && pending_space && width + space_width + word_width > max_width {
                lines.push(std::mem::take(&mut line));
                width = 0.0;
            }
            let prefix = if !line.is_empty() && pending_space {
                width += space_width;
                " "
            } else {
                ""
            };
            width += word_width;
            pending_space = false;
            match line.last_mut() {
                Some(last) if last.bold == run.bold && last.italic == run.italic => {
                    last.text.push_str(prefix);
                    last.text.push_str(word);
                }
                _ => line.push(Run {
                    text: format!("{prefix}{word}"),
                    bold: run.bold,
                    italic: run.italic,
                }),
            }
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Wraps plain text (no styling) into line strings.
pub(crate) fn wrap_plain(text: &str, max_width: f64, font_px: f64) -> Vec<String> {
    let run = Run {
        text: text.to_string(),
        bold: false,
        italic: false,
    };
    wrap_runs(&[run], max_width, font_px)
        .into_iter()
        .map(|line| line.into_iter().map(|r| r.text).collect())
        .collect()
}

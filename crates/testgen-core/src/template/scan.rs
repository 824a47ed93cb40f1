//! Splitting template text into top-level sections

use super::error::{OpenSection, TemplateError};
use super::syntax::{classify, LineKind};

/// A tagged block of template text, from `@tag` to its matching `@tag_`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Tag name without the leading `@`
    pub tag: String,
    /// Text after the tag on the opening line
    pub argument: String,
    /// Lines between the opening and closing tag, joined with `\n`
    pub body: String,
    /// Line number of the opening tag
    pub line: usize,
}

impl Section {
    /// Line number of the first body line
    pub fn body_line(&self) -> usize {
        self.line + 1
    }
}

/// One top-level element of a scanned text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item<'a> {
    /// A line outside any section
    Text { line: usize, text: &'a str },
    /// A complete section with its nested content kept in the body
    Section(Section),
}

/// Scan `text` into top-level items
///
/// `first_line` is the line number of the first line of `text`, so that
/// sections found inside a body report positions in the original file.
///
/// # Errors
///
/// Returns `UnterminatedSection` when an opening tag has no matching close.
pub fn scan(text: &str, first_line: usize) -> Result<Vec<Item<'_>>, TemplateError> {
    let lines: Vec<&str> = text.lines().collect();
    let mut items = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        let line = first_line + index;

        match classify(lines[index]) {
            LineKind::Open {
                tag,
                argument,
                self_closing: true,
            } => {
                items.push(Item::Section(Section {
                    tag: tag.to_string(),
                    argument: argument.to_string(),
                    body: String::new(),
                    line,
                }));
                index += 1;
            }
            LineKind::Open {
                tag,
                argument,
                self_closing: false,
            } => {
                let end = find_close(&lines, index + 1, tag).ok_or_else(|| {
                    TemplateError::UnterminatedSection {
                        open: vec![OpenSection {
                            tag: tag.to_string(),
                            line,
                        }],
                    }
                })?;

                items.push(Item::Section(Section {
                    tag: tag.to_string(),
                    argument: argument.to_string(),
                    body: lines[index + 1..end].join("\n"),
                    line,
                }));
                index = end + 1;
            }
            LineKind::Close { .. } | LineKind::Text => {
                items.push(Item::Text {
                    line,
                    text: lines[index],
                });
                index += 1;
            }
        }
    }

    Ok(items)
}

/// Index of the line closing `tag`, skipping nested sections of the same tag
fn find_close(lines: &[&str], start: usize, tag: &str) -> Option<usize> {
    let mut depth = 0usize;

    for (offset, line) in lines[start..].iter().enumerate() {
        match classify(line) {
            LineKind::Open {
                tag: inner,
                self_closing: false,
                ..
            } if inner == tag => depth += 1,
            LineKind::Close { tag: inner } if inner == tag => {
                if depth == 0 {
                    return Some(start + offset);
                }
                depth -= 1;
            }
            _ => {}
        }
    }

    None
}

/// Remove every `comment` section from `text`, keeping all other lines
pub fn strip_comments(text: &str) -> String {
    let mut depth = 0usize;
    let mut kept = Vec::new();

    for line in text.lines() {
        match classify(line) {
            LineKind::Open {
                tag: "comment",
                self_closing,
                ..
            } => {
                if !self_closing {
                    depth += 1;
                }
            }
            LineKind::Close { tag: "comment" } if depth > 0 => depth -= 1,
            _ if depth > 0 => {}
            _ => kept.push(line),
        }
    }

    kept.join("\n")
}

//! Section line classification and structural validation
//!
//! Sections are line-anchored:
//!
//! - `@tag` or `@tag argument` opens a section
//! - `@tag_` (trailing whitespace allowed) closes it
//! - `@tag argument @tag_` opens and closes on the same line
//!
//! Sections nest and must close in last-in-first-out order.

use crate::template::error::{OpenSection, TemplateError};

/// Classification of a single template line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// `@tag [argument]`, possibly closed on the same line
    Open {
        tag: &'a str,
        argument: &'a str,
        self_closing: bool,
    },
    /// `@tag_`
    Close { tag: &'a str },
    /// Anything else
    Text,
}

/// Classify `line` with the one rule shared by the checker and the parser
pub fn classify(line: &str) -> LineKind<'_> {
    let Some(rest) = line.strip_prefix('@') else {
        return LineKind::Text;
    };

    let tag_len = rest
        .find(|c: char| c == '_' || c.is_whitespace())
        .unwrap_or(rest.len());
    if tag_len == 0 {
        return LineKind::Text;
    }
    let (tag, after) = rest.split_at(tag_len);

    if let Some(trailing) = after.strip_prefix('_') {
        return if trailing.trim().is_empty() {
            LineKind::Close { tag }
        } else {
            LineKind::Text
        };
    }

    let argument = after.trim();
    let close_marker = format!("@{}_", tag);
    match argument.strip_suffix(close_marker.as_str()) {
        Some(inner) => LineKind::Open {
            tag,
            argument: inner.trim(),
            self_closing: true,
        },
        None => LineKind::Open {
            tag,
            argument,
            self_closing: false,
        },
    }
}

/// Validate section nesting over the whole text
///
/// # Errors
///
/// - `UnexpectedClose` for a closing tag with nothing open
/// - `MismatchedSection` for a closing tag that is not the innermost open one
/// - `UnterminatedSection` listing every section still open at end of input
pub fn check_syntax(text: &str) -> Result<(), TemplateError> {
    let mut stack: Vec<OpenSection> = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;

        match classify(line) {
            LineKind::Open {
                tag,
                self_closing: false,
                ..
            } => stack.push(OpenSection {
                tag: tag.to_string(),
                line: line_number,
            }),
            LineKind::Close { tag } => match stack.last() {
                None => {
                    return Err(TemplateError::UnexpectedClose {
                        tag: tag.to_string(),
                        line: line_number,
                    })
                }
                Some(open) if open.tag != tag => {
                    return Err(TemplateError::MismatchedSection {
                        found: tag.to_string(),
                        line: line_number,
                        open: open.tag.clone(),
                        open_line: open.line,
                    })
                }
                Some(_) => {
                    stack.pop();
                }
            },
            _ => {}
        }
    }

    if stack.is_empty() {
        Ok(())
    } else {
        Err(TemplateError::UnterminatedSection { open: stack })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_open() {
        assert_eq!(
            classify("@sample"),
            LineKind::Open {
                tag: "sample",
                argument: "",
                self_closing: false
            }
        );
        assert_eq!(
            classify("@dir  integer "),
            LineKind::Open {
                tag: "dir",
                argument: "integer",
                self_closing: false
            }
        );
    }

    #[test]
    fn test_classify_close() {
        assert_eq!(classify("@sample_"), LineKind::Close { tag: "sample" });
        assert_eq!(classify("@sample_  \t"), LineKind::Close { tag: "sample" });
    }

    #[test]
    fn test_classify_self_closing() {
        assert_eq!(
            classify("@file a.c $test(1) @ok 0 @ok_ @file_"),
            LineKind::Open {
                tag: "file",
                argument: "a.c $test(1) @ok 0 @ok_",
                self_closing: true
            }
        );
    }

    #[test]
    fn test_classify_text() {
        assert_eq!(classify("int main(void);"), LineKind::Text);
        assert_eq!(classify(" @def indented"), LineKind::Text);
        assert_eq!(classify("@"), LineKind::Text);
        assert_eq!(classify("@_"), LineKind::Text);
        assert_eq!(classify("@tag_suffix"), LineKind::Text);
    }

    #[test]
    fn test_check_syntax_success() {
        let text = "\n@comment\nIgnore this section\n@comment_\n";
        assert!(check_syntax(text).is_ok());
    }

    #[test]
    fn test_check_syntax_success_nested() {
        let text = "\n@def hoge\n@comment\nIgnore this section\n@comment_\n@def_\n";
        assert!(check_syntax(text).is_ok());
    }

    #[test]
    fn test_check_syntax_self_closing_opens_nothing() {
        let text = "@dir out\n@file a.c $m() @file_\n@dir_\n";
        assert!(check_syntax(text).is_ok());
    }

    #[test]
    fn test_check_syntax_start_only() {
        match check_syntax("\n@start\n") {
            Err(TemplateError::UnterminatedSection { open }) => {
                assert_eq!(
                    open,
                    vec![OpenSection {
                        tag: "start".to_string(),
                        line: 2
                    }]
                );
            }
            other => panic!("Expected UnterminatedSection, got {:?}", other),
        }
    }

    #[test]
    fn test_check_syntax_lists_every_unclosed_section() {
        match check_syntax("@a\n@b\n@c\n@c_\n") {
            Err(TemplateError::UnterminatedSection { open }) => {
                let tags: Vec<_> = open.iter().map(|s| (s.tag.as_str(), s.line)).collect();
                assert_eq!(tags, vec![("a", 1), ("b", 2)]);
            }
            other => panic!("Expected UnterminatedSection, got {:?}", other),
        }
    }

    #[test]
    fn test_check_syntax_end_only() {
        match check_syntax("\n@def_\n") {
            Err(TemplateError::UnexpectedClose { tag, line }) => {
                assert_eq!(tag, "def");
                assert_eq!(line, 2);
            }
            other => panic!("Expected UnexpectedClose, got {:?}", other),
        }
    }

    #[test]
    fn test_check_syntax_mismatched_end() {
        match check_syntax("\n@foo\n@bar_\n") {
            Err(TemplateError::MismatchedSection {
                found,
                line,
                open,
                open_line,
            }) => {
                assert_eq!(found, "bar");
                assert_eq!(line, 3);
                assert_eq!(open, "foo");
                assert_eq!(open_line, 2);
            }
            other => panic!("Expected MismatchedSection, got {:?}", other),
        }
    }

    #[test]
    fn test_check_syntax_misordered_close() {
        let result = check_syntax("@def x\n@comment\n@def_\n@comment_\n");
        assert!(matches!(
            result,
            Err(TemplateError::MismatchedSection { .. })
        ));
    }
}

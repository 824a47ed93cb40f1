//! Template error types

use std::fmt;
use std::path::PathBuf;

/// A section that was opened but never closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSection {
    /// Tag name without the leading `@`
    pub tag: String,
    /// Line number of the opening tag
    pub line: usize,
}

/// Errors raised while checking, parsing or expanding templates
#[derive(Debug)]
pub enum TemplateError {
    /// Macro called with the wrong number of arguments
    ArityMismatch {
        /// Name of the macro being evaluated
        name: String,
        /// Number of formal parameters
        expected: usize,
        /// Number of arguments supplied
        got: usize,
    },

    /// Reference to a macro that is neither a parameter nor defined
    UndefinedMacro {
        /// The unresolved token, including the sigil
        name: String,
    },

    /// A macro re-entered itself through a chain of calls
    MacroCycle {
        /// Call chain, outermost first, ending with the repeated name
        chain: Vec<String>,
    },

    /// Macro calls nested deeper than the expansion limit
    ExpansionTooDeep {
        /// Macro whose call exceeded the limit
        name: String,
        /// Maximum nesting depth
        limit: usize,
    },

    /// Macro could not be constructed
    InvalidMacro {
        /// Error message
        reason: String,
    },

    /// Closing tag does not match the innermost open section
    MismatchedSection {
        /// Tag of the unexpected closing line
        found: String,
        /// Line of the unexpected closing tag
        line: usize,
        /// Tag of the section still open
        open: String,
        /// Line where the open section started
        open_line: usize,
    },

    /// Closing tag with no open section
    UnexpectedClose {
        /// Tag of the closing line
        tag: String,
        /// Line of the closing tag
        line: usize,
    },

    /// Sections still open at end of input
    UnterminatedSection {
        /// Every unclosed section, outermost first
        open: Vec<OpenSection>,
    },

    /// Include target not found in any include path
    IncludeNotFound {
        /// The path as written in the template
        path: String,
    },

    /// Include target is already being parsed
    IncludeCycle {
        /// Resolved path of the repeated file
        path: PathBuf,
    },

    /// Section argument is malformed
    InvalidSection {
        /// Tag of the section
        tag: String,
        /// Line of the opening tag
        line: usize,
        /// Error message
        reason: String,
    },

    /// Malformed `@file` directive
    InvalidDirective {
        /// Line where the directive starts
        line: usize,
        /// The directive text
        text: String,
        /// Error message
        reason: String,
    },

    /// Filesystem operation failed
    Io {
        /// Operation that failed (e.g. "create directory")
        operation: &'static str,
        /// Path the operation was applied to
        path: PathBuf,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// Error raised while processing a template file
    InTemplate {
        /// Template being processed
        path: PathBuf,
        /// The error raised inside it
        source: Box<TemplateError>,
    },
}

impl TemplateError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TemplateError::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Innermost error, skipping every `InTemplate` wrapper
    pub fn root_cause(&self) -> &TemplateError {
        match self {
            TemplateError::InTemplate { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Template files the error passed through, outermost first
    pub fn template_chain(&self) -> Vec<&PathBuf> {
        let mut chain = Vec::new();
        let mut current = self;
        while let TemplateError::InTemplate { path, source } = current {
            chain.push(path);
            current = source;
        }
        chain
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::ArityMismatch {
                name,
                expected,
                got,
            } => {
                write!(
                    f,
                    "[{}] argument count does not match (expected={}, got={})",
                    name, expected, got
                )
            }
            TemplateError::UndefinedMacro { name } => {
                write!(f, "'{}' is not a defined macro", name)
            }
            TemplateError::MacroCycle { chain } => {
                write!(f, "Recursive macro expansion: {}", chain.join(" -> "))
            }
            TemplateError::ExpansionTooDeep { name, limit } => {
                write!(
                    f,
                    "Expansion of '{}' exceeds the nesting limit of {}",
                    name, limit
                )
            }
            TemplateError::InvalidMacro { reason } => {
                write!(f, "Invalid macro: {}", reason)
            }
            TemplateError::MismatchedSection {
                found,
                line,
                open,
                open_line,
            } => {
                write!(
                    f,
                    "Unexpected end of '{}' at line {}: '{}' section (at {}) is still open",
                    found, line, open, open_line
                )
            }
            TemplateError::UnexpectedClose { tag, line } => {
                write!(f, "Found only '{}' end at line {}", tag, line)
            }
            TemplateError::UnterminatedSection { open } => {
                let messages: Vec<String> = open
                    .iter()
                    .map(|s| {
                        format!(
                            "'{}' section doesn't have end of section (at {})",
                            s.tag, s.line
                        )
                    })
                    .collect();
                write!(f, "{}", messages.join("\n"))
            }
            TemplateError::IncludeNotFound { path } => {
                write!(f, "Included file '{}' is not found", path)
            }
            TemplateError::IncludeCycle { path } => {
                write!(f, "'{}' includes itself", path.display())
            }
            TemplateError::InvalidSection { tag, line, reason } => {
                write!(f, "Invalid '{}' section at line {}: {}", tag, line, reason)
            }
            TemplateError::InvalidDirective { line, text, reason } => {
                write!(
                    f,
                    "Invalid directive at line {}: {} ('{}')",
                    line, reason, text
                )
            }
            TemplateError::Io {
                operation,
                path,
                source,
            } => {
                write!(
                    f,
                    "I/O error during {} on {}: {}",
                    operation,
                    path.display(),
                    source
                )
            }
            TemplateError::InTemplate { path, source } => {
                write!(f, "{}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TemplateError::Io { source, .. } => Some(source),
            TemplateError::InTemplate { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

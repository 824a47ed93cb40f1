//! Section handlers and the tag -> handler table
//!
//! | Tag | Action |
//! |-----|--------|
//! | `def` | define or replace a macro |
//! | `dir` | recreate a directory and write the files listed in the body |
//! | `include` | parse another template with the same environment |
//! | `comment` | nothing |

use super::error::TemplateError;
use super::macros::{Macro, MacroCall};
use super::parser::{GeneratedFile, Parser};
use super::scan::{scan, strip_comments, Item, Section};
use crate::path::is_safe_relative;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Handler invoked with the parser and a complete section
pub type SectionHandler = fn(&mut Parser<'_>, &Section) -> Result<(), TemplateError>;

/// `$name` or `$name(params)` on a `@def` line
static DEF_ARGUMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\$?[A-Za-z0-9_]+)\s*(?:\(([^)]*)\))?$").expect("def argument pattern")
});

/// `<name> $macro(args) [@ok <n> @ok_]`, i.e. a `@file` line without its tags
static FILE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+)\s+(\$[A-Za-z0-9_]+(?:\s*\([^)]*\))?)(?:\s+@ok\s+(\d+)\s+@ok_)?$")
        .expect("file directive pattern")
});

const FILE_DIRECTIVE_USAGE: &str = "expected '@file <name> $macro(args) [@ok <n> @ok_] @file_'";

/// Immutable mapping from section tag to handler
///
/// Built once and passed by reference into every [`Parser`].
#[derive(Clone, Default)]
pub struct SectionTable {
    handlers: HashMap<String, SectionHandler>,
}

impl SectionTable {
    /// A table with no handlers; every section is skipped
    pub fn new() -> Self {
        Self::default()
    }

    /// The `def`, `dir`, `include` and `comment` handlers
    pub fn standard() -> Self {
        Self::new()
            .with("def", define_macro)
            .with("dir", generate_directory)
            .with("include", include_template)
            .with("comment", skip_comment)
    }

    /// Register `handler` for `tag`, replacing any previous one
    pub fn with(mut self, tag: &str, handler: SectionHandler) -> Self {
        self.handlers.insert(tag.to_string(), handler);
        self
    }

    pub fn get(&self, tag: &str) -> Option<SectionHandler> {
        self.handlers.get(tag).copied()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }
}

impl fmt::Debug for SectionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("SectionTable").field("tags", &tags).finish()
    }
}

fn invalid_section(section: &Section, reason: impl Into<String>) -> TemplateError {
    TemplateError::InvalidSection {
        tag: section.tag.clone(),
        line: section.line,
        reason: reason.into(),
    }
}

/// `@def $name($a, $b)`: body becomes the macro body, comments removed
pub fn define_macro(parser: &mut Parser<'_>, section: &Section) -> Result<(), TemplateError> {
    let argument = section.argument.trim();
    let caps = DEF_ARGUMENT.captures(argument).ok_or_else(|| {
        invalid_section(
            section,
            format!("expected '$name' or '$name(params)', got '{}'", argument),
        )
    })?;

    let name = caps.get(1).map_or("", |m| m.as_str());
    let params: Vec<&str> = caps
        .get(2)
        .map(|m| {
            m.as_str()
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let mac = Macro::new(name, strip_comments(&section.body), &params)
        .map_err(|e| invalid_section(section, e.to_string()))?;

    log::debug!(
        "defined macro {} with {} parameter(s) at line {}",
        mac.name(),
        mac.arity(),
        section.line
    );
    if let Some(previous) = parser.environment_mut().define(mac) {
        log::debug!("macro {} redefined", previous.name());
    }

    Ok(())
}

/// `@dir <name>`: recreate `<output root>/<name>` and emit its `@file`s
pub fn generate_directory(parser: &mut Parser<'_>, section: &Section) -> Result<(), TemplateError> {
    let target = child_directory(parser.output_root(), section)?;
    emit_directory(parser, &target, section)
}

fn child_directory(parent: &Path, section: &Section) -> Result<PathBuf, TemplateError> {
    let name = section.argument.trim();
    if name.is_empty() {
        return Err(invalid_section(section, "missing directory name"));
    }
    is_safe_relative(Path::new(name)).map_err(|e| invalid_section(section, e.to_string()))?;
    Ok(parent.join(name))
}

/// Process a `dir` body with `target` as the output directory
///
/// The directory is passed down explicitly, so nested `dir` sections and
/// `@file` directives never depend on process-wide state.
fn emit_directory(
    parser: &mut Parser<'_>,
    target: &Path,
    section: &Section,
) -> Result<(), TemplateError> {
    recreate_directory(target)?;
    log::info!("created directory {}", target.display());

    for item in scan(&section.body, section.body_line())? {
        match item {
            Item::Text { line, text } => {
                if !text.trim().is_empty() {
                    log::debug!("ignoring text at line {} in directory section", line);
                }
            }
            Item::Section(inner) => match inner.tag.as_str() {
                "file" => write_file(parser, target, &inner)?,
                "comment" => {}
                "dir" => {
                    let nested = child_directory(target, &inner)?;
                    emit_directory(parser, &nested, &inner)?;
                }
                other => log::debug!(
                    "skipping @{} section at line {} in directory section",
                    other,
                    inner.line
                ),
            },
        }
    }

    Ok(())
}

/// Remove whatever is at `path` and create an empty directory there
fn recreate_directory(path: &Path) -> Result<(), TemplateError> {
    if let Ok(metadata) = fs::symlink_metadata(path) {
        if metadata.is_dir() {
            fs::remove_dir_all(path)
                .map_err(|e| TemplateError::io("remove directory", path, e))?;
        } else {
            fs::remove_file(path).map_err(|e| TemplateError::io("remove file", path, e))?;
        }
    }

    fs::create_dir_all(path).map_err(|e| TemplateError::io("create directory", path, e))
}

/// A parsed `@file` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDirective {
    /// Output file name, relative to the directory section
    pub name: String,
    /// Call supplying the file content
    pub call: MacroCall,
    /// `@ok <n>` marker, passed through to the report
    pub expect: Option<u32>,
}

impl FileDirective {
    /// Parse the text between `@file` and `@file_`
    ///
    /// Returns the reason on failure.
    pub fn parse(text: &str) -> Result<Self, String> {
        let caps = FILE_DIRECTIVE
            .captures(text.trim())
            .ok_or_else(|| FILE_DIRECTIVE_USAGE.to_string())?;

        let name = caps.get(1).map_or("", |m| m.as_str()).to_string();
        is_safe_relative(Path::new(&name)).map_err(|e| e.to_string())?;

        let call_text = caps.get(2).map_or("", |m| m.as_str());
        let call = MacroCall::parse(call_text)
            .ok_or_else(|| format!("invalid macro call '{}'", call_text))?;

        let expect = match caps.get(3) {
            Some(m) => Some(
                m.as_str()
                    .parse()
                    .map_err(|_| format!("invalid @ok value '{}'", m.as_str()))?,
            ),
            None => None,
        };

        Ok(Self { name, call, expect })
    }
}

fn write_file(
    parser: &mut Parser<'_>,
    dir: &Path,
    section: &Section,
) -> Result<(), TemplateError> {
    let text = if section.body.trim().is_empty() {
        section.argument.clone()
    } else {
        format!("{}\n{}", section.argument, section.body)
    };

    let directive = FileDirective::parse(&text).map_err(|reason| {
        TemplateError::InvalidDirective {
            line: section.line,
            text: text.trim().to_string(),
            reason,
        }
    })?;

    let content = directive.call.expand(parser.environment())?;

    let path = dir.join(&directive.name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TemplateError::io("create directory", parent, e))?;
    }
    fs::write(&path, content).map_err(|e| TemplateError::io("write file", &path, e))?;
    log::info!("generated {}", path.display());

    parser.record(GeneratedFile {
        path,
        expect: directive.expect,
    });

    Ok(())
}

/// `@include <path>` (or the path as the body): parse the target template
pub fn include_template(parser: &mut Parser<'_>, section: &Section) -> Result<(), TemplateError> {
    let target = match section.argument.trim() {
        "" => section.body.trim(),
        argument => argument,
    };
    if target.is_empty() {
        return Err(invalid_section(section, "missing include path"));
    }

    let resolved = parser.resolve_include(target)?;
    log::debug!(
        "including {} from line {}",
        resolved.display(),
        section.line
    );
    parser.parse_file(&resolved)
}

pub fn skip_comment(_parser: &mut Parser<'_>, _section: &Section) -> Result<(), TemplateError> {
    Ok(())
}

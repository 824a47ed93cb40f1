//! Template parser - drives syntax checking, section scanning and dispatch
//!
//! A template file is first validated as a whole by
//! [`check_syntax`](super::syntax::check_syntax), so a structurally broken
//! file produces no output at all. The text is then scanned into top-level
//! sections and each one is handed to the handler registered for its tag in
//! the [`SectionTable`].
//!
//! ## Include paths
//!
//! Every file being parsed pushes a frame holding its absolute path and
//! directory. Relative `include` targets are searched in the directory of the
//! innermost template first, then in each enclosing template's directory, and
//! finally in the fallback roots given with [`Parser::with_include_roots`].

use super::error::TemplateError;
use super::macros::Environment;
use super::scan::{scan, Item, Section};
use super::sections::SectionTable;
use super::syntax::check_syntax;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A file written by a `@file` directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    /// Location of the written file
    pub path: PathBuf,
    /// Value of the `@ok <n>` marker, if present
    pub expect: Option<u32>,
}

#[derive(Debug)]
struct IncludeFrame {
    file: PathBuf,
    dir: PathBuf,
}

/// Parser state shared across a run: output root, macro environment,
/// handler table and include-path stack
pub struct Parser<'a> {
    env: &'a mut Environment,
    sections: &'a SectionTable,
    output_root: PathBuf,
    include_roots: Vec<PathBuf>,
    frames: Vec<IncludeFrame>,
    generated: Vec<GeneratedFile>,
}

impl<'a> Parser<'a> {
    /// Create a parser writing below `output_root`
    pub fn new(
        output_root: impl Into<PathBuf>,
        env: &'a mut Environment,
        sections: &'a SectionTable,
    ) -> Self {
        Self {
            env,
            sections,
            output_root: output_root.into(),
            include_roots: Vec::new(),
            frames: Vec::new(),
            generated: Vec::new(),
        }
    }

    /// Directories searched for includes after every template directory
    pub fn with_include_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.include_roots = roots;
        self
    }

    pub fn environment(&self) -> &Environment {
        &*self.env
    }

    pub(crate) fn environment_mut(&mut self) -> &mut Environment {
        &mut *self.env
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Number of template files currently open
    pub fn include_depth(&self) -> usize {
        self.frames.len()
    }

    /// Files written so far, in generation order; the record is emptied
    pub fn take_generated(&mut self) -> Vec<GeneratedFile> {
        std::mem::take(&mut self.generated)
    }

    pub(crate) fn record(&mut self, file: GeneratedFile) {
        self.generated.push(file);
    }

    /// Parse a template file
    ///
    /// Errors raised while processing the file are wrapped in
    /// `TemplateError::InTemplate` naming it; the include-path frame for the
    /// file is popped on every exit path.
    pub fn parse_file(&mut self, path: &Path) -> Result<(), TemplateError> {
        let file = fs::canonicalize(path)
            .map_err(|e| TemplateError::io("resolve template", path, e))?;

        if self.frames.iter().any(|frame| frame.file == file) {
            return Err(TemplateError::IncludeCycle { path: file });
        }

        let text = fs::read_to_string(&file)
            .map_err(|e| TemplateError::io("read template", &file, e))?;
        let dir = file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        log::debug!("entering template {}", file.display());
        self.frames.push(IncludeFrame {
            file: file.clone(),
            dir,
        });
        let result = self.parse_str(&text);
        self.frames.pop();
        log::debug!("leaving template {}", file.display());

        result.map_err(|source| TemplateError::InTemplate {
            path: file,
            source: Box::new(source),
        })
    }

    /// Check and parse template text
    ///
    /// Text outside sections is ignored.
    pub fn parse_str(&mut self, text: &str) -> Result<(), TemplateError> {
        check_syntax(text)?;

        for item in scan(text, 1)? {
            if let Item::Section(section) = item {
                self.dispatch(&section)?;
            }
        }

        Ok(())
    }

    fn dispatch(&mut self, section: &Section) -> Result<(), TemplateError> {
        let sections = self.sections;

        match sections.get(&section.tag) {
            Some(handler) => {
                log::debug!("@{} section at line {}", section.tag, section.line);
                handler(self, section)
            }
            None => {
                log::debug!(
                    "skipping unregistered @{} section at line {}",
                    section.tag,
                    section.line
                );
                Ok(())
            }
        }
    }

    /// Find an include target, nearest template directory first
    ///
    /// # Errors
    ///
    /// Returns `IncludeNotFound` when no search root holds the file.
    pub fn resolve_include(&self, target: &str) -> Result<PathBuf, TemplateError> {
        let target_path = Path::new(target);

        if target_path.is_absolute() {
            return if target_path.is_file() {
                Ok(target_path.to_path_buf())
            } else {
                Err(TemplateError::IncludeNotFound {
                    path: target.to_string(),
                })
            };
        }

        let roots = self
            .frames
            .iter()
            .rev()
            .map(|frame| &frame.dir)
            .chain(self.include_roots.iter());

        for root in roots {
            let candidate = root.join(target_path);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        Err(TemplateError::IncludeNotFound {
            path: target.to_string(),
        })
    }
}

#[cfg(test)]
mod tests;

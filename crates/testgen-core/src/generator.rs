//! Test-suite generation - turns `.tt` templates into an output tree
//!
//! # Steps
//! 1. Reject an empty template list and any file not ending in `.tt`
//! 2. Create the output root
//! 3. Seed the environment with the predefined macros
//! 4. Parse every template in order with one shared parser, so macros
//!    defined in an earlier template are visible to later ones

use crate::config::Config;
use crate::error::{Result, TestgenError};
use crate::predefined::predefined_macros;
use crate::template::{check_syntax, GeneratedFile, Parser, SectionTable, TemplateError};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Required template file extension
pub const TEMPLATE_EXTENSION: &str = "tt";

/// Outcome of a generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub output_dir: PathBuf,
    pub templates: Vec<PathBuf>,
    /// Written files in generation order
    pub files: Vec<GeneratedFile>,
}

#[derive(Debug, Clone)]
pub struct Generator {
    config: Config,
    output_dir: PathBuf,
    include_paths: Vec<PathBuf>,
}

impl Generator {
    /// Create a generator writing to the configured `testdir`
    pub fn new(config: Config) -> Self {
        let output_dir = config.testdir.clone();
        let include_paths = config.include_paths.clone();
        Self {
            config,
            output_dir,
            include_paths,
        }
    }

    /// Write below `dir` instead of the configured `testdir`
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Search `paths` for includes before the configured include paths
    pub fn with_include_paths(mut self, paths: Vec<PathBuf>) -> Self {
        let configured = std::mem::take(&mut self.include_paths);
        self.include_paths = paths.into_iter().chain(configured).collect();
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn include_paths(&self) -> &[PathBuf] {
        &self.include_paths
    }

    /// Generate the test suite from `templates`
    ///
    /// Stops at the first failing template; files written before the failure
    /// are left in place.
    pub fn run(&self, templates: &[PathBuf]) -> Result<GenerationReport> {
        self.config.validate()?;
        check_template_names(templates)?;

        fs::create_dir_all(&self.output_dir)?;
        log::info!(
            "generating {} template(s) into {}",
            templates.len(),
            self.output_dir.display()
        );

        let mut env = predefined_macros(&self.config)?;
        let sections = SectionTable::standard();
        let mut parser = Parser::new(&self.output_dir, &mut env, &sections)
            .with_include_roots(self.include_paths.clone());

        for template in templates {
            log::info!("processing {}", template.display());
            parser.parse_file(template)?;
        }

        let files = parser.take_generated();
        log::info!("generated {} file(s)", files.len());

        Ok(GenerationReport {
            output_dir: self.output_dir.clone(),
            templates: templates.to_vec(),
            files,
        })
    }

    /// Check names and section structure of `templates` without generating
    pub fn check(templates: &[PathBuf]) -> Result<()> {
        check_template_names(templates)?;

        for template in templates {
            let text = fs::read_to_string(template)
                .map_err(|e| TemplateError::io("read template", template, e))?;
            check_syntax(&text).map_err(|source| TemplateError::InTemplate {
                path: template.clone(),
                source: Box::new(source),
            })?;
            log::debug!("{} is well-formed", template.display());
        }

        Ok(())
    }
}

/// Fail unless every path has the `.tt` extension
pub fn check_template_names(templates: &[PathBuf]) -> Result<()> {
    if templates.is_empty() {
        return Err(TestgenError::NoTemplates);
    }

    for template in templates {
        if !is_template(template) {
            return Err(TestgenError::NotATemplate {
                path: template.clone(),
            });
        }
    }

    Ok(())
}

pub fn is_template(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == TEMPLATE_EXTENSION)
}

//! Shared setup for CLI commands

use anyhow::{Context as _, Result, anyhow};
use std::path::{Path, PathBuf};
use testgen_core::Config;

/// Loaded configuration plus global flags
pub struct Context {
    pub config: Config,
    pub verbose: bool,
}

impl Context {
    /// Load and validate the configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(config_path: &Path, verbose: bool) -> Result<Self> {
        let config = Config::from_file(config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?;

        if !config.color {
            colored::control::set_override(false);
        }

        Ok(Self { config, verbose })
    }
}

/// Expand glob patterns into template paths, in pattern order
///
/// A pattern that matches nothing is kept literally, so the template
/// checks report it by name.
///
/// # Errors
///
/// Returns an error for a syntactically invalid pattern.
pub fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut templates = Vec::new();

    for pattern in patterns {
        let entries =
            glob::glob(pattern).map_err(|e| anyhow!("Can't expand '{}': {}", pattern, e))?;

        let before = templates.len();
        for entry in entries {
            templates.push(entry.with_context(|| format!("Can't expand '{}'", pattern))?);
        }

        if templates.len() == before {
            log::debug!("pattern '{}' matched nothing; using it literally", pattern);
            templates.push(PathBuf::from(pattern));
        }
    }

    Ok(templates)
}

use crate::template::TemplateError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TestgenError {
    // Config errors
    #[error("CONFIG_PARSE_ERROR: {0}")]
    ConfigParseError(String),

    #[error("CONFIG_INVALID_VALUE: {field}: {reason}")]
    ConfigInvalidValue { field: String, reason: String },

    // Template selection errors
    #[error("NOT_A_TEMPLATE: '{}' is not a template file (*.tt)", path.display())]
    NotATemplate { path: PathBuf },

    #[error("NO_TEMPLATES: no template files given")]
    NoTemplates,

    // Toolchain errors
    #[error("TOOL_NOT_FOUND: '{tool}' is not found on PATH")]
    ToolNotFound { tool: String },

    // Template errors
    #[error("TEMPLATE_ERROR: {0}")]
    Template(#[from] TemplateError),

    // IO errors
    #[error("IO_ERROR: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for TestgenError {
    fn from(err: serde_json::Error) -> Self {
        TestgenError::ConfigParseError(format!("JSON error: {}", err))
    }
}

impl From<toml::de::Error> for TestgenError {
    fn from(err: toml::de::Error) -> Self {
        TestgenError::ConfigParseError(format!("TOML error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, TestgenError>;

// Core modules
pub mod config;
pub mod error;
pub mod generator;
pub mod path;
pub mod predefined;
pub mod template;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, TestgenError};
pub use generator::{GenerationReport, Generator};

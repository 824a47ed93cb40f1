//! Generator configuration
//!
//! A configuration file describes the target toolchain and the integer
//! widths used for the predefined limit macros. Files ending in `.toml` are
//! read as TOML, everything else as JSON.

mod model;

pub use model::{Config, SizeConfig, MAX_INTEGER_BITS};

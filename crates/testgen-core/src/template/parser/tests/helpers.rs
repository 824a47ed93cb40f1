//! Shared test helpers for parser tests

use crate::template::{Environment, GeneratedFile, Parser, SectionTable, TemplateError};
use std::fs;
use std::path::Path;

pub(super) use testgen_testkit::write_template;

/// Parse `template` with the standard handlers, writing below `output`
pub(super) fn run(
    output: &Path,
    env: &mut Environment,
    template: &Path,
) -> Result<Vec<GeneratedFile>, TemplateError> {
    let sections = SectionTable::standard();
    let mut parser = Parser::new(output, env, &sections);
    parser.parse_file(template)?;
    Ok(parser.take_generated())
}

pub(super) fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

//! Template module - macro-expanding test-suite templates
//!
//! A `.tt` template is plain text with line-anchored sections:
//!
//! ```text
//! @def $add($type, $a, $b)
//! $type r = $a + $b;
//! @def_
//!
//! @dir integer
//! @file add_int.c $add(int, 1, 2) @file_
//! @dir_
//! ```
//!
//! ## Pipeline
//!
//! 1. [`syntax::check_syntax`] validates section nesting for the whole file
//! 2. [`scan::scan`] splits the text into top-level sections
//! 3. [`Parser`] hands each section to the handler registered in a
//!    [`SectionTable`]
//! 4. `@file` directives expand a [`MacroCall`] against the [`Environment`]
//!
//! ## Macros
//!
//! Names carry the `$` sigil. Parameters are substituted, parameterless
//! macros are replaced by their body and `$Id` is left untouched. A body with
//! no references at all expands to the empty string.

pub mod error;
pub mod macros;
pub mod parser;
pub mod scan;
pub mod sections;
pub mod syntax;

pub use error::{OpenSection, TemplateError};
pub use macros::{split_arguments, Environment, Macro, MacroCall};
pub use parser::{GeneratedFile, Parser};
pub use scan::Section;
pub use sections::{FileDirective, SectionHandler, SectionTable};
pub use syntax::check_syntax;

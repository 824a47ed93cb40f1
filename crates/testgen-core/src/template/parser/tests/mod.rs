//! Tests for the template parser
//!
//! Each submodule drives `Parser` over real files in a temporary workspace
//! directory and inspects what was written.

use super::*;

mod helpers;

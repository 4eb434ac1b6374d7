//! Check command implementation

use colored::Colorize;
use std::path::Path;

use cfgmend_content::{TomlEditValidator, check_syntax};

use super::read_document;
use crate::error::Result;

/// Validate `file` and report `ok` on success.
pub fn run_check(file: &Path) -> Result<()> {
    let text = read_document(file)?;
    check_syntax(&TomlEditValidator, &file.display().to_string(), &text)?;
    println!("{}: {}", file.display(), "ok".green());
    Ok(())
}

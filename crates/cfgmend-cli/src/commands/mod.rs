//! Command implementations

pub mod check;
pub mod patch;

pub use check::run_check;
pub use patch::{PatchArgs, run_patch};

use crate::error::{CliError, Result};
use std::path::Path;

/// Read a document, mapping failures to an error naming the file.
pub(crate) fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| CliError::read(path, e))
}

//! Patch command implementation
//!
//! The patched document goes to stdout (or `--output`), the change summary
//! to stderr, so the command can sit in a shell pipeline.

use colored::Colorize;
use std::io::ErrorKind;
use std::path::Path;

use cfgmend_content::{PatchOptions, Patcher};
use cfgmend_meta::{ConfigLoader, EditRequest};

use super::read_document;
use crate::error::{CliError, Result};

/// Context lines around each diff hunk.
const DIFF_CONTEXT: usize = 3;

/// Inputs for [`run_patch`], borrowed from the parsed command line.
#[derive(Debug, Clone, Copy)]
pub struct PatchArgs<'a> {
    pub current: &'a Path,
    pub template: &'a Path,
    pub edits: &'a Path,
    pub schema: Option<&'a Path>,
    pub check_syntax: bool,
    pub diff: bool,
    pub json: bool,
    pub output: Option<&'a Path>,
}

/// Run the patch command.
pub fn run_patch(args: &PatchArgs<'_>) -> Result<()> {
    let current = read_current(args.current)?;
    let template = read_document(args.template)?;
    let request: EditRequest = ConfigLoader::new().load(args.edits)?;

    let patcher = match args.schema {
        Some(path) => Patcher::from_schema_file(path)?,
        None => Patcher::default(),
    }
    .with_options(PatchOptions {
        validate_syntax: args.check_syntax,
    });

    let outcome = patcher.patch(&current, &template, &request)?;
    let summary = outcome.summary(&current);

    if let Some(path) = args.output {
        std::fs::write(path, &outcome.text).map_err(|e| CliError::write(path, e))?;
        tracing::info!(path = %path.display(), "wrote patched document");
    }

    if args.json {
        let report = serde_json::json!({
            "changed": outcome.changed,
            "added": summary.added,
            "removed": summary.removed,
            "similarity": summary.similarity,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if args.diff {
        print_diff(&outcome.unified_diff(&current, DIFF_CONTEXT));
    } else if args.output.is_none() {
        print!("{}", outcome.text);
    }

    if outcome.changed {
        eprintln!(
            "{} {} added, {} removed",
            "patched:".green().bold(),
            summary.added,
            summary.removed
        );
    } else {
        eprintln!("{}", "No changes.".dimmed());
    }
    Ok(())
}

/// Read the current document; a missing file means a fresh install.
fn read_current(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "current document missing, starting empty");
            Ok(String::new())
        }
        Err(e) => Err(CliError::read(path, e)),
    }
}

fn print_diff(diff: &str) {
    for line in diff.lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            println!("{}", line.bold());
        } else if line.starts_with('+') {
            println!("{}", line.green());
        } else if line.starts_with('-') {
            println!("{}", line.red());
        } else if line.starts_with("@@") {
            println!("{}", line.cyan());
        } else {
            println!("{line}");
        }
    }
}

//! cfgmend - patch agent config files without losing comments
//!
//! Reads a current document, a canonical template and an edit request,
//! and prints the patched document (or a diff of it).

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use commands::PatchArgs;
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose)
        .map_err(|e| CliError::user(format!("Failed to initialise logging: {e}")))?;

    match cli.command {
        Some(cmd) => execute_command(cmd),
        None => {
            println!("cfgmend - Format-preserving config patcher");
            println!();
            println!("Run 'cfgmend --help' for usage information.");
            Ok(())
        }
    }
}

fn execute_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Patch {
            current,
            template,
            edits,
            schema,
            check_syntax,
            diff,
            json,
            output,
        } => commands::run_patch(&PatchArgs {
            current: &current,
            template: &template,
            edits: &edits,
            schema: schema.as_deref(),
            check_syntax,
            diff,
            json,
            output: output.as_deref(),
        }),
        Commands::Check { file } => commands::run_check(&file),
    }
}

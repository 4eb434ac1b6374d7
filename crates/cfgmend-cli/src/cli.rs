//! CLI argument parsing using clap derive

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cfgmend - Patch agent config files without losing comments or custom content
#[derive(Parser, Debug)]
#[command(name = "cfgmend")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (debug logs on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Apply an edit request to a config file
    ///
    /// The patched document is printed to stdout unless --output is given.
    ///
    /// Examples:
    ///   cfgmend patch -c config.toml -t template.toml -e edits.toml
    ///   cfgmend patch -c config.toml -t template.toml -e edits.json --diff
    ///   cfgmend patch -c config.toml -t template.toml -e edits.yaml -o config.toml
    Patch {
        /// Current document (a missing file is treated as empty)
        #[arg(short, long, env = "CFGMEND_CURRENT")]
        current: PathBuf,

        /// Canonical template document
        #[arg(short, long, env = "CFGMEND_TEMPLATE")]
        template: PathBuf,

        /// Edit request (.toml, .json, .yaml or .yml)
        #[arg(short, long)]
        edits: PathBuf,

        /// Patch schema overriding the built-in agent schema
        #[arg(short, long, env = "CFGMEND_SCHEMA")]
        schema: Option<PathBuf>,

        /// Reject malformed input before patching
        #[arg(long)]
        check_syntax: bool,

        /// Print a unified diff instead of the patched document
        #[arg(long, conflicts_with = "json")]
        diff: bool,

        /// Print a JSON change summary instead of the patched document
        #[arg(long)]
        json: bool,

        /// Write the patched document to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that a document is syntactically valid
    Check {
        /// Document to check
        file: PathBuf,
    },
}

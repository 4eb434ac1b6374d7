//! Line-level structure and editing for cfgmend.
//!
//! This crate knows nothing about which sections or keys matter; it only
//! provides the three layers the patch engine is built on:
//!
//! - [`scanner`]: quote and bracket state carried across lines;
//! - [`parser`]: raw text split into a preamble, `[table]` blocks and
//!   `[[array]]` elements;
//! - [`editor`]: find, replace, insert, comment out and remove key
//!   assignments inside one block without touching anything else.
//!
//! All operations are pure and work on owned line buffers.

pub mod editor;
pub mod parser;
pub mod scanner;

pub use editor::{
    KeyLine, find_active_key, find_key, multiline_value_end_index, read_string, remove_key,
    set_commented_key, set_key_value,
};
pub use parser::{Block, BlockKind, Document, Header, parse, parse_header};
pub use scanner::{LineScan, LineTracker, QuoteState, count_bracket_depth, scan};

//! Format-preserving patching of structured config documents.
//!
//! Given the user's current document, a canonical template and an
//! [`EditRequest`](cfgmend_meta::EditRequest), [`patch`] produces a document
//! that:
//!
//! - applies the requested field edits and entry toggles;
//! - follows the template's section and entry order;
//! - keeps every comment, custom section and unknown array block verbatim;
//! - never splits a multiline value while editing it.
//!
//! # Example
//!
//! ```
//! use cfgmend_content::patch;
//! use cfgmend_meta::{EditRequest, PatchSchema};
//!
//! let template = "[[servers]]\nid = \"a\"\nenabled = true\n";
//! let current = "[[servers]]\nid = \"a\"\nenabled = false\n";
//! let request = EditRequest::new().known_ids(["a"]).toggle("a", true);
//!
//! let outcome = patch(current, template, &request, &PatchSchema::default()).unwrap();
//! assert_eq!(outcome.text, template);
//! ```

pub mod array_merge;
pub mod assembler;
pub mod diff;
pub mod engine;
pub mod error;
pub mod sanitizer;
pub mod syntax;

pub use array_merge::{element_id, merge_array};
pub use assembler::assemble;
pub use diff::{ChangeSummary, unified_diff};
pub use engine::{PatchOptions, PatchOutcome, Patcher, patch};
pub use error::{Error, Result};
pub use sanitizer::sanitize;
pub use syntax::{SyntaxValidator, TomlEditValidator, check_syntax};

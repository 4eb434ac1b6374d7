//! Optional syntax gate run before any edit.

use crate::error::{Error, Result};

/// Checks that a document is well-formed before it is patched.
pub trait SyntaxValidator: Send + Sync {
    /// Returns the parser diagnostic when `text` is malformed.
    fn validate(&self, text: &str) -> std::result::Result<(), String>;
}

/// Validates with `toml_edit`'s full parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlEditValidator;

impl SyntaxValidator for TomlEditValidator {
    fn validate(&self, text: &str) -> std::result::Result<(), String> {
        text.parse::<toml_edit::DocumentMut>()
            .map(|_| ())
            .map_err(|e| e.to_string().trim_end().to_string())
    }
}

/// Run `validator` on `text`, labelling a failure with `document`.
pub fn check_syntax(validator: &dyn SyntaxValidator, document: &str, text: &str) -> Result<()> {
    validator.validate(text).map_err(|message| {
        tracing::debug!(document, "syntax gate rejected input");
        Error::syntax(document, message)
    })
}

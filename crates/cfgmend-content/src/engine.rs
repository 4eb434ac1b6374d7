//! The patch entry point.
//!
//! A patch is a pure function of its inputs:
//! `(current_text, template_text, request, schema) -> text | error`. Nothing
//! is cached between calls, so a [`Patcher`] can be shared across threads.

use cfgmend_blocks::parse;
use cfgmend_meta::{ConfigLoader, EditRequest, PatchSchema};
use std::fmt;
use std::path::Path;

use crate::assembler::assemble;
use crate::diff::{ChangeSummary, unified_diff};
use crate::error::{Error, Result};
use crate::syntax::{SyntaxValidator, TomlEditValidator, check_syntax};

/// Switches for a patch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchOptions {
    /// Reject malformed input before editing anything.
    pub validate_syntax: bool,
}

/// Result of a successful patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    /// The patched document, newline-terminated unless empty.
    pub text: String,
    /// Whether `text` differs from the input document.
    pub changed: bool,
}

impl PatchOutcome {
    /// Unified diff from `original` to the patched text.
    pub fn unified_diff(&self, original: &str, context: usize) -> String {
        unified_diff(original, &self.text, context)
    }

    pub fn summary(&self, original: &str) -> ChangeSummary {
        ChangeSummary::compute(original, &self.text)
    }
}

/// Applies edit requests against a fixed schema.
pub struct Patcher {
    schema: PatchSchema,
    options: PatchOptions,
    validator: Box<dyn SyntaxValidator>,
}

impl Patcher {
    pub fn new(schema: PatchSchema) -> Self {
        Self {
            schema,
            options: PatchOptions::default(),
            validator: Box::new(TomlEditValidator),
        }
    }

    /// Create a patcher whose schema is read from a TOML, JSON or YAML file.
    pub fn from_schema_file(path: &Path) -> Result<Self> {
        let schema: PatchSchema = ConfigLoader::new().load(path)?;
        Ok(Self::new(schema))
    }

    pub fn with_options(mut self, options: PatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_validator(mut self, validator: impl SyntaxValidator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    pub fn schema(&self) -> &PatchSchema {
        &self.schema
    }

    pub fn options(&self) -> PatchOptions {
        self.options
    }

    /// Run the syntax gate alone.
    pub fn check(&self, document: &str, text: &str) -> Result<()> {
        check_syntax(self.validator.as_ref(), document, text)
    }

    /// Patch `current` against `template` according to `request`.
    #[tracing::instrument(skip_all)]
    pub fn patch(&self, current: &str, template: &str, request: &EditRequest) -> Result<PatchOutcome> {
        let validator = self
            .options
            .validate_syntax
            .then_some(self.validator.as_ref());
        run(current, template, request, &self.schema, validator)
    }
}

impl Default for Patcher {
    fn default() -> Self {
        Self::new(PatchSchema::default())
    }
}

impl fmt::Debug for Patcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Patcher")
            .field("schema", &self.schema)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Patch with default options (no syntax gate).
pub fn patch(
    current: &str,
    template: &str,
    request: &EditRequest,
    schema: &PatchSchema,
) -> Result<PatchOutcome> {
    run(current, template, request, schema, None)
}

fn run(
    current: &str,
    template: &str,
    request: &EditRequest,
    schema: &PatchSchema,
    validator: Option<&dyn SyntaxValidator>,
) -> Result<PatchOutcome> {
    if request.touches_array() && request.known_ids.is_empty() {
        return Err(Error::EmptyCanonicalSet);
    }
    if let Some(validator) = validator {
        check_syntax(validator, "current", current)?;
        check_syntax(validator, "template", template)?;
    }

    let current_doc = parse(current);
    let template_doc = parse(template);
    let lines = assemble(&current_doc, &template_doc, request, schema)?;

    let mut text = lines.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    let changed = text != current;
    tracing::debug!(changed, lines = lines.len(), "patch complete");
    Ok(PatchOutcome { text, changed })
}

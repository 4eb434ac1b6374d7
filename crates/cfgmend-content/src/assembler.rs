//! Canonical assembly of the output document.
//!
//! Output order:
//!
//! ```text
//! preamble            current's, or the template's when current has none
//! [template tables]   template order (current order when the template has
//!                     no tables); current block wins, template seeds
//! [[array]] elements  right after the container table (or after the above)
//! [other tables]      current-only or newly requested, sorted by name
//! [[other arrays]]    current-only groups, sorted, original element order
//! ```
//!
//! Blocks are separated by exactly one blank line. Comment lines directly
//! above a header travel with that block.

use cfgmend_blocks::{Block, BlockKind, Document, find_active_key, set_commented_key, set_key_value};
use cfgmend_meta::{EditRequest, FieldChange, FieldValue, PatchSchema};
use std::collections::BTreeSet;

use crate::array_merge::merge_array;
use crate::error::Result;

/// Accumulates blocks with exactly one blank line between them.
#[derive(Debug, Default)]
struct Output {
    lines: Vec<String>,
}

impl Output {
    /// Append `lines` minus trailing blank lines. Blank-only input adds nothing.
    fn push(&mut self, lines: &[String]) {
        let Some(last) = lines.iter().rposition(|l| !l.trim().is_empty()) else {
            return;
        };
        if !self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.lines.extend_from_slice(&lines[..=last]);
    }

    fn push_block(&mut self, block: &Block) {
        if block.leading().is_empty() {
            self.push(block.lines());
        } else {
            self.push(&[block.leading(), block.lines()].concat());
        }
    }

    fn push_all(&mut self, blocks: &[Block]) {
        for block in blocks {
            self.push_block(block);
        }
    }
}

/// Merge `current` into the template's canonical layout and apply `request`.
pub fn assemble(
    current: &Document,
    template: &Document,
    request: &EditRequest,
    schema: &PatchSchema,
) -> Result<Vec<String>> {
    let elements = merge_array(
        current,
        template,
        request,
        &schema.array,
        schema.discriminant.as_ref(),
    )?;
    let mut out = Output::default();

    if current.has_preamble_content() {
        out.push(&current.preamble);
    } else {
        out.push(&template.preamble);
    }

    let order = if template.order.is_empty() {
        &current.order
    } else {
        &template.order
    };

    let mut pending = Some(elements);
    for name in order {
        if let Some(block) = select_section(name, current, template, request, schema) {
            out.push_block(&block);
        }
        if schema.is_container(name)
            && let Some(elements) = pending.take()
        {
            out.push_all(&elements);
        }
    }
    if let Some(elements) = pending.take() {
        out.push_all(&elements);
    }

    for name in trailing_sections(order, current, template, request, schema) {
        if let Some(block) = select_section(&name, current, template, request, schema) {
            tracing::debug!(section = %name, "emitting non-template section");
            out.push_block(&block);
        }
    }

    for (name, group) in &current.arrays {
        if *name != schema.array.name {
            tracing::debug!(array = %name, count = group.len(), "preserving custom array");
            out.push_all(group);
        }
    }

    Ok(out.lines)
}

/// Tables emitted after the ordered ones: current-only tables plus tables
/// that only exist because the request writes into them.
fn trailing_sections(
    order: &[String],
    current: &Document,
    template: &Document,
    request: &EditRequest,
    schema: &PatchSchema,
) -> BTreeSet<String> {
    let absent = |name: &str| current.section(name).is_none() && template.section(name).is_none();
    let array_prefix = format!("{}.", schema.array.name);

    let mut names: BTreeSet<String> = current
        .sections
        .keys()
        .filter(|name| !order.contains(name))
        .cloned()
        .collect();

    for edit in &request.fields {
        if !matches!(edit.change, FieldChange::Set(_)) || !absent(edit.section.as_str()) {
            continue;
        }
        if edit.section == schema.array.name || edit.section.starts_with(&array_prefix) {
            tracing::warn!(section = %edit.section, "field edits cannot target array entries");
            continue;
        }
        names.insert(edit.section.clone());
    }

    if let Some(name) = &schema.optional_block
        && request.optional_block_values().is_some()
        && absent(name.as_str())
    {
        names.insert(name.clone());
    }
    names
}

/// Pick the authoritative block for a table and apply its edits.
fn select_section(
    name: &str,
    current: &Document,
    template: &Document,
    request: &EditRequest,
    schema: &PatchSchema,
) -> Option<Block> {
    let template_block = template.section(name);

    let mut block = match current.section(name) {
        _ if schema.is_optional_block(name) && request.optional_block_disabled() => {
            tracing::debug!(section = name, "optional block disabled");
            return None;
        }
        Some(block) => block.clone(),
        None if schema.is_optional_block(name) && request.optional_block_values().is_none() => {
            return None;
        }
        None => match template_block {
            Some(block) => {
                tracing::debug!(section = name, "seeded from template");
                block.clone()
            }
            None => {
                tracing::debug!(section = name, "creating section");
                Block::with_header(name, BlockKind::Table)
            }
        },
    };

    for edit in request.fields_for(name) {
        apply_field(&mut block, template_block, schema, &edit.key, &edit.change);
    }
    if schema.is_optional_block(name)
        && let Some(values) = request.optional_block_values()
    {
        for (key, value) in values {
            set_field(&mut block, template_block, schema, key, value);
        }
    }
    Some(block)
}

/// Nearest key before `key` in the schema's order that is set in `block`.
fn anchor_key(block: &Block, schema: &PatchSchema, key: &str) -> Option<String> {
    schema
        .keys_before(block.name(), key)
        .find(|known| find_active_key(block, known).is_some())
        .map(str::to_string)
}

fn apply_field(
    block: &mut Block,
    template: Option<&Block>,
    schema: &PatchSchema,
    key: &str,
    change: &FieldChange,
) {
    match change {
        FieldChange::Set(value) => set_field(block, template, schema, key, value),
        FieldChange::Clear => {
            let anchor = anchor_key(block, schema, key);
            set_commented_key(block, template, key, anchor.as_deref());
        }
    }
}

fn set_field(
    block: &mut Block,
    template: Option<&Block>,
    schema: &PatchSchema,
    key: &str,
    value: &FieldValue,
) {
    let anchor = anchor_key(block, schema, key);
    set_key_value(block, template, key, &value.to_toml(), anchor.as_deref());
}

//! Identifier-aligned merge of the managed array-of-tables.
//!
//! Elements are matched between the current document and the template by
//! their identifier field. Canonical identifiers come first, in canonical
//! order; every other current element follows in its original order.

use cfgmend_blocks::{Block, Document, find_active_key, set_key_value};
use cfgmend_meta::{ArraySpec, DiscriminantSpec, EditRequest};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::sanitizer::sanitize;

/// Identifier of an element, string-quoted or bare.
pub fn element_id(block: &Block, id_field: &str) -> Option<String> {
    find_active_key(block, id_field)
        .map(|line| line.string_value().unwrap_or_else(|| line.value.clone()))
}

/// First element per identifier, with its position.
fn index_by_id<'a>(elements: &'a [Block], id_field: &str) -> BTreeMap<String, (usize, &'a Block)> {
    let mut index = BTreeMap::new();
    for (i, block) in elements.iter().enumerate() {
        if let Some(id) = element_id(block, id_field) {
            index.entry(id).or_insert((i, block));
        }
    }
    index
}

/// Canonical identifier order: the request's known ids, else template order.
fn canonical_ids(template: &[Block], request: &EditRequest, id_field: &str) -> Vec<String> {
    let source: Vec<String> = if request.known_ids.is_empty() {
        template
            .iter()
            .filter_map(|b| element_id(b, id_field))
            .collect()
    } else {
        request.known_ids.clone()
    };
    let mut seen = BTreeSet::new();
    source
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

fn warn_unknown_ids(request: &EditRequest, canonical: &[String]) {
    let toggled = request.toggles.iter().flat_map(|t| t.keys());
    for id in request.restore_missing.iter().chain(toggled) {
        if !canonical.contains(id) {
            tracing::warn!(id = %id, "ignoring request for non-canonical entry");
        }
    }
}

/// Produce the merged, ordered element list for `spec.name`.
///
/// Fails with [`Error::MissingCanonicalSource`] when a restore (or an
/// enable toggle for an absent element) names an identifier the template
/// does not define.
pub fn merge_array(
    current: &Document,
    template: &Document,
    request: &EditRequest,
    spec: &ArraySpec,
    discriminant: Option<&DiscriminantSpec>,
) -> Result<Vec<Block>> {
    let current_elements = current.array(&spec.name);
    let template_elements = template.array(&spec.name);
    let current_index = index_by_id(current_elements, &spec.id_field);
    let template_index = index_by_id(template_elements, &spec.id_field);
    let canonical = canonical_ids(template_elements, request, &spec.id_field);
    warn_unknown_ids(request, &canonical);

    let finish = |block: &mut Block, template_block: Option<&Block>, toggle: Option<bool>| {
        if let Some(enabled) = toggle {
            set_key_value(
                block,
                template_block,
                &spec.toggle_field,
                if enabled { "true" } else { "false" },
                Some(spec.id_field.as_str()),
            );
        }
        if let Some(discriminant) = discriminant {
            sanitize(block, discriminant);
        }
    };

    let mut used = vec![false; current_elements.len()];
    let mut merged = Vec::with_capacity(current_elements.len() + canonical.len());

    for id in &canonical {
        let template_block = template_index.get(id).map(|&(_, b)| b);
        let toggle = request.toggle_for(id);

        let mut block = if let Some(&(i, block)) = current_index.get(id) {
            used[i] = true;
            block.clone()
        } else if request.restore_missing.contains(id) || toggle == Some(true) {
            let source = template_block.ok_or_else(|| Error::MissingCanonicalSource {
                id: id.clone(),
            })?;
            tracing::debug!(id = %id, "restored entry from template");
            source.clone()
        } else {
            continue;
        };

        finish(&mut block, template_block, toggle);
        merged.push(block);
    }

    for (i, block) in current_elements.iter().enumerate() {
        if used[i] {
            continue;
        }
        tracing::debug!(id = ?element_id(block, &spec.id_field), "keeping custom entry");
        let mut block = block.clone();
        finish(&mut block, None, None);
        merged.push(block);
    }

    Ok(merged)
}

//! Caller-supplied description of what a patch should change.
//!
//! Every editable thing is optional: `None` (or an empty collection) means
//! "not requested", so there is no separate touched flag to fall out of sync
//! with the value it guards.
//!
//! ```toml
//! known_ids = ["files", "search"]
//! restore_missing = ["search"]
//!
//! [toggles]
//! files = true
//!
//! [[fields]]
//! section = "agent"
//! key = "model"
//! change = { set = "large" }
//!
//! [[fields]]
//! section = "agent"
//! key = "proxy"
//! change = "clear"
//!
//! [optional_block.enable]
//! latency_warn_ms = 250
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};

/// A scalar or array value to write into the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<FieldValue>),
}

impl FieldValue {
    /// Render as a TOML literal, e.g. `"text"`, `42`, `["a", "b"]`.
    pub fn to_toml(&self) -> String {
        toml_edit::Value::from(self).to_string().trim().to_string()
    }
}

impl From<&FieldValue> for toml_edit::Value {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Bool(b) => (*b).into(),
            FieldValue::Integer(i) => (*i).into(),
            FieldValue::Float(f) => (*f).into(),
            FieldValue::String(s) => s.as_str().into(),
            FieldValue::Array(items) => {
                toml_edit::Value::Array(items.iter().map(toml_edit::Value::from).collect())
            }
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// What to do with one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldChange {
    /// Write the value, replacing any active assignment.
    Set(FieldValue),
    /// Turn the assignment into a commented-out placeholder.
    Clear,
}

/// One field-level edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEdit {
    pub section: String,
    pub key: String,
    pub change: FieldChange,
}

impl FieldEdit {
    /// Build an edit from a `section.key` path. The key is the last segment,
    /// so dotted section names such as `servers.defaults.timeout` work.
    pub fn from_path(path: &str, change: FieldChange) -> Result<Self> {
        let (section, key) = path
            .rsplit_once('.')
            .filter(|(s, k)| !s.is_empty() && !k.is_empty())
            .ok_or_else(|| Error::InvalidFieldPath {
                path: path.to_string(),
            })?;
        Ok(Self {
            section: section.to_string(),
            key: key.to_string(),
            change,
        })
    }
}

/// Request for the schema's optional top-level block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionalBlockEdit {
    /// Drop the block from the output.
    Disable,
    /// Keep (or seed) the block and set these keys.
    Enable(BTreeMap<String, FieldValue>),
}

/// Everything a single patch invocation should change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditRequest {
    /// Field edits, applied in order.
    pub fields: Vec<FieldEdit>,
    /// Enable/disable per array-element identifier. `None` leaves the
    /// array's toggles untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toggles: Option<BTreeMap<String, bool>>,
    /// Canonical identifier order for the managed array.
    pub known_ids: Vec<String>,
    /// Canonical identifiers to seed from the template when absent.
    pub restore_missing: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional_block: Option<OptionalBlockEdit>,
}

impl EditRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `section.key` to `value`.
    pub fn set(mut self, path: &str, value: impl Into<FieldValue>) -> Result<Self> {
        self.fields
            .push(FieldEdit::from_path(path, FieldChange::Set(value.into()))?);
        Ok(self)
    }

    /// Comment out `section.key`.
    pub fn clear(mut self, path: &str) -> Result<Self> {
        self.fields
            .push(FieldEdit::from_path(path, FieldChange::Clear)?);
        Ok(self)
    }

    pub fn toggle(mut self, id: impl Into<String>, enabled: bool) -> Self {
        self.toggles
            .get_or_insert_with(BTreeMap::new)
            .insert(id.into(), enabled);
        self
    }

    pub fn known_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn restore(mut self, id: impl Into<String>) -> Self {
        self.restore_missing.insert(id.into());
        self
    }

    pub fn enable_optional_block<I, K>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, FieldValue)>,
        K: Into<String>,
    {
        let values = values.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.optional_block = Some(OptionalBlockEdit::Enable(values));
        self
    }

    pub fn disable_optional_block(mut self) -> Self {
        self.optional_block = Some(OptionalBlockEdit::Disable);
        self
    }

    /// Whether the request changes which array elements exist or are enabled.
    pub fn touches_array(&self) -> bool {
        self.toggles.is_some() || !self.restore_missing.is_empty()
    }

    pub fn toggle_for(&self, id: &str) -> Option<bool> {
        self.toggles.as_ref()?.get(id).copied()
    }

    /// Field edits targeting `section`, in request order.
    pub fn fields_for<'a>(&'a self, section: &'a str) -> impl Iterator<Item = &'a FieldEdit> + 'a {
        self.fields.iter().filter(move |f| f.section == section)
    }

    pub fn optional_block_disabled(&self) -> bool {
        matches!(self.optional_block, Some(OptionalBlockEdit::Disable))
    }

    pub fn optional_block_values(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match &self.optional_block {
            Some(OptionalBlockEdit::Enable(values)) => Some(values),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(FieldValue::from("plain"), r#""plain""#)]
    #[case(FieldValue::from("quote \" and \\"), r#""quote \" and \\""#)]
    #[case(FieldValue::from(true), "true")]
    #[case(FieldValue::from(42_i64), "42")]
    #[case(FieldValue::from(0.25_f64), "0.25")]
    #[case(
        FieldValue::Array(vec![FieldValue::from("a"), FieldValue::from("b")]),
        r#"["a", "b"]"#
    )]
    fn test_field_value_to_toml(#[case] value: FieldValue, #[case] expected: &str) {
        assert_eq!(value.to_toml(), expected);
    }

    #[test]
    fn test_from_path_splits_on_last_dot() {
        let edit = FieldEdit::from_path("servers.defaults.timeout", FieldChange::Clear).unwrap();
        assert_eq!(edit.section, "servers.defaults");
        assert_eq!(edit.key, "timeout");
    }

    #[rstest]
    #[case("model")]
    #[case(".model")]
    #[case("agent.")]
    fn test_from_path_rejects_incomplete(#[case] path: &str) {
        assert!(matches!(
            FieldEdit::from_path(path, FieldChange::Clear),
            Err(Error::InvalidFieldPath { .. })
        ));
    }

    #[test]
    fn test_builder_and_queries() {
        let request = EditRequest::new()
            .set("agent.model", "large")
            .unwrap()
            .clear("agent.proxy")
            .unwrap()
            .toggle("files", false)
            .known_ids(["files", "search"])
            .restore("search");

        assert!(request.touches_array());
        assert_eq!(request.toggle_for("files"), Some(false));
        assert_eq!(request.toggle_for("search"), None);
        assert_eq!(request.fields_for("agent").count(), 2);
        assert_eq!(request.fields_for("mcp").count(), 0);
        assert!(!request.optional_block_disabled());
    }

    #[test]
    fn test_untouched_request() {
        let request = EditRequest::new().set("agent.model", "m").unwrap();
        assert!(!request.touches_array());
        assert!(request.optional_block_values().is_none());
    }

    #[test]
    fn test_deserialize_from_toml() {
        let source = r#"
known_ids = ["files", "search"]
restore_missing = ["search"]

[toggles]
files = true

[[fields]]
section = "agent"
key = "model"
change = { set = "large" }

[[fields]]
section = "agent"
key = "proxy"
change = "clear"

[optional_block.enable]
latency_warn_ms = 250
"#;
        let request: EditRequest = toml::from_str(source).unwrap();

        assert_eq!(request.known_ids, vec!["files", "search"]);
        assert!(request.restore_missing.contains("search"));
        assert_eq!(request.toggle_for("files"), Some(true));
        assert_eq!(
            request.fields[0].change,
            FieldChange::Set(FieldValue::from("large"))
        );
        assert_eq!(request.fields[1].change, FieldChange::Clear);
        assert_eq!(
            request
                .optional_block_values()
                .and_then(|v| v.get("latency_warn_ms")),
            Some(&FieldValue::Integer(250))
        );
    }

    #[test]
    fn test_deserialize_disable_from_json() {
        let request: EditRequest =
            serde_json::from_str(r#"{"optional_block": "disable"}"#).unwrap();
        assert!(request.optional_block_disabled());
        assert!(request.toggles.is_none());
    }
}

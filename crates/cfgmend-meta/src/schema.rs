//! Patch schema - the explicitly passed description of what the patch
//! engine manages in a document.
//!
//! # Example TOML
//!
//! ```toml
//! optional_block = "diagnostics"
//!
//! [sections]
//! agent = ["model", "provider", "log_level"]
//!
//! [array]
//! name = "servers"
//! id_field = "id"
//! toggle_field = "enabled"
//! container = "mcp"
//!
//! [discriminant]
//! field = "transport"
//!
//! [discriminant.forbidden]
//! stdio = ["url", "headers"]
//! http = ["command", "args"]
//! ```
//!
//! Every table is optional; missing parts fall back to [`PatchSchema::default`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a server element is reached. Each transport owns a set of fields
/// that make no sense for the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Stdio,
    Http,
    Sse,
}

impl Transport {
    pub const ALL: [Transport; 3] = [Transport::Stdio, Transport::Http, Transport::Sse];

    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Stdio => "stdio",
            Transport::Http => "http",
            Transport::Sse => "sse",
        }
    }

    /// Fields that must not appear on an element using this transport.
    pub fn forbidden_fields(&self) -> &'static [&'static str] {
        match self {
            Transport::Stdio => &["url", "headers", "bearer_token_env_var"],
            Transport::Http | Transport::Sse => &["command", "args", "cwd", "env"],
        }
    }
}

/// The one array-of-tables the engine merges by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArraySpec {
    /// Array name, as in `[[name]]`.
    pub name: String,
    /// Field holding each element's stable identifier.
    pub id_field: String,
    /// Boolean field written by enable/disable toggles.
    pub toggle_field: String,
    /// Table section the elements are emitted right after.
    #[serde(default)]
    pub container: Option<String>,
}

impl Default for ArraySpec {
    fn default() -> Self {
        Self {
            name: "servers".into(),
            id_field: "id".into(),
            toggle_field: "enabled".into(),
            container: Some("mcp".into()),
        }
    }
}

/// Field whose value selects which other fields are allowed on an element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DiscriminantSpec {
    pub field: String,
    /// Discriminant value -> fields to strip.
    #[serde(default)]
    pub forbidden: BTreeMap<String, Vec<String>>,
}

impl DiscriminantSpec {
    /// Fields to strip for `value`; empty for unknown values.
    pub fn forbidden_for(&self, value: &str) -> &[String] {
        self.forbidden.get(value).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for DiscriminantSpec {
    fn default() -> Self {
        let forbidden = Transport::ALL
            .into_iter()
            .map(|t| (t.as_str().to_string(), owned(t.forbidden_fields())))
            .collect();
        Self {
            field: "transport".into(),
            forbidden,
        }
    }
}

/// Everything the engine needs to know about the managed document shape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PatchSchema {
    /// Known keys per section, in canonical order.
    pub sections: BTreeMap<String, Vec<String>>,
    pub array: ArraySpec,
    pub discriminant: Option<DiscriminantSpec>,
    /// Top-level table callers may switch on or off as a whole.
    pub optional_block: Option<String>,
}

impl PatchSchema {
    /// Canonical key order for `section`, empty when unknown.
    pub fn known_keys(&self, section: &str) -> &[String] {
        self.sections.get(section).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Keys listed before `key` in `section`, nearest first.
    pub fn keys_before<'a>(
        &'a self,
        section: &str,
        key: &str,
    ) -> impl Iterator<Item = &'a str> + use<'a> {
        let known = self.known_keys(section);
        let end = known.iter().position(|k| k == key).unwrap_or(known.len());
        known[..end].iter().rev().map(String::as_str)
    }

    pub fn is_optional_block(&self, name: &str) -> bool {
        self.optional_block.as_deref() == Some(name)
    }

    pub fn is_container(&self, name: &str) -> bool {
        self.array.container.as_deref() == Some(name)
    }
}

impl Default for PatchSchema {
    fn default() -> Self {
        let sections = BTreeMap::from([
            (
                "agent".to_string(),
                owned(&["model", "provider", "log_level", "proxy", "max_turns"]),
            ),
            (
                "mcp".to_string(),
                owned(&["enabled", "startup_timeout_secs", "tool_timeout_secs"]),
            ),
            (
                "servers".to_string(),
                owned(&[
                    "id",
                    "enabled",
                    "transport",
                    "command",
                    "args",
                    "cwd",
                    "env",
                    "url",
                    "headers",
                    "bearer_token_env_var",
                ]),
            ),
            (
                "diagnostics".to_string(),
                owned(&["latency_warn_ms", "error_rate_warn", "sample_window_secs"]),
            ),
        ]);

        Self {
            sections,
            array: ArraySpec::default(),
            discriminant: Some(DiscriminantSpec::default()),
            optional_block: Some("diagnostics".into()),
        }
    }
}

fn owned(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Transport::Stdio, "stdio", &["url", "headers", "bearer_token_env_var"])]
    #[case(Transport::Http, "http", &["command", "args", "cwd", "env"])]
    #[case(Transport::Sse, "sse", &["command", "args", "cwd", "env"])]
    fn test_transport_table(
        #[case] transport: Transport,
        #[case] name: &str,
        #[case] forbidden: &[&str],
    ) {
        assert_eq!(transport.as_str(), name);
        assert_eq!(transport.forbidden_fields(), forbidden);
        assert_eq!(DiscriminantSpec::default().forbidden_for(name), forbidden);
    }

    #[test]
    fn test_default_discriminant_table() {
        let spec = DiscriminantSpec::default();
        assert_eq!(spec.field, "transport");
        assert_eq!(
            spec.forbidden_for("stdio"),
            &["url", "headers", "bearer_token_env_var"]
        );
        assert_eq!(spec.forbidden_for("sse"), &["command", "args", "cwd", "env"]);
        assert!(spec.forbidden_for("carrier-pigeon").is_empty());
    }

    #[test]
    fn test_keys_before_nearest_first() {
        let schema = PatchSchema::default();
        let before: Vec<_> = schema.keys_before("agent", "log_level").collect();
        assert_eq!(before, vec!["provider", "model"]);
        assert_eq!(schema.keys_before("agent", "model").count(), 0);
        assert_eq!(schema.keys_before("nope", "model").count(), 0);
    }

    #[test]
    fn test_unknown_key_follows_every_known_key() {
        let schema = PatchSchema::default();
        let before: Vec<_> = schema.keys_before("mcp", "custom").collect();
        assert_eq!(
            before,
            vec!["tool_timeout_secs", "startup_timeout_secs", "enabled"]
        );
    }

    #[test]
    fn test_partial_schema_keeps_defaults() {
        let schema: PatchSchema = toml::from_str(
            r#"
optional_block = "telemetry"

[array]
name = "plugins"
id_field = "name"
toggle_field = "active"
"#,
        )
        .unwrap();

        assert!(schema.is_optional_block("telemetry"));
        assert!(!schema.is_optional_block("diagnostics"));
        assert_eq!(schema.array.name, "plugins");
        assert_eq!(schema.array.container, None);
        assert_eq!(schema.known_keys("agent").first().map(String::as_str), Some("model"));
        assert!(schema.discriminant.is_some());
    }

    #[test]
    fn test_default_container() {
        let schema = PatchSchema::default();
        assert!(schema.is_container("mcp"));
        assert!(!schema.is_container("agent"));
    }
}

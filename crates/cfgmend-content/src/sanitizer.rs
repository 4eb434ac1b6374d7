//! Strips fields that are invalid for an element's discriminant value.

use cfgmend_blocks::{Block, find_active_key, remove_key};
use cfgmend_meta::DiscriminantSpec;

/// Remove every field forbidden for the block's current discriminant value.
///
/// A block without the discriminant, or with a value the table does not
/// know, is left alone. Only the block's own key region is reached; keys
/// under nested `[name.child]` sub-tables stay untouched. Returns the number
/// of assignments removed.
pub fn sanitize(block: &mut Block, spec: &DiscriminantSpec) -> usize {
    let Some(value) = find_active_key(block, &spec.field)
        .map(|line| line.string_value().unwrap_or_else(|| line.value.clone()))
    else {
        return 0;
    };

    let removed: usize = spec
        .forbidden_for(&value)
        .iter()
        .map(|field| remove_key(block, field))
        .sum();
    if removed > 0 {
        tracing::debug!(block = block.name(), discriminant = %value, removed, "sanitized entry");
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgmend_blocks::BlockKind;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn element(text: &str) -> Block {
        Block::new(
            "servers",
            BlockKind::ArrayElement,
            text.lines().map(String::from).collect(),
        )
    }

    #[rstest]
    #[case::stdio_drops_remote_fields(
        "[[servers]]\nid = \"files\"\ntransport = \"stdio\"\ncommand = \"fs-server\"\nurl = \"http://x\"\nheaders = {\n  A = \"1\",\n}\n# url = \"kept\"",
        2,
        "[[servers]]\nid = \"files\"\ntransport = \"stdio\"\ncommand = \"fs-server\"\n# url = \"kept\""
    )]
    #[case::http_drops_process_fields(
        "[[servers]]\nid = \"web\"\ntransport = \"http\"\ncommand = \"old\"\nargs = [\n  \"--port\",\n  \"80\",\n]\nurl = \"http://x\"",
        2,
        "[[servers]]\nid = \"web\"\ntransport = \"http\"\nurl = \"http://x\""
    )]
    #[case::sse_drops_process_fields(
        "[[servers]]\nid = \"ev\"\ntransport = 'sse'\ncwd = \"/srv\"\nenv = { A = \"1\" }\nurl = \"http://x\"",
        2,
        "[[servers]]\nid = \"ev\"\ntransport = 'sse'\nurl = \"http://x\""
    )]
    #[case::bare_discriminant_value(
        "[[servers]]\ntransport = stdio\nurl = \"u\"",
        1,
        "[[servers]]\ntransport = stdio"
    )]
    fn test_discriminant_cases(#[case] input: &str, #[case] removed: usize, #[case] expected: &str) {
        let mut block = element(input);
        assert_eq!(sanitize(&mut block, &DiscriminantSpec::default()), removed);
        assert_eq!(block.lines().join("\n"), expected);
    }

    #[test]
    fn test_unknown_or_missing_discriminant_is_noop() {
        let text = "[[servers]]\nid = \"x\"\ncommand = \"c\"\nurl = \"u\"";
        let mut missing = element(text);
        let mut unknown = element(&format!("{text}\ntransport = \"pigeon\""));

        assert_eq!(sanitize(&mut missing, &DiscriminantSpec::default()), 0);
        assert_eq!(sanitize(&mut unknown, &DiscriminantSpec::default()), 0);
        assert_eq!(missing.lines().join("\n"), text);
    }

    #[test]
    fn test_nested_sub_table_is_out_of_reach() {
        let mut block = element(
            "[[servers]]\nid = \"files\"\ntransport = \"stdio\"\n[servers.extra]\nurl = \"nested\"",
        );
        assert_eq!(sanitize(&mut block, &DiscriminantSpec::default()), 0);
        assert_eq!(block.lines().len(), 5);
    }
}

//! Cross-crate tests following one config file through its life:
//! fresh install, hand edits, template upgrade and shared patchers.
//!
//! Requests are loaded from files with `ConfigLoader`, patched with
//! `Patcher` and the results parsed back with `cfgmend_blocks` and `toml`.

use cfgmend_blocks::parse;
use cfgmend_content::{PatchOptions, Patcher};
use cfgmend_meta::{ConfigLoader, EditRequest, FieldValue};
use cfgmend_test_utils::fixtures::{self, KNOWN_IDS, TEMPLATE};
use cfgmend_test_utils::workspace::TestWorkspace;
use pretty_assertions::assert_eq;

fn checked_patcher() -> Patcher {
    Patcher::default().with_options(PatchOptions {
        validate_syntax: true,
    })
}

fn server_ids(text: &str) -> Vec<String> {
    let value: toml::Value = toml::from_str(text).unwrap();
    value
        .get("servers")
        .and_then(|s| s.as_array())
        .map(|servers| {
            servers
                .iter()
                .filter_map(|s| s.get("id").and_then(|id| id.as_str()).map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn server_enabled(text: &str, id: &str) -> Option<bool> {
    let value: toml::Value = toml::from_str(text).unwrap();
    value
        .get("servers")?
        .as_array()?
        .iter()
        .find(|s| s.get("id").and_then(|v| v.as_str()) == Some(id))?
        .get("enabled")?
        .as_bool()
}

/// Patch until the output stops changing; a correct patch needs one run.
fn assert_stable(patcher: &Patcher, text: &str, template: &str, request: &EditRequest) {
    let again = patcher.patch(text, template, request).unwrap();
    assert_eq!(again.text, text);
    assert!(!again.changed);
}

// =============================================================================
// Request files drive the pipeline
// =============================================================================

#[test]
fn test_fixture_files_through_loader_and_patcher() {
    let ws = TestWorkspace::with_fixtures();
    let request: EditRequest = ConfigLoader::new().load(&ws.path("edits.toml")).unwrap();
    assert_eq!(request, fixtures::edit_request());

    let patcher = checked_patcher();
    let outcome = patcher
        .patch(&ws.read("current.toml"), &ws.read("template.toml"), &request)
        .unwrap();

    assert!(outcome.changed);
    assert_eq!(
        server_ids(&outcome.text),
        vec!["files", "search", "browser", "notes"]
    );
    assert_eq!(server_enabled(&outcome.text, "search"), Some(false));
    assert_eq!(server_enabled(&outcome.text, "browser"), Some(true));
    assert_stable(&patcher, &outcome.text, TEMPLATE, &request);
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_install_edit_upgrade_cycle() {
    let patcher = checked_patcher();

    // 1. Fresh install with only the files server.
    let install = EditRequest::new().known_ids(KNOWN_IDS).toggle("files", true);
    let installed = patcher.patch("", TEMPLATE, &install).unwrap().text;
    assert_eq!(server_ids(&installed), vec!["files"]);
    assert!(!installed.contains("[diagnostics]"));

    // 2. The user adds a comment to the server and a section of their own.
    let edited = installed.replace(
        "id = \"files\"\n",
        "id = \"files\"\n# keep this one local\n",
    ) + "\n[my_tools]\npath = \"/opt/tools\" # mine\n";
    let repatched = patcher.patch(&edited, TEMPLATE, &install).unwrap();
    assert_eq!(repatched.text, edited);
    assert!(!repatched.changed);

    // 3. A newer template ships an extra server and the user opts in.
    let upgraded_template = TEMPLATE.replace(
        "\n[diagnostics]",
        "\n[[servers]]\nid = \"memory\"\nenabled = false\ntransport = \"stdio\"\ncommand = \"mcp-memory\"\n\n[diagnostics]",
    );
    let upgrade = EditRequest::new()
        .known_ids(["files", "search", "browser", "memory"])
        .toggle("memory", true)
        .toggle("search", true);
    let upgraded = patcher.patch(&edited, &upgraded_template, &upgrade).unwrap().text;

    assert_eq!(server_ids(&upgraded), vec!["files", "search", "memory"]);
    assert_eq!(server_enabled(&upgraded, "memory"), Some(true));
    assert!(upgraded.contains("# keep this one local\n"));
    assert!(upgraded.ends_with("[my_tools]\npath = \"/opt/tools\" # mine\n"));
    assert_stable(&patcher, &upgraded, &upgraded_template, &upgrade);

    // 4. Switching everything off keeps the entries in place.
    let off = KNOWN_IDS
        .iter()
        .chain(["memory"].iter())
        .fold(
            EditRequest::new().known_ids(["files", "search", "browser", "memory"]),
            |request, id| request.toggle(*id, false),
        );
    let disabled = patcher.patch(&upgraded, &upgraded_template, &off).unwrap().text;
    assert_eq!(server_ids(&disabled), vec!["files", "search", "memory"]);
    for id in ["files", "search", "memory"] {
        assert_eq!(server_enabled(&disabled, id), Some(false), "{id}");
    }
}

#[test]
fn test_optional_block_enable_then_disable() {
    let patcher = checked_patcher();
    let enable =
        EditRequest::new().enable_optional_block([("latency_warn_ms", FieldValue::Integer(250))]);
    let enabled = patcher.patch(fixtures::CURRENT, TEMPLATE, &enable).unwrap().text;

    let doc = parse(&enabled);
    let block = doc.section("diagnostics").unwrap();
    assert!(block.lines().iter().any(|l| l == "latency_warn_ms = 250"));
    assert!(block.lines().iter().any(|l| l == "sample_window_secs = 300"));
    assert_stable(&patcher, &enabled, TEMPLATE, &enable);

    let disable = EditRequest::new().disable_optional_block();
    let disabled = patcher.patch(&enabled, TEMPLATE, &disable).unwrap().text;
    assert!(parse(&disabled).section("diagnostics").is_none());
    assert!(disabled.contains("[my_custom]"));
}

// =============================================================================
// Sharing
// =============================================================================

#[test]
fn test_patcher_shared_across_threads() {
    let patcher = checked_patcher();
    let request = fixtures::edit_request();
    let expected = patcher
        .patch(fixtures::CURRENT, TEMPLATE, &request)
        .unwrap()
        .text;

    let results: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    patcher
                        .patch(fixtures::CURRENT, TEMPLATE, &request)
                        .unwrap()
                        .text
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for text in results {
        assert_eq!(text, expected);
    }
}

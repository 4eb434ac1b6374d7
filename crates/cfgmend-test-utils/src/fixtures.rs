//! Agent config fixtures shared by the test suites.
//!
//! The files live in `test-fixtures/agent/` at the workspace root so the CLI
//! tests can point at them directly as well.

use cfgmend_meta::EditRequest;

/// Canonical template: `[agent]`, `[mcp]`, three `[[servers]]` entries
/// (`files`, `search`, `browser`) and the optional `[diagnostics]` block.
pub const TEMPLATE: &str = include_str!("../../../test-fixtures/agent/template.toml");

/// A hand-edited document: sections out of order, a multiline prompt holding
/// header- and key-like text, a server with leftover fields from another
/// transport, a nested `[servers.env]` table, a custom server, a custom
/// section and a custom array.
pub const CURRENT: &str = include_str!("../../../test-fixtures/agent/current.toml");

/// Edit request matching [`edit_request`], in TOML form.
pub const EDITS: &str = include_str!("../../../test-fixtures/agent/edits.toml");

/// Canonical server identifiers in template order.
pub const KNOWN_IDS: [&str; 3] = ["files", "search", "browser"];

/// The request in [`EDITS`]: disable `search`, enable and restore `browser`,
/// set `agent.log_level` and clear `agent.proxy`.
pub fn edit_request() -> EditRequest {
    EditRequest::new()
        .known_ids(KNOWN_IDS)
        .restore("browser")
        .toggle("search", false)
        .toggle("browser", true)
        .set("agent.log_level", "debug")
        .and_then(|r| r.clear("agent.proxy"))
        .unwrap_or_else(|e| panic!("fixture request is invalid: {e}"))
}

/// A request touching the server array with every canonical id known.
pub fn toggles(pairs: &[(&str, bool)]) -> EditRequest {
    pairs
        .iter()
        .fold(EditRequest::new().known_ids(KNOWN_IDS), |request, &(id, on)| {
            request.toggle(id, on)
        })
}

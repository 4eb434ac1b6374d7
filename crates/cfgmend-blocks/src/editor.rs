//! Key-level surgery on a single [`Block`].
//!
//! Every operation is scoped to the block's own key region (see
//! [`Block::own_len`]) and only looks at top-level lines, so key-like text
//! inside a multiline string or array value is never matched.
//!
//! Rules shared by all operations:
//! - at most one uncommented assignment per key survives an edit;
//! - a value spanning several lines is always replaced or removed as a unit;
//! - commented-out assignments are left alone unless an operation explicitly
//!   rewrites them.

use regex::Regex;
use std::sync::LazyLock;

use crate::parser::Block;
use crate::scanner::{LineTracker, QuoteState, scan};

/// Bare, basic-quoted or literal-quoted key segment.
pub(crate) const KEY_SEGMENT: &str = r#"(?:[A-Za-z0-9_-]+|"(?:[^"\\]|\\.)*"|'[^']*')"#;

static KEY_SEGMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(KEY_SEGMENT).expect("Invalid key segment regex"));

/// Captures indent, comment marker, (dotted) key and the `=` separator.
static KEY_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(\s*)(#\s*)?({KEY_SEGMENT}(?:\s*\.\s*{KEY_SEGMENT})*)(\s*=\s*)"
    ))
    .expect("Invalid key line regex")
});

/// A key assignment line, commented or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLine {
    /// Line index within the slice it was found in.
    pub index: usize,
    pub raw: String,
    pub indent: String,
    pub commented: bool,
    /// The key exactly as written.
    pub key: String,
    /// The `=` with its surrounding whitespace, exactly as written.
    pub separator: String,
    /// Value text on this line, without any trailing comment.
    pub value: String,
    /// Trailing inline comment including the whitespace before `#`.
    pub comment: Option<String>,
}

impl KeyLine {
    /// Parse `line` as a key assignment.
    pub fn parse(index: usize, line: &str) -> Option<Self> {
        let caps = KEY_LINE_REGEX.captures(line)?;
        let head = caps.get(0)?;
        let rest = &line[head.end()..];

        let (value, comment) = match scan(rest, QuoteState::None).comment_start {
            Some(pos) => {
                let value = rest[..pos].trim_end();
                (value, Some(rest[value.len()..].to_string()))
            }
            None => (rest.trim_end(), None),
        };

        Some(Self {
            index,
            raw: line.to_string(),
            indent: caps.get(1).map_or("", |m| m.as_str()).to_string(),
            commented: caps.get(2).is_some(),
            key: caps.get(3)?.as_str().to_string(),
            separator: caps.get(4)?.as_str().to_string(),
            value: value.to_string(),
            comment,
        })
    }

    /// Whether this line assigns `key`.
    pub fn matches(&self, key: &str) -> bool {
        normalize_key(&self.key) == normalize_key(key)
    }

    /// The value as a plain string when it is a single-line quoted string.
    pub fn string_value(&self) -> Option<String> {
        let value = self.value.as_str();
        if value.len() < 2 || value.starts_with("\"\"\"") || value.starts_with("'''") {
            return None;
        }
        if let Some(inner) = value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')) {
            return Some(inner.to_string());
        }
        let inner = value.strip_prefix('"')?.strip_suffix('"')?;
        Some(unescape_basic(inner))
    }
}

/// Canonical spelling of a (dotted) key for comparison.
///
/// Quoted segments that spell a bare key compare equal to it (`"model"` is
/// `model`); any other quoted segment keeps its quotes, so `"a.b"` never
/// matches the dotted `a.b`.
fn normalize_key(key: &str) -> String {
    KEY_SEGMENT_REGEX
        .find_iter(key)
        .map(|m| canonical_segment(m.as_str()))
        .collect::<Vec<_>>()
        .join(".")
}

fn canonical_segment(segment: &str) -> String {
    let text = if let Some(inner) = segment.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        inner.to_string()
    } else if let Some(inner) = segment.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        unescape_basic(inner)
    } else {
        return segment.to_string();
    };
    let bare = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare { text } else { format!("{text:?}") }
}

fn unescape_basic(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Formatting used to render a rewritten assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LineFormat {
    indent: String,
    key: String,
    separator: String,
    comment: String,
}

impl LineFormat {
    fn bare(key: &str) -> Self {
        Self {
            indent: String::new(),
            key: key.to_string(),
            separator: " = ".to_string(),
            comment: String::new(),
        }
    }

    fn render(&self, value: &str) -> String {
        format!(
            "{}{}{}{}{}",
            self.indent, self.key, self.separator, value, self.comment
        )
    }
}

impl From<&KeyLine> for LineFormat {
    fn from(line: &KeyLine) -> Self {
        Self {
            indent: line.indent.clone(),
            key: line.key.clone(),
            separator: line.separator.clone(),
            comment: line.comment.clone().unwrap_or_default(),
        }
    }
}

/// Every top-level line in `lines` that assigns `key`, commented or not.
fn occurrences(lines: &[String], key: &str) -> Vec<KeyLine> {
    let mut tracker = LineTracker::new();
    let mut found = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if tracker.at_top_level()
            && let Some(key_line) = KeyLine::parse(i, line)
            && key_line.matches(key)
        {
            found.push(key_line);
        }
        tracker.feed(line);
    }
    found
}

/// Inclusive line spans of every uncommented assignment of `key`.
fn active_spans(lines: &[String], key: &str) -> Vec<(usize, usize)> {
    occurrences(lines, key)
        .into_iter()
        .filter(|l| !l.commented)
        .map(|l| (l.index, multiline_value_end_index(lines, l.index)))
        .collect()
}

/// First line assigning `key`, commented or not.
pub fn find_key(lines: &[String], key: &str) -> Option<KeyLine> {
    occurrences(lines, key).into_iter().next()
}

/// First uncommented assignment of `key` in the block's own region.
pub fn find_active_key(block: &Block, key: &str) -> Option<KeyLine> {
    occurrences(&block.lines()[..block.own_len()], key)
        .into_iter()
        .find(|l| !l.commented)
}

/// String value of the first uncommented assignment of `key`.
pub fn read_string(block: &Block, key: &str) -> Option<String> {
    find_active_key(block, key).and_then(|l| l.string_value())
}

/// Index of the last line belonging to the value assigned on line `start`.
///
/// Follows array (`[...]`) and inline-table (`{...}`) continuations as well as
/// triple-quoted strings. For a single-line value this is `start` itself.
pub fn multiline_value_end_index(lines: &[String], start: usize) -> usize {
    let mut tracker = LineTracker::new();
    for (i, line) in lines.iter().enumerate().skip(start) {
        tracker.feed(line);
        if tracker.at_top_level() {
            return i;
        }
    }
    lines.len().saturating_sub(1).max(start)
}

fn strip_comment_marker(line: &str) -> Option<&str> {
    line.trim_start().strip_prefix('#')
}

/// Last line of a commented-out assignment starting at `start`, following
/// commented continuation lines of a multiline value.
fn commented_value_end_index(lines: &[String], start: usize) -> usize {
    let mut tracker = LineTracker::new();
    for (i, line) in lines.iter().enumerate().skip(start) {
        let Some(text) = strip_comment_marker(line) else {
            return i.saturating_sub(1).max(start);
        };
        tracker.feed(text);
        if tracker.at_top_level() {
            return i;
        }
    }
    lines.len().saturating_sub(1).max(start)
}

fn comment_out(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|line| {
            let body = line.trim_start();
            let indent = &line[..line.len() - body.len()];
            if body.is_empty() {
                format!("{indent}#")
            } else {
                format!("{indent}# {body}")
            }
        })
        .collect()
}

/// Canonical commented-out phrasing for `key` taken from a template block.
fn commented_phrasing(template: &Block, key: &str) -> Option<Vec<String>> {
    let lines = &template.lines()[..template.own_len()];
    let found = find_key(lines, key)?;
    if found.commented {
        let end = commented_value_end_index(lines, found.index);
        Some(lines[found.index..=end].to_vec())
    } else {
        let end = multiline_value_end_index(lines, found.index);
        Some(comment_out(&lines[found.index..=end]))
    }
}

/// Where a new assignment goes: after `after_key`'s value, else right after the header.
fn insertion_index(lines: &[String], after_key: Option<&str>) -> usize {
    after_key
        .filter(|k| !k.is_empty())
        .and_then(|k| active_spans(lines, k).first().map(|&(_, end)| end + 1))
        .unwrap_or(1)
        .min(lines.len())
}

/// Drop every active span except the first, then swap the first for `replacement`.
fn replace_spans(lines: &mut Vec<String>, spans: &[(usize, usize)], replacement: Vec<String>) {
    let Some((&(start, end), duplicates)) = spans.split_first() else {
        return;
    };
    for &(dup_start, dup_end) in duplicates.iter().rev() {
        tracing::warn!(line = %lines[dup_start], "pruning duplicate assignment");
        lines.drain(dup_start..=dup_end);
    }
    lines.splice(start..=end, replacement);
}

/// Set `key = value` in `block`.
///
/// Formatting (indent, key spelling, separator, inline comment) comes from
/// the template's line for `key` when there is one, otherwise from the
/// block's own line. The first uncommented assignment is replaced and any
/// duplicates are removed; with no active assignment the line is inserted
/// after `after_key`, or right after the header.
pub fn set_key_value(
    block: &mut Block,
    template: Option<&Block>,
    key: &str,
    value: &str,
    after_key: Option<&str>,
) {
    let own = block.own_len();
    let format = template
        .and_then(|t| find_key(&t.lines()[..t.own_len()], key))
        .or_else(|| find_key(&block.lines()[..own], key))
        .map_or_else(|| LineFormat::bare(key), |l| LineFormat::from(&l));
    let line = format.render(value);
    let spans = active_spans(&block.lines()[..own], key);

    tracing::trace!(block = block.name(), key, value, "set key");
    let lines = block.lines_mut();
    if spans.is_empty() {
        let at = insertion_index(&lines[..own], after_key);
        lines.insert(at, line);
    } else {
        replace_spans(lines, &spans, vec![line]);
    }
}

/// Clear `key` by turning it into a commented-out line.
///
/// An active assignment is replaced by the template's commented phrasing, or
/// commented in place when the template has none. When the key is absent the
/// template phrasing is inserted as a placeholder after `after_key`.
pub fn set_commented_key(
    block: &mut Block,
    template: Option<&Block>,
    key: &str,
    after_key: Option<&str>,
) {
    let own = block.own_len();
    let phrasing = template.and_then(|t| commented_phrasing(t, key));
    let found = occurrences(&block.lines()[..own], key);
    let spans = active_spans(&block.lines()[..own], key);

    tracing::trace!(block = block.name(), key, "comment out key");
    let lines = block.lines_mut();
    if let Some(&(start, end)) = spans.first() {
        let replacement = phrasing.unwrap_or_else(|| comment_out(&lines[start..=end]));
        replace_spans(lines, &spans, replacement);
    } else if found.is_empty()
        && let Some(phrasing) = phrasing
    {
        let at = insertion_index(&lines[..own], after_key);
        lines.splice(at..at, phrasing);
    }
}

/// Remove every uncommented assignment of `key`, multiline values included.
///
/// Returns the number of assignments removed.
pub fn remove_key(block: &mut Block, key: &str) -> usize {
    let own = block.own_len();
    let spans = active_spans(&block.lines()[..own], key);
    let lines = block.lines_mut();
    for &(start, end) in spans.iter().rev() {
        lines.drain(start..=end);
    }
    if !spans.is_empty() {
        tracing::trace!(block = block.name(), key, count = spans.len(), "removed key");
    }
    spans.len()
}

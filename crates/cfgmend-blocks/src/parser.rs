//! Splits raw configuration text into a preamble, table sections and
//! array-of-tables elements.
//!
//! ```text
//! # preamble comment
//!
//! [agent]              <- Block (Table "agent")
//! model = "default"
//!
//! [[servers]]          <- Block (ArrayElement "servers")
//! id = "files"
//!
//! [servers.env]        <- stays inside the element above
//! ROOT = "/srv"
//! ```
//!
//! Header recognition only happens on top-level lines, so a `[x]` line inside
//! a multiline string or a multiline array value is never mistaken for a
//! section start.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::editor::KEY_SEGMENT;
use crate::scanner::{LineTracker, QuoteState, scan};

/// A dotted key between header brackets, e.g. `servers.env` or `languages."c#"`.
static HEADER_KEY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*{KEY_SEGMENT}(?:\s*\.\s*{KEY_SEGMENT})*\s*$"))
        .expect("Invalid header key regex")
});

static HEADER_SEGMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(KEY_SEGMENT).expect("Invalid header segment regex"));

/// Whether a block is a `[table]` or one `[[array]]` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Table,
    ArrayElement,
}

/// A recognized section header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub kind: BlockKind,
}

/// Recognize a header line. Callers must only pass top-level lines.
///
/// The trailing comment is cut with the quote-aware scanner, so `#`, `[`
/// and `]` inside quoted key segments are part of the name. The name is the
/// key segments as written, joined by `.` without surrounding whitespace.
pub fn parse_header(line: &str) -> Option<Header> {
    let code = match scan(line, QuoteState::None).comment_start {
        Some(pos) => &line[..pos],
        None => line,
    };
    let code = code.trim();

    let (inner, kind) = match code.strip_prefix("[[").and_then(|c| c.strip_suffix("]]")) {
        Some(inner) => (inner, BlockKind::ArrayElement),
        None => (
            code.strip_prefix('[')?.strip_suffix(']')?,
            BlockKind::Table,
        ),
    };
    if !HEADER_KEY_REGEX.is_match(inner) {
        return None;
    }

    let name = HEADER_SEGMENT_REGEX
        .find_iter(inner)
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(".");
    Some(Header { name, kind })
}

/// One section's raw lines, header included.
///
/// Comment lines sitting directly above the header (no blank line between)
/// are kept apart in [`Block::leading`] so they move with the block when
/// sections are reordered. Editing only ever touches [`Block::lines`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    name: String,
    kind: BlockKind,
    leading: Vec<String>,
    lines: Vec<String>,
}

impl Block {
    /// Create a block from raw lines. The first line is expected to be the header.
    pub fn new(name: impl Into<String>, kind: BlockKind, lines: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            leading: Vec::new(),
            lines,
        }
    }

    /// Attach comment lines that introduce this block.
    pub fn with_leading(mut self, leading: Vec<String>) -> Self {
        self.leading = leading;
        self
    }

    /// Create a block holding only a freshly rendered header line.
    pub fn with_header(name: impl Into<String>, kind: BlockKind) -> Self {
        let name = name.into();
        let header = match kind {
            BlockKind::Table => format!("[{name}]"),
            BlockKind::ArrayElement => format!("[[{name}]]"),
        };
        Self::new(name, kind, vec![header])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    /// Comment lines directly above the header.
    pub fn leading(&self) -> &[String] {
        &self.leading
    }

    /// Header and body lines.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut Vec<String> {
        &mut self.lines
    }

    /// All lines in output order, leading comments first.
    pub fn into_lines(self) -> Vec<String> {
        let mut lines = self.leading;
        lines.extend(self.lines);
        lines
    }

    /// Number of lines that belong to this block's own key region.
    ///
    /// For an array element followed by `[name.child]` sub-tables this stops
    /// at the first nested header; for every other block it is `lines().len()`.
    pub fn own_len(&self) -> usize {
        let mut tracker = LineTracker::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 && tracker.at_top_level() && parse_header(line).is_some() {
                return i;
            }
            tracker.feed(line);
        }
        self.lines.len()
    }

    /// Whether `header` opens a sub-table that belongs inside this block.
    fn nests(&self, header: &Header) -> bool {
        self.kind == BlockKind::ArrayElement
            && header
                .name
                .strip_prefix(self.name.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
    }
}

/// Parse result of one input text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Lines before the first header.
    pub preamble: Vec<String>,
    /// Table sections by name.
    pub sections: BTreeMap<String, Block>,
    /// Array-of-tables elements by array name, in source order.
    pub arrays: BTreeMap<String, Vec<Block>>,
    /// Table section names in order of first appearance.
    pub order: Vec<String>,
}

impl Document {
    /// Parse raw text into a document.
    pub fn parse(text: &str) -> Self {
        let mut doc = Document::default();
        let mut tracker = LineTracker::new();
        let mut open: Option<Block> = None;
        // Trailing top-level comment lines of the open block.
        let mut comment_run = 0;

        for line in text.lines() {
            let top_level = tracker.at_top_level();
            tracker.feed(line);

            let header = if top_level { parse_header(line) } else { None };
            match header {
                Some(header) if open.as_ref().is_some_and(|b| b.nests(&header)) => {
                    comment_run = 0;
                    if let Some(block) = open.as_mut() {
                        block.lines.push(line.to_string());
                    }
                }
                Some(header) => {
                    let mut leading = Vec::new();
                    if let Some(mut block) = open.take() {
                        let split = block.lines.len() - comment_run;
                        leading = block.lines.split_off(split);
                        doc.insert(block);
                    }
                    comment_run = 0;
                    open = Some(
                        Block::new(header.name, header.kind, vec![line.to_string()])
                            .with_leading(leading),
                    );
                }
                None => {
                    let is_comment = top_level && line.trim_start().starts_with('#');
                    comment_run = if is_comment { comment_run + 1 } else { 0 };
                    match open.as_mut() {
                        Some(block) => block.lines.push(line.to_string()),
                        None => doc.preamble.push(line.to_string()),
                    }
                }
            }
        }

        if let Some(block) = open.take() {
            doc.insert(block);
        }
        doc
    }

    fn insert(&mut self, block: Block) {
        match block.kind {
            BlockKind::Table => {
                if self.sections.contains_key(&block.name) {
                    tracing::warn!(section = %block.name, "duplicate table header ignored");
                    return;
                }
                self.order.push(block.name.clone());
                self.sections.insert(block.name.clone(), block);
            }
            BlockKind::ArrayElement => {
                self.arrays.entry(block.name.clone()).or_default().push(block);
            }
        }
    }

    pub fn section(&self, name: &str) -> Option<&Block> {
        self.sections.get(name)
    }

    /// Elements of the named array, empty when absent.
    pub fn array(&self, name: &str) -> &[Block] {
        self.arrays.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the preamble holds anything besides blank lines.
    pub fn has_preamble_content(&self) -> bool {
        self.preamble.iter().any(|l| !l.trim().is_empty())
    }
}

/// Parse raw text into a [`Document`].
pub fn parse(text: &str) -> Document {
    Document::parse(text)
}

//! Quote-aware line scanning.
//!
//! The scanner never builds a syntax tree. It walks one line at a time and
//! reports two things: where an unquoted `#` comment starts, and which
//! quoting mode is still open when the line ends. Feeding the returned state
//! into the next call is what lets callers skip over multiline strings.
//!
//! All delimiters are ASCII, so the walk is done on bytes; UTF-8
//! continuation bytes can never be mistaken for a delimiter.

/// Lexical mode active at a given point of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QuoteState {
    /// Plain code, outside of any string.
    #[default]
    None,
    /// Inside `"..."`.
    InBasicString,
    /// Inside `'...'`.
    InLiteralString,
    /// Inside `"""..."""`.
    InMultilineBasicString,
    /// Inside `'''...'''`.
    InMultilineLiteralString,
}

impl QuoteState {
    /// Whether this state can carry over to the next line.
    pub fn is_multiline(self) -> bool {
        matches!(
            self,
            QuoteState::InMultilineBasicString | QuoteState::InMultilineLiteralString
        )
    }

    /// Single-line strings cannot cross a newline; only multiline modes survive.
    fn at_line_end(self) -> Self {
        if self.is_multiline() {
            self
        } else {
            QuoteState::None
        }
    }
}

/// Result of scanning a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineScan {
    /// Byte offset of the first unquoted `#`, if any.
    pub comment_start: Option<usize>,
    /// State at the end of the line, to be passed to the next one.
    pub state: QuoteState,
}

/// Character classes the transition function distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Hash,
    Backslash,
    /// A run of identical quote bytes.
    Quote { delim: u8, run: usize },
    Other(u8),
}

impl Token {
    fn at(bytes: &[u8], i: usize) -> Self {
        match bytes[i] {
            b'#' => Token::Hash,
            b'\\' => Token::Backslash,
            delim @ (b'"' | b'\'') => {
                let run = bytes[i..].iter().take_while(|&&b| b == delim).count();
                Token::Quote { delim, run }
            }
            other => Token::Other(other),
        }
    }
}

/// Pure transition: next state and how many bytes the token consumed.
fn transition(state: QuoteState, token: Token) -> (QuoteState, usize) {
    use QuoteState::*;

    match (state, token) {
        (None, Token::Quote { delim, run }) if run >= 3 => (multiline_for(delim), 3),
        // `""` or `''` is an empty string: opened and closed at once.
        (None, Token::Quote { run: 2, .. }) => (None, 2),
        (None, Token::Quote { delim, .. }) => (single_for(delim), 1),

        // An escape always swallows the following byte, which is what makes
        // `\"` keep the string open while `\\"` closes it.
        (InBasicString | InMultilineBasicString, Token::Backslash) => (state, 2),
        (InBasicString, Token::Quote { delim: b'"', .. }) => (None, 1),
        (InLiteralString, Token::Quote { delim: b'\'', .. }) => (None, 1),

        // Up to two extra quotes may sit right before the closing delimiter.
        (InMultilineBasicString, Token::Quote { delim: b'"', run }) if run >= 3 => {
            (None, run.min(5))
        }
        (InMultilineLiteralString, Token::Quote { delim: b'\'', run }) if run >= 3 => {
            (None, run.min(5))
        }

        (state, Token::Quote { run, .. }) => (state, run),
        (state, Token::Hash | Token::Backslash | Token::Other(_)) => (state, 1),
    }
}

fn multiline_for(delim: u8) -> QuoteState {
    if delim == b'"' {
        QuoteState::InMultilineBasicString
    } else {
        QuoteState::InMultilineLiteralString
    }
}

fn single_for(delim: u8) -> QuoteState {
    if delim == b'"' {
        QuoteState::InBasicString
    } else {
        QuoteState::InLiteralString
    }
}

/// Walk `line` starting in `state_in`, calling `visit` for every byte that
/// sits in plain code. Stops at an unquoted comment.
fn walk(line: &str, state_in: QuoteState, mut visit: impl FnMut(u8)) -> LineScan {
    let bytes = line.as_bytes();
    let mut state = state_in;
    let mut i = 0;

    while i < bytes.len() {
        let token = Token::at(bytes, i);
        if state == QuoteState::None {
            match token {
                Token::Hash => {
                    return LineScan {
                        comment_start: Some(i),
                        state,
                    };
                }
                Token::Other(b) => visit(b),
                _ => {}
            }
        }
        let (next, consumed) = transition(state, token);
        state = next;
        i += consumed;
    }

    LineScan {
        comment_start: None,
        state: state.at_line_end(),
    }
}

/// Scan one line.
///
/// When `state_in` is a multiline string the line is only searched for the
/// matching unescaped closing delimiter; anything after the close is scanned
/// as plain code again.
pub fn scan(line: &str, state_in: QuoteState) -> LineScan {
    walk(line, state_in, |_| {})
}

/// Net change in nesting depth for one `open`/`close` pair on this line.
///
/// Brackets inside strings and after an unquoted `#` are ignored.
pub fn count_bracket_depth(
    line: &str,
    state_in: QuoteState,
    open: u8,
    close: u8,
) -> (i32, QuoteState) {
    let mut depth = 0;
    let scan = walk(line, state_in, |b| {
        if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
        }
    });
    (depth, scan.state)
}

/// Carries quote state and bracket nesting across consecutive lines.
///
/// A line is "top level" when it starts outside of any multiline string and
/// outside of any open `[...]` or `{...}` value. Only top-level lines can be
/// section headers or key assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineTracker {
    state: QuoteState,
    depth: i32,
}

impl LineTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> QuoteState {
        self.state
    }

    pub fn at_top_level(&self) -> bool {
        self.state == QuoteState::None && self.depth == 0
    }

    /// Advance past `line`, returning the scan of that line.
    pub fn feed(&mut self, line: &str) -> LineScan {
        let mut depth = self.depth;
        let scan = walk(line, self.state, |b| match b {
            b'[' | b'{' => depth += 1,
            b']' | b'}' => depth -= 1,
            _ => {}
        });
        self.depth = depth.max(0);
        self.state = scan.state;
        scan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"key = "value""#, QuoteState::None, None)]
    #[case(r#"key = "value" # note"#, QuoteState::None, Some(14))]
    #[case(r#"key = "a # not a comment""#, QuoteState::None, None)]
    #[case(r#"key = 'C:\path' # note"#, QuoteState::None, Some(16))]
    #[case(r#"key = "esc \" still open # x""#, QuoteState::None, None)]
    #[case("# whole line", QuoteState::None, Some(0))]
    #[case(r#"key = """"#, QuoteState::InMultilineBasicString, None)]
    #[case("key = '''", QuoteState::InMultilineLiteralString, None)]
    #[case(r#"key = """one line""" # c"#, QuoteState::None, Some(21))]
    #[case(r#"key = "" # empty"#, QuoteState::None, Some(9))]
    fn test_scan_from_plain_code(
        #[case] line: &str,
        #[case] state: QuoteState,
        #[case] comment: Option<usize>,
    ) {
        let scan = scan(line, QuoteState::None);
        assert_eq!(scan.state, state);
        assert_eq!(scan.comment_start, comment);
    }

    #[rstest]
    #[case(r#"still inside # not a comment"#, QuoteState::InMultilineBasicString)]
    #[case(r#"escaped \""" stays open"#, QuoteState::InMultilineBasicString)]
    #[case(r#"double escaped \\""""#, QuoteState::None)]
    #[case(r#"closes here""""#, QuoteState::None)]
    #[case(r#"two extra quotes"""""#, QuoteState::None)]
    fn test_scan_inside_multiline_basic(#[case] line: &str, #[case] expected: QuoteState) {
        let scan = scan(line, QuoteState::InMultilineBasicString);
        assert_eq!(scan.state, expected);
        if expected.is_multiline() {
            assert_eq!(scan.comment_start, None);
        }
    }

    #[test]
    fn test_multiline_literal_has_no_escapes() {
        let scan = scan(r"C:\dir\'''", QuoteState::InMultilineLiteralString);
        assert_eq!(scan.state, QuoteState::None);
    }

    #[test]
    fn test_comment_after_multiline_close_is_found() {
        let line = r#"end""" # trailing"#;
        let scan = scan(line, QuoteState::InMultilineBasicString);
        assert_eq!(scan.state, QuoteState::None);
        assert_eq!(scan.comment_start, Some(7));
    }

    #[test]
    fn test_unterminated_single_line_string_resets() {
        let scan = scan(r#"key = "broken"#, QuoteState::None);
        assert_eq!(scan.state, QuoteState::None);
    }

    #[rstest]
    #[case("args = [", 1)]
    #[case(r#"args = ["a]", "b"]"#, 0)]
    #[case(r#"  "x", # ] not counted"#, 0)]
    #[case("]", -1)]
    #[case("nested = [[1, 2], [3", 2)]
    fn test_count_square_brackets(#[case] line: &str, #[case] delta: i32) {
        let (depth, _) = count_bracket_depth(line, QuoteState::None, b'[', b']');
        assert_eq!(depth, delta);
    }

    #[test]
    fn test_count_braces_ignores_square() {
        let (depth, _) = count_bracket_depth("env = { A = [1", QuoteState::None, b'{', b'}');
        assert_eq!(depth, 1);
    }

    #[test]
    fn test_tracker_spans_array_with_string_bracket() {
        let mut tracker = LineTracker::new();
        tracker.feed("args = [");
        assert!(!tracker.at_top_level());
        tracker.feed(r#"  "--flag=]","#);
        assert!(!tracker.at_top_level());
        tracker.feed("]");
        assert!(tracker.at_top_level());
    }

    #[test]
    fn test_tracker_spans_multiline_string() {
        let mut tracker = LineTracker::new();
        tracker.feed(r#"text = """"#);
        assert_eq!(tracker.state(), QuoteState::InMultilineBasicString);
        tracker.feed("[not.a.header]");
        assert!(!tracker.at_top_level());
        tracker.feed(r#"""""#);
        assert!(tracker.at_top_level());
    }
}

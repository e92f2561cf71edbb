//! Inline markup parser – tokenizes the constrained inline-HTML subset the
//! extractor emits inside paragraphs.
//!
//! Supported tags: `<b>`/`</b>`, `<i>`/`</i>`, `<a href="URL">`/`</a>`,
//! matched case-insensitively. Everything else, including malformed or
//! unsupported tags, passes through as literal text. The parser performs no
//! balance validation; dangling style state is closed implicitly by
//! [`resolve_runs`] at the end of the paragraph.

// ---------------------------------------------------------------------------
// Token types
// ---------------------------------------------------------------------------

/// A toggleable inline style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleFlag {
    Bold,
    Italic,
}

/// Atomic unit of parsed inline markup.
///
/// Produced per paragraph and consumed immediately; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineToken {
    Text(String),
    StyleStart(StyleFlag),
    StyleEnd(StyleFlag),
    LinkStart(String),
    LinkEnd,
}

/// A text run with its fully resolved style, ready for the flow engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    /// Target URL when the run sits inside an anchor.
    pub link: Option<String>,
}

/// Mutable style accumulator threaded through one paragraph's tokens.
///
/// Resets at paragraph boundaries: styles never leak across paragraphs,
/// even when the input leaves tags unclosed.
#[derive(Debug, Clone, Default)]
pub struct StyleState {
    pub bold: bool,
    pub italic: bool,
    pub active_link: Option<String>,
}

impl StyleState {
    fn apply(&mut self, token: &InlineToken) {
        match token {
            InlineToken::StyleStart(StyleFlag::Bold) => self.bold = true,
            InlineToken::StyleEnd(StyleFlag::Bold) => self.bold = false,
            InlineToken::StyleStart(StyleFlag::Italic) => self.italic = true,
            InlineToken::StyleEnd(StyleFlag::Italic) => self.italic = false,
            InlineToken::LinkStart(url) => self.active_link = Some(url.clone()),
            InlineToken::LinkEnd => self.active_link = None,
            InlineToken::Text(_) => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Parser – simple scanner over the constrained subset
// ---------------------------------------------------------------------------

/// Parse a constrained inline-HTML string into a flat token stream.
///
/// Text between and around tags is preserved verbatim, surrounding
/// whitespace included. Pure function of the input, restartable.
pub fn parse_inline(input: &str) -> Vec<InlineToken> {
    let mut scanner = Scanner::new(input);
    scanner.run();
    scanner.tokens
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    text_start: usize,
    tokens: Vec<InlineToken>,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            text_start: 0,
            tokens: Vec::new(),
        }
    }

    fn run(&mut self) {
        while self.pos < self.input.len() {
            if self.input.as_bytes()[self.pos] == b'<' {
                if let Some((token, tag_len)) = self.match_tag() {
                    self.flush_text();
                    self.tokens.push(token);
                    self.pos += tag_len;
                    self.text_start = self.pos;
                    continue;
                }
            }
            // Not a recognized tag boundary: the byte belongs to text.
            self.pos += self.char_len();
        }
        self.flush_text();
    }

    /// Try to match one of the supported tags at the current position.
    /// Returns the token and the tag's byte length without consuming.
    fn match_tag(&self) -> Option<(InlineToken, usize)> {
        let rest = &self.input[self.pos..];

        for (literal, token) in [
            ("<b>", InlineToken::StyleStart(StyleFlag::Bold)),
            ("</b>", InlineToken::StyleEnd(StyleFlag::Bold)),
            ("<i>", InlineToken::StyleStart(StyleFlag::Italic)),
            ("</i>", InlineToken::StyleEnd(StyleFlag::Italic)),
            ("</a>", InlineToken::LinkEnd),
        ] {
            if starts_with_ignore_case(rest, literal) {
                return Some((token, literal.len()));
            }
        }

        // `<a href="URL">` with a non-empty quoted target.
        const OPEN: &str = "<a href=\"";
        if starts_with_ignore_case(rest, OPEN) {
            let after = &rest[OPEN.len()..];
            let quote = after.find('"')?;
            if quote == 0 || !after[quote + 1..].starts_with('>') {
                return None;
            }
            let url = after[..quote].to_string();
            return Some((InlineToken::LinkStart(url), OPEN.len() + quote + 2));
        }

        None
    }

    fn flush_text(&mut self) {
        if self.text_start < self.pos {
            self.tokens.push(InlineToken::Text(
                self.input[self.text_start..self.pos].to_string(),
            ));
        }
    }

    fn char_len(&self) -> usize {
        self.input[self.pos..]
            .chars()
            .next()
            .map(|c| c.len_utf8())
            .unwrap_or(1)
    }
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    // Byte-wise so a multi-byte char straddling the prefix length cannot
    // split a str slice.
    let (s, p) = (s.as_bytes(), prefix.as_bytes());
    s.len() >= p.len() && s[..p.len()].eq_ignore_ascii_case(p)
}

// ---------------------------------------------------------------------------
// Style resolution – pure fold, no page side effects
// ---------------------------------------------------------------------------

/// Fold a token stream into styled runs.
///
/// Style toggles mutate the accumulator; each text token snapshots it.
/// Reaching the end of the stream closes any still-open styles and links,
/// so unbalanced input degrades to at worst a styled tail, never an error.
pub fn resolve_runs(tokens: &[InlineToken]) -> Vec<StyledRun> {
    let mut state = StyleState::default();
    let mut runs = Vec::new();

    for token in tokens {
        if let InlineToken::Text(text) = token {
            if !text.is_empty() {
                runs.push(StyledRun {
                    text: text.clone(),
                    bold: state.bold,
                    italic: state.italic,
                    link: state.active_link.clone(),
                });
            }
        } else {
            state.apply(token);
        }
    }

    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> InlineToken {
        InlineToken::Text(s.to_string())
    }

    #[test]
    fn parse_bold_tags() {
        let tokens = parse_inline("Text <b>bold</b> normal");
        assert_eq!(
            tokens,
            vec![
                text("Text "),
                InlineToken::StyleStart(StyleFlag::Bold),
                text("bold"),
                InlineToken::StyleEnd(StyleFlag::Bold),
                text(" normal"),
            ]
        );
    }

    #[test]
    fn parse_link_tags() {
        let tokens = parse_inline(r#"Visit <a href="https://example.com">site</a> now"#);
        assert_eq!(
            tokens,
            vec![
                text("Visit "),
                InlineToken::LinkStart("https://example.com".to_string()),
                text("site"),
                InlineToken::LinkEnd,
                text(" now"),
            ]
        );
    }

    #[test]
    fn parse_mixed_formatting() {
        let tokens = parse_inline("<b>Bold <i>and italic</i></b>");
        assert!(tokens.contains(&InlineToken::StyleStart(StyleFlag::Bold)));
        assert!(tokens.contains(&InlineToken::StyleStart(StyleFlag::Italic)));
        assert!(tokens.contains(&InlineToken::StyleEnd(StyleFlag::Italic)));
        assert!(tokens.contains(&InlineToken::StyleEnd(StyleFlag::Bold)));
    }

    #[test]
    fn tags_match_case_insensitively() {
        let tokens = parse_inline("<B>x</B> <A HREF=\"u\">y</A>");
        assert_eq!(tokens[0], InlineToken::StyleStart(StyleFlag::Bold));
        assert_eq!(tokens[3], InlineToken::LinkStart("u".to_string()));
    }

    #[test]
    fn unsupported_tags_stay_literal() {
        let tokens = parse_inline("a <u>b</u> <span>c</span>");
        assert_eq!(tokens, vec![text("a <u>b</u> <span>c</span>")]);
    }

    #[test]
    fn malformed_anchor_stays_literal() {
        // Missing closing quote and empty href are both not anchor starts.
        assert_eq!(
            parse_inline(r#"<a href="oops>x"#),
            vec![text(r#"<a href="oops>x"#)]
        );
        assert_eq!(
            parse_inline(r#"<a href="">x</a>"#),
            vec![text(r#"<a href="">x"#), InlineToken::LinkEnd]
        );
    }

    #[test]
    fn fragment_links_tokenize_literally() {
        // Fragment stripping is the extractor's job; the parser takes the
        // anchor it is given.
        let tokens = parse_inline(r##"<a href="#section">jump</a>"##);
        assert_eq!(tokens[0], InlineToken::LinkStart("#section".to_string()));
    }

    #[test]
    fn text_concatenation_equals_input_with_tags_stripped() {
        let input = r#"A <b>b</b> c <i>d <a href="u">e</a></i> f"#;
        let stripped: String = parse_inline(input)
            .iter()
            .filter_map(|t| match t {
                InlineToken::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(stripped, "A b c d e f");
    }

    #[test]
    fn resolve_runs_snapshots_state() {
        let runs = resolve_runs(&parse_inline("<b>Bold <i>both</i></b> plain"));
        assert_eq!(runs.len(), 3);
        assert!(runs[0].bold && !runs[0].italic);
        assert!(runs[1].bold && runs[1].italic);
        assert!(!runs[2].bold && !runs[2].italic);
    }

    #[test]
    fn unclosed_styles_do_not_leak_past_the_fold() {
        let runs = resolve_runs(&parse_inline("<b>never closed"));
        assert_eq!(runs.len(), 1);
        assert!(runs[0].bold);
        // A fresh paragraph starts from a fresh accumulator.
        let next = resolve_runs(&parse_inline("clean"));
        assert!(!next[0].bold);
    }

    #[test]
    fn link_state_carries_url() {
        let runs = resolve_runs(&parse_inline(r#"<a href="https://e.com">in</a> out"#));
        assert_eq!(runs[0].link.as_deref(), Some("https://e.com"));
        assert!(runs[1].link.is_none());
    }
}

//! Inline tokenizer: emphasis and citation placeholders.
//!
//! Strong (`**`) is resolved before emphasis (`*`). An emphasis span skips
//! over complete strong spans while looking for its closer, so it can contain
//! one but never closes inside one. Delimiters only close on the same line.
//! Unclosed delimiters are kept as literal text.

use super::{CitationNode, Inline};
use crate::markers::{PLACEHOLDER_OPEN, Token, read_placeholder};

/// Accumulates inline nodes, merging adjacent text.
#[derive(Default)]
struct InlineBuilder {
    nodes: Vec<Inline>,
}

impl InlineBuilder {
    fn text(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        if let Some(Inline::Text(last)) = self.nodes.last_mut() {
            last.push_str(s);
        } else {
            self.nodes.push(Inline::Text(s.to_string()));
        }
    }

    fn node(&mut self, node: Inline) {
        self.nodes.push(node);
    }
}

/// Byte offset of the end of the line containing `from`.
fn line_end(text: &str, from: usize) -> usize {
    text[from..].find('\n').map_or(text.len(), |n| from + n)
}

/// Find the `**` closing a strong span whose content starts at `from`.
fn strong_close(text: &str, from: usize) -> Option<usize> {
    let end = line_end(text, from);
    // content must be non-empty
    let search_from = from + text[from..end].chars().next()?.len_utf8();
    text[search_from..end].find("**").map(|n| search_from + n)
}

/// Find the `*` closing an emphasis span whose content starts at `from`.
fn emphasis_close(text: &str, from: usize) -> Option<usize> {
    let end = line_end(text, from);
    let mut j = from;
    while j < end {
        let rest = &text[j..end];
        if rest.starts_with("**") {
            match strong_close(text, j + 2) {
                Some(close) if close + 2 <= end => j = close + 2,
                _ => j += 2,
            }
            continue;
        }
        if rest.starts_with('*') {
            return (j > from).then_some(j);
        }
        j += rest.chars().next().map_or(1, char::len_utf8);
    }
    None
}

/// Tokenize inline text. `citations[i]` resolves placeholder token `i`.
pub fn parse_inlines(text: &str, citations: &[CitationNode]) -> Vec<Inline> {
    let mut out = InlineBuilder::default();
    let mut text_start = 0;
    let mut i = 0;

    while i < text.len() {
        let rest = &text[i..];

        if rest.starts_with("**") {
            if let Some(close) = strong_close(text, i + 2) {
                out.text(&text[text_start..i]);
                out.node(Inline::Strong(parse_inlines(&text[i + 2..close], citations)));
                i = close + 2;
                text_start = i;
            } else {
                i += 2;
            }
            continue;
        }

        if rest.starts_with('*') {
            if let Some(close) = emphasis_close(text, i + 1) {
                out.text(&text[text_start..i]);
                out.node(Inline::Emphasis(parse_inlines(&text[i + 1..close], citations)));
                i = close + 1;
                text_start = i;
            } else {
                i += 1;
            }
            continue;
        }

        if rest.starts_with(PLACEHOLDER_OPEN) {
            match read_placeholder(rest) {
                Some((Token::Citation(index), len)) => {
                    if let Some(node) = citations.get(index) {
                        out.text(&text[text_start..i]);
                        out.node(Inline::Citation(node.clone()));
                        i += len;
                        text_start = i;
                        continue;
                    }
                }
                Some((Token::LiteralOpen, len)) => {
                    out.text(&text[text_start..i]);
                    out.text(&text[i..i + PLACEHOLDER_OPEN.len_utf8()]);
                    i += len;
                    text_start = i;
                    continue;
                }
                None => {}
            }
            i += PLACEHOLDER_OPEN.len_utf8();
            continue;
        }

        i += rest.chars().next().map_or(1, char::len_utf8);
    }
    out.text(&text[text_start..]);

    out.nodes
}

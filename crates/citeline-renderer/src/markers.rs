//! Citation marker extraction and per-section numbering.
//!
//! Report text carries markers of the literal form `[[Src:<digits>]]`. Parsing
//! replaces each marker with an opaque placeholder token and assigns display
//! numbers in first-seen order: the first marker for a source gets 1, the next
//! unseen source gets 2, and repeats reuse their number.
//!
//! Placeholder tokens are `U+E000 <index> U+E001`, where `index` points into
//! [`ParsedMarkers::placeholders`]. The delimiters are private-use code points,
//! so no markdown rule can match inside them. A `U+E000` already present in the
//! input is written as the empty token `U+E000 U+E001`, which decodes back to
//! the literal character, so input text can never forge a citation.

use std::collections::HashMap;
use std::sync::LazyLock;

use citeline_common::CitationRef;
use regex::Regex;
use serde::Serialize;
use smol_str::{SmolStr, format_smolstr};

pub static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[Src:(\d+)\]\]").unwrap());

/// Opens a placeholder token.
pub const PLACEHOLDER_OPEN: char = '\u{E000}';
/// Closes a placeholder token.
pub const PLACEHOLDER_CLOSE: char = '\u{E001}';

/// Normalized source id for the digits captured from a marker: `3` -> `src_3`.
pub fn source_id_for(digits: &str) -> SmolStr {
    format_smolstr!("src_{}", digits)
}

/// A parsed marker: which source it cites and the number shown for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placeholder {
    pub source_id: SmolStr,
    pub display_number: u32,
}

/// Insertion-ordered `source_id -> display_number` table for one section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationNumbering {
    order: Vec<SmolStr>,
    numbers: HashMap<SmolStr, u32>,
}

impl CitationNumbering {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number for `source_id`, assigning the next one if it is unseen.
    pub fn assign(&mut self, source_id: &SmolStr) -> u32 {
        if let Some(&number) = self.numbers.get(source_id) {
            return number;
        }
        self.order.push(source_id.clone());
        let number = self.order.len() as u32;
        self.numbers.insert(source_id.clone(), number);
        number
    }

    pub fn number_for(&self, source_id: &str) -> Option<u32> {
        self.numbers.get(source_id).copied()
    }

    pub fn source_for(&self, display_number: u32) -> Option<&SmolStr> {
        let index = (display_number as usize).checked_sub(1)?;
        self.order.get(index)
    }

    /// Distinct sources referenced.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// `(source_id, display_number)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (&SmolStr, u32)> {
        self.order
            .iter()
            .enumerate()
            .map(|(i, id)| (id, i as u32 + 1))
    }
}

/// Result of [`parse_markers`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMarkers {
    /// Input text with every marker replaced by a placeholder token.
    pub text: String,
    pub numbering: CitationNumbering,
    /// One entry per marker, in document order. Token indices point here.
    pub placeholders: Vec<Placeholder>,
}

impl ParsedMarkers {
    pub fn placeholder(&self, index: usize) -> Option<&Placeholder> {
        self.placeholders.get(index)
    }
}

/// Replace markers with placeholder tokens and number their sources.
///
/// Text between markers is copied through unchanged, apart from escaping
/// [`PLACEHOLDER_OPEN`]. Anything that is not exactly `[[Src:<digits>]]` stays
/// literal.
pub fn parse_markers(text: &str) -> ParsedMarkers {
    let mut parsed = ParsedMarkers {
        text: String::with_capacity(text.len()),
        ..Default::default()
    };
    let mut last = 0;

    for caps in MARKER_RE.captures_iter(text) {
        let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_escaped(&mut parsed.text, &text[last..whole.start()]);

        let source_id = source_id_for(digits.as_str());
        let display_number = parsed.numbering.assign(&source_id);
        push_placeholder_token(&mut parsed.text, parsed.placeholders.len());
        parsed.placeholders.push(Placeholder {
            source_id,
            display_number,
        });

        last = whole.end();
    }
    push_escaped(&mut parsed.text, &text[last..]);

    tracing::trace!(
        markers = parsed.placeholders.len(),
        sources = parsed.numbering.len(),
        "parsed citation markers"
    );
    parsed
}

/// Count well-formed markers in `text`.
pub fn count_markers(text: &str) -> usize {
    MARKER_RE.find_iter(text).count()
}

/// Remove markers, returning the clean text and where each marker stood.
///
/// Offsets are char offsets into the returned text, with `start_index ==
/// end_index`. The clean text is trimmed and the offsets shifted to match.
pub fn strip_markers(text: &str) -> (String, Vec<CitationRef>) {
    let mut clean = String::with_capacity(text.len());
    let mut citations = Vec::new();
    let mut last = 0;
    let mut char_pos = 0usize;

    for caps in MARKER_RE.captures_iter(text) {
        let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let between = &text[last..whole.start()];
        clean.push_str(between);
        char_pos += between.chars().count();
        citations.push(CitationRef {
            start_index: char_pos,
            end_index: char_pos,
            source_id: source_id_for(digits.as_str()),
        });
        last = whole.end();
    }
    clean.push_str(&text[last..]);

    let leading = clean.chars().take_while(|c| c.is_whitespace()).count();
    let trimmed = clean.trim().to_string();
    let len = trimmed.chars().count();
    for citation in &mut citations {
        let pos = citation.start_index.saturating_sub(leading).min(len);
        citation.start_index = pos;
        citation.end_index = pos;
    }

    (trimmed, citations)
}

fn push_escaped(out: &mut String, text: &str) {
    let mut rest = text;
    while let Some(at) = rest.find(PLACEHOLDER_OPEN) {
        let after = at + PLACEHOLDER_OPEN.len_utf8();
        out.push_str(&rest[..after]);
        out.push(PLACEHOLDER_CLOSE);
        rest = &rest[after..];
    }
    out.push_str(rest);
}

pub(crate) fn push_placeholder_token(out: &mut String, index: usize) {
    use std::fmt::Write;
    out.push(PLACEHOLDER_OPEN);
    let _ = write!(out, "{index}");
    out.push(PLACEHOLDER_CLOSE);
}

/// A token read back out of placeholder text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token {
    /// Placeholder for the marker at this index.
    Citation(usize),
    /// An escaped literal [`PLACEHOLDER_OPEN`] from the input.
    LiteralOpen,
}

/// Read a token at the start of `s`.
///
/// Returns the token and its byte length.
pub(crate) fn read_placeholder(s: &str) -> Option<(Token, usize)> {
    let rest = s.strip_prefix(PLACEHOLDER_OPEN)?;
    let close = rest.find(PLACEHOLDER_CLOSE)?;
    let len = PLACEHOLDER_OPEN.len_utf8() + close + PLACEHOLDER_CLOSE.len_utf8();
    let digits = &rest[..close];
    if digits.is_empty() {
        return Some((Token::LiteralOpen, len));
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index = digits.parse().ok()?;
    Some((Token::Citation(index), len))
}

//! Report data model: sources, sections, and the wire payload they arrive in.
//!
//! The backend delivers one record per report section. Each carries the
//! section text with embedded `[[Src:N]]` markers (`cited_text`) and the
//! source excerpts those markers point at. Everything here is plain data;
//! numbering and rendering live in `citeline-renderer`.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, ToSmolStr};

use crate::error::ParseError;

/// Page marker the ingestion step embeds in chunk text.
static PAGE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n--- PAGE (\d+) ---").unwrap());

/// A page reference as sent by the backend: either a bare number or a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageNumber {
    Number(i64),
    Text(String),
}

impl PageNumber {
    /// Display label for the page, or `None` if the value carries nothing.
    ///
    /// Numbers and digit-only strings become `Page N`; anything else is
    /// already a label and is passed through trimmed.
    pub fn label(&self) -> Option<String> {
        match self {
            PageNumber::Number(n) => Some(format!("Page {n}")),
            PageNumber::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    None
                } else if s.chars().all(|c| c.is_ascii_digit()) {
                    Some(format!("Page {s}"))
                } else {
                    Some(s.to_string())
                }
            }
        }
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageNumber::Number(n) => write!(f, "{n}"),
            PageNumber::Text(s) => f.write_str(s),
        }
    }
}

/// Extract a `Page N` label from the `--- PAGE N ---` marker in chunk text.
pub fn page_from_chunk(chunk_text: &str) -> Option<String> {
    PAGE_MARKER_RE
        .captures(chunk_text)
        .and_then(|caps| caps.get(1))
        .map(|m| format!("Page {}", m.as_str()))
}

/// A source excerpt: one page (or chunk) of an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub source_id: SmolStr,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub page_number: Option<PageNumber>,
    #[serde(default)]
    pub raw_text: Option<String>,
}

impl Source {
    pub fn new(source_id: impl Into<SmolStr>) -> Self {
        Self {
            source_id: source_id.into(),
            title: None,
            page_number: None,
            raw_text: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_page(mut self, page: PageNumber) -> Self {
        self.page_number = Some(page);
        self
    }

    pub fn with_raw_text(mut self, raw_text: impl Into<String>) -> Self {
        self.raw_text = Some(raw_text.into());
        self
    }

    /// Page label for display.
    ///
    /// Falls back to the page marker inside `raw_text` when the backend
    /// sent no usable page number.
    pub fn page_label(&self) -> Option<String> {
        self.page_number
            .as_ref()
            .and_then(PageNumber::label)
            .or_else(|| self.raw_text.as_deref().and_then(page_from_chunk))
    }
}

/// Backend provenance for one citation.
///
/// Offsets index the section's clean text. Accepted and kept, but display
/// numbering never depends on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationRef {
    pub start_index: usize,
    pub end_index: usize,
    pub source_id: SmolStr,
}

/// One logical part of a report, with its own citation numbering scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub key: SmolStr,
    pub title: String,
    #[serde(default)]
    pub cited_text: String,
    #[serde(default)]
    pub clean_text: Option<String>,
    #[serde(default)]
    pub sources: HashMap<SmolStr, Source>,
    #[serde(default)]
    pub citations: Vec<CitationRef>,
}

impl Section {
    pub fn new(
        key: impl Into<SmolStr>,
        title: impl Into<String>,
        cited_text: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            cited_text: cited_text.into(),
            ..Default::default()
        }
    }

    /// Add a source, keyed by its id. A later source with the same id replaces the earlier one.
    pub fn with_source(mut self, source: Source) -> Self {
        self.sources.insert(source.source_id.clone(), source);
        self
    }

    pub fn source(&self, source_id: &str) -> Option<&Source> {
        self.sources.get(source_id)
    }
}

/// Wire shape of a source inside a section payload. The id is the map key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub page_number: Option<PageNumber>,
    #[serde(default)]
    pub raw_text: Option<String>,
}

/// Wire shape of one section as delivered by the analysis backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionPayload {
    /// Explicit key; derived from `section_name` when absent.
    #[serde(default)]
    pub key: Option<String>,
    pub section_name: String,
    #[serde(default)]
    pub clean_text: Option<String>,
    #[serde(default)]
    pub cited_text: Option<String>,
    #[serde(default)]
    pub citations: Vec<CitationRef>,
    #[serde(default)]
    pub sources: HashMap<String, SourcePayload>,
}

impl SectionPayload {
    pub fn section_key(&self) -> SmolStr {
        match self.key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_smolstr(),
            _ => section_key_from_name(&self.section_name),
        }
    }

    pub fn into_section(self) -> Section {
        let key = self.section_key();
        let sources = self
            .sources
            .into_iter()
            .map(|(id, wire)| {
                let source_id = id.to_smolstr();
                let source = Source {
                    source_id: source_id.clone(),
                    title: wire.title,
                    page_number: wire.page_number,
                    raw_text: wire.raw_text,
                };
                (source_id, source)
            })
            .collect();

        Section {
            key,
            title: self.section_name,
            cited_text: self.cited_text.unwrap_or_default(),
            clean_text: self.clean_text,
            sources,
            citations: self.citations,
        }
    }
}

/// A full report as delivered by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPayload {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub sections: Vec<SectionPayload>,
}

impl ReportPayload {
    /// Parse a payload from JSON text, keeping the text for error reporting.
    pub fn from_json(name: &str, src: &str) -> Result<Self, ParseError> {
        serde_json::from_str(src).map_err(|err| ParseError::json(err, name, src))
    }

    pub fn into_sections(self) -> Vec<Section> {
        self.sections
            .into_iter()
            .map(SectionPayload::into_section)
            .collect()
    }
}

/// Derive a section key from a display name: `"Key Products"` -> `key_products`.
pub fn section_key_from_name(name: &str) -> SmolStr {
    let mut key = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_sep && !key.is_empty() {
                key.push('_');
            }
            pending_sep = false;
            key.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    key.to_smolstr()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_label_from_number() {
        let source = Source::new("src_1").with_page(PageNumber::Number(5));
        assert_eq!(source.page_label().as_deref(), Some("Page 5"));

        let source = Source::new("src_1").with_page(PageNumber::Text("12".into()));
        assert_eq!(source.page_label().as_deref(), Some("Page 12"));

        let source = Source::new("src_1").with_page(PageNumber::Text("Page 7".into()));
        assert_eq!(source.page_label().as_deref(), Some("Page 7"));
    }

    #[test]
    fn test_page_label_falls_back_to_chunk_marker() {
        let source = Source::new("src_2")
            .with_page(PageNumber::Text("  ".into()))
            .with_raw_text("Revenue grew.\n--- PAGE 14 ---\nMore text");
        assert_eq!(source.page_label().as_deref(), Some("Page 14"));

        let source = Source::new("src_3").with_raw_text("no marker here");
        assert_eq!(source.page_label(), None);
    }

    #[test]
    fn test_page_from_chunk_takes_first_marker() {
        let text = "a\n--- PAGE 3 ---\nb\n--- PAGE 4 ---";
        assert_eq!(page_from_chunk(text).as_deref(), Some("Page 3"));
        // marker must follow a newline
        assert_eq!(page_from_chunk("--- PAGE 3 ---"), None);
    }

    #[test]
    fn test_section_key_from_name() {
        assert_eq!(section_key_from_name("Key Products"), "key_products");
        assert_eq!(section_key_from_name("  Overview  "), "overview");
        assert_eq!(section_key_from_name("M&A / Strategy"), "m_a_strategy");
        assert_eq!(section_key_from_name(""), "");
    }

    #[test]
    fn test_payload_into_sections() {
        let json = r#"{
            "company_name": "Acme",
            "sections": [
                {
                    "section_name": "Company Overview",
                    "clean_text": "Acme makes anvils.",
                    "cited_text": "Acme makes anvils [[Src:3]].",
                    "citations": [{"start_index": 17, "end_index": 17, "source_id": "src_3"}],
                    "sources": {
                        "src_3": {"title": "Annual Report", "page_number": 4, "raw_text": "anvils"}
                    }
                },
                {"key": "products", "section_name": "Products", "sources": {}}
            ]
        }"#;

        let payload = ReportPayload::from_json("report.json", json).unwrap();
        assert_eq!(payload.company_name.as_deref(), Some("Acme"));

        let sections = payload.into_sections();
        assert_eq!(sections.len(), 2);

        let overview = &sections[0];
        assert_eq!(overview.key, "company_overview");
        assert_eq!(overview.title, "Company Overview");
        assert_eq!(overview.citations.len(), 1);
        let source = overview.source("src_3").unwrap();
        assert_eq!(source.source_id, "src_3");
        assert_eq!(source.title.as_deref(), Some("Annual Report"));
        assert_eq!(source.page_number, Some(PageNumber::Number(4)));

        let products = &sections[1];
        assert_eq!(products.key, "products");
        assert!(products.cited_text.is_empty());
        assert!(products.sources.is_empty());
    }

    #[test]
    fn test_payload_null_fields() {
        let json = r#"{"sections": [{"section_name": "Risks", "cited_text": null,
            "sources": {"src_1": {"title": null, "page_number": null, "raw_text": null}}}]}"#;
        let sections = ReportPayload::from_json("r.json", json).unwrap().into_sections();
        assert_eq!(sections[0].cited_text, "");
        assert_eq!(sections[0].source("src_1").unwrap().page_label(), None);
    }

    #[test]
    fn test_payload_parse_error_has_location() {
        let json = "{\n  \"sections\": [\n    {\"section_name\": 5}\n  ]\n}";
        let err = ReportPayload::from_json("bad.json", json).unwrap_err();
        let (line, _col) = err.line_col().unwrap();
        assert_eq!(line, 3);
    }
}

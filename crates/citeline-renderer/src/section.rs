//! Rendered sections and the report view that owns them.

use std::collections::HashMap;

use citeline_common::{CitationRef, ReportPayload, Section, SmolStr, Source, SourceLookup};
use serde::Serialize;
use tracing::{debug, warn};

use crate::html::{push_section_html, write_html};
use crate::markdown::{CitationNode, Document, RenderOptions, render_markdown};
use crate::markers::{CitationNumbering, parse_markers, strip_markers};

/// A source as cited in a section, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CitedSource<'a> {
    pub display_number: u32,
    pub source_id: &'a SmolStr,
    /// `None` when the section does not carry the cited source.
    pub source: Option<&'a Source>,
}

/// A section after marker parsing and markdown rendering.
///
/// Numbering and document come from the same pass over `cited_text`, so the
/// number shown for a citation always matches its entry in [`numbering`].
///
/// [`numbering`]: RenderedSection::numbering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSection {
    section: Section,
    numbering: CitationNumbering,
    document: Document,
    clean_text: String,
    citation_refs: Vec<CitationRef>,
    marker_count: usize,
}

impl RenderedSection {
    pub fn render(section: &Section, options: &RenderOptions) -> Self {
        Self::from_section(section.clone(), options)
    }

    pub fn from_section(section: Section, options: &RenderOptions) -> Self {
        let parsed = parse_markers(&section.cited_text);
        let nodes: Vec<CitationNode> = parsed
            .placeholders
            .iter()
            .map(|p| CitationNode {
                source_id: p.source_id.clone(),
                section_key: section.key.clone(),
                display_number: p.display_number,
            })
            .collect();
        let document = render_markdown(&parsed.text, &nodes, options);

        // the backend may omit clean text; derive it the same way it would
        let (derived_clean, derived_refs) = strip_markers(&section.cited_text);
        let clean_text = section.clean_text.clone().unwrap_or(derived_clean);
        let citation_refs = if section.citations.is_empty() {
            derived_refs
        } else {
            section.citations.clone()
        };

        let rendered = Self {
            marker_count: parsed.placeholders.len(),
            numbering: parsed.numbering,
            document,
            clean_text,
            citation_refs,
            section,
        };

        debug!(
            section = %rendered.section.key,
            markers = rendered.marker_count,
            sources = rendered.numbering.len(),
            blocks = rendered.document.len(),
            "rendered section"
        );
        for source_id in rendered.unresolved_citations() {
            warn!(
                section = %rendered.section.key,
                source_id = %source_id,
                "citation has no matching source"
            );
        }

        rendered
    }

    pub fn key(&self) -> &SmolStr {
        &self.section.key
    }

    pub fn title(&self) -> &str {
        &self.section.title
    }

    pub fn section(&self) -> &Section {
        &self.section
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn numbering(&self) -> &CitationNumbering {
        &self.numbering
    }

    pub fn sources(&self) -> &HashMap<SmolStr, Source> {
        &self.section.sources
    }

    /// Source for `source_id` within this section only.
    pub fn lookup_source(&self, source_id: &str) -> Option<&Source> {
        self.section.source(source_id)
    }

    /// Section text with markers removed.
    pub fn clean_text(&self) -> &str {
        &self.clean_text
    }

    /// Citation positions in [`clean_text`](Self::clean_text).
    pub fn citation_refs(&self) -> &[CitationRef] {
        &self.citation_refs
    }

    /// Number of markers in the section text, repeats included.
    pub fn marker_count(&self) -> usize {
        self.marker_count
    }

    /// Cited sources in display-number order, one entry per distinct source.
    pub fn referenced_sources(&self) -> Vec<CitedSource<'_>> {
        self.numbering
            .iter()
            .map(|(source_id, display_number)| CitedSource {
                display_number,
                source_id,
                source: self.section.source(source_id),
            })
            .collect()
    }

    /// Cited source ids the section carries no source for.
    pub fn unresolved_citations(&self) -> Vec<&SmolStr> {
        self.numbering
            .iter()
            .filter(|(source_id, _)| !self.section.sources.contains_key(*source_id))
            .map(|(source_id, _)| source_id)
            .collect()
    }

    /// Body HTML, without the section wrapper.
    pub fn html(&self) -> String {
        write_html(&self.document)
    }

    /// Body HTML inside a `<section>` element with the title as `<h2>`.
    pub fn section_html(&self) -> String {
        let mut out = String::new();
        push_section_html(&mut out, &self.section.key, &self.section.title, &self.document);
        out
    }
}

impl SourceLookup for RenderedSection {
    fn lookup_source(&self, section_key: &str, source_id: &str) -> Option<&Source> {
        if self.section.key == section_key {
            self.section.source(source_id)
        } else {
            None
        }
    }
}

/// All rendered sections of the current report, in payload order.
///
/// Lookups are keyed by `(section_key, source_id)`, so the same source id in
/// two sections resolves to each section's own source.
#[derive(Debug, Clone, Default)]
pub struct ReportView {
    options: RenderOptions,
    company_name: Option<String>,
    sections: Vec<RenderedSection>,
    by_key: HashMap<SmolStr, usize>,
}

impl ReportView {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn from_payload(payload: ReportPayload, options: RenderOptions) -> Self {
        let mut view = Self::new(options);
        view.load(payload);
        view
    }

    /// Replace the current report with `payload`.
    pub fn load(&mut self, payload: ReportPayload) {
        self.company_name = payload.company_name.clone();
        self.load_sections(payload.into_sections());
    }

    /// Replace the current sections.
    ///
    /// A section whose key was already seen replaces the earlier one in place.
    pub fn load_sections(&mut self, sections: Vec<Section>) {
        self.sections.clear();
        self.by_key.clear();
        for section in sections {
            let rendered = RenderedSection::from_section(section, &self.options);
            match self.by_key.get(rendered.key()) {
                Some(&index) => {
                    warn!(section = %rendered.key(), "duplicate section key, keeping the later one");
                    self.sections[index] = rendered;
                }
                None => {
                    self.by_key.insert(rendered.key().clone(), self.sections.len());
                    self.sections.push(rendered);
                }
            }
        }
        debug!(sections = self.sections.len(), "loaded report");
    }

    pub fn clear(&mut self) {
        self.company_name = None;
        self.sections.clear();
        self.by_key.clear();
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn company_name(&self) -> Option<&str> {
        self.company_name.as_deref()
    }

    pub fn section(&self, key: &str) -> Option<&RenderedSection> {
        self.by_key.get(key).map(|&index| &self.sections[index])
    }

    pub fn sections(&self) -> &[RenderedSection] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Every section as a `<section>` element, separated by newlines.
    pub fn html(&self) -> String {
        let mut out = String::new();
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            push_section_html(&mut out, section.key(), section.title(), section.document());
        }
        out
    }

    /// Total markers across all sections.
    pub fn marker_count(&self) -> usize {
        self.sections.iter().map(RenderedSection::marker_count).sum()
    }
}

impl SourceLookup for ReportView {
    fn lookup_source(&self, section_key: &str, source_id: &str) -> Option<&Source> {
        self.section(section_key)?.lookup_source(source_id)
    }
}

//! citeline-renderer
//!
//! Turns a section's marker-annotated text into numbered citations and a
//! rendered document:
//!
//! 1. [`markers`] swaps every `[[Src:N]]` marker for an opaque placeholder token
//!    and numbers sources in first-seen order.
//! 2. [`markdown`] tokenizes the placeholder text into a [`Document`] tree in
//!    which citations are leaves.
//! 3. [`html`] writes the tree out.
//!
//! [`section`] ties these together per section and keeps a [`ReportView`] of
//! the whole report that resolves citations back to their sources.

pub mod html;
pub mod markdown;
pub mod markers;
pub mod section;

pub use html::{push_html, push_section_html, write_html, write_html_fmt, write_html_io};
pub use markdown::{
    Alignment, Block, Cell, CitationNode, Document, Inline, RenderOptions, Table,
    inline_plain_text, render_markdown,
};
pub use markers::{
    CitationNumbering, ParsedMarkers, Placeholder, count_markers, parse_markers, strip_markers,
};
pub use section::{CitedSource, RenderedSection, ReportView};

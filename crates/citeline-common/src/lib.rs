//! citeline-common: shared types for the citation engine.
//!
//! This crate provides:
//! - The report data model (`Source`, `Section`, wire payloads)
//! - `SourceLookup` trait for resolving a citation to its source
//! - Error types with `miette` diagnostics
//! - Configuration loading
//! - Optional tracing setup for binaries (`telemetry` feature)

pub mod config;
pub mod error;
pub mod lookup;
pub mod model;
#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use smol_str::SmolStr;

pub use crate::config::{Config, FileStore, Loader, RenderConfig, Saver, TooltipConfig};
pub use crate::error::{CitelineError, ParseError, ParseErrorKind};
pub use crate::lookup::SourceLookup;
pub use crate::model::{
    CitationRef, PageNumber, ReportPayload, Section, SectionPayload, Source, SourcePayload,
    page_from_chunk, section_key_from_name,
};

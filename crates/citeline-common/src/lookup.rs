//! Source resolution for rendered citations.
//!
//! The popover needs to go from a citation element's `(section_key, source_id)`
//! attributes back to the source record. Implementations are provided by
//! whatever owns the rendered report (e.g. `citeline-renderer`'s `ReportView`).

use crate::model::{Section, Source};

/// Resolves a citation to its source excerpt, scoped by section.
pub trait SourceLookup {
    /// Get the source cited as `source_id` within section `section_key`.
    ///
    /// Returns `None` when the section is unknown or does not carry the source.
    fn lookup_source(&self, section_key: &str, source_id: &str) -> Option<&Source>;
}

/// Unit type implementation - nothing resolves.
impl SourceLookup for () {
    fn lookup_source(&self, _section_key: &str, _source_id: &str) -> Option<&Source> {
        None
    }
}

/// A single section resolves only its own key.
impl SourceLookup for Section {
    fn lookup_source(&self, section_key: &str, source_id: &str) -> Option<&Source> {
        if self.key == section_key {
            self.source(source_id)
        } else {
            None
        }
    }
}

impl SourceLookup for [Section] {
    fn lookup_source(&self, section_key: &str, source_id: &str) -> Option<&Source> {
        self.iter()
            .find(|section| section.key == section_key)
            .and_then(|section| section.source(source_id))
    }
}

impl<T: SourceLookup + ?Sized> SourceLookup for &T {
    fn lookup_source(&self, section_key: &str, source_id: &str) -> Option<&Source> {
        (**self).lookup_source(section_key, source_id)
    }
}

impl<T: SourceLookup> SourceLookup for Option<T> {
    fn lookup_source(&self, section_key: &str, source_id: &str) -> Option<&Source> {
        self.as_ref()
            .and_then(|lookup| lookup.lookup_source(section_key, source_id))
    }
}

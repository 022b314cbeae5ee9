//! Error types for citeline

use miette::{Diagnostic, NamedSource, SourceOffset, SourceSpan};
use std::borrow::Cow;

/// Main error type for citeline operations
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum CitelineError {
    /// IO error
    #[error(transparent)]
    #[diagnostic(code(citeline::io))]
    Io(#[from] std::io::Error),

    /// Parse error with source location
    #[error(transparent)]
    #[diagnostic_source]
    Parse(#[from] ParseError),

    /// Configuration could not be loaded or saved
    #[error("configuration error: {0}")]
    #[diagnostic(code(citeline::config))]
    Config(String),
}

/// Parse error with source code location information
#[derive(thiserror::Error, Debug, Diagnostic)]
#[error("parse error: {}", self.kind)]
#[diagnostic(code(citeline::parse))]
pub struct ParseError {
    #[diagnostic_source]
    kind: ParseErrorKind,
    #[source_code]
    src: NamedSource<Cow<'static, str>>,
    #[label("error")]
    err_location: SourceSpan,
    err_line_col: Option<(usize, usize)>,
    #[help]
    advice: Option<String>,
}

impl ParseError {
    /// Build from a serde_json error, pointing into the text that failed to parse.
    pub fn json(err: serde_json::Error, name: &str, src: &str) -> Self {
        let line = err.line();
        let column = err.column();
        let advice = match err.classify() {
            serde_json::error::Category::Data => {
                Some("check the field types against the report payload format".to_string())
            }
            serde_json::error::Category::Eof => Some("the payload appears truncated".to_string()),
            _ => None,
        };
        let src = NamedSource::new(name, Cow::Owned(src.to_string()));
        let err_location = span_at(src.inner(), line, column);
        Self {
            kind: ParseErrorKind::Json(err),
            src,
            err_location,
            err_line_col: Some((line, column)),
            advice,
        }
    }

    /// Build from a toml error, pointing into the text that failed to parse.
    pub fn toml(err: toml::de::Error, name: &str, src: &str) -> Self {
        let err_location = err
            .span()
            .map(|range| SourceSpan::new(range.start.into(), range.len()))
            .unwrap_or_else(|| SourceSpan::new(0.into(), 0));
        let src = NamedSource::new(name, Cow::Owned(src.to_string()));
        let err_line_col = Some(offset_to_line_col(err_location.offset(), &src));
        Self {
            kind: ParseErrorKind::Toml(err),
            src,
            err_location,
            err_line_col,
            advice: None,
        }
    }

    /// 1-based line and column of the failure, when known.
    pub fn line_col(&self) -> Option<(usize, usize)> {
        self.err_line_col
    }

    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum ParseErrorKind {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

fn span_at(src: &str, line: usize, column: usize) -> SourceSpan {
    if line == 0 {
        return SourceSpan::new(0.into(), 0);
    }
    SourceSpan::new(SourceOffset::from_location(src, line, column.max(1)), 0)
}

fn offset_to_line_col(offset: usize, src: &NamedSource<Cow<'static, str>>) -> (usize, usize) {
    let mut line_start = 0usize;

    for (i, line) in src.inner().split_inclusive('\n').enumerate() {
        let line_end = line_start + line.len();
        if offset < line_end {
            let col = line[..offset - line_start].chars().count();
            return (i + 1, col + 1);
        }
        line_start = line_end;
    }
    (src.inner().lines().count().max(1), 1)
}

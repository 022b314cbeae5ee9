//! Constrained markdown dialect for report sections.
//!
//! Rendering runs in two stages. A line-based block scanner (`block`) splits
//! the text into headings, lists, tables, paragraphs and raw inline runs. An
//! inline tokenizer (`inline`) then turns each block's text into emphasis and
//! citation nodes. Citation placeholder tokens become [`Inline::Citation`]
//! leaves during the inline stage and are never looked at by any markdown rule.
//!
//! Supported syntax:
//! - `#`, `##`, `###` headings
//! - `**strong**` and `*emphasis*`, closed on the same line
//! - `* ` bullet items, grouped into one list per run of lines
//! - `1. ` numbered items, rendered as bare list items unless
//!   [`RenderOptions::wrap_numbered_lists`] is set
//! - pipe tables with a separator row
//! - blank-line separated paragraphs

mod block;
mod inline;

use citeline_common::RenderConfig;
use serde::Serialize;
use smol_str::SmolStr;

pub use block::parse_blocks;
pub use inline::parse_inlines;

/// Rendering switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Group consecutive numbered items into an [`Block::OrderedList`].
    pub wrap_numbered_lists: bool,
}

impl From<&RenderConfig> for RenderOptions {
    fn from(config: &RenderConfig) -> Self {
        Self {
            wrap_numbered_lists: config.wrap_numbered_lists,
        }
    }
}

/// A citation as it appears in rendered output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CitationNode {
    pub source_id: SmolStr,
    pub section_key: SmolStr,
    pub display_number: u32,
}

/// Inline content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum Inline {
    Text(String),
    Strong(Vec<Inline>),
    Emphasis(Vec<Inline>),
    Citation(CitationNode),
}

/// Column alignment from a table separator row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

/// One table cell's content.
pub type Cell = Vec<Inline>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub alignments: Vec<Alignment>,
    pub head: Vec<Cell>,
    /// Body rows, each exactly `head.len()` cells wide.
    pub rows: Vec<Vec<Cell>>,
}

/// Block-level content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading { level: u8, content: Vec<Inline> },
    Paragraph { content: Vec<Inline> },
    /// Bullet items from consecutive `* ` lines.
    List { items: Vec<Vec<Inline>> },
    /// Consecutive numbered items, only with `wrap_numbered_lists`.
    OrderedList { items: Vec<Vec<Inline>> },
    /// A numbered item outside any list container.
    ListItem { content: Vec<Inline> },
    Table(Table),
    /// Plain lines that follow another block without a blank line between.
    Inline { content: Vec<Inline> },
}

/// A rendered section body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Every citation leaf in document order.
    pub fn citations(&self) -> Vec<&CitationNode> {
        let mut out = Vec::new();
        for block in &self.blocks {
            block.for_each_inline_run(&mut |run| collect_citations(run, &mut out));
        }
        out
    }

    /// Text content without markup, blocks separated by blank lines.
    ///
    /// Citations are written as `[N]`.
    pub fn plain_text(&self) -> String {
        let mut blocks = Vec::with_capacity(self.blocks.len());
        for block in &self.blocks {
            let mut lines = Vec::new();
            block.for_each_inline_run(&mut |run| lines.push(inline_plain_text(run)));
            blocks.push(lines.join("\n"));
        }
        blocks.join("\n\n")
    }
}

impl Block {
    /// Visit each inline run held by this block (cells and items separately).
    pub fn for_each_inline_run<'a>(&'a self, f: &mut dyn FnMut(&'a [Inline])) {
        match self {
            Block::Heading { content, .. }
            | Block::Paragraph { content }
            | Block::ListItem { content }
            | Block::Inline { content } => f(content.as_slice()),
            Block::List { items } | Block::OrderedList { items } => {
                items.iter().for_each(|item| f(item.as_slice()))
            }
            Block::Table(table) => {
                table.head.iter().for_each(|cell| f(cell.as_slice()));
                table.rows.iter().flatten().for_each(|cell| f(cell.as_slice()));
            }
        }
    }
}

fn collect_citations<'a>(run: &'a [Inline], out: &mut Vec<&'a CitationNode>) {
    for inline in run {
        match inline {
            Inline::Citation(node) => out.push(node),
            Inline::Strong(children) | Inline::Emphasis(children) => {
                collect_citations(children, out)
            }
            Inline::Text(_) => {}
        }
    }
}

/// Flatten inline content to text. Citations become `[N]`.
pub fn inline_plain_text(run: &[Inline]) -> String {
    let mut out = String::new();
    push_plain_text(run, &mut out);
    out
}

fn push_plain_text(run: &[Inline], out: &mut String) {
    for inline in run {
        match inline {
            Inline::Text(text) => out.push_str(text),
            Inline::Strong(children) | Inline::Emphasis(children) => {
                push_plain_text(children, out)
            }
            Inline::Citation(node) => {
                out.push('[');
                out.push_str(&node.display_number.to_string());
                out.push(']');
            }
        }
    }
}

/// Render placeholder-annotated text into a [`Document`].
///
/// `citations[i]` is the node for placeholder token `i`. Tokens with no
/// matching entry stay in the text as-is.
pub fn render_markdown(
    text: &str,
    citations: &[CitationNode],
    options: &RenderOptions,
) -> Document {
    let document = Document {
        blocks: parse_blocks(text, citations, options),
    };
    tracing::trace!(blocks = document.len(), "rendered markdown");
    document
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    fn cite(n: u32) -> CitationNode {
        CitationNode {
            source_id: format!("src_{n}").into(),
            section_key: "overview".into(),
            display_number: n,
        }
    }

    #[test]
    fn test_citations_in_document_order() {
        let doc = Document {
            blocks: vec![
                Block::Heading {
                    level: 2,
                    content: vec![Inline::Citation(cite(1))],
                },
                Block::List {
                    items: vec![vec![Inline::Strong(vec![Inline::Citation(cite(2))])]],
                },
                Block::Table(Table {
                    alignments: vec![Alignment::None],
                    head: vec![vec![text("h")]],
                    rows: vec![vec![vec![Inline::Citation(cite(3))]]],
                }),
            ],
        };
        let numbers: Vec<u32> = doc.citations().iter().map(|c| c.display_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_plain_text() {
        let doc = Document {
            blocks: vec![
                Block::Paragraph {
                    content: vec![
                        text("Sales "),
                        Inline::Emphasis(vec![text("rose")]),
                        Inline::Citation(cite(1)),
                    ],
                },
                Block::List {
                    items: vec![vec![text("a")], vec![text("b")]],
                },
            ],
        };
        assert_eq!(doc.plain_text(), "Sales rose[1]\n\na\nb");
    }

    #[test]
    fn test_options_from_config() {
        let config = RenderConfig {
            wrap_numbered_lists: true,
        };
        assert!(RenderOptions::from(&config).wrap_numbered_lists);
    }
}

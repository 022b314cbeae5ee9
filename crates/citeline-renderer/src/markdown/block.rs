//! Line-based block scanner.
//!
//! Each line is classified on its own, in precedence order: heading, bullet
//! item, numbered item, table start, plain text. Blank lines close the current
//! chunk. Plain lines at the start of a chunk become a paragraph; plain lines
//! after a heading, list or table in the same chunk become a raw inline run.

use super::inline::parse_inlines;
use super::{Alignment, Block, Cell, CitationNode, Inline, RenderOptions, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Blank,
    Heading(u8, &'a str),
    Bullet(&'a str),
    Numbered(&'a str),
    Text(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    if line.trim().is_empty() {
        return Line::Blank;
    }
    if let Some((level, text)) = heading(line) {
        return Line::Heading(level, text);
    }
    if let Some(text) = line.strip_prefix("* ").filter(|t| !t.trim().is_empty()) {
        return Line::Bullet(text.trim());
    }
    if let Some(text) = numbered(line) {
        return Line::Numbered(text);
    }
    Line::Text(line)
}

/// `#`..`###` followed by a space.
fn heading(line: &str) -> Option<(u8, &str)> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if !(1..=3).contains(&hashes) {
        return None;
    }
    let text = line[hashes..].strip_prefix(' ')?;
    Some((hashes as u8, text.trim()))
}

/// `<digits>. ` followed by non-empty text.
fn numbered(line: &str) -> Option<&str> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let text = line[digits..].strip_prefix(". ")?.trim();
    (!text.is_empty()).then_some(text)
}

fn is_table_row(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

fn is_separator_row(line: &str) -> bool {
    let line = line.trim();
    line.contains('|')
        && line.contains('-')
        && line
            .chars()
            .all(|c| matches!(c, '-' | ':' | '|' | ' ' | '\t'))
}

/// Split a pipe row into trimmed cell texts.
fn split_row(line: &str) -> Vec<&str> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(str::trim).collect()
}

fn alignment(cell: &str) -> Alignment {
    match (cell.starts_with(':'), cell.ends_with(':') && cell.len() > 1) {
        (true, true) => Alignment::Center,
        (true, false) => Alignment::Left,
        (false, true) => Alignment::Right,
        (false, false) => Alignment::None,
    }
}

/// Scanner state for one call to [`parse_blocks`].
struct BlockScanner<'a, 'c> {
    citations: &'c [CitationNode],
    options: &'a RenderOptions,
    blocks: Vec<Block>,
    /// Plain lines waiting to become a paragraph or inline run.
    pending_text: Vec<&'a str>,
    /// Whether the current chunk already produced a block.
    chunk_has_block: bool,
}

impl<'a, 'c> BlockScanner<'a, 'c> {
    fn inlines(&self, text: &str) -> Vec<Inline> {
        parse_inlines(text, self.citations)
    }

    fn flush_text(&mut self) {
        if self.pending_text.is_empty() {
            return;
        }
        let text = self.pending_text.join("\n");
        self.pending_text.clear();
        let content = self.inlines(&text);
        if self.chunk_has_block {
            self.blocks.push(Block::Inline { content });
        } else {
            self.blocks.push(Block::Paragraph { content });
        }
        self.chunk_has_block = true;
    }

    fn push_block(&mut self, block: Block) {
        self.flush_text();
        self.blocks.push(block);
        self.chunk_has_block = true;
    }

    fn end_chunk(&mut self) {
        self.flush_text();
        self.chunk_has_block = false;
    }

    /// Try to read a table at `lines[0]`. Returns the table and lines consumed.
    fn table(&self, lines: &[&str]) -> Option<(Table, usize)> {
        let [header, separator, first_row, ..] = lines else {
            return None;
        };
        if !is_table_row(header) || !is_separator_row(separator) || !is_table_row(first_row) {
            return None;
        }

        let head_cells = split_row(header);
        let width = head_cells.len();
        let mut alignments: Vec<Alignment> =
            split_row(separator).into_iter().map(alignment).collect();
        alignments.resize(width, Alignment::None);

        let body_len = lines[2..]
            .iter()
            .take_while(|line| is_table_row(line) && !line.trim().is_empty())
            .count();

        let rows: Vec<Vec<Cell>> = lines[2..2 + body_len]
            .iter()
            .map(|line| {
                let cells = split_row(line);
                if cells.len() > width {
                    tracing::debug!(
                        expected = width,
                        found = cells.len(),
                        "dropping extra table cells"
                    );
                }
                // pad short rows, drop extra cells
                (0..width)
                    .map(|i| self.inlines(cells.get(i).copied().unwrap_or("")))
                    .collect()
            })
            .collect();

        let table = Table {
            alignments,
            head: head_cells.into_iter().map(|cell| self.inlines(cell)).collect(),
            rows,
        };
        Some((table, 2 + body_len))
    }
}

/// Split text into blocks. Total: any input yields a (possibly empty) list.
pub fn parse_blocks(
    text: &str,
    citations: &[CitationNode],
    options: &RenderOptions,
) -> Vec<Block> {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let mut scanner = BlockScanner {
        citations,
        options,
        blocks: Vec::new(),
        pending_text: Vec::new(),
        chunk_has_block: false,
    };

    let mut i = 0;
    while i < lines.len() {
        match classify(lines[i]) {
            Line::Blank => {
                scanner.end_chunk();
                i += 1;
            }
            Line::Heading(level, text) => {
                let content = scanner.inlines(text);
                scanner.push_block(Block::Heading { level, content });
                i += 1;
            }
            Line::Bullet(_) => {
                let mut items = Vec::new();
                while let Some(Line::Bullet(text)) = lines.get(i).map(|l| classify(l)) {
                    items.push(scanner.inlines(text));
                    i += 1;
                }
                scanner.push_block(Block::List { items });
            }
            Line::Numbered(text) if !scanner.options.wrap_numbered_lists => {
                let content = scanner.inlines(text);
                scanner.push_block(Block::ListItem { content });
                i += 1;
            }
            Line::Numbered(_) => {
                let mut items = Vec::new();
                while let Some(Line::Numbered(text)) = lines.get(i).map(|l| classify(l)) {
                    items.push(scanner.inlines(text));
                    i += 1;
                }
                scanner.push_block(Block::OrderedList { items });
            }
            Line::Text(line) => {
                if let Some((table, consumed)) = scanner.table(&lines[i..]) {
                    scanner.push_block(Block::Table(table));
                    i += consumed;
                } else {
                    scanner.pending_text.push(line);
                    i += 1;
                }
            }
        }
    }
    scanner.end_chunk();

    scanner.blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Vec<Block> {
        parse_blocks(text, &[], &RenderOptions::default())
    }

    fn text(s: &str) -> Vec<Inline> {
        vec![Inline::Text(s.to_string())]
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("# Title"), Line::Heading(1, "Title"));
        assert_eq!(classify("### Deep"), Line::Heading(3, "Deep"));
        assert_eq!(classify("#### Too deep"), Line::Text("#### Too deep"));
        assert_eq!(classify("#NoSpace"), Line::Text("#NoSpace"));
        assert_eq!(classify("* item"), Line::Bullet("item"));
        assert_eq!(classify("*emphasis*"), Line::Text("*emphasis*"));
        assert_eq!(classify("* "), Line::Text("* "));
        assert_eq!(classify("12. twelfth"), Line::Numbered("twelfth"));
        assert_eq!(classify("12.no space"), Line::Text("12.no space"));
        assert_eq!(classify("   "), Line::Blank);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n  \n").is_empty());
    }

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        let blocks = parse("First line\nsecond line\n\n\nThird");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph {
                    content: text("First line\nsecond line")
                },
                Block::Paragraph {
                    content: text("Third")
                },
            ]
        );
    }

    #[test]
    fn test_heading_levels() {
        let blocks = parse("# One\n## Two\n### Three");
        let levels: Vec<u8> = blocks
            .iter()
            .map(|b| match b {
                Block::Heading { level, .. } => *level,
                other => panic!("unexpected block {other:?}"),
            })
            .collect();
        assert_eq!(levels, vec![1, 2, 3]);
    }

    #[test]
    fn test_consecutive_bullets_group() {
        let blocks = parse("* a\n* b\n\n* c");
        assert_eq!(
            blocks,
            vec![
                Block::List {
                    items: vec![text("a"), text("b")]
                },
                Block::List {
                    items: vec![text("c")]
                },
            ]
        );
    }

    #[test]
    fn test_numbered_items_stay_bare() {
        let blocks = parse("1. first\n2. second");
        assert_eq!(
            blocks,
            vec![
                Block::ListItem {
                    content: text("first")
                },
                Block::ListItem {
                    content: text("second")
                },
            ]
        );
    }

    #[test]
    fn test_numbered_items_wrapped_when_enabled() {
        let options = RenderOptions {
            wrap_numbered_lists: true,
        };
        let blocks = parse_blocks("1. first\n2. second\n\n3. third", &[], &options);
        assert_eq!(
            blocks,
            vec![
                Block::OrderedList {
                    items: vec![text("first"), text("second")]
                },
                Block::OrderedList {
                    items: vec![text("third")]
                },
            ]
        );
    }

    #[test]
    fn test_text_after_block_is_inline_run() {
        let blocks = parse("Intro\n## Heading\nTrailing line");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph {
                    content: text("Intro")
                },
                Block::Heading {
                    level: 2,
                    content: text("Heading")
                },
                Block::Inline {
                    content: text("Trailing line")
                },
            ]
        );
    }

    #[test]
    fn test_table() {
        let blocks = parse("| Name | Share |\n|:--|--:|\n| Alpha | 40% |\n| Beta | 60% |");
        assert_eq!(
            blocks,
            vec![Block::Table(Table {
                alignments: vec![Alignment::Left, Alignment::Right],
                head: vec![text("Name"), text("Share")],
                rows: vec![
                    vec![text("Alpha"), text("40%")],
                    vec![text("Beta"), text("60%")],
                ],
            })]
        );
    }

    #[test]
    fn test_table_pads_short_and_drops_long_rows() {
        let blocks = parse("| a | b | c |\n|---|:-:|---|\n| 1 |\n| 1 | 2 | 3 | 4 |");
        let Block::Table(table) = &blocks[0] else {
            panic!("expected table, got {blocks:?}");
        };
        assert_eq!(
            table.alignments,
            vec![Alignment::None, Alignment::Center, Alignment::None]
        );
        assert_eq!(table.rows[0], vec![text("1"), vec![], vec![]]);
        assert_eq!(table.rows[1], vec![text("1"), text("2"), text("3")]);
    }

    #[test]
    fn test_table_needs_separator_and_body() {
        // no body row: header and separator are plain text
        let blocks = parse("| a | b |\n|---|---|");
        assert_eq!(
            blocks,
            vec![Block::Paragraph {
                content: text("| a | b |\n|---|---|")
            }]
        );

        // no separator
        let blocks = parse("| a | b |\n| 1 | 2 |");
        assert!(matches!(blocks[0], Block::Paragraph { .. }));
    }

    #[test]
    fn test_table_ends_at_first_non_row() {
        let blocks = parse("Before\n| a |\n|---|\n| 1 |\nAfter");
        assert_eq!(blocks.len(), 3);
        assert!(matches!(blocks[0], Block::Paragraph { .. }));
        assert!(matches!(blocks[1], Block::Table(_)));
        assert_eq!(
            blocks[2],
            Block::Inline {
                content: text("After")
            }
        );
    }

    #[test]
    fn test_crlf_lines() {
        let blocks = parse("# Title\r\n\r\nBody\r\n");
        assert_eq!(
            blocks,
            vec![
                Block::Heading {
                    level: 1,
                    content: text("Title")
                },
                Block::Paragraph {
                    content: text("Body")
                },
            ]
        );
    }

    #[test]
    fn test_bullet_star_not_read_as_emphasis() {
        let blocks = parse("* item with *note*");
        assert_eq!(
            blocks,
            vec![Block::List {
                items: vec![vec![
                    Inline::Text("item with ".to_string()),
                    Inline::Emphasis(text("note")),
                ]]
            }]
        );
    }
}

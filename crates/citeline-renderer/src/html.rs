//! HTML output for rendered documents.
//!
//! Blocks are written one after another separated by `\n`. Citations become
//! `<sup class="citation">` elements carrying the attributes the popover reads:
//! `data-source-id`, `data-section-key` and `data-display-number`.

use pulldown_cmark_escape::{FmtWriter, IoWriter, StrWrite, escape_html, escape_html_body_text};

use crate::markdown::{Alignment, Block, CitationNode, Document, Inline, Table};

enum TableState {
    Head,
    Body,
}

struct HtmlWriter<W> {
    writer: W,
    /// Whether anything has been written yet.
    started: bool,
}

impl<W: StrWrite> HtmlWriter<W> {
    fn new(writer: W) -> Self {
        Self {
            writer,
            started: false,
        }
    }

    #[inline]
    fn write(&mut self, s: &str) -> Result<(), W::Error> {
        self.writer.write_str(s)
    }

    fn run(mut self, document: &Document) -> Result<(), W::Error> {
        for block in &document.blocks {
            if self.started {
                self.write("\n")?;
            }
            self.started = true;
            self.block(block)?;
        }
        Ok(())
    }

    fn run_section(mut self, key: &str, title: &str, document: &Document) -> Result<(), W::Error> {
        self.write("<section data-section-key=\"")?;
        escape_html(&mut self.writer, key)?;
        self.write("\">\n")?;
        if !title.is_empty() {
            self.write("<h2>")?;
            escape_html_body_text(&mut self.writer, title)?;
            self.write("</h2>\n")?;
        }
        for block in &document.blocks {
            self.block(block)?;
            self.write("\n")?;
        }
        self.write("</section>")
    }

    fn block(&mut self, block: &Block) -> Result<(), W::Error> {
        match block {
            Block::Heading { level, content } => {
                write!(&mut self.writer, "<h{}>", level)?;
                self.inlines(content)?;
                write!(&mut self.writer, "</h{}>", level)
            }
            Block::Paragraph { content } => {
                self.write("<p>")?;
                self.inlines(content)?;
                self.write("</p>")
            }
            Block::List { items } => self.list("ul", items),
            Block::OrderedList { items } => self.list("ol", items),
            Block::ListItem { content } => {
                self.write("<li>")?;
                self.inlines(content)?;
                self.write("</li>")
            }
            Block::Table(table) => self.table(table),
            Block::Inline { content } => self.inlines(content),
        }
    }

    fn list(&mut self, tag: &str, items: &[Vec<Inline>]) -> Result<(), W::Error> {
        writeln!(&mut self.writer, "<{}>", tag)?;
        for item in items {
            self.write("<li>")?;
            self.inlines(item)?;
            self.write("</li>\n")?;
        }
        write!(&mut self.writer, "</{}>", tag)
    }

    fn table(&mut self, table: &Table) -> Result<(), W::Error> {
        self.write("<table>\n<thead>\n")?;
        self.row(table, &table.head, TableState::Head)?;
        self.write("</thead>\n<tbody>\n")?;
        for row in &table.rows {
            self.row(table, row, TableState::Body)?;
        }
        self.write("</tbody>\n</table>")
    }

    fn row(
        &mut self,
        table: &Table,
        cells: &[Vec<Inline>],
        state: TableState,
    ) -> Result<(), W::Error> {
        let tag = match state {
            TableState::Head => "th",
            TableState::Body => "td",
        };
        self.write("<tr>")?;
        for (index, cell) in cells.iter().enumerate() {
            write!(&mut self.writer, "<{}", tag)?;
            match table.alignments.get(index) {
                Some(&Alignment::Left) => self.write(" style=\"text-align: left\">")?,
                Some(&Alignment::Center) => self.write(" style=\"text-align: center\">")?,
                Some(&Alignment::Right) => self.write(" style=\"text-align: right\">")?,
                _ => self.write(">")?,
            }
            self.inlines(cell)?;
            write!(&mut self.writer, "</{}>", tag)?;
        }
        self.write("</tr>\n")
    }

    fn inlines(&mut self, run: &[Inline]) -> Result<(), W::Error> {
        for inline in run {
            match inline {
                Inline::Text(text) => escape_html_body_text(&mut self.writer, text)?,
                Inline::Strong(children) => {
                    self.write("<strong>")?;
                    self.inlines(children)?;
                    self.write("</strong>")?;
                }
                Inline::Emphasis(children) => {
                    self.write("<em>")?;
                    self.inlines(children)?;
                    self.write("</em>")?;
                }
                Inline::Citation(node) => self.citation(node)?,
            }
        }
        Ok(())
    }

    fn citation(&mut self, node: &CitationNode) -> Result<(), W::Error> {
        self.write("<sup class=\"citation\" data-source-id=\"")?;
        escape_html(&mut self.writer, &node.source_id)?;
        self.write("\" data-section-key=\"")?;
        escape_html(&mut self.writer, &node.section_key)?;
        write!(
            &mut self.writer,
            "\" data-display-number=\"{0}\">[{0}]</sup>",
            node.display_number
        )
    }
}

/// Render `document` to an HTML string.
pub fn write_html(document: &Document) -> String {
    let mut out = String::new();
    push_html(&mut out, document);
    out
}

/// Append the HTML for `document` to `s`.
pub fn push_html(s: &mut String, document: &Document) {
    // a String sink never reports an error
    let _ = write_html_fmt(s, document);
}

/// Append `document` wrapped in a `<section>` element with an `<h2>` title.
pub fn push_section_html(s: &mut String, key: &str, title: &str, document: &Document) {
    let _ = HtmlWriter::new(FmtWriter(s)).run_section(key, title, document);
}

/// Write the HTML for `document` into a Unicode-accepting buffer or stream.
pub fn write_html_fmt<W: std::fmt::Write>(writer: W, document: &Document) -> std::fmt::Result {
    HtmlWriter::new(FmtWriter(writer)).run(document)
}

/// Write the HTML for `document` to an I/O stream.
///
/// Wrap unbuffered writers like files in a `BufWriter`.
pub fn write_html_io<W: std::io::Write>(writer: W, document: &Document) -> std::io::Result<()> {
    HtmlWriter::new(IoWriter(writer)).run(document)
}

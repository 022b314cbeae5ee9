// End-to-end checks for the section pipeline: payload -> sections ->
// numbering, document tree, HTML and source lookup.

use citeline_common::{PageNumber, ReportPayload, Section, Source, SourceLookup};
use citeline_renderer::{
    Block, Inline, RenderOptions, RenderedSection, ReportView, markdown::parse_blocks,
    parse_markers,
};

const PAYLOAD: &str = r###"{
  "company_name": "Acme Robotics",
  "sections": [
    {
      "section_name": "Company Overview",
      "cited_text": "## Summary\n\nAcme builds **warehouse robots [[Src:5]]** and sells them abroad[[Src:2]].\n\n* Founded 2015[[Src:5]]\n* 240 staff",
      "sources": {
        "src_5": { "title": "Annual report", "page_number": 3, "raw_text": "Acme was founded in 2015." },
        "src_2": { "title": "Press kit", "page_number": "12", "raw_text": "Export markets..." }
      }
    },
    {
      "key": "products",
      "section_name": "Key Products",
      "cited_text": "The R2 picker[[Src:2]] leads the range[[Src:9]].",
      "sources": {
        "src_2": { "title": "Product sheet", "page_number": null, "raw_text": "\n--- PAGE 7 ---\nR2 picker" }
      }
    }
  ]
}"###;

fn view() -> ReportView {
    let payload = ReportPayload::from_json("payload.json", PAYLOAD).unwrap();
    ReportView::from_payload(payload, RenderOptions::default())
}

fn numbers(section: &RenderedSection) -> Vec<(String, u32)> {
    section
        .numbering()
        .iter()
        .map(|(id, n)| (id.to_string(), n))
        .collect()
}

#[test]
fn sections_keep_payload_order_and_keys() {
    let view = view();
    let keys: Vec<&str> = view.sections().iter().map(|s| s.key().as_str()).collect();
    assert_eq!(keys, vec!["company_overview", "products"]);
    assert_eq!(view.company_name(), Some("Acme Robotics"));
    assert_eq!(view.len(), 2);
}

#[test]
fn first_seen_numbering_per_section() {
    let view = view();
    let overview = view.section("company_overview").unwrap();
    assert_eq!(
        numbers(overview),
        vec![("src_5".to_string(), 1), ("src_2".to_string(), 2)]
    );
    assert_eq!(overview.marker_count(), 3);

    // src_2 is numbered 2 in the overview but 1 here
    let products = view.section("products").unwrap();
    assert_eq!(
        numbers(products),
        vec![("src_2".to_string(), 1), ("src_9".to_string(), 2)]
    );
}

#[test]
fn citation_inside_strong_keeps_identity() {
    let view = view();
    let overview = view.section("company_overview").unwrap();
    let Block::Paragraph { content } = &overview.document().blocks[1] else {
        panic!("expected paragraph, got {:?}", overview.document().blocks[1]);
    };
    let Inline::Strong(children) = &content[1] else {
        panic!("expected strong, got {:?}", content[1]);
    };
    let Inline::Citation(node) = &children[1] else {
        panic!("expected citation, got {:?}", children[1]);
    };
    assert_eq!(node.source_id, "src_5");
    assert_eq!(node.display_number, 1);
    assert_eq!(node.section_key, "company_overview");
}

#[test]
fn document_citations_follow_text_order() {
    let view = view();
    let overview = view.section("company_overview").unwrap();
    let shown: Vec<(String, u32)> = overview
        .document()
        .citations()
        .iter()
        .map(|c| (c.source_id.to_string(), c.display_number))
        .collect();
    assert_eq!(
        shown,
        vec![
            ("src_5".to_string(), 1),
            ("src_2".to_string(), 2),
            ("src_5".to_string(), 1),
        ]
    );
}

#[test]
fn lookup_is_scoped_by_section() {
    let view = view();
    let overview_src = view.lookup_source("company_overview", "src_2").unwrap();
    let products_src = view.lookup_source("products", "src_2").unwrap();
    assert_eq!(overview_src.title.as_deref(), Some("Press kit"));
    assert_eq!(products_src.title.as_deref(), Some("Product sheet"));
    assert!(view.lookup_source("products", "src_5").is_none());
    assert!(view.lookup_source("nope", "src_2").is_none());
}

#[test]
fn page_labels_from_number_text_and_chunk() {
    let view = view();
    let label = |key: &str, id: &str| view.lookup_source(key, id).and_then(Source::page_label);
    assert_eq!(label("company_overview", "src_5").as_deref(), Some("Page 3"));
    assert_eq!(label("company_overview", "src_2").as_deref(), Some("Page 12"));
    assert_eq!(label("products", "src_2").as_deref(), Some("Page 7"));
}

#[test]
fn referenced_and_unresolved_sources() {
    let view = view();
    let products = view.section("products").unwrap();

    let referenced = products.referenced_sources();
    assert_eq!(referenced.len(), 2);
    assert_eq!(referenced[0].display_number, 1);
    assert!(referenced[0].source.is_some());
    assert_eq!(referenced[1].source_id, "src_9");
    assert!(referenced[1].source.is_none());

    let unresolved: Vec<&str> = products
        .unresolved_citations()
        .into_iter()
        .map(|id| id.as_str())
        .collect();
    assert_eq!(unresolved, vec!["src_9"]);
}

#[test]
fn clean_text_and_offsets_derived_when_missing() {
    let view = view();
    let products = view.section("products").unwrap();
    assert_eq!(products.clean_text(), "The R2 picker leads the range.");
    let offsets: Vec<usize> = products
        .citation_refs()
        .iter()
        .map(|c| c.start_index)
        .collect();
    assert_eq!(offsets, vec![13, 29]);
}

#[test]
fn empty_section_renders_nothing() {
    let section = Section::new("empty", "Empty", "");
    let rendered = RenderedSection::render(&section, &RenderOptions::default());
    assert!(rendered.document().is_empty());
    assert!(rendered.numbering().is_empty());
    assert_eq!(rendered.html(), "");
    assert!(rendered.referenced_sources().is_empty());
}

#[test]
fn malformed_markers_render_as_text() {
    let section = Section::new("s", "S", "See [[Src:x]] and [[Src:12");
    let rendered = RenderedSection::render(&section, &RenderOptions::default());
    assert!(rendered.numbering().is_empty());
    assert_eq!(rendered.html(), "<p>See [[Src:x]] and [[Src:12</p>");
}

#[test]
fn plain_paragraphs_render_idempotently() {
    let text = "First paragraph\nwith two lines.\n\nSecond paragraph.";
    let options = RenderOptions::default();
    let once = parse_blocks(text, &[], &options);
    let plain = citeline_renderer::Document {
        blocks: once.clone(),
    }
    .plain_text();
    let twice = parse_blocks(&plain, &[], &options);
    assert_eq!(once, twice);
}

#[test]
fn same_source_numbers_from_one_in_each_section() {
    let a = Section::new("a", "A", "x[[Src:4]] y[[Src:1]]").with_source(Source::new("src_1"));
    let b = Section::new("b", "B", "z[[Src:1]]").with_source(Source::new("src_1"));
    let a = RenderedSection::render(&a, &RenderOptions::default());
    let b = RenderedSection::render(&b, &RenderOptions::default());
    assert_eq!(a.numbering().number_for("src_1"), Some(2));
    assert_eq!(b.numbering().number_for("src_1"), Some(1));
}

#[test]
fn rendering_twice_gives_equal_results() {
    let section = Section::new("s", "S", "**a[[Src:3]]** *b*[[Src:1]]");
    let options = RenderOptions::default();
    assert_eq!(
        RenderedSection::render(&section, &options),
        RenderedSection::render(&section, &options)
    );
    assert_eq!(parse_markers(&section.cited_text), parse_markers(&section.cited_text));
}

#[test]
fn duplicate_section_keys_keep_later_in_place() {
    let mut view = ReportView::new(RenderOptions::default());
    view.load_sections(vec![
        Section::new("a", "First A", "one"),
        Section::new("b", "B", "two"),
        Section::new("a", "Second A", "three"),
    ]);
    let titles: Vec<&str> = view.sections().iter().map(|s| s.title()).collect();
    assert_eq!(titles, vec!["Second A", "B"]);
    assert_eq!(view.section("a").unwrap().title(), "Second A");
}

#[test]
fn load_replaces_and_clear_resets() {
    let mut reloaded = view();
    reloaded.load(ReportPayload::default());
    assert!(reloaded.is_empty());
    assert!(reloaded.section("products").is_none());

    let mut cleared = view();
    cleared.clear();
    assert!(cleared.is_empty());
    assert_eq!(cleared.company_name(), None);
    assert!(cleared.lookup_source("products", "src_2").is_none());
}

#[test]
fn report_html() {
    let mut view = ReportView::new(RenderOptions::default());
    view.load_sections(vec![
        Section::new("risks", "Risks", "Supply chain[[Src:1]]")
            .with_source(Source::new("src_1").with_page(PageNumber::Number(2))),
        Section::new("outlook", "", "1. grow\n2. hire"),
    ]);
    insta::assert_snapshot!(view.html(), @r#"
    <section data-section-key="risks">
    <h2>Risks</h2>
    <p>Supply chain<sup class="citation" data-source-id="src_1" data-section-key="risks" data-display-number="1">[1]</sup></p>
    </section>
    <section data-section-key="outlook">
    <li>grow</li>
    <li>hire</li>
    </section>
    "#);
}

#[test]
fn wrapped_numbered_lists_render_as_ol() {
    let options = RenderOptions {
        wrap_numbered_lists: true,
    };
    let section = Section::new("s", "S", "1. grow\n2. hire");
    let rendered = RenderedSection::render(&section, &options);
    insta::assert_snapshot!(rendered.html(), @r"
    <ol>
    <li>grow</li>
    <li>hire</li>
    </ol>
    ");
}

#[test]
fn literal_delimiters_do_not_become_citations() {
    let section = Section::new("s", "S", "Plain \u{E000}0\u{E001} text, real cite[[Src:7]]")
        .with_source(Source::new("src_7"));
    let rendered = RenderedSection::render(&section, &RenderOptions::default());
    assert_eq!(rendered.marker_count(), 1);
    assert_eq!(rendered.document().citations().len(), 1);
    let html = rendered.html();
    assert_eq!(html.matches("data-source-id=\"src_7\"").count(), 1);
    assert!(html.starts_with("<p>Plain \u{E000}0\u{E001} text"));
}

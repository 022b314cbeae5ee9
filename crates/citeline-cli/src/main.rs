use citeline_common::telemetry::{self, TelemetryConfig};
use citeline_common::{Config, FileStore, Loader, ReportPayload};
use citeline_popover::PopoverContent;
use citeline_renderer::{CitedSource, Document, RenderOptions, RenderedSection, ReportView};
use miette::{IntoDiagnostic, Result};
use pulldown_cmark_escape::{FmtWriter, escape_html_body_text};
use serde::Serialize;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(version, about = "Citeline - render cited report sections", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a JSON or TOML config file
    #[arg(long, global = true, env = "CITELINE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every section of a report payload
    Render {
        /// Report payload (JSON)
        payload: PathBuf,

        /// Write output here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Wrap the HTML in a minimal page
        #[arg(long)]
        standalone: bool,

        #[arg(long, value_enum, default_value_t = Format::Html)]
        format: Format,
    },
    /// List each section's citation numbering
    Citations {
        /// Report payload (JSON)
        payload: PathBuf,
    },
    /// Show what the popover would display for one citation
    Source {
        /// Report payload (JSON)
        payload: PathBuf,

        /// Section key, e.g. `company_overview`
        section: String,

        /// Source id, e.g. `src_3`
        source_id: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Html,
    /// Document trees and numbering as JSON
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_miette();
    telemetry::init(TelemetryConfig::from_env("citeline"));

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Render {
            payload,
            output,
            standalone,
            format,
        } => {
            let view = load_report(&payload, &config).await?;
            let rendered = match format {
                Format::Html if standalone => standalone_page(&view),
                Format::Html => view.html(),
                Format::Json => report_json(&view)?,
            };
            match output {
                Some(path) => {
                    tokio::fs::write(&path, rendered).await.into_diagnostic()?;
                    tracing::info!(path = %path.display(), sections = view.len(), "wrote report");
                }
                None => println!("{rendered}"),
            }
        }
        Commands::Citations { payload } => {
            let view = load_report(&payload, &config).await?;
            print!("{}", citation_tables(&view));
        }
        Commands::Source {
            payload,
            section,
            source_id,
        } => {
            let view = load_report(&payload, &config).await?;
            let rendered = view
                .section(&section)
                .ok_or_else(|| miette::miette!("no section with key `{section}`"))?;
            let source = rendered.lookup_source(&source_id).ok_or_else(|| {
                miette::miette!("section `{section}` has no source `{source_id}`")
            })?;
            let display_number = rendered.numbering().number_for(&source_id).unwrap_or(0);
            let content = PopoverContent::from_source(
                source,
                display_number,
                config.tooltip.excerpt_max_chars,
            );
            print!("{}", popover_text(&content));
        }
    }

    Ok(())
}

async fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    if !path.exists() {
        tracing::info!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }
    let config = FileStore::new(path).load().await?;
    tracing::debug!(?config, "loaded config");
    Ok(config)
}

async fn load_report(path: &Path, config: &Config) -> Result<ReportView> {
    let src = tokio::fs::read_to_string(path).await.into_diagnostic()?;
    let payload = ReportPayload::from_json(&path.display().to_string(), &src)?;
    Ok(ReportView::from_payload(
        payload,
        RenderOptions::from(&config.render),
    ))
}

fn standalone_page(view: &ReportView) -> String {
    let title = view.company_name().unwrap_or("Report");
    let mut page = String::from("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>");
    let _ = escape_html_body_text(FmtWriter(&mut page), title);
    page.push_str("</title>\n</head>\n<body>\n<h1>");
    let _ = escape_html_body_text(FmtWriter(&mut page), title);
    page.push_str("</h1>\n");
    page.push_str(&view.html());
    page.push_str("\n</body>\n</html>");
    page
}

#[derive(Serialize)]
struct SectionOutput<'a> {
    key: &'a str,
    title: &'a str,
    citations: Vec<CitedSource<'a>>,
    unresolved: Vec<&'a str>,
    document: &'a Document,
}

impl<'a> From<&'a RenderedSection> for SectionOutput<'a> {
    fn from(section: &'a RenderedSection) -> Self {
        Self {
            key: section.key(),
            title: section.title(),
            citations: section.referenced_sources(),
            unresolved: section
                .unresolved_citations()
                .into_iter()
                .map(|id| id.as_str())
                .collect(),
            document: section.document(),
        }
    }
}

fn report_json(view: &ReportView) -> Result<String> {
    let sections: Vec<SectionOutput<'_>> = view.sections().iter().map(SectionOutput::from).collect();
    serde_json::to_string_pretty(&sections).into_diagnostic()
}

fn citation_tables(view: &ReportView) -> String {
    let mut out = String::new();
    for section in view.sections() {
        let _ = writeln!(out, "{} ({})", section.title(), section.key());
        if section.numbering().is_empty() {
            out.push_str("  no citations\n");
        }
        for cited in section.referenced_sources() {
            let _ = write!(out, "  [{}] {}", cited.display_number, cited.source_id);
            match cited.source {
                Some(source) => {
                    if let Some(title) = &source.title {
                        let _ = write!(out, "  {title}");
                    }
                    if let Some(page) = source.page_label() {
                        let _ = write!(out, "  {page}");
                    }
                    out.push('\n');
                }
                None => out.push_str("  (unresolved)\n"),
            }
        }
    }
    out
}

fn popover_text(content: &PopoverContent) -> String {
    let mut out = format!("[{}] {}\n", content.display_number, content.title);
    if let Some(page) = &content.page_label {
        let _ = writeln!(out, "{page}");
    }
    if !content.excerpt.is_empty() {
        let _ = writeln!(out, "\n{}", content.excerpt);
    }
    out
}

fn init_miette() {
    let _ = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }));
    miette::set_panic_hook();
}

#[cfg(test)]
mod tests {
    use super::*;
    use citeline_common::{PageNumber, Section, Source};

    fn view() -> ReportView {
        let mut view = ReportView::new(RenderOptions::default());
        view.load_sections(vec![
            Section::new("overview", "Overview", "Robots[[Src:3]] sold[[Src:8]].").with_source(
                Source::new("src_3")
                    .with_title("Annual report")
                    .with_page(PageNumber::Number(2)),
            ),
            Section::new("team", "Team", "No citations here."),
        ]);
        view
    }

    #[test]
    fn test_citation_tables() {
        insta::assert_snapshot!(citation_tables(&view()), @r"
        Overview (overview)
          [1] src_3  Annual report  Page 2
          [2] src_8  (unresolved)
        Team (team)
          no citations
        ");
    }

    #[test]
    fn test_standalone_page_escapes_title() {
        let mut view = view();
        view.load(ReportPayload {
            company_name: Some("A&B <Co>".into()),
            sections: vec![],
        });
        let page = standalone_page(&view);
        assert!(page.contains("<title>A&amp;B &lt;Co&gt;</title>"));
        assert!(page.ends_with("</body>\n</html>"));
    }

    #[test]
    fn test_report_json_lists_unresolved() {
        let json: serde_json::Value = serde_json::from_str(&report_json(&view()).unwrap()).unwrap();
        assert_eq!(json[0]["key"], "overview");
        assert_eq!(json[0]["unresolved"][0], "src_8");
        assert_eq!(json[0]["citations"][0]["display_number"], 1);
        assert_eq!(json[1]["document"]["blocks"][0]["type"], "paragraph");
    }

    #[test]
    fn test_popover_text() {
        let content = PopoverContent {
            display_number: 2,
            title: "Press kit".into(),
            page_label: Some("Page 9".into()),
            excerpt: "Exports doubled.".into(),
        };
        assert_eq!(
            popover_text(&content),
            "[2] Press kit\nPage 9\n\nExports doubled.\n"
        );
    }

    #[test]
    fn test_cli_parses_render_flags() {
        let cli = Cli::try_parse_from([
            "citeline",
            "render",
            "report.json",
            "-o",
            "out.html",
            "--standalone",
            "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Render {
                payload,
                output,
                standalone,
                format,
            } => {
                assert_eq!(payload, PathBuf::from("report.json"));
                assert_eq!(output, Some(PathBuf::from("out.html")));
                assert!(standalone);
                assert_eq!(format, Format::Json);
            }
            _ => panic!("expected render"),
        }
    }
}

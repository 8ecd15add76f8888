// src/report/mod.rs
// =============================================================================
// Writes the crawl results as a markdown report.
//
// Layout:
//   # Crawled Website Report
//   ## Results for: <root>          (one section per root URL)
//   <br>> link to <a>url</a>        (or "broken link" when the fetch failed)
//   <br>depth:0
//   # > Page heading                (each heading at its own level)
//   ...
//   ## Summary
//
// Pages are listed by depth. With several roots, a page shows up under every
// root that reached it.
// =============================================================================

mod markdown;

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::crawl::CrawlResult;

pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    // Renders the report and replaces whatever was at the path before
    pub fn write(&self, results: &[CrawlResult], roots: &[String]) -> Result<()> {
        let report = Self::render(results, roots);
        fs::write(&self.path, report)
            .with_context(|| format!("failed to write report to {}", self.path.display()))?;

        tracing::info!(path = %self.path.display(), pages = results.len(), "report written");
        Ok(())
    }

    pub fn render(results: &[CrawlResult], roots: &[String]) -> String {
        let mut pages: Vec<&CrawlResult> = results.iter().collect();
        pages.sort_by_key(|page| page.depth());

        let single_root = roots.len() == 1;
        let mut out = String::new();
        push_line(&mut out, &markdown::heading("Crawled Website Report", 1));

        for root in roots {
            out.push('\n');
            push_line(&mut out, &markdown::heading(&format!("Results for: {}", root), 2));

            for page in pages
                .iter()
                .filter(|page| single_root || page.parent_origins().contains(root))
            {
                out.push('\n');
                write_page(&mut out, page);
            }
        }

        out.push('\n');
        push_line(&mut out, &markdown::heading("Summary", 2));
        out.push('\n');
        push_line(&mut out, &format!("- Pages crawled: {}", results.len()));
        push_line(&mut out, &format!("- Broken links: {}", count_broken(results)));
        out
    }
}

pub fn count_broken(results: &[CrawlResult]) -> usize {
    results.iter().filter(|page| page.is_fetch_failed()).count()
}

fn write_page(out: &mut String, page: &CrawlResult) {
    let depth = page.depth();
    push_line(
        out,
        &markdown::link_info(page.page_url(), depth, page.is_fetch_failed()),
    );
    push_line(out, &markdown::depth_marker(depth));

    for raw in page.headings() {
        match markdown::parse_heading(raw) {
            Some((level, text)) => {
                push_line(out, &markdown::page_heading(text, level, depth))
            }
            None => tracing::debug!(heading = %raw, "skipping malformed heading"),
        }
    }
}

fn push_line(out: &mut String, line: &str) {
    // writing to a String can't fail
    let _ = writeln!(out, "{}", line);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use pulldown_cmark::{Event, HeadingLevel, Parser, Tag};
    use std::collections::BTreeSet;

    fn origins(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|o| o.to_string()).collect()
    }

    fn sample() -> Vec<CrawlResult> {
        vec![
            CrawlResult::failed("https://a.test/gone", 1, FetchError::HttpStatus(404))
                .with_parent_origins(origins(&["https://a.test/"])),
            CrawlResult::fetched(
                "https://a.test/",
                0,
                vec![
                    "h1:Home".to_string(),
                    "h2:News".to_string(),
                    "bogus".to_string(),
                ],
                vec!["https://a.test/gone".to_string()],
            )
            .with_parent_origins(origins(&["https://a.test/"])),
        ]
    }

    // (level, text) of every heading in a markdown document
    fn headings(markdown: &str) -> Vec<(HeadingLevel, String)> {
        let mut found = Vec::new();
        let mut current: Option<(HeadingLevel, String)> = None;

        for event in Parser::new(markdown) {
            match event {
                Event::Start(Tag::Heading(level, _, _)) => {
                    current = Some((level, String::new()))
                }
                Event::Text(text) => {
                    if let Some((_, buffer)) = current.as_mut() {
                        buffer.push_str(&text);
                    }
                }
                Event::End(Tag::Heading(..)) => found.extend(current.take()),
                _ => {}
            }
        }
        found
    }

    #[test]
    fn test_report_lines() {
        let report = ReportWriter::render(&sample(), &["https://a.test/".to_string()]);

        let expected = "\
# Crawled Website Report

## Results for: https://a.test/

<br>> link to <a>https://a.test/</a>
<br>depth:0
# > Home
## > News

<br>-> broken link <a>https://a.test/gone</a>
<br>depth:1

## Summary

- Pages crawled: 2
- Broken links: 1
";
        assert_eq!(report, expected);
    }

    #[test]
    fn test_report_parses_as_markdown() {
        let report = ReportWriter::render(&sample(), &["https://a.test/".to_string()]);

        assert_eq!(
            headings(&report),
            vec![
                (HeadingLevel::H1, "Crawled Website Report".to_string()),
                (HeadingLevel::H2, "Results for: https://a.test/".to_string()),
                (HeadingLevel::H1, "> Home".to_string()),
                (HeadingLevel::H2, "> News".to_string()),
                (HeadingLevel::H2, "Summary".to_string()),
            ]
        );
    }

    #[test]
    fn test_pages_are_grouped_by_root() {
        let results = vec![
            CrawlResult::fetched("https://a.test/one", 0, vec![], vec![])
                .with_parent_origins(origins(&["https://a.test/one"])),
            CrawlResult::fetched("https://a.test/two", 0, vec![], vec![])
                .with_parent_origins(origins(&["https://a.test/two"])),
            CrawlResult::fetched("https://a.test/shared", 1, vec![], vec![])
                .with_parent_origins(origins(&["https://a.test/one", "https://a.test/two"])),
        ];
        let roots = vec![
            "https://a.test/one".to_string(),
            "https://a.test/two".to_string(),
        ];

        let report = ReportWriter::render(&results, &roots);

        let (first, second) = report
            .split_once("## Results for: https://a.test/two")
            .unwrap();
        assert!(first.contains("<a>https://a.test/one</a>"));
        assert!(!first.contains("<a>https://a.test/two</a>"));
        assert!(first.contains("<a>https://a.test/shared</a>"));
        assert!(second.contains("<a>https://a.test/two</a>"));
        assert!(!second.contains("<a>https://a.test/one</a>"));
        assert!(second.contains("<a>https://a.test/shared</a>"));
    }

    #[test]
    fn test_count_broken() {
        assert_eq!(count_broken(&sample()), 1);
        assert_eq!(count_broken(&[]), 0);
    }

    #[test]
    fn test_write_replaces_existing_file() {
        let path =
            std::env::temp_dir().join(format!("site-crawler-report-{}.md", std::process::id()));
        fs::write(&path, "stale content").unwrap();

        let writer = ReportWriter::new(&path);
        writer.write(&sample(), &["https://a.test/".to_string()]).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Crawled Website Report\n"));
        assert!(!written.contains("stale content"));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_error_names_the_path() {
        let writer = ReportWriter::new("/definitely/not/a/dir/report.md");
        let error = writer.write(&sample(), &[]).unwrap_err();
        assert!(format!("{:#}", error).contains("/definitely/not/a/dir/report.md"));
    }
}

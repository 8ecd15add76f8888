// src/fetch/html.rs
// =============================================================================
// This module pulls the headings and links out of an HTML page.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// The output is raw: headings keep their document order across levels, and
// links are only resolved to absolute URLs. Cleaning (trimming, lower-casing,
// dropping empties, ordering headings by level) is the page analyzer's job.
// =============================================================================

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// One `<h1>`..`<h6>` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// What the crawler needs from a page, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    pub headings: Vec<Heading>,
    pub links: Vec<String>,
}

// Parses an HTML document
//
// Parameters:
//   html: the HTML content to parse
//   base: the URL the page was served from (for resolving relative links)
pub fn parse_page(html: &str, base: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        headings: extract_headings(&document),
        links: extract_links(&document, base),
    }
}

fn extract_headings(document: &Html) -> Vec<Heading> {
    let selector = selector("h1, h2, h3, h4, h5, h6");

    document
        .select(&selector)
        .filter_map(|element| {
            let level = element.value().name().get(1..)?.parse().ok()?;
            Some(Heading {
                level,
                text: element_text(&element),
            })
        })
        .collect()
}

fn extract_links(document: &Html, base: &Url) -> Vec<String> {
    let selector = selector("a[href]");

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .map(|url| url.to_string())
        .collect()
}

// Text of an element with runs of whitespace collapsed, like a browser shows it
fn element_text(element: &ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Our selectors are constants, a parse failure is a programming error
fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("constant CSS selector is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/docs/page").unwrap()
    }

    fn heading(level: u8, text: &str) -> Heading {
        Heading {
            level,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_headings_in_document_order() {
        let html = r#"
            <h2>Second</h2>
            <h1>  First
                heading </h1>
            <h6><span>Deep</span> <em>one</em></h6>
        "#;
        let page = parse_page(html, &base());
        assert_eq!(
            page.headings,
            vec![
                heading(2, "Second"),
                heading(1, "First heading"),
                heading(6, "Deep one"),
            ]
        );
    }

    #[test]
    fn test_links_are_resolved() {
        let html = r#"
            <a href="https://www.rust-lang.org">Rust</a>
            <a href="/about">About</a>
            <a href="guide"> Guide </a>
            <a href="../up">Up</a>
            <a>No href</a>
        "#;
        let page = parse_page(html, &base());
        assert_eq!(
            page.links,
            vec![
                "https://www.rust-lang.org/",
                "https://example.com/about",
                "https://example.com/docs/guide",
                "https://example.com/up",
            ]
        );
    }

    #[test]
    fn test_empty_document() {
        let page = parse_page("", &base());
        assert_eq!(page, ParsedPage::default());
    }
}

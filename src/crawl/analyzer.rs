// src/crawl/analyzer.rs
// =============================================================================
// Turns one URL into one CrawlResult.
//
// The analyzer asks the page loader for the page exactly once and formats
// what comes back. A failed load is not an error here: it becomes a result
// with fetch_failed set, so one bad page never aborts the crawl.
// =============================================================================

use std::sync::Arc;

use crate::fetch::{Heading, PageLoader};

use super::CrawlResult;

const MAX_HEADING_LEVEL: u8 = 6;

pub struct PageAnalyzer {
    loader: Arc<dyn PageLoader>,
}

impl PageAnalyzer {
    pub fn new(loader: Arc<dyn PageLoader>) -> Self {
        Self { loader }
    }

    pub async fn process_page(&self, url: &str, depth: usize) -> CrawlResult {
        match self.loader.load_page(url).await {
            Ok(page) => CrawlResult::fetched(
                url,
                depth,
                format_headings(&page.headings),
                clean_links(page.links),
            ),
            Err(error) => {
                tracing::warn!(url = %url, depth, error = %error, "failed to load page");
                CrawlResult::failed(url, depth, error)
            }
        }
    }
}

// All h1 headings first, then h2, and so on. Inside a level the document
// order is kept. Empty headings are skipped.
fn format_headings(headings: &[Heading]) -> Vec<String> {
    (1..=MAX_HEADING_LEVEL)
        .flat_map(|level| {
            headings
                .iter()
                .filter(move |heading| heading.level == level)
                .map(|heading| heading.text.trim())
                .filter(|text| !text.is_empty())
                .map(move |text| format!("h{}:{}", level, text))
        })
        .collect()
}

// Duplicates stay: deduplication happens when links are crawled
fn clean_links(links: Vec<String>) -> Vec<String> {
    links
        .into_iter()
        .map(|link| link.trim().to_lowercase())
        .filter(|link| !link.is_empty())
        .collect()
}

// src/crawl/result.rs
// =============================================================================
// One crawled page, as handed to the report writer.
//
// A result is created by exactly one crawl task. The only part that several
// tasks touch is the set of parent origins, and while the crawl is running
// that set lives in the crawler's shared state (see crawler.rs). It is copied
// in here with with_parent_origins() when the crawl has finished.
// =============================================================================

use std::collections::BTreeSet;

use serde::Serialize;

use crate::fetch::FetchError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlResult {
    page_url: String,
    depth: usize,
    headings: Vec<String>,
    child_links: Vec<String>,
    fetch_failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<FetchError>,
    parent_origins: BTreeSet<String>,
}

impl CrawlResult {
    /// A page that loaded; `headings` are `"h{level}:{text}"` strings
    pub fn fetched(
        page_url: impl Into<String>,
        depth: usize,
        headings: Vec<String>,
        child_links: Vec<String>,
    ) -> Self {
        Self {
            page_url: page_url.into(),
            depth,
            headings,
            child_links,
            fetch_failed: false,
            failure: None,
            parent_origins: BTreeSet::new(),
        }
    }

    /// A page that could not be loaded. It has no headings and no links.
    pub fn failed(page_url: impl Into<String>, depth: usize, failure: FetchError) -> Self {
        Self {
            page_url: page_url.into(),
            depth,
            headings: Vec::new(),
            child_links: Vec::new(),
            fetch_failed: true,
            failure: Some(failure),
            parent_origins: BTreeSet::new(),
        }
    }

    pub fn with_parent_origins(mut self, parent_origins: BTreeSet<String>) -> Self {
        self.parent_origins = parent_origins;
        self
    }

    /// The URL as it was first seen, not normalized
    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn headings(&self) -> &[String] {
        &self.headings
    }

    pub fn child_links(&self) -> &[String] {
        &self.child_links
    }

    pub fn is_fetch_failed(&self) -> bool {
        self.fetch_failed
    }

    pub fn failure(&self) -> Option<&FetchError> {
        self.failure.as_ref()
    }

    pub fn parent_origins(&self) -> &BTreeSet<String> {
        &self.parent_origins
    }
}

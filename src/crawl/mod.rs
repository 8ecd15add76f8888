// src/crawl/mod.rs
// =============================================================================
// This module is the concurrent crawl engine.
//
// Submodules:
// - normalize: URL normalization and the domain allow-list check
// - result: The per-page result record
// - analyzer: Loads one page and turns it into a result
// - executor: Worker pool that can wait for dynamically growing work
// - crawler: The orchestrator that ties the above together
// =============================================================================

mod analyzer;
mod crawler;
mod executor;
mod normalize;
mod result;

pub use analyzer::PageAnalyzer;
pub use crawler::WebCrawler;
pub use executor::{ExecutorError, ShutdownOutcome, TaskExecutor};
pub use normalize::{is_allowed, normalize_url, site_host};
pub use result::CrawlResult;

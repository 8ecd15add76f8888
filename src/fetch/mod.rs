// src/fetch/mod.rs
// =============================================================================
// Fetching and parsing pages.
//
// Submodules:
// - html: Extracts headings and links from an HTML document
// - http: Downloads pages over HTTP(S)
// - error: Why a page could not be loaded
//
// The crawler only talks to the PageLoader trait, so the tests can hand it an
// in-memory site instead of a network.
// =============================================================================

mod error;
mod html;
mod http;

use async_trait::async_trait;

pub use error::FetchError;
pub use html::{parse_page, Heading, ParsedPage};
pub use http::HttpPageLoader;

/// Loads one page and returns its headings and links
#[async_trait]
pub trait PageLoader: Send + Sync {
    async fn load_page(&self, url: &str) -> Result<ParsedPage, FetchError>;
}

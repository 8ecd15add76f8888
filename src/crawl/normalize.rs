// src/crawl/normalize.rs
// =============================================================================
// URL normalization and the domain allow-list check.
//
// Two URLs that point at the same page must produce the same key, otherwise
// the crawler fetches the page twice. The key is built like this:
// - the fragment (#section) and the query (?a=b) are dropped
// - one trailing slash is stripped from the path
// - domain hosts get a "www." prefix if they don't already have one, so
//   example.com and www.example.com collapse to the same key
// - the path keeps its case (only scheme and host are lower-cased, which the
//   url crate does for us while parsing)
//
// The allow-list stores bare hosts ("example.com"). The check strips "www."
// from the link's host before looking it up, so both spellings of a site
// are accepted no matter which one the user typed.
// =============================================================================

use std::collections::BTreeSet;
use url::{Host, Url};

// Builds the comparable key for a URL
//
// Returns None when the string is not an absolute URL or has no host
// (mailto:, javascript:, data: ...). Such links are never crawled.
//
// Example:
//   "https://example.com/docs/#intro" -> Some("https://www.example.com/docs")
pub fn normalize_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;

    let host = match url.host()? {
        Host::Domain(domain) if domain.starts_with("www.") => domain.to_string(),
        Host::Domain(domain) => format!("www.{}", domain),
        // "www." in front of an IP address would make the key unreachable
        Host::Ipv4(addr) => addr.to_string(),
        Host::Ipv6(addr) => format!("[{}]", addr),
    };

    // port() is None for the scheme's default port
    let port = url.port().map(|port| format!(":{}", port)).unwrap_or_default();

    let path = url.path();
    let path = path.strip_suffix('/').unwrap_or(path);

    Some(format!("{}://{}{}{}", url.scheme(), host, port, path))
}

// Reduces a host to the form stored in the allow-list
pub fn site_host(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

// Checks whether a URL's host is one of the allowed domains
//
// This is an exact match on the host, not a substring test:
// "evil-example.com" is not allowed by "example.com", and neither is
// "docs.example.com".
pub fn is_allowed(raw: &str, allowed_domains: &BTreeSet<String>) -> bool {
    Url::parse(raw)
        .ok()
        .and_then(|url| url.host_str().map(|host| allowed_domains.contains(site_host(host))))
        .unwrap_or(false)
}

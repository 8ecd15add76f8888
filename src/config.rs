// src/config.rs
// =============================================================================
// The crawl configuration: where to start, how deep to go, and which domains
// the crawler may visit.
//
// Everything is validated once, in CrawlConfiguration::new(). A value of this
// type is always valid, so the crawler never checks it again. The fields are
// private and there are no setters, which keeps it immutable after startup.
// =============================================================================

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::crawl::site_host;

/// Reasons a configuration is rejected. All of them stop the program before
/// any page is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The start URL was empty
    #[error("no start URL provided")]
    MissingRootUrl,

    /// The start URL could not be parsed, or has no host
    #[error("invalid start URL '{url}': {reason}")]
    InvalidRootUrl { url: String, reason: String },

    /// No maximum depth was given
    #[error("no maximum depth provided")]
    MissingDepth,

    /// The maximum depth was below zero
    #[error("max depth must be >= 0, got {0}")]
    NegativeDepth(i64),

    /// The maximum depth was neither a number nor "unlimited"
    #[error("invalid max depth '{0}' (expected a number >= 0 or 'unlimited')")]
    InvalidDepth(String),

    /// None of the given domains resolved to a host
    #[error("at least one valid domain must be provided")]
    NoValidDomain,
}

/// How deep the crawler may follow links. The start page is depth 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthLimit {
    Bounded(usize),
    Unbounded,
}

impl DepthLimit {
    pub fn allows(&self, depth: usize) -> bool {
        match self {
            DepthLimit::Bounded(max) => depth <= *max,
            DepthLimit::Unbounded => true,
        }
    }
}

impl FromStr for DepthLimit {
    type Err = ConfigurationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let cleaned = raw.trim().to_lowercase();
        if matches!(cleaned.as_str(), "unlimited" | "inf" | "*") {
            return Ok(DepthLimit::Unbounded);
        }

        let depth: i64 = cleaned
            .parse()
            .map_err(|_| ConfigurationError::InvalidDepth(raw.to_string()))?;
        usize::try_from(depth)
            .map(DepthLimit::Bounded)
            .map_err(|_| ConfigurationError::NegativeDepth(depth))
    }
}

impl fmt::Display for DepthLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepthLimit::Bounded(max) => write!(f, "{}", max),
            DepthLimit::Unbounded => write!(f, "unlimited"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfiguration {
    root_url: Url,
    max_depth: DepthLimit,
    allowed_domains: BTreeSet<String>,
}

impl CrawlConfiguration {
    // Validates and normalizes all inputs
    //
    // Parameters:
    //   root_url: where the crawl starts (trimmed and lower-cased before parsing)
    //   max_depth: None is rejected, there is no implicit default
    //   domains: raw domain strings such as "example.com" or "https://example.com"
    pub fn new<I, S>(
        root_url: &str,
        max_depth: Option<DepthLimit>,
        domains: I,
    ) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let root_url = parse_root_url(root_url)?;
        let max_depth = max_depth.ok_or(ConfigurationError::MissingDepth)?;
        let allowed_domains = process_domains(domains)?;

        Ok(Self {
            root_url,
            max_depth,
            allowed_domains,
        })
    }

    pub fn root_url(&self) -> &Url {
        &self.root_url
    }

    pub fn max_depth(&self) -> DepthLimit {
        self.max_depth
    }

    pub fn allowed_domains(&self) -> &BTreeSet<String> {
        &self.allowed_domains
    }

    pub fn allows_depth(&self, depth: usize) -> bool {
        self.max_depth.allows(depth)
    }
}

impl fmt::Display for CrawlConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let domains: Vec<&str> = self.allowed_domains.iter().map(String::as_str).collect();
        writeln!(f, "Root URL       : {}", self.root_url)?;
        writeln!(f, "Max Depth      : {}", self.max_depth)?;
        write!(f, "Allowed Domains: {}", domains.join(", "))
    }
}

// Splits the comma separated domain argument from the command line
pub fn parse_domain_list(raw: &str) -> Vec<String> {
    raw.split(',').map(|domain| domain.to_string()).collect()
}

fn parse_root_url(raw: &str) -> Result<Url, ConfigurationError> {
    let cleaned = raw.trim().to_lowercase();
    if cleaned.is_empty() {
        return Err(ConfigurationError::MissingRootUrl);
    }

    let url = Url::parse(&cleaned).map_err(|e| ConfigurationError::InvalidRootUrl {
        url: cleaned.clone(),
        reason: e.to_string(),
    })?;

    if url.host_str().is_none() {
        return Err(ConfigurationError::InvalidRootUrl {
            url: cleaned,
            reason: "URL has no host".to_string(),
        });
    }

    Ok(url)
}

// Trims, lower-cases and parses every raw domain, keeping the hosts that parse
fn process_domains<I, S>(raw_domains: I) -> Result<BTreeSet<String>, ConfigurationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let valid: BTreeSet<String> = raw_domains
        .into_iter()
        .map(|domain| domain.as_ref().trim().to_lowercase())
        .filter(|domain| !domain.is_empty())
        .filter_map(|domain| {
            let host = extract_host(&domain);
            if host.is_none() {
                tracing::warn!(domain = %domain, "ignoring malformed domain");
            }
            host
        })
        .collect();

    if valid.is_empty() {
        return Err(ConfigurationError::NoValidDomain);
    }
    Ok(valid)
}

// "example.com", "www.example.com" and "https://example.com/x" all give "example.com"
fn extract_host(domain: &str) -> Option<String> {
    let candidate = if domain.contains("://") {
        domain.to_string()
    } else {
        format!("https://{}", domain)
    };

    let url = Url::parse(&candidate).ok()?;
    url.host_str().map(|host| site_host(host).to_string())
}

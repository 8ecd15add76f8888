// src/fetch/error.rs
// =============================================================================
// Why a page could not be loaded.
//
// The crawler itself only cares that a page failed (it becomes a broken link
// in the report), but keeping the reason around makes the log, the JSON
// output and the tests a lot more useful than a bare boolean.
// =============================================================================

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FetchError {
    /// The URL could not be parsed before sending anything
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// Request timed out
    #[error("request timed out")]
    Timeout,
    /// Too many redirects (redirect loop)
    #[error("too many redirects")]
    TooManyRedirects,
    /// Could not resolve hostname
    #[error("could not resolve hostname")]
    Dns,
    /// Host unreachable, connection refused, ...
    #[error("connection failed: {0}")]
    Connect(String),
    /// SSL/TLS certificate error
    #[error("SSL certificate error")]
    Tls,
    /// The server answered with a non-2xx status
    #[error("HTTP {0}")]
    HttpStatus(u16),
    /// The response is not an HTML document
    #[error("unsupported content type '{0}'")]
    UnsupportedContent(String),
    /// The body could not be read
    #[error("failed to read response body: {0}")]
    Body(String),
    /// Any other request error
    #[error("request failed: {0}")]
    Request(String),
}

// Sorts reqwest errors into the variants above
//
// reqwest doesn't expose DNS or TLS failures as separate kinds, so for those
// we look at the error text, like we do for link checks.
impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        let error_string = format!("{:?}", error).to_lowercase();

        if error.is_timeout() {
            FetchError::Timeout
        } else if error.is_redirect() {
            FetchError::TooManyRedirects
        } else if error.is_connect() {
            if error_string.contains("dns") || error_string.contains("resolve") {
                FetchError::Dns
            } else if error_string.contains("certificate") || error_string.contains("tls") {
                FetchError::Tls
            } else {
                FetchError::Connect(error.to_string())
            }
        } else if error_string.contains("certificate") || error_string.contains("ssl") {
            FetchError::Tls
        } else if error.is_body() || error.is_decode() {
            FetchError::Body(error.to_string())
        } else {
            FetchError::Request(error.to_string())
        }
    }
}

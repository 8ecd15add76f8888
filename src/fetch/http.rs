// src/fetch/http.rs
// =============================================================================
// The real page loader: downloads a page with reqwest and parses it with
// scraper.
//
// Key functionality:
// - One shared Client for every request (connection pooling)
// - Per-request timeout and a redirect limit
// - Anything that isn't a 2xx HTML response counts as a failed fetch
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, redirect, Client, Response};
use url::Url;

use super::{parse_page, FetchError, PageLoader, ParsedPage};

const MAX_REDIRECTS: usize = 5;

// Some servers refuse requests without a browser-like user agent
const USER_AGENT: &str = "Mozilla/5.0 (compatible; site-crawler/0.1)";

pub struct HttpPageLoader {
    client: Client,
}

impl HttpPageLoader {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageLoader for HttpPageLoader {
    async fn load_page(&self, url: &str) -> Result<ParsedPage, FetchError> {
        let target =
            Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;

        let response = self.client.get(target).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        if let Some(content_type) = content_type(&response) {
            if !is_html(&content_type) {
                return Err(FetchError::UnsupportedContent(content_type));
            }
        }

        // Relative links resolve against where we ended up after redirects
        let base = response.url().clone();
        // A timeout while reading the body is still a timeout
        let body = response.text().await?;

        Ok(parse_page(&body, &base))
    }
}

fn content_type(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_lowercase())
}

// A missing content type is given the benefit of the doubt by the caller
fn is_html(content_type: &str) -> bool {
    content_type.contains("text/html") || content_type.contains("xml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Heading;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn loader() -> HttpPageLoader {
        HttpPageLoader::new(Duration::from_secs(5)).unwrap()
    }

    fn impatient_loader() -> HttpPageLoader {
        HttpPageLoader::new(Duration::from_millis(200)).unwrap()
    }

    #[tokio::test]
    async fn test_loads_and_parses_html() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/docs/")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(r#"<h1>Docs</h1><a href="intro">Intro</a>"#)
            .create_async()
            .await;

        let url = format!("{}/docs/", server.url());
        let page = loader().load_page(&url).await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            page.headings,
            vec![Heading {
                level: 1,
                text: "Docs".to_string()
            }]
        );
        assert_eq!(page.links, vec![format!("{}/docs/intro", server.url())]);
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let url = format!("{}/missing", server.url());
        let error = loader().load_page(&url).await.unwrap_err();
        assert_eq!(error, FetchError::HttpStatus(404));
    }

    #[tokio::test]
    async fn test_non_html_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/report.pdf")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body("%PDF-1.7")
            .create_async()
            .await;

        let url = format!("{}/report.pdf", server.url());
        let error = loader().load_page(&url).await.unwrap_err();
        assert_eq!(error, FetchError::UnsupportedContent("application/pdf".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_url_fails_without_request() {
        let error = loader().load_page("not a url").await.unwrap_err();
        assert!(matches!(error, FetchError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // nothing listens on port 1
        let error = loader().load_page("http://127.0.0.1:1/").await.unwrap_err();
        assert!(matches!(error, FetchError::Connect(_)), "got {:?}", error);
    }

    #[tokio::test]
    async fn test_unknown_host() {
        let error = loader()
            .load_page("http://nonexistent.invalid/")
            .await
            .unwrap_err();
        assert_eq!(error, FetchError::Dns);
    }

    #[tokio::test]
    async fn test_redirect_loop_hits_the_limit() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/loop")
            .with_status(302)
            .with_header("location", "/loop")
            .create_async()
            .await;

        let url = format!("{}/loop", server.url());
        let error = loader().load_page(&url).await.unwrap_err();
        assert_eq!(error, FetchError::TooManyRedirects);
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        // The OS accepts the connection but nobody ever answers
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());

        let error = impatient_loader().load_page(&url).await.unwrap_err();
        assert_eq!(error, FetchError::Timeout);
        drop(listener);
    }

    #[tokio::test]
    async fn test_body_that_stalls_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let head = "HTTP/1.1 200 OK\r\n\
                        content-type: text/html\r\n\
                        content-length: 1000\r\n\r\n\
                        <h1>partial";
            let _ = socket.write_all(head.as_bytes()).await;
            // keep the connection open without sending the rest
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let error = impatient_loader().load_page(&url).await.unwrap_err();
        assert_eq!(error, FetchError::Timeout);
    }

    #[test]
    fn test_is_html() {
        assert!(is_html("text/html; charset=utf-8"));
        assert!(is_html("application/xhtml+xml"));
        assert!(!is_html("image/png"));
    }
}

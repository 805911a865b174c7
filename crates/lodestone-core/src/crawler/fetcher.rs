//! HTTP fetching for the crawler.
//!
//! Wraps reqwest's blocking client behind the three operations the crawler
//! needs: probe a URL's headers, decide whether they describe HTML, and
//! fetch a page body with a bounded number of redirects. The client is
//! pooled and shared so repeated requests to the same host reuse
//! connections.

use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::redirect;
use url::Url;

use crate::config::{FETCH_TIMEOUT_SECS, MAX_REDIRECTS};
use crate::error::CrawlError;

/// Shared pooled HTTP client.
///
/// Configured with the crawl-wide timeout, the redirect cap for body
/// fetches, and a user agent naming the crawler.
static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!("lodestone/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .redirect(redirect::Policy::limited(MAX_REDIRECTS))
        .pool_max_idle_per_host(10)
        .build()
        .expect("failed to build HTTP client")
});

/// Parses and normalizes a URL for crawling: validates the scheme and
/// strips any fragment (the url crate re-encodes the query on parse).
pub fn normalize(url: &str) -> Result<Url, CrawlError> {
    let mut parsed =
        Url::parse(url).map_err(|e| CrawlError::InvalidUrl(format!("{url}: {e}")))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(CrawlError::InvalidUrl(format!(
            "unsupported scheme: {}",
            parsed.scheme()
        )));
    }
    parsed.set_fragment(None);
    Ok(parsed)
}

/// Fetches the response headers for `url` without downloading the body.
pub fn fetch_headers(url: &Url) -> Result<HeaderMap, CrawlError> {
    let response = HTTP_CLIENT
        .head(url.clone())
        .send()
        .map_err(|e| CrawlError::RequestFailed(format!("{url}: {e}")))?;
    Ok(response.headers().clone())
}

/// Whether the response headers describe an HTML document.
pub fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|content_type| {
            content_type.contains("text/html") || content_type.contains("application/xhtml")
        })
        .unwrap_or(false)
}

/// Fetches the body of `url` as text, following at most the configured
/// number of redirects.
pub fn fetch_body(url: &Url) -> Result<String, CrawlError> {
    let response = HTTP_CLIENT
        .get(url.clone())
        .send()
        .map_err(|e| CrawlError::RequestFailed(format!("{url}: {e}")))?;
    if !response.status().is_success() {
        return Err(CrawlError::RequestFailed(format!(
            "{url}: status {}",
            response.status()
        )));
    }
    response
        .text()
        .map_err(|e| CrawlError::RequestFailed(format!("{url}: {e}")))
}

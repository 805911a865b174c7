//! Error types for building, crawling, and the work queue.
//!
//! Each failure domain gets its own enum so callers can match on exactly
//! the failures they can see. None of these trigger retries: recovery is
//! always "skip this unit of work, continue the batch".

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while crawling a single page.
///
/// A crawl error aborts only the affected page's task; the crawl itself
/// continues with whatever work is still in flight.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// URL failed to parse or uses a non-HTTP(S) scheme
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// Network request failed or returned an unusable response
    #[error("request failed: {0}")]
    RequestFailed(String),
    /// Response content type is not HTML
    #[error("skipping non-HTML content: {0}")]
    NonHtml(String),
    /// HTML could not be parsed for links or text
    #[error("failed to parse HTML: {0}")]
    ParseError(String),
}

/// Errors raised while building the index from the filesystem.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Failed to open or read a document
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Directory traversal failed below the corpus root
    #[error("directory traversal error: {0}")]
    Traversal(String),
}

/// Errors raised by the work queue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// Work was submitted after `shutdown`
    #[error("work queue is shut down")]
    ShutDown,
}

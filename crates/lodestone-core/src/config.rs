//! Default limits and thresholds.
//!
//! These values back the command-line defaults: a flag that is absent or
//! fails to parse falls back to the constant here rather than aborting.

// =============================================================================
// Concurrency
// =============================================================================

/// Default worker count for the work queue.
///
/// Used whenever a thread count is requested but absent or non-positive.
pub const DEFAULT_THREADS: usize = 5;

// =============================================================================
// Crawling
// =============================================================================

/// Default crawl budget in pages, counting the seed itself.
pub const DEFAULT_CRAWL_PAGES: usize = 1;

/// Maximum redirects followed while fetching a page body.
pub const MAX_REDIRECTS: usize = 3;

/// Per-request timeout in seconds for crawler fetches.
pub const FETCH_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Corpus discovery
// =============================================================================

/// File extensions considered indexable text, matched case-insensitively.
pub const TEXT_EXTENSIONS: [&str; 2] = ["txt", "text"];

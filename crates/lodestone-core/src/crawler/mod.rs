//! Budget-bounded, self-scheduling web crawler.
//!
//! The crawl starts from one seed URL and expands breadth-first through
//! discovered links, one work-queue task per page. Expansion is not
//! recursion: a page task submits new page tasks against the shared pool,
//! and [`WebCrawler::crawl`] returns only once the pool's completion
//! barrier has seen every dynamically spawned task finish.
//!
//! The page budget is enforced by [`CrawlFrontier`]: the visited-set
//! membership check, budget check, mark, and counter increment happen as
//! one atomic group per link (and the task submit stays inside the same
//! critical section), so concurrent discovery of the same URL from
//! different pages can neither double-schedule it nor overrun the budget.
//!
//! A page that fails to fetch, is not HTML, or cannot be parsed aborts
//! only its own task; the crawl continues.

pub mod fetcher;
pub mod parser;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};
use url::Url;

use crate::error::CrawlError;
use crate::index::{InvertedIndex, ThreadSafeInvertedIndex};
use crate::sync::{QueueHandle, WorkQueue};
use crate::text;

/// The shared visited set and page counter, guarded as one unit.
pub struct CrawlFrontier {
    visited: HashSet<String>,
    admitted: usize,
    budget: usize,
}

impl CrawlFrontier {
    /// Creates a frontier that will admit at most `budget` pages.
    pub fn new(budget: usize) -> Self {
        Self {
            visited: HashSet::new(),
            admitted: 0,
            budget: budget.max(1),
        }
    }

    /// Atomically checks membership and budget, and on success marks the
    /// URL visited and counts it against the budget.
    ///
    /// Returns whether the caller should schedule this URL. Once a URL is
    /// admitted it never will be again.
    pub fn try_admit(&mut self, url: &str) -> bool {
        if self.admitted >= self.budget || self.visited.contains(url) {
            return false;
        }
        self.visited.insert(url.to_string());
        self.admitted += 1;
        true
    }

    /// Pages admitted so far, including the seed.
    pub fn admitted(&self) -> usize {
        self.admitted
    }
}

/// Crawls a bounded subgraph of the web into a shared index.
pub struct WebCrawler {
    seed: Url,
    frontier: Arc<Mutex<CrawlFrontier>>,
    index: Arc<ThreadSafeInvertedIndex>,
    queue: WorkQueue,
}

impl WebCrawler {
    /// Creates a crawler for `seed` with a total page budget of
    /// `max_pages` (the seed counts) and `threads` workers.
    pub fn new(
        seed: &str,
        max_pages: usize,
        threads: usize,
        index: Arc<ThreadSafeInvertedIndex>,
    ) -> Result<Self, CrawlError> {
        let seed = fetcher::normalize(seed)?;
        Ok(Self {
            seed,
            frontier: Arc::new(Mutex::new(CrawlFrontier::new(max_pages))),
            index,
            queue: WorkQueue::new(threads),
        })
    }

    /// Runs the crawl to completion.
    ///
    /// Submits the seed task, then blocks until every task (including
    /// tasks submitted by running tasks) has finished, and finally tears
    /// the pool down.
    pub fn crawl(self) {
        info!("starting crawl from {}", self.seed);
        let handle = self.queue.handle();
        {
            let mut frontier = self.frontier.lock().unwrap();
            if frontier.try_admit(self.seed.as_str()) {
                submit_page(
                    &handle,
                    self.seed.clone(),
                    self.frontier.clone(),
                    self.index.clone(),
                );
            }
        }
        self.queue.drain_and_stop();
        info!(
            "crawl finished: {} pages admitted",
            self.frontier.lock().unwrap().admitted()
        );
    }
}

/// Schedules one page task. Must not be called for a URL that was not
/// admitted by the frontier.
fn submit_page(
    handle: &QueueHandle,
    url: Url,
    frontier: Arc<Mutex<CrawlFrontier>>,
    index: Arc<ThreadSafeInvertedIndex>,
) {
    let task_handle = handle.clone();
    let result = handle.execute(move || {
        if let Err(e) = crawl_page(&task_handle, &url, &frontier, &index) {
            debug!("skipping page: {e}");
        }
    });
    if result.is_err() {
        // Only possible if the pool was torn down mid-crawl.
        warn!("page task rejected by shut-down queue");
    }
}

/// Fetches, expands, and indexes a single page.
fn crawl_page(
    handle: &QueueHandle,
    url: &Url,
    frontier: &Arc<Mutex<CrawlFrontier>>,
    index: &Arc<ThreadSafeInvertedIndex>,
) -> Result<(), CrawlError> {
    let headers = fetcher::fetch_headers(url)?;
    if !fetcher::is_html(&headers) {
        return Err(CrawlError::NonHtml(url.to_string()));
    }
    let html = fetcher::fetch_body(url)?;

    // Expand before indexing so discovered pages start fetching while
    // this one is still being tokenized.
    let links = parser::find_links(url, &html);
    if !links.is_empty() {
        let mut frontier_guard = frontier.lock().unwrap();
        for link in links {
            if frontier_guard.try_admit(link.as_str()) {
                submit_page(handle, link, frontier.clone(), index.clone());
            }
        }
    }

    let text = parser::extract_text(&html);
    let location = url.as_str();
    let mut local = InvertedIndex::new();
    let mut position = 0;
    for term in text::stems(&text) {
        position += 1;
        local.insert(&term, location, position);
    }
    index.merge_from(local);
    debug!("indexed {} ({} terms)", location, position);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn frontier_admits_each_url_once() {
        let mut frontier = CrawlFrontier::new(10);
        assert!(frontier.try_admit("https://example.com/"));
        assert!(!frontier.try_admit("https://example.com/"));
        assert_eq!(frontier.admitted(), 1);
    }

    #[test]
    fn frontier_enforces_the_budget() {
        let mut frontier = CrawlFrontier::new(3);
        assert!(frontier.try_admit("https://example.com/a"));
        assert!(frontier.try_admit("https://example.com/b"));
        assert!(frontier.try_admit("https://example.com/c"));
        assert!(!frontier.try_admit("https://example.com/d"));
        assert_eq!(frontier.admitted(), 3);
    }

    #[test]
    fn frontier_budget_holds_under_concurrent_discovery() {
        let frontier = Arc::new(Mutex::new(CrawlFrontier::new(50)));
        let accepted = Arc::new(AtomicUsize::new(0));

        // Threads race to admit overlapping URL ranges.
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let frontier = frontier.clone();
                let accepted = accepted.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        // Overlap: each URL is attempted by two threads.
                        let url = format!("https://example.com/{}", (t / 2) * 100 + i);
                        if frontier.lock().unwrap().try_admit(&url) {
                            accepted.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(accepted.load(Ordering::SeqCst), 50);
        assert_eq!(frontier.lock().unwrap().admitted(), 50);
    }

    #[test]
    fn crawl_returns_when_the_seed_fetch_fails() {
        // Port 1 refuses connections, so the seed task fails fast; the
        // completion barrier must still see it finish and let crawl()
        // return with nothing indexed.
        let index = Arc::new(ThreadSafeInvertedIndex::new());
        let crawler = WebCrawler::new("http://127.0.0.1:1/", 5, 2, index.clone()).unwrap();
        crawler.crawl();
        assert!(index.is_empty());
    }

    #[test]
    fn crawler_rejects_invalid_seeds() {
        let index = Arc::new(ThreadSafeInvertedIndex::new());
        assert!(WebCrawler::new("not a url", 1, 2, index.clone()).is_err());
        assert!(WebCrawler::new("ftp://example.com/", 1, 2, index).is_err());
    }
}

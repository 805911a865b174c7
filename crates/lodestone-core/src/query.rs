//! Query engines with a canonical-key result cache.
//!
//! A raw query line is canonicalized by stemming, deduplicating, and
//! sorting its tokens; the space-joined set is the cache key, so two lines
//! that stem to the same set share one entry and one search.
//!
//! The threaded engine guarantees the search runs at most once per key
//! even under concurrent identical submissions, via a two-phase cache
//! update: a task reserves the key with a placeholder under the cache
//! lock, runs the search with no cache lock held (the store read lock is
//! enough), then re-enters the lock once to replace the placeholder with
//! the real results. A racing task that sees the placeholder skips.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::error::BuildError;
use crate::index::{InvertedIndex, SearchResult, ThreadSafeInvertedIndex};
use crate::sync::WorkQueue;
use crate::text;

/// Canonicalizes one raw query line into its cache key and term set.
///
/// Returns `None` for lines with no usable terms.
fn canonicalize(line: &str) -> Option<(String, BTreeSet<String>)> {
    let terms = text::unique_stems(line);
    if terms.is_empty() {
        return None;
    }
    let key = terms.iter().cloned().collect::<Vec<_>>().join(" ");
    Some((key, terms))
}

fn read_lines(path: &Path) -> Result<Vec<String>, BuildError> {
    let file = File::open(path).map_err(|source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    BufReader::new(file)
        .lines()
        .collect::<Result<_, _>>()
        .map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Sequential query engine over a plain index.
pub struct QuerySearch<'idx> {
    index: &'idx InvertedIndex,
    cache: BTreeMap<String, Vec<SearchResult>>,
}

impl<'idx> QuerySearch<'idx> {
    pub fn new(index: &'idx InvertedIndex) -> Self {
        Self {
            index,
            cache: BTreeMap::new(),
        }
    }

    /// Processes every line of the query file in order.
    pub fn process_file(&mut self, path: &Path, exact: bool) -> Result<(), BuildError> {
        let lines = read_lines(path)?;
        info!("processing {} query lines from {}", lines.len(), path.display());
        for line in lines {
            self.process_line(&line, exact);
        }
        Ok(())
    }

    /// Searches for one query line and caches the results under its
    /// canonical key. Re-submitting an already-processed query is a
    /// no-op.
    pub fn process_line(&mut self, line: &str, exact: bool) {
        let Some((key, terms)) = canonicalize(line) else {
            return;
        };
        if self.cache.contains_key(&key) {
            debug!("query already cached: {key}");
            return;
        }
        let results = self.index.search(&terms, exact);
        self.cache.insert(key, results);
    }

    /// Returns the cached results for `line`, or empty if it was never
    /// processed.
    pub fn get_results(&self, line: &str) -> Vec<SearchResult> {
        canonicalize(line)
            .and_then(|(key, _)| self.cache.get(&key).cloned())
            .unwrap_or_default()
    }

    /// All processed canonical query keys, sorted.
    pub fn query_lines(&self) -> Vec<String> {
        self.cache.keys().cloned().collect()
    }

    /// Owned copy of the full cache, for exporters.
    pub fn results_snapshot(&self) -> BTreeMap<String, Vec<SearchResult>> {
        self.cache.clone()
    }
}

/// Cache slot: `None` is the placeholder reserving a key whose search is
/// still in flight.
type PendingCache = BTreeMap<String, Option<Vec<SearchResult>>>;

/// Threaded query engine over the shared thread-safe index.
pub struct ThreadedQuerySearch {
    index: Arc<ThreadSafeInvertedIndex>,
    cache: Arc<Mutex<PendingCache>>,
    threads: usize,
}

impl ThreadedQuerySearch {
    pub fn new(index: Arc<ThreadSafeInvertedIndex>, threads: usize) -> Self {
        Self {
            index,
            cache: Arc::new(Mutex::new(BTreeMap::new())),
            threads,
        }
    }

    /// Processes the query file with one task per line, blocking until
    /// every line is done, then tears the pool down.
    pub fn process_file(&self, path: &Path, exact: bool) -> Result<(), BuildError> {
        let lines = read_lines(path)?;
        info!(
            "processing {} query lines from {} across {} workers",
            lines.len(),
            path.display(),
            self.threads
        );
        let queue = WorkQueue::new(self.threads);
        for line in lines {
            let index = self.index.clone();
            let cache = self.cache.clone();
            queue
                .execute(move || process_line_shared(&index, &cache, &line, exact))
                .expect("queue accepts work before drain_and_stop");
        }
        queue.drain_and_stop();
        Ok(())
    }

    /// Searches for one query line with the exactly-once guarantee.
    pub fn process_line(&self, line: &str, exact: bool) {
        process_line_shared(&self.index, &self.cache, line, exact);
    }

    /// Returns the cached results for `line`; empty if never processed or
    /// still in flight.
    pub fn get_results(&self, line: &str) -> Vec<SearchResult> {
        canonicalize(line)
            .and_then(|(key, _)| self.cache.lock().unwrap().get(&key).cloned())
            .flatten()
            .unwrap_or_default()
    }

    /// All processed canonical query keys, sorted.
    pub fn query_lines(&self) -> Vec<String> {
        self.cache.lock().unwrap().keys().cloned().collect()
    }

    /// Owned copy of the completed cache entries, for exporters.
    pub fn results_snapshot(&self) -> BTreeMap<String, Vec<SearchResult>> {
        self.cache
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(key, slot)| slot.clone().map(|results| (key.clone(), results)))
            .collect()
    }
}

/// The two-phase cache update shared by direct and task-driven calls.
fn process_line_shared(
    index: &ThreadSafeInvertedIndex,
    cache: &Mutex<PendingCache>,
    line: &str,
    exact: bool,
) {
    let Some((key, terms)) = canonicalize(line) else {
        return;
    };
    // Phase one: reserve the key, or skip if someone else already has it
    // (placeholder or finished results alike).
    {
        let mut cache_guard = cache.lock().unwrap();
        if cache_guard.contains_key(&key) {
            debug!("query already claimed: {key}");
            return;
        }
        cache_guard.insert(key.clone(), None);
    }
    // The search itself holds only the store's read lock.
    let results = index.search(&terms, exact);
    // Phase two: replace the placeholder.
    cache.lock().unwrap().insert(key, Some(results));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::thread;
    use tempfile::NamedTempFile;

    fn example_index() -> InvertedIndex {
        let mut index = InvertedIndex::new();
        index.insert("cat", "A", 1);
        index.insert("dog", "A", 2);
        index.insert("cat", "A", 3);
        index.insert("dog", "B", 1);
        index.insert("bird", "B", 2);
        index
    }

    #[test]
    fn canonical_key_sorts_and_dedupes_terms() {
        let (key, terms) = canonicalize("dogs CATS dog").unwrap();
        assert_eq!(key, "cat dog");
        assert_eq!(terms.len(), 2);
    }

    #[test]
    fn blank_lines_are_ignored() {
        let index = example_index();
        let mut search = QuerySearch::new(&index);
        search.process_line("", true);
        search.process_line("  42 ...  ", true);
        assert!(search.query_lines().is_empty());
    }

    #[test]
    fn equivalent_lines_share_one_cache_entry() {
        let index = example_index();
        let mut search = QuerySearch::new(&index);
        search.process_line("cat dog", true);
        search.process_line("dogs cats", true);
        search.process_line("DOG cat dog", true);
        assert_eq!(search.query_lines(), vec!["cat dog"]);
    }

    #[test]
    fn get_results_recomputes_the_key() {
        let index = example_index();
        let mut search = QuerySearch::new(&index);
        search.process_line("cat dog", true);

        let results = search.get_results("dogs cats");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].location, "A");
        assert_eq!(results[0].count, 3);
        assert!(search.get_results("unprocessed").is_empty());
    }

    #[test]
    fn process_file_handles_each_line() {
        let index = example_index();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "cat").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "dog bird").unwrap();
        file.flush().unwrap();

        let mut search = QuerySearch::new(&index);
        search.process_file(file.path(), true).unwrap();
        assert_eq!(search.query_lines(), vec!["bird dog", "cat"]);
    }

    #[test]
    fn threaded_engine_caches_one_entry_per_key() {
        let index = Arc::new(ThreadSafeInvertedIndex::new());
        {
            let mut local = example_index();
            local.insert("fish", "C", 1);
            index.merge_from(local);
        }
        let search = Arc::new(ThreadedQuerySearch::new(index, 4));

        // Many threads race the same logical query plus a few distinct ones.
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let search = search.clone();
                thread::spawn(move || {
                    search.process_line("cats dogs", true);
                    search.process_line("fishes", true);
                    search.process_line(if i % 2 == 0 { "bird" } else { "birds" }, true);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            search.query_lines(),
            vec!["bird", "cat dog", "fish"]
        );
        let results = search.get_results("cat dog");
        assert_eq!(results[0].location, "A");
        assert_eq!(results[0].count, 3);
    }

    #[test]
    fn threaded_process_file_completes_every_line() {
        let index = Arc::new(ThreadSafeInvertedIndex::new());
        index.merge_from(example_index());
        let search = ThreadedQuerySearch::new(index, 3);

        let mut file = NamedTempFile::new().unwrap();
        for line in ["cat", "dog", "bird", "cat dog", "cats", "missing"] {
            writeln!(file, "{line}").unwrap();
        }
        file.flush().unwrap();

        search.process_file(file.path(), true).unwrap();
        assert_eq!(
            search.query_lines(),
            vec!["bird", "cat", "cat dog", "dog", "miss"]
        );
        // Every placeholder was replaced by real results.
        for key in search.query_lines() {
            let snapshot = search.results_snapshot();
            assert!(snapshot.contains_key(&key));
        }
    }
}

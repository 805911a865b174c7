//! The inverted index store and ranked search.
//!
//! Maps each term to the locations it appears in and the 1-based positions
//! within each location's token stream, alongside a per-location total of
//! distinct term occurrences (the ranking denominator). All maps are
//! ordered: sorted term keys make prefix search a contiguous range scan,
//! and exports come out deterministic for free.

mod threadsafe;

pub use threadsafe::ThreadSafeInvertedIndex;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;

use serde::Serialize;

/// One ranked search hit.
///
/// `count` sums the occurrence counts of every matched query term at this
/// location; `score` divides that by the location's total term count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub location: String,
    pub count: usize,
    pub score: f64,
}

impl SearchResult {
    /// Ranking order: score descending, then count descending, then
    /// location ascending compared case-insensitively.
    fn ranking(&self, other: &Self) -> std::cmp::Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.count.cmp(&self.count))
            .then_with(|| {
                self.location
                    .to_lowercase()
                    .cmp(&other.location.to_lowercase())
            })
    }
}

/// Term → location → positions, plus per-location term counts.
#[derive(Debug, Default, Clone)]
pub struct InvertedIndex {
    postings: BTreeMap<String, BTreeMap<String, BTreeSet<usize>>>,
    /// Total distinct (term, position) pairs recorded per location; the
    /// denominator for scoring. Incremented only on novel insertions, so
    /// re-inserting an identical triple cannot inflate it.
    word_counts: BTreeMap<String, usize>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `term` occurs at `position` within `location`.
    ///
    /// Returns whether the triple was newly added; only then is the
    /// location's term count incremented.
    pub fn insert(&mut self, term: &str, location: &str, position: usize) -> bool {
        let added = self
            .postings
            .entry(term.to_string())
            .or_default()
            .entry(location.to_string())
            .or_default()
            .insert(position);
        if added {
            *self.word_counts.entry(location.to_string()).or_insert(0) += 1;
        }
        added
    }

    /// Unions `other`'s postings into this index and adds its term counts
    /// onto this index's counts.
    ///
    /// Callers must only merge fragments partitioned so that no two ever
    /// contain the same (term, location, position) triple; overlapping
    /// fragments would double-count the summed totals.
    pub fn merge_from(&mut self, other: InvertedIndex) {
        for (term, locations) in other.postings {
            match self.postings.get_mut(&term) {
                None => {
                    self.postings.insert(term, locations);
                }
                Some(current) => {
                    for (location, positions) in locations {
                        match current.get_mut(&location) {
                            None => {
                                current.insert(location, positions);
                            }
                            Some(existing) => existing.extend(positions),
                        }
                    }
                }
            }
        }
        for (location, count) in other.word_counts {
            *self.word_counts.entry(location).or_insert(0) += count;
        }
    }

    /// All indexed terms, sorted.
    pub fn terms(&self) -> Vec<String> {
        self.postings.keys().cloned().collect()
    }

    /// All locations containing `term`, sorted.
    pub fn locations(&self, term: &str) -> Vec<String> {
        self.postings
            .get(term)
            .map(|locations| locations.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Positions of `term` within `location`, ascending.
    pub fn positions(&self, term: &str, location: &str) -> BTreeSet<usize> {
        self.postings
            .get(term)
            .and_then(|locations| locations.get(location))
            .cloned()
            .unwrap_or_default()
    }

    /// All locations with at least one recorded term, sorted.
    pub fn indexed_locations(&self) -> Vec<String> {
        self.word_counts.keys().cloned().collect()
    }

    /// Total distinct term occurrences recorded for `location`.
    pub fn word_count(&self, location: &str) -> usize {
        self.word_counts.get(location).copied().unwrap_or(0)
    }

    pub fn has_term(&self, term: &str) -> bool {
        self.postings.contains_key(term)
    }

    pub fn has_location(&self, term: &str, location: &str) -> bool {
        self.postings
            .get(term)
            .is_some_and(|locations| locations.contains_key(location))
    }

    pub fn has_position(&self, term: &str, location: &str, position: usize) -> bool {
        self.postings
            .get(term)
            .and_then(|locations| locations.get(location))
            .is_some_and(|positions| positions.contains(&position))
    }

    /// Number of distinct terms.
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    /// Number of locations containing `term`.
    pub fn location_count(&self, term: &str) -> usize {
        self.postings.get(term).map(BTreeMap::len).unwrap_or(0)
    }

    /// Occurrence count of `term` at `location`.
    pub fn position_count(&self, term: &str, location: &str) -> usize {
        self.postings
            .get(term)
            .and_then(|locations| locations.get(location))
            .map(BTreeSet::len)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Read-only view of the full postings structure, for exporters.
    pub fn postings(&self) -> &BTreeMap<String, BTreeMap<String, BTreeSet<usize>>> {
        &self.postings
    }

    /// Read-only view of the per-location term counts, for exporters.
    pub fn word_counts(&self) -> &BTreeMap<String, usize> {
        &self.word_counts
    }

    /// Runs a ranked search for `queries`, exact or prefix.
    pub fn search(&self, queries: &BTreeSet<String>, exact: bool) -> Vec<SearchResult> {
        if exact {
            self.exact_search(queries)
        } else {
            self.partial_search(queries)
        }
    }

    /// Ranked search over terms exactly equal to a query term.
    pub fn exact_search(&self, queries: &BTreeSet<String>) -> Vec<SearchResult> {
        let mut matches: HashMap<&str, usize> = HashMap::new();
        for query in queries {
            self.accumulate(query, &mut matches);
        }
        self.rank(matches)
    }

    /// Ranked search over terms having a query term as prefix.
    ///
    /// Sorted keys make every prefix group contiguous: start at the first
    /// term >= the query and scan forward until a term no longer starts
    /// with it.
    pub fn partial_search(&self, queries: &BTreeSet<String>) -> Vec<SearchResult> {
        let mut matches: HashMap<&str, usize> = HashMap::new();
        for query in queries {
            let from = (Bound::Included(query.as_str()), Bound::Unbounded);
            for term in self
                .postings
                .range::<str, _>(from)
                .map(|(term, _)| term.as_str())
                .take_while(|term| term.starts_with(query.as_str()))
            {
                self.accumulate(term, &mut matches);
            }
        }
        self.rank(matches)
    }

    /// Folds one matched index term into the per-location running counts.
    fn accumulate<'a>(&'a self, term: &str, matches: &mut HashMap<&'a str, usize>) {
        if let Some((_, locations)) = self.postings.get_key_value(term) {
            for (location, positions) in locations {
                *matches.entry(location.as_str()).or_insert(0) += positions.len();
            }
        }
    }

    /// Scores and orders the accumulated matches.
    fn rank(&self, matches: HashMap<&str, usize>) -> Vec<SearchResult> {
        let mut results: Vec<SearchResult> = matches
            .into_iter()
            .map(|(location, count)| SearchResult {
                score: count as f64 / self.word_count(location) as f64,
                location: location.to_string(),
                count,
            })
            .collect();
        // Pre-sort by location so full ties stay deterministic under the
        // stable ranking sort.
        results.sort_by(|a, b| a.location.cmp(&b.location));
        results.sort_by(|a, b| a.ranking(b));
        results
    }
}

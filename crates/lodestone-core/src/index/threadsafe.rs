//! Thread-safe wrapper around [`InvertedIndex`].
//!
//! Composes the plain store with a [`MultiReaderLock`] rather than
//! overriding it: mutating operations take the write mode, everything else
//! (including search, which only reads) takes the read mode. Accessors
//! return owned snapshots so no guard ever escapes, and no operation does
//! I/O while holding the lock.

use std::collections::{BTreeMap, BTreeSet};

use super::{InvertedIndex, SearchResult};
use crate::sync::MultiReaderLock;

/// An [`InvertedIndex`] shared between builder, crawler, and query tasks.
#[derive(Default)]
pub struct ThreadSafeInvertedIndex {
    inner: MultiReaderLock<InvertedIndex>,
}

impl ThreadSafeInvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`InvertedIndex::insert`].
    pub fn insert(&self, term: &str, location: &str, position: usize) -> bool {
        self.inner.write().insert(term, location, position)
    }

    /// See [`InvertedIndex::merge_from`]. One write-lock acquisition
    /// absorbs an entire per-document fragment.
    pub fn merge_from(&self, other: InvertedIndex) {
        self.inner.write().merge_from(other);
    }

    /// See [`InvertedIndex::search`].
    pub fn search(&self, queries: &BTreeSet<String>, exact: bool) -> Vec<SearchResult> {
        self.inner.read().search(queries, exact)
    }

    pub fn terms(&self) -> Vec<String> {
        self.inner.read().terms()
    }

    pub fn locations(&self, term: &str) -> Vec<String> {
        self.inner.read().locations(term)
    }

    pub fn positions(&self, term: &str, location: &str) -> BTreeSet<usize> {
        self.inner.read().positions(term, location)
    }

    pub fn indexed_locations(&self) -> Vec<String> {
        self.inner.read().indexed_locations()
    }

    pub fn word_count(&self, location: &str) -> usize {
        self.inner.read().word_count(location)
    }

    pub fn has_term(&self, term: &str) -> bool {
        self.inner.read().has_term(term)
    }

    pub fn has_location(&self, term: &str, location: &str) -> bool {
        self.inner.read().has_location(term, location)
    }

    pub fn has_position(&self, term: &str, location: &str, position: usize) -> bool {
        self.inner.read().has_position(term, location, position)
    }

    pub fn term_count(&self) -> usize {
        self.inner.read().term_count()
    }

    pub fn location_count(&self, term: &str) -> usize {
        self.inner.read().location_count(term)
    }

    pub fn position_count(&self, term: &str, location: &str) -> usize {
        self.inner.read().position_count(term, location)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Owned copy of the per-location term counts.
    pub fn word_counts(&self) -> BTreeMap<String, usize> {
        self.inner.read().word_counts().clone()
    }

    /// Full owned copy of the index, for read-only consumers like
    /// exporters that want an unlocked view.
    pub fn snapshot(&self) -> InvertedIndex {
        self.inner.read().clone()
    }

    /// Consumes the wrapper, returning the plain index.
    pub fn into_inner(self) -> InvertedIndex {
        self.inner.into_inner()
    }
}

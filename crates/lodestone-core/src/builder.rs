//! Populates the index from files and directory trees.
//!
//! A single document streams line by line through the tokenizer with one
//! position counter for the whole file. A directory is walked for eligible
//! text files which are then built in sorted order, either sequentially or
//! as one work-queue task per document.
//!
//! The threaded build gives each task a private [`InvertedIndex`] covering
//! exactly one document and merges it into the shared index once at the
//! end: one write-lock acquisition per document instead of one per token,
//! and since no two tasks share a document the merge fragments can never
//! overlap.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::TEXT_EXTENSIONS;
use crate::error::BuildError;
use crate::index::{InvertedIndex, ThreadSafeInvertedIndex};
use crate::sync::WorkQueue;
use crate::text;

/// Lists the eligible documents under `root`, sorted by path.
///
/// A file root is returned as-is regardless of extension; within a
/// directory only files with a recognized text extension
/// (case-insensitive) are eligible.
pub fn list_documents(root: &Path) -> Result<Vec<PathBuf>, BuildError> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    let mut documents = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| BuildError::Traversal(e.to_string()))?;
        if entry.file_type().is_file() && is_text_file(entry.path()) {
            documents.push(entry.into_path());
        }
    }
    Ok(documents)
}

fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            TEXT_EXTENSIONS
                .iter()
                .any(|eligible| ext.eq_ignore_ascii_case(eligible))
        })
        .unwrap_or(false)
}

/// Indexes one document: every stemmed token becomes a
/// (term, path, position) triple with positions starting at 1.
pub fn build_file(path: &Path, index: &mut InvertedIndex) -> Result<(), BuildError> {
    let file = File::open(path).map_err(|source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let location = path.to_string_lossy().into_owned();
    let mut position = 0;

    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        for term in text::stems(&line) {
            position += 1;
            index.insert(&term, &location, position);
        }
    }
    debug!("indexed {} ({} terms)", location, position);
    Ok(())
}

/// Builds `path` (file or directory tree) into `index` sequentially.
pub fn build_path(path: &Path, index: &mut InvertedIndex) -> Result<(), BuildError> {
    let documents = list_documents(path)?;
    info!("building {} documents from {}", documents.len(), path.display());
    for document in documents {
        build_file(&document, index)?;
    }
    Ok(())
}

/// Builds `path` into the shared index with one task per document.
///
/// Blocks until every document task has finished, then tears the pool
/// down. A document that fails to read is logged and skipped; it does not
/// fail the batch.
pub fn build_path_threaded(
    path: &Path,
    index: &Arc<ThreadSafeInvertedIndex>,
    threads: usize,
) -> Result<(), BuildError> {
    let documents = list_documents(path)?;
    info!(
        "building {} documents from {} across {} workers",
        documents.len(),
        path.display(),
        threads
    );

    let queue = WorkQueue::new(threads);
    for document in documents {
        let index = Arc::clone(index);
        queue
            .execute(move || {
                let mut local = InvertedIndex::new();
                match build_file(&document, &mut local) {
                    Ok(()) => index.merge_from(local),
                    Err(e) => warn!("skipping document: {e}"),
                }
            })
            .expect("queue accepts work before drain_and_stop");
    }
    queue.drain_and_stop();
    Ok(())
}

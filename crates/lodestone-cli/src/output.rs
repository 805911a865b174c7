//! JSON exporters for the index, the per-location word counts, and the
//! cached query results.

use anyhow::{Context, Result};
use lodestone_core::index::{InvertedIndex, SearchResult};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

fn writer(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Writes the full term → location → positions mapping.
pub fn write_index(path: &Path, index: &InvertedIndex) -> Result<()> {
    serde_json::to_writer_pretty(writer(path)?, index.postings())
        .with_context(|| format!("failed to write index to {}", path.display()))
}

/// Writes the location → word count mapping.
pub fn write_counts(path: &Path, index: &InvertedIndex) -> Result<()> {
    serde_json::to_writer_pretty(writer(path)?, index.word_counts())
        .with_context(|| format!("failed to write counts to {}", path.display()))
}

/// Writes every cached query with its ranked results.
pub fn write_results(
    path: &Path,
    results: &BTreeMap<String, Vec<SearchResult>>,
) -> Result<()> {
    serde_json::to_writer_pretty(writer(path)?, results)
        .with_context(|| format!("failed to write results to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn exports_are_valid_json() {
        let mut index = InvertedIndex::new();
        index.insert("cat", "a.txt", 1);
        index.insert("dog", "a.txt", 2);

        let dir = TempDir::new().unwrap();
        let index_path = dir.path().join("index.json");
        let counts_path = dir.path().join("counts.json");
        write_index(&index_path, &index).unwrap();
        write_counts(&counts_path, &index).unwrap();

        let postings: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&index_path).unwrap()).unwrap();
        assert_eq!(postings["cat"]["a.txt"][0], 1);

        let counts: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&counts_path).unwrap()).unwrap();
        assert_eq!(counts["a.txt"], 2);
    }

    #[test]
    fn results_export_includes_scores() {
        let results = BTreeMap::from([(
            "cat".to_string(),
            vec![SearchResult {
                location: "a.txt".to_string(),
                count: 2,
                score: 0.5,
            }],
        )]);

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        write_results(&path, &results).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["cat"][0]["location"], "a.txt");
        assert_eq!(parsed["cat"][0]["score"], 0.5);
    }
}

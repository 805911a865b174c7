//! Lodestone CLI - build, crawl, and query an inverted index.
//!
//! # Usage
//!
//! ```bash
//! # Index a directory and answer a query file
//! lode --text ./corpus --query queries.txt --results
//!
//! # Crawl up to 50 pages from a seed and export the index
//! lode --html https://example.com --crawl 50 --index
//!
//! # Multithreaded build with 8 workers
//! lode --text ./corpus --threads 8 --counts counts.json
//! ```

mod output;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use lodestone_core::builder;
use lodestone_core::config;
use lodestone_core::crawler::WebCrawler;
use lodestone_core::index::{InvertedIndex, ThreadSafeInvertedIndex};
use lodestone_core::query::{QuerySearch, ThreadedQuerySearch};

/// Lodestone search engine driver.
///
/// Builds an inverted index from local text files or a web crawl, answers
/// ranked queries against it, and exports everything as JSON.
#[derive(Parser)]
#[command(name = "lode", version, about)]
struct Cli {
    /// Text file or directory to index
    #[arg(long)]
    text: Option<PathBuf>,

    /// Seed URL to crawl and index
    #[arg(long)]
    html: Option<String>,

    /// Total page budget for the crawl, seed included; malformed or
    /// non-positive values fall back to the default
    #[arg(long)]
    crawl: Option<String>,

    /// Worker thread count; also switches building and querying to the
    /// multithreaded engines. Malformed or non-positive values fall back
    /// to the default
    #[arg(long)]
    threads: Option<String>,

    /// Query file with one search per line
    #[arg(long)]
    query: Option<PathBuf>,

    /// Match query terms by prefix instead of exactly
    #[arg(long)]
    partial: bool,

    /// Write per-location word counts as JSON
    #[arg(long, num_args = 0..=1, default_missing_value = "counts.json")]
    counts: Option<PathBuf>,

    /// Write the full inverted index as JSON
    #[arg(long, num_args = 0..=1, default_missing_value = "index.json")]
    index: Option<PathBuf>,

    /// Write cached query results as JSON
    #[arg(long, num_args = 0..=1, default_missing_value = "results.json")]
    results: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Crawling always runs on the pool, so a seed forces threaded mode.
    let threaded = cli.threads.is_some() || cli.html.is_some();
    let threads = parse_count(cli.threads.as_deref(), config::DEFAULT_THREADS);

    if threaded {
        run_threaded(&cli, threads)
    } else {
        run_sequential(&cli)
    }
}

/// Single-threaded pipeline over the plain index.
///
/// Each stage reports its own failure and the run continues, so a bad
/// query file never blocks an index export.
fn run_sequential(cli: &Cli) -> Result<()> {
    let mut index = InvertedIndex::new();

    if let Some(text) = &cli.text {
        if let Err(e) = builder::build_path(text, &mut index) {
            error!("unable to index {}: {e}", text.display());
        }
    }

    let mut search = QuerySearch::new(&index);
    if let Some(query) = &cli.query {
        if let Err(e) = search.process_file(query, !cli.partial) {
            error!("unable to process queries from {}: {e}", query.display());
        }
    }

    if let Some(path) = &cli.results {
        if let Err(e) = output::write_results(path, &search.results_snapshot()) {
            error!("{e:#}");
        }
    }
    export_index(cli, &index);
    Ok(())
}

/// Multithreaded pipeline: pooled build, crawl, and querying over the
/// shared thread-safe index.
fn run_threaded(cli: &Cli, threads: usize) -> Result<()> {
    let index = Arc::new(ThreadSafeInvertedIndex::new());

    if let Some(text) = &cli.text {
        if let Err(e) = builder::build_path_threaded(text, &index, threads) {
            error!("unable to index {}: {e}", text.display());
        }
    }

    if let Some(seed) = &cli.html {
        let budget = parse_count(cli.crawl.as_deref(), config::DEFAULT_CRAWL_PAGES);
        match WebCrawler::new(seed, budget, threads, index.clone()) {
            Ok(crawler) => crawler.crawl(),
            Err(e) => error!("unable to crawl {seed}: {e}"),
        }
    }

    let search = ThreadedQuerySearch::new(index.clone(), threads);
    if let Some(query) = &cli.query {
        if let Err(e) = search.process_file(query, !cli.partial) {
            error!("unable to process queries from {}: {e}", query.display());
        }
    }

    if let Some(path) = &cli.results {
        if let Err(e) = output::write_results(path, &search.results_snapshot()) {
            error!("{e:#}");
        }
    }
    export_index(cli, &index.snapshot());
    Ok(())
}

/// Parses a numeric flag value leniently.
///
/// An absent, unparsable, or non-positive value falls back to `default`;
/// a bad number is never fatal.
fn parse_count(value: Option<&str>, default: usize) -> usize {
    match value.map(str::parse::<i64>) {
        Some(Ok(n)) if n >= 1 => n as usize,
        Some(_) => {
            warn!("ignoring invalid count {:?}, using {default}", value.unwrap_or(""));
            default
        }
        None => default,
    }
}

fn export_index(cli: &Cli, index: &InvertedIndex) {
    if let Some(path) = &cli.counts {
        if let Err(e) = output::write_counts(path, index) {
            error!("{e:#}");
        }
    }
    if let Some(path) = &cli.index {
        if let Err(e) = output::write_index(path, index) {
            error!("{e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_numeric_flags_are_not_fatal() {
        let cli = Cli::try_parse_from(["lode", "--threads", "abc"]).unwrap();
        assert_eq!(
            parse_count(cli.threads.as_deref(), config::DEFAULT_THREADS),
            config::DEFAULT_THREADS
        );

        let cli =
            Cli::try_parse_from(["lode", "--html", "https://example.com", "--crawl", "many"])
                .unwrap();
        assert_eq!(
            parse_count(cli.crawl.as_deref(), config::DEFAULT_CRAWL_PAGES),
            config::DEFAULT_CRAWL_PAGES
        );
    }

    #[test]
    fn non_positive_counts_fall_back_to_the_default() {
        assert_eq!(parse_count(Some("0"), 5), 5);
        assert_eq!(parse_count(Some("-3"), 5), 5);
        assert_eq!(parse_count(None, 5), 5);
        assert_eq!(parse_count(Some("8"), 5), 8);
    }

    #[test]
    fn a_malformed_threads_flag_still_selects_threaded_mode() {
        let cli = Cli::try_parse_from(["lode", "--threads", "lots"]).unwrap();
        assert!(cli.threads.is_some());
    }
}

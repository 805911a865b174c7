//! # Lodestone Core
//!
//! Single-process search engine: builds an inverted index from a text corpus
//! or a crawled web subset and answers ranked multi-term queries against it,
//! all under concurrent execution.
//!
//! ## Modules
//!
//! - [`sync`] - Concurrency primitives: a writer-preferring reader/writer lock
//!   and a bounded work queue with a dynamic completion barrier
//! - [`index`] - The inverted index store (term → location → positions),
//!   ranked exact/prefix search, and its thread-safe wrapper
//! - [`builder`] - Populates the index from files and directory trees,
//!   sequentially or one work-queue task per document
//! - [`crawler`] - Budget-bounded, self-scheduling web crawler
//! - [`query`] - Query engines (sequential and threaded) with a
//!   canonical-key result cache
//! - [`text`] - Tokenization and stemming
//! - [`config`] - Default limits and thresholds
//! - [`error`] - Error types for building, crawling, and the work queue

pub mod builder;
pub mod config;
pub mod crawler;
pub mod error;
pub mod index;
pub mod query;
pub mod sync;
pub mod text;

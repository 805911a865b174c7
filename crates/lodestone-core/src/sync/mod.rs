//! Concurrency primitives.
//!
//! Everything concurrent in this crate runs on exactly two abstractions:
//! [`MultiReaderLock`], a writer-preferring reader/writer lock guarding the
//! shared index, and [`WorkQueue`], a bounded worker pool whose completion
//! barrier stays correct when running tasks submit more tasks.

mod multi_reader;
mod work_queue;

pub use multi_reader::{MultiReaderLock, ReadGuard, WriteGuard};
pub use work_queue::{QueueHandle, WorkQueue};

//! Bounded worker pool with a dynamic completion barrier.
//!
//! A fixed set of worker threads pulls closures off a shared queue. The
//! barrier in [`WorkQueue::finish`] counts *outstanding* work: the pending
//! counter is incremented at submission time and decremented only after a
//! task returns, and the wait condition is re-checked under that same
//! counter. A task that submits more tasks mid-flight (the crawler's
//! fan-out pattern) therefore bumps the counter before the barrier can
//! observe zero, so no dynamically spawned work is ever missed.
//!
//! A task that panics is caught, logged, and counted as finished; the pool
//! never hangs waiting for a task that raised.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use tracing::{debug, warn};

use crate::error::QueueError;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct QueueState {
    jobs: VecDeque<Job>,
    /// Submitted-but-not-finished task count; the barrier condition
    pending: usize,
    shutdown: bool,
}

struct Inner {
    state: Mutex<QueueState>,
    /// Workers park here for new jobs
    work_available: Condvar,
    /// `finish` parks here until `pending` reaches zero
    work_done: Condvar,
}

/// A bounded pool of worker threads executing submitted closures.
pub struct WorkQueue {
    inner: Arc<Inner>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl WorkQueue {
    /// Creates a pool with `threads` workers (at least one).
    pub fn new(threads: usize) -> Self {
        let threads = threads.max(1);
        let inner = Arc::new(Inner {
            state: Mutex::new(QueueState {
                jobs: VecDeque::new(),
                pending: 0,
                shutdown: false,
            }),
            work_available: Condvar::new(),
            work_done: Condvar::new(),
        });

        let workers = (0..threads)
            .map(|i| {
                let inner = inner.clone();
                thread::Builder::new()
                    .name(format!("lodestone-worker-{i}"))
                    .spawn(move || worker_loop(&inner))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        debug!("work queue started with {} workers", threads);
        Self { inner, workers }
    }

    /// Enqueues a task for asynchronous execution and returns immediately.
    ///
    /// Returns [`QueueError::ShutDown`] if the pool has been shut down.
    pub fn execute<F>(&self, job: F) -> Result<(), QueueError>
    where
        F: FnOnce() + Send + 'static,
    {
        submit(&self.inner, Box::new(job))
    }

    /// Returns a cloneable handle that can submit work to this pool.
    ///
    /// Handles let a running task schedule follow-up tasks on the pool
    /// that is executing it.
    pub fn handle(&self) -> QueueHandle {
        QueueHandle {
            inner: self.inner.clone(),
        }
    }

    /// Blocks until every outstanding task has finished, including tasks
    /// submitted by tasks that were running when the call began.
    pub fn finish(&self) {
        let mut state = self.inner.state.lock().unwrap();
        while state.pending > 0 {
            state = self.inner.work_done.wait(state).unwrap();
        }
    }

    /// Signals workers to stop pulling work and joins them.
    ///
    /// Queued-but-unstarted jobs are discarded (and counted as finished so
    /// a concurrent `finish` cannot hang); call [`WorkQueue::finish`] first
    /// if the queued work must run. Subsequent `execute` calls fail.
    pub fn shutdown(&mut self) {
        {
            let mut state = self.inner.state.lock().unwrap();
            if state.shutdown {
                return;
            }
            state.shutdown = true;
            let abandoned = state.jobs.len();
            if abandoned > 0 {
                warn!("shutting down with {} unstarted jobs", abandoned);
                state.pending -= abandoned;
                state.jobs.clear();
                if state.pending == 0 {
                    self.inner.work_done.notify_all();
                }
            }
        }
        self.inner.work_available.notify_all();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        debug!("work queue shut down");
    }

    /// Waits for all outstanding work, then tears the pool down.
    ///
    /// One-shot convenience for callers that submit a batch and are done
    /// with the pool afterwards.
    pub fn drain_and_stop(mut self) {
        self.finish();
        self.shutdown();
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Cloneable submission handle to a [`WorkQueue`].
#[derive(Clone)]
pub struct QueueHandle {
    inner: Arc<Inner>,
}

impl QueueHandle {
    /// Enqueues a task on the underlying pool; see [`WorkQueue::execute`].
    pub fn execute<F>(&self, job: F) -> Result<(), QueueError>
    where
        F: FnOnce() + Send + 'static,
    {
        submit(&self.inner, Box::new(job))
    }
}

fn submit(inner: &Inner, job: Job) -> Result<(), QueueError> {
    {
        let mut state = inner.state.lock().unwrap();
        if state.shutdown {
            return Err(QueueError::ShutDown);
        }
        // Increment happens at submission time so a barrier already in
        // progress cannot observe zero before this job runs.
        state.pending += 1;
        state.jobs.push_back(job);
    }
    inner.work_available.notify_one();
    Ok(())
}

fn worker_loop(inner: &Inner) {
    loop {
        let job = {
            let mut state = inner.state.lock().unwrap();
            loop {
                if state.shutdown {
                    return;
                }
                if let Some(job) = state.jobs.pop_front() {
                    break job;
                }
                state = inner.work_available.wait(state).unwrap();
            }
        };

        if catch_unwind(AssertUnwindSafe(job)).is_err() {
            warn!("task panicked; treating as failed and continuing");
        }

        let mut state = inner.state.lock().unwrap();
        state.pending -= 1;
        if state.pending == 0 {
            inner.work_done.notify_all();
        }
    }
}

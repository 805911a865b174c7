//! Writer-preferring reader/writer lock.
//!
//! Like [`std::sync::RwLock`] this wraps the protected value and hands out
//! RAII guards, but the fairness policy is fixed and documented: a reader
//! that arrives while any writer is waiting (or active) parks until the
//! writer queue is empty, so a continuous stream of readers can never
//! starve a writer.
//!
//! # Contract
//!
//! - Any number of readers may hold the lock simultaneously.
//! - A writer is exclusive against all readers and other writers.
//! - Not reentrant, no read-to-write upgrade: a thread holding a guard must
//!   not acquire another guard on the same lock.

use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex};

/// Bookkeeping shared by all guards, protected by one mutex.
struct LockState {
    /// Readers currently holding the lock
    readers: usize,
    /// Whether a writer currently holds the lock
    writer: bool,
    /// Writers parked in [`MultiReaderLock::write`]
    writers_waiting: usize,
}

/// A reader/writer lock over a value of type `T` with writer preference.
pub struct MultiReaderLock<T> {
    state: Mutex<LockState>,
    /// Readers park here until no writer holds or wants the lock
    readers_cv: Condvar,
    /// Writers park here until the lock is free of readers and writers
    writers_cv: Condvar,
    value: UnsafeCell<T>,
}

// Safety: access to `value` is mediated entirely by the state mutex and
// condvars below; a write guard exists only while `writer` is set and no
// readers are active, and read guards only while `writer` is clear.
unsafe impl<T: Send> Send for MultiReaderLock<T> {}
unsafe impl<T: Send + Sync> Sync for MultiReaderLock<T> {}

impl<T> MultiReaderLock<T> {
    /// Creates a new lock wrapping `value`.
    pub fn new(value: T) -> Self {
        Self {
            state: Mutex::new(LockState {
                readers: 0,
                writer: false,
                writers_waiting: 0,
            }),
            readers_cv: Condvar::new(),
            writers_cv: Condvar::new(),
            value: UnsafeCell::new(value),
        }
    }

    /// Acquires the lock in read mode, blocking while a writer holds or
    /// is waiting for the lock.
    pub fn read(&self) -> ReadGuard<'_, T> {
        let mut state = self.state.lock().unwrap();
        while state.writer || state.writers_waiting > 0 {
            state = self.readers_cv.wait(state).unwrap();
        }
        state.readers += 1;
        ReadGuard { lock: self }
    }

    /// Acquires the lock in write mode, blocking until it is exclusive.
    pub fn write(&self) -> WriteGuard<'_, T> {
        let mut state = self.state.lock().unwrap();
        state.writers_waiting += 1;
        while state.writer || state.readers > 0 {
            state = self.writers_cv.wait(state).unwrap();
        }
        state.writers_waiting -= 1;
        state.writer = true;
        WriteGuard { lock: self }
    }

    /// Consumes the lock, returning the wrapped value.
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }
}

impl<T: Default> Default for MultiReaderLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Shared-access guard returned by [`MultiReaderLock::read`].
pub struct ReadGuard<'a, T> {
    lock: &'a MultiReaderLock<T>,
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Safety: no write guard can exist while `readers > 0`.
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        let mut state = self.lock.state.lock().unwrap();
        state.readers -= 1;
        if state.readers == 0 && state.writers_waiting > 0 {
            self.lock.writers_cv.notify_one();
        }
    }
}

/// Exclusive-access guard returned by [`MultiReaderLock::write`].
pub struct WriteGuard<'a, T> {
    lock: &'a MultiReaderLock<T>,
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Safety: this guard is the sole holder while `writer` is set.
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // Safety: this guard is the sole holder while `writer` is set.
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<T> Drop for WriteGuard<'_, T> {
    fn drop(&mut self) {
        let mut state = self.lock.state.lock().unwrap();
        state.writer = false;
        if state.writers_waiting > 0 {
            self.lock.writers_cv.notify_one();
        } else {
            self.lock.readers_cv.notify_all();
        }
    }
}

//! Growable MPMC queue for in-process (inter-thread) communication.
//!
//! A FIFO queue over a heap-allocated circular buffer, guarded by one mutex
//! and one condition variable.
//!
//! # Overview
//!
//! - [`Queue::enqueue`] never blocks and never reports "full": when the
//!   buffer is full it doubles in place under the lock.
//! - [`Queue::dequeue`] blocks while the queue is empty and wakes when an
//!   element arrives.
//! - Any number of producer and consumer threads may share one queue
//!   (wrap it in an [`Arc`](std::sync::Arc)).
//! - Storage is never returned to the allocator until the queue is destroyed.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use mpmcq::Queue;
//!
//! let queue = Arc::new(Queue::new(0)?);
//!
//! let producer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || {
//!         for i in 0..100u64 {
//!             queue.enqueue(i).expect("allocation failed");
//!         }
//!     })
//! };
//!
//! // Blocks until each value arrives.
//! let sum: u64 = (0..100).map(|_| queue.dequeue().unwrap()).sum();
//! producer.join().unwrap();
//!
//! assert_eq!(sum, 4950);
//! Arc::into_inner(queue).unwrap().destroy()?;
//! # Ok::<(), mpmcq::QueueError>(())
//! ```
//!
//! # Ordering
//!
//! Elements from one producer come out in the order that producer enqueued
//! them. Elements from different producers interleave in lock-acquisition
//! order. Every element is delivered to exactly one `dequeue` call.

use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard};

use crate::error::{EnqueueError, QueueError};
use crate::ring::Ring;
use crate::trace::{debug, error, trace, warn};

/// Initial logical capacity used by [`QueueConfig::default`].
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

/// Configuration for a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Elements the queue holds before its first growth. Zero is valid.
    pub initial_capacity: usize,
    /// Name attached to trace events for this queue.
    pub label: Option<String>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            label: None,
        }
    }
}

impl QueueConfig {
    #[must_use]
    pub const fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A growable multi-producer, multi-consumer FIFO queue.
///
/// The queue stores values of `T` and never inspects them. If `T` is a
/// handle to something else (an index, a pointer-like id, an `Arc`), what it
/// refers to stays the caller's responsibility. "Null-like" values such as
/// `None` or `0` are ordinary elements.
///
/// Elements still queued when the queue is destroyed or dropped are dropped
/// with it.
///
/// See [the module-level documentation](crate::sync::queue) for an example.
pub struct Queue<T> {
    state: Mutex<Ring<T>>,
    /// Signaled once per successful enqueue.
    nonempty: Condvar,
    label: Option<String>,
}

impl<T> Queue<T> {
    /// Creates a queue that holds `initial_capacity` elements before growing.
    ///
    /// # Errors
    ///
    /// [`QueueError::Allocation`] or [`QueueError::CapacityOverflow`] if the
    /// storage cannot be allocated.
    pub fn new(initial_capacity: usize) -> Result<Self, QueueError> {
        Self::with_config(&QueueConfig::default().with_initial_capacity(initial_capacity))
    }

    /// Creates a queue from a [`QueueConfig`].
    ///
    /// # Errors
    ///
    /// Same as [`Queue::new`].
    pub fn with_config(config: &QueueConfig) -> Result<Self, QueueError> {
        let ring = match Ring::with_capacity(config.initial_capacity) {
            Ok(ring) => ring,
            Err(err) => {
                warn!(
                    label = ?config.label,
                    capacity = config.initial_capacity,
                    error = %err,
                    "queue allocation failed"
                );
                return Err(err);
            }
        };

        debug!(
            label = ?config.label,
            capacity = config.initial_capacity,
            "queue created"
        );

        Ok(Self {
            state: Mutex::new(ring),
            nonempty: Condvar::new(),
            label: config.label.clone(),
        })
    }

    /// The label from the queue's configuration.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ring<T>>, QueueError> {
        self.state.lock().map_err(|_| {
            error!(label = ?self.label, "queue lock poisoned");
            QueueError::Poisoned
        })
    }

    /// Appends `item` to the back of the queue.
    ///
    /// Never blocks waiting for room. If the queue is full, its storage
    /// doubles first. Wakes one waiting consumer.
    ///
    /// # Errors
    ///
    /// Returns the item inside [`EnqueueError`] if growth fails to allocate
    /// or the lock is poisoned. The queue is not modified in either case.
    pub fn enqueue(&self, item: T) -> Result<(), EnqueueError<T>> {
        let mut ring = match self.lock() {
            Ok(ring) => ring,
            Err(err) => return Err(EnqueueError::new(err, item)),
        };

        ring.push(item)?;
        trace!(label = ?self.label, len = ring.len(), "enqueued");

        // One new element, one wakeup. Issued before the guard drops.
        self.nonempty.notify_one();
        Ok(())
    }

    /// Removes the element at the front of the queue, blocking while empty.
    ///
    /// There is no timeout: the call waits until some producer enqueues.
    ///
    /// # Errors
    ///
    /// [`QueueError::Poisoned`] if the lock is poisoned before or during the
    /// wait. Emptiness is never an error.
    pub fn dequeue(&self) -> Result<T, QueueError> {
        let mut ring = self.lock()?;
        loop {
            // Re-checked after every wake: the wakeup may be spurious, or
            // another consumer may have taken the element first.
            if let Some(item) = ring.pop() {
                trace!(label = ?self.label, len = ring.len(), "dequeued");
                return Ok(item);
            }

            trace!(label = ?self.label, "queue empty, waiting");
            ring = self.nonempty.wait(ring).map_err(|_| {
                error!(label = ?self.label, "queue lock poisoned during wait");
                QueueError::Poisoned
            })?;
        }
    }

    /// Number of elements currently queued.
    ///
    /// The value is a snapshot and may be stale once the lock is released.
    ///
    /// # Errors
    ///
    /// [`QueueError::Poisoned`] if the lock is poisoned.
    pub fn len(&self) -> Result<usize, QueueError> {
        Ok(self.lock()?.len())
    }

    /// Number of elements the queue holds before its next growth.
    ///
    /// # Errors
    ///
    /// [`QueueError::Poisoned`] if the lock is poisoned.
    pub fn capacity(&self) -> Result<usize, QueueError> {
        Ok(self.lock()?.capacity())
    }

    /// Destroys the queue, releasing its storage and dropping any elements
    /// still queued.
    ///
    /// Taking `self` by value means no other thread can be using the queue.
    /// For a shared queue, recover it with [`Arc::into_inner`] after joining
    /// the threads that use it.
    ///
    /// [`Arc::into_inner`]: std::sync::Arc::into_inner
    ///
    /// # Errors
    ///
    /// [`QueueError::Poisoned`] if a thread panicked while holding the lock.
    /// The storage is released either way.
    pub fn destroy(self) -> Result<(), QueueError> {
        let Self { state, label, .. } = self;
        match state.into_inner() {
            Ok(ring) => {
                debug!(label = ?label, remaining = ring.len(), "queue destroyed");
                drop(ring);
                Ok(())
            }
            Err(_) => {
                error!(label = ?label, "queue destroyed with poisoned lock");
                Err(QueueError::Poisoned)
            }
        }
    }
}

impl<T> fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

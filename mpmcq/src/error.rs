//! Error types shared by the ring algorithm and the concurrent queue.

use std::collections::TryReserveError;
use std::fmt;
use std::sync::PoisonError;

use thiserror::Error;

/// Errors reported by queue operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The allocator refused the storage for the requested slot count.
    #[error("failed to allocate queue storage: {0}")]
    Allocation(#[from] TryReserveError),
    /// The slot count derived from `capacity` does not fit in `usize`.
    ///
    /// Raised by creation with `capacity` and by growth from `capacity`.
    #[error("slot count for queue capacity {capacity} overflows usize")]
    CapacityOverflow {
        /// Logical capacity that was being allocated or grown.
        capacity: usize,
    },
    /// A thread panicked while holding the queue lock.
    ///
    /// The queue state can no longer be trusted; every later operation on the
    /// same instance reports this error.
    #[error("queue lock poisoned by a panicking thread")]
    Poisoned,
}

impl<G> From<PoisonError<G>> for QueueError {
    fn from(_: PoisonError<G>) -> Self {
        Self::Poisoned
    }
}

/// A failed enqueue, carrying the item that was not stored.
///
/// The queue is left exactly as it was before the call.
#[derive(Error)]
#[error("failed to enqueue item: {error}")]
pub struct EnqueueError<T> {
    error: QueueError,
    item: T,
}

impl<T> EnqueueError<T> {
    pub(crate) const fn new(error: QueueError, item: T) -> Self {
        Self { error, item }
    }

    /// The reason the item was rejected.
    #[must_use]
    pub const fn error(&self) -> &QueueError {
        &self.error
    }

    /// Recovers the rejected item.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.item
    }

    /// Splits the error into its reason and the rejected item.
    #[must_use]
    pub fn into_parts(self) -> (QueueError, T) {
        (self.error, self.item)
    }
}

// Payloads are opaque to the queue, so the item is never formatted.
impl<T> fmt::Debug for EnqueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnqueueError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> From<EnqueueError<T>> for QueueError {
    fn from(err: EnqueueError<T>) -> Self {
        err.error
    }
}

//! Growable circular buffer algorithm.
//!
//! This module holds the index arithmetic and the order-preserving growth
//! used by [`crate::sync::queue::Queue`]. It does no locking: the queue
//! wraps a [`Ring`] in its mutex and every method here runs inside that
//! critical section.
//!
//! # Layout
//!
//! A ring of logical capacity `C` owns `C + 1` slots. `begin` is the oldest
//! live slot, `end` is one past the newest. One slot always stays free, so
//! `begin == end` means empty and `advance(end) == begin` means full.
//!
//! ```text
//!  no wrap (begin <= end)         wrap (begin > end)
//!  [ . a b c . . ]                [ d e . . a b c ]
//!      ^     ^                          ^   ^
//!    begin  end                        end begin
//! ```

use std::mem::MaybeUninit;
use std::ops::Range;
use std::ptr;

use crate::error::{EnqueueError, QueueError};
use crate::trace::{debug, warn};

/// Circular buffer of `T` with one spare slot.
pub(crate) struct Ring<T> {
    buffer: Box<[MaybeUninit<T>]>,
    begin: usize,
    end: usize,
}

impl<T> Ring<T> {
    /// Allocates a ring that holds `capacity` elements before it grows.
    pub(crate) fn with_capacity(capacity: usize) -> Result<Self, QueueError> {
        Ok(Self {
            buffer: allocate(capacity)?,
            begin: 0,
            end: 0,
        })
    }

    /// Advances a slot index, wrapping to 0 at `slots`.
    ///
    /// Equivalent to `(index + 1) % slots` without the division.
    #[inline]
    pub(crate) const fn advance(index: usize, slots: usize) -> usize {
        let next = index + 1;
        if next == slots { 0 } else { next }
    }

    #[inline]
    fn slots(&self) -> usize {
        self.buffer.len()
    }

    /// Number of elements the ring holds before the next growth.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots() - 1
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        Self::advance(self.end, self.slots()) == self.begin
    }

    /// Live element count, `(end - begin) mod slots`.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        if self.end >= self.begin {
            self.end - self.begin
        } else {
            self.slots() - self.begin + self.end
        }
    }

    /// The live region as two index spans, oldest first.
    ///
    /// The second span is empty unless the live region wraps.
    fn spans(&self) -> (Range<usize>, Range<usize>) {
        if self.begin <= self.end {
            (self.begin..self.end, 0..0)
        } else {
            (self.begin..self.slots(), 0..self.end)
        }
    }

    /// Appends `item`, growing first if the ring is full.
    ///
    /// # Errors
    ///
    /// Returns the item inside [`EnqueueError`] if growth fails. The ring is
    /// unchanged in that case.
    pub(crate) fn push(&mut self, item: T) -> Result<(), EnqueueError<T>> {
        if self.is_full() {
            if let Err(error) = self.grow() {
                warn!(capacity = self.capacity(), %error, "ring growth failed");
                return Err(EnqueueError::new(error, item));
            }
        }

        self.buffer[self.end].write(item);
        self.end = Self::advance(self.end, self.slots());
        Ok(())
    }

    /// Removes the oldest element.
    pub(crate) fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        // SAFETY: begin != end, so `begin` lies in the live region. Every live
        // slot was written by `push` (or moved there by `grow`) and has not
        // been read since. Advancing `begin` below retires the slot, so the
        // value is read exactly once.
        let item = unsafe { self.buffer[self.begin].assume_init_read() };
        self.begin = Self::advance(self.begin, self.slots());
        Some(item)
    }

    /// Doubles the logical capacity (0 grows to 1), keeping FIFO order.
    ///
    /// Live elements move to the front of the new buffer: `begin` becomes 0
    /// and `end` becomes the live length.
    ///
    /// # Errors
    ///
    /// [`QueueError::CapacityOverflow`] if the doubled slot count does not fit
    /// in `usize`, [`QueueError::Allocation`] if the allocator refuses. The
    /// ring is unchanged on error.
    pub(crate) fn grow(&mut self) -> Result<(), QueueError> {
        let old_capacity = self.capacity();
        let new_capacity = old_capacity
            .checked_mul(2)
            .ok_or(QueueError::CapacityOverflow {
                capacity: old_capacity,
            })?
            .max(1);
        let mut buffer = allocate::<T>(new_capacity)?;

        let len = self.len();
        let (head, tail) = self.spans();
        debug_assert_eq!(head.len() + tail.len(), len);

        // SAFETY:
        // - Both spans lie inside the old buffer and cover exactly the live
        //   slots, which are initialized.
        // - The new buffer has `new_capacity + 1 > len` slots, so
        //   `[0, len)` is in bounds.
        // - The buffers are distinct allocations, so the copies don't overlap.
        // - The old buffer is replaced right after and holds `MaybeUninit`,
        //   so dropping it does not drop the moved values.
        unsafe {
            let src = self.buffer.as_ptr();
            let dst = buffer.as_mut_ptr();
            ptr::copy_nonoverlapping(src.add(head.start), dst, head.len());
            ptr::copy_nonoverlapping(src.add(tail.start), dst.add(head.len()), tail.len());
        }

        debug!(
            from = old_capacity,
            to = new_capacity,
            len,
            wrapped = !tail.is_empty(),
            "ring grew"
        );

        self.buffer = buffer;
        self.begin = 0;
        self.end = len;
        Ok(())
    }
}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        while self.pop().is_some() {}
    }
}

/// Allocates `capacity + 1` uninitialized slots without aborting on failure.
fn allocate<T>(capacity: usize) -> Result<Box<[MaybeUninit<T>]>, QueueError> {
    let slots = capacity
        .checked_add(1)
        .ok_or(QueueError::CapacityOverflow { capacity })?;

    let mut buffer = Vec::new();
    buffer.try_reserve_exact(slots)?;
    buffer.resize_with(slots, MaybeUninit::uninit);
    Ok(buffer.into_boxed_slice())
}

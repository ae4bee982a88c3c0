//! A growable multi-producer, multi-consumer FIFO queue.
//!
//! [`Queue<T>`] is a circular buffer behind a mutex and a condition
//! variable. Enqueue never blocks: a full buffer doubles in place. Dequeue
//! blocks while the queue is empty.
//!
//! ```
//! use mpmcq::{Queue, QueueConfig};
//!
//! let queue = Queue::with_config(&QueueConfig::default().with_initial_capacity(0))?;
//! for i in 0..10 {
//!     queue.enqueue(i)?;
//! }
//! for i in 0..10 {
//!     assert_eq!(queue.dequeue()?, i);
//! }
//! queue.destroy()?;
//! # Ok::<(), mpmcq::QueueError>(())
//! ```
//!
//! Build with `--features tracing` and call [`init_tracing`] to see growth
//! and wakeup events.

pub mod error;
pub mod sync;

mod ring;
mod trace;

pub use error::{EnqueueError, QueueError};
pub use sync::queue::{DEFAULT_INITIAL_CAPACITY, Queue, QueueConfig};
pub use trace::init_tracing;

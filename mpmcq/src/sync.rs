//! Synchronization primitives for in-process communication.
//!
//! This module provides thread-safe queues shared between threads within
//! the same process.

pub mod queue;

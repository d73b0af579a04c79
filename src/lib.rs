//! Lock-free SPSC ring buffer for no-std embedded targets.
//!
//! # Highlights
//! - One producer and one consumer, each possibly an interrupt handler.
//! - Runs over caller-supplied storage; no allocation, no locks.
//! - Optional drop-oldest overwrite mode, bulk transfer, and deadline-bounded
//!   polling wrappers.
//! - Per-instance diagnostics: last-error snapshot and usage statistics.
//!
//! # Quick start
//! ```
//! use ph_ring::RingBuffer;
//!
//! let mut storage = [0u8; 16];
//! let mut ring = RingBuffer::new(&mut storage);
//!
//! ring.insert(42).unwrap();
//! assert_eq!(ring.peek(0), Ok(42));
//! assert_eq!(ring.remove(), Ok(42));
//! ```
//!
//! # Producer and consumer in different contexts
//! ```
//! use ph_ring::RingBuffer;
//!
//! let mut storage = [0u32; 64];
//! let mut ring = RingBuffer::new(&mut storage);
//! let (mut tx, mut rx) = ring.split();
//!
//! std::thread::scope(|s| {
//!     s.spawn(move || {
//!         for i in 0..1000 {
//!             while tx.insert(i).is_err() {
//!                 std::thread::yield_now();
//!             }
//!         }
//!     });
//!     let mut next = 0;
//!     while next < 1000 {
//!         if let Ok(v) = rx.remove() {
//!             assert_eq!(v, next);
//!             next += 1;
//!         }
//!     }
//! });
//! ```
//!
//! # Semantics
//! - A ring over `N` slots holds at most `N - 1` items; one slot is kept free
//!   to tell "full" from "empty".
//! - Every fallible call returns [`Result`]; `is_ok()` is the boolean view.
//!   Failures are also recorded in a per-ring [`ErrorInfo`] snapshot.
//! - Bulk calls stop at the first rejection and report how many items moved.
//!
//! # Features
//! - `stats` (default): usage counters, see [`Stats`].
//! - `tracing` (default): `tracing` events on rejections, evictions,
//!   integrity failures and timeouts. Turn off on targets without `alloc`.
//! - `std`: [`StdClock`] and the `*_with_timeout` shorthands.
//! - `portable-atomic*`: atomics from `portable-atomic` for cores without
//!   native compare-and-swap.
//!
//! # Safety and concurrency
//! The ring is SPSC by construction: the producer and consumer halves come
//! from [`RingBuffer::split`], which borrows the ring mutably, so a second
//! producer or consumer cannot exist. Sharing one half between contexts needs
//! an external lock around it.
#![no_std]

#[cfg(any(test, feature = "std"))]
extern crate std;

#[cfg(feature = "tracing")]
macro_rules! log_event {
    ($level:ident, $($arg:tt)+) => {
        tracing::$level!($($arg)+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! log_event {
    ($level:ident, $($arg:tt)+) => {
        ()
    };
}

pub(crate) use log_event;

mod atomic;
pub mod error;
mod handles;
pub mod ring;
pub mod stats;
pub mod timeout;

pub use error::{ErrorInfo, Operation, Parameter, Result, RingError};
pub use handles::{Consumer, Producer};
pub use ring::RingBuffer;
pub use stats::Stats;
#[cfg(feature = "std")]
pub use timeout::StdClock;
pub use timeout::{Clock, PollPolicy, poll_until};

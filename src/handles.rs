//! Producer and consumer halves of a split [`RingBuffer`].

use core::panic::Location;
use core::time::Duration;

use crate::error::Result;
use crate::ring::RingBuffer;
use crate::timeout::Clock;

/// The inserting side. Exactly one exists per split.
pub struct Producer<'r, 'a, T: Copy> {
    ring: &'r RingBuffer<'a, T>,
}

impl<'r, 'a, T: Copy> Producer<'r, 'a, T> {
    pub(crate) fn new(ring: &'r RingBuffer<'a, T>) -> Self {
        Self { ring }
    }

    #[track_caller]
    #[inline]
    pub fn insert(&mut self, item: T) -> Result<()> {
        self.ring.insert_inner(item, Location::caller().line())
    }

    #[track_caller]
    pub fn try_insert_bulk(&mut self, items: &[T]) -> Result<usize> {
        self.ring.insert_bulk_inner(items, Location::caller().line())
    }

    #[track_caller]
    pub fn insert_bulk(&mut self, items: &[T]) -> usize {
        self.try_insert_bulk(items).unwrap_or(0)
    }

    #[track_caller]
    pub fn insert_with_timeout_on<C: Clock + ?Sized>(
        &mut self,
        item: T,
        timeout: Duration,
        clock: &C,
    ) -> Result<()> {
        self.ring
            .insert_timeout_inner(item, timeout, clock, Location::caller().line())
    }

    #[cfg(feature = "std")]
    #[track_caller]
    pub fn insert_with_timeout(&mut self, item: T, timeout: Duration) -> Result<()> {
        let line = Location::caller().line();
        self.ring
            .insert_timeout_inner(item, timeout, &crate::timeout::StdClock, line)
    }

    #[inline]
    pub fn free_space(&self) -> usize {
        self.ring.free_space()
    }

    #[inline]
    pub fn occupancy(&self) -> usize {
        self.ring.occupancy()
    }

    #[inline]
    pub fn overwrite_enabled(&self) -> bool {
        self.ring.overwrite_enabled()
    }

    /// Shared view of the ring for read-only calls (stats, diagnostics, ...).
    #[inline]
    pub fn ring(&self) -> &'r RingBuffer<'a, T> {
        self.ring
    }
}

/// The removing side. Exactly one exists per split.
pub struct Consumer<'r, 'a, T: Copy> {
    ring: &'r RingBuffer<'a, T>,
}

impl<'r, 'a, T: Copy> Consumer<'r, 'a, T> {
    pub(crate) fn new(ring: &'r RingBuffer<'a, T>) -> Self {
        Self { ring }
    }

    #[track_caller]
    #[inline]
    pub fn remove(&mut self) -> Result<T> {
        self.ring.remove_inner(Location::caller().line())
    }

    #[track_caller]
    pub fn try_remove_bulk(&mut self, out: &mut [T]) -> Result<usize> {
        self.ring.remove_bulk_inner(out, Location::caller().line())
    }

    #[track_caller]
    pub fn remove_bulk(&mut self, out: &mut [T]) -> usize {
        self.try_remove_bulk(out).unwrap_or(0)
    }

    #[track_caller]
    pub fn peek(&self, offset: usize) -> Result<T> {
        self.ring.peek(offset)
    }

    #[track_caller]
    pub fn remove_with_timeout_on<C: Clock + ?Sized>(
        &mut self,
        timeout: Duration,
        clock: &C,
    ) -> Result<T> {
        self.ring
            .remove_timeout_inner(timeout, clock, Location::caller().line())
    }

    #[cfg(feature = "std")]
    #[track_caller]
    pub fn remove_with_timeout(&mut self, timeout: Duration) -> Result<T> {
        let line = Location::caller().line();
        self.ring
            .remove_timeout_inner(timeout, &crate::timeout::StdClock, line)
    }

    #[inline]
    pub fn occupancy(&self) -> usize {
        self.ring.occupancy()
    }

    #[inline]
    pub fn free_space(&self) -> usize {
        self.ring.free_space()
    }

    #[inline]
    pub fn ring(&self) -> &'r RingBuffer<'a, T> {
        self.ring
    }
}

//! Fixed-capacity SPSC ring over caller-supplied storage.
//!
//! # Layout
//! `producer_index` counts items written, `consumer_index` items read. Both
//! run modulo `lap`, the largest multiple of `capacity` that fits in a
//! `usize`, and index `i` lives in slot `i % capacity`. The ring is empty when
//! the indices are equal and full at `capacity - 1` items, so one slot is
//! always left unused. A single-slot ring therefore never holds anything.
//!
//! Counting past `capacity` keeps the consumer index from coming back to an
//! earlier value while the producer evicts: the same value recurs only after
//! `lap` evictions.
//!
//! # Memory ordering
//! Each side writes or reads its slot, then publishes its index behind a
//! release fence; the other side reads that index and issues an acquire fence
//! before touching the slot. Index loads and stores themselves are relaxed.
//!
//! # Overwrite mode
//! When overwrite is on and the ring is full, the producer drops the oldest
//! item by advancing the consumer index with a compare-and-swap before writing.
//! The consumer publishes with a compare-and-swap as well and retries its read
//! if the producer got there first, so an evicted item is never returned.
//!
//! # Concurrency
//! Exactly one producer and one consumer. Either use the `&mut self` methods
//! from a single context, or [`split`](RingBuffer::split) the ring into a
//! [`Producer`] and a [`Consumer`] that may live in different threads or
//! interrupt handlers. Read-only methods take `&self` and may be called from
//! any context. Several producers or consumers need an external lock around
//! their handle; nothing inside the ring arbitrates between them.

use core::fmt;
use core::marker::PhantomData;
use core::mem::MaybeUninit;
use core::panic::Location;
use core::ptr::NonNull;
use core::time::Duration;

use crate::atomic::{Flag, IndexCell, Ordering, fence};
use crate::error::{ErrorInfo, LastError, Operation, Result, RingError};
use crate::handles::{Consumer, Producer};
use crate::stats::{Stats, StatsRecorder};
use crate::timeout::{Clock, PollPolicy, poll_until};

/// Lock-free SPSC ring buffer borrowing its storage for `'a`.
///
/// The ring never allocates. A ring built without storage, or over an empty
/// slice, is inert: every operation fails cleanly with
/// [`RingError::NullPointer`] or [`RingError::InvalidSize`].
pub struct RingBuffer<'a, T> {
    slots: Option<NonNull<T>>,
    capacity: usize,
    lap: usize,
    producer_index: IndexCell,
    consumer_index: IndexCell,
    overwrite: Flag,
    poll: PollPolicy,
    last_error: LastError,
    stats: StatsRecorder,
    _storage: PhantomData<&'a mut [T]>,
}

// Slots are only reached through the index protocol described above.
unsafe impl<T: Send> Send for RingBuffer<'_, T> {}
unsafe impl<T: Send> Sync for RingBuffer<'_, T> {}

/// Largest multiple of `capacity` representable in a `usize`.
#[inline]
const fn lap_for(capacity: usize) -> usize {
    if capacity == 0 { 0 } else { usize::MAX / capacity * capacity }
}

#[inline(always)]
const fn next_index(index: usize, lap: usize) -> usize {
    if index + 1 == lap { 0 } else { index + 1 }
}

#[inline(always)]
const fn span(producer: usize, consumer: usize, lap: usize) -> usize {
    if producer >= consumer {
        producer - consumer
    } else {
        lap - consumer + producer
    }
}

impl<'a, T: Copy> RingBuffer<'a, T> {
    /// A ring with no storage. Call [`init`](Self::init) before use.
    pub fn uninit() -> Self {
        Self {
            slots: None,
            capacity: 0,
            lap: 0,
            producer_index: IndexCell::new(0),
            consumer_index: IndexCell::new(0),
            overwrite: Flag::new(false),
            poll: PollPolicy::default(),
            last_error: LastError::new(),
            stats: StatsRecorder::new(),
            _storage: PhantomData,
        }
    }

    /// Build a ring over `storage`.
    ///
    /// An empty slice yields an inert ring with `InvalidSize` recorded in
    /// [`last_error`](Self::last_error); use [`try_new`](Self::try_new) to get
    /// the failure as a value instead.
    #[track_caller]
    pub fn new(storage: &'a mut [T]) -> Self {
        let mut ring = Self::uninit();
        let _ = ring.init_inner(Some(storage), Location::caller().line());
        ring
    }

    #[track_caller]
    pub fn try_new(storage: &'a mut [T]) -> Result<Self> {
        let mut ring = Self::uninit();
        ring.init_inner(Some(storage), Location::caller().line())?;
        Ok(ring)
    }

    /// (Re)initialize over `storage`.
    ///
    /// Indices go to zero, overwrite is turned off, the poll policy returns to
    /// its default, and the error snapshot and statistics are cleared. `None`
    /// fails with `NullPointer`, an empty slice with `InvalidSize`; in both
    /// cases the ring is left fully reset and inert.
    #[track_caller]
    pub fn init(&mut self, storage: Option<&'a mut [T]>) -> Result<()> {
        self.init_inner(storage, Location::caller().line())
    }

    fn init_inner(&mut self, storage: Option<&'a mut [T]>, line: u32) -> Result<()> {
        self.producer_index.reset(0);
        self.consumer_index.reset(0);
        self.overwrite.set(false);
        self.poll = PollPolicy::default();
        self.last_error.clear();
        self.stats.reset();

        let Some(storage) = storage else {
            self.slots = None;
            self.capacity = 0;
            self.lap = 0;
            crate::log_event!(warn, "ring initialized without storage");
            return self.track(Operation::Init, line, Err(RingError::NullPointer));
        };
        self.capacity = storage.len();
        self.lap = lap_for(self.capacity);
        self.slots = Some(NonNull::from(storage).cast::<T>());
        if self.capacity == 0 {
            crate::log_event!(warn, "ring initialized over zero-length storage");
            return self.track(Operation::Init, line, Err(RingError::InvalidSize));
        }
        Ok(())
    }

    /// Slot count of the storage, including the slot that is never filled.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of items currently held.
    pub fn occupancy(&self) -> usize {
        if self.slots.is_none() || self.capacity == 0 {
            return 0;
        }
        let (producer, consumer) = self.index_pair();
        if !self.in_range(producer, consumer) {
            // Corrupted; `check_integrity` reports it.
            return 0;
        }
        span(producer, consumer, self.lap)
    }

    /// Number of inserts that would succeed right now without eviction.
    pub fn free_space(&self) -> usize {
        if self.slots.is_none() || self.capacity == 0 {
            return 0;
        }
        let (producer, consumer) = self.index_pair();
        if !self.in_range(producer, consumer) {
            return 0;
        }
        self.capacity - 1 - span(producer, consumer, self.lap)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.occupancy() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.free_space() == 0
    }

    /// Structural integrity check: storage present, non-zero capacity, both
    /// indices in range and occupancy below capacity.
    #[track_caller]
    pub fn check_integrity(&self) -> Result<()> {
        let line = Location::caller().line();
        let result = self.geometry().and_then(|(_, capacity)| {
            let (producer, consumer) = self.index_pair();
            if !self.in_range(producer, consumer) {
                crate::log_event!(warn, producer, consumer, capacity, "ring indices out of range");
                return Err(RingError::BufferCorrupted);
            }
            Ok(())
        });
        self.track(Operation::SanityCheck, line, result)
    }

    /// Boolean view of [`check_integrity`](Self::check_integrity).
    #[track_caller]
    pub fn sanity_check(&self) -> bool {
        self.check_integrity().is_ok()
    }

    /// Insert one item. Fails with `BufferFull` unless overwrite is on.
    #[track_caller]
    pub fn insert(&mut self, item: T) -> Result<()> {
        self.insert_inner(item, Location::caller().line())
    }

    /// Remove the oldest item.
    #[track_caller]
    pub fn remove(&mut self) -> Result<T> {
        self.remove_inner(Location::caller().line())
    }

    /// Copy out the item `offset` places after the oldest one without
    /// removing anything.
    #[track_caller]
    pub fn peek(&self, offset: usize) -> Result<T> {
        let line = Location::caller().line();
        let result = self.peek_at(offset);
        self.track(Operation::Peek, line, result)
    }

    /// Insert items in order, stopping at the first rejection.
    ///
    /// Returns how many were inserted. Transferring at least one item is a
    /// success; only a call that moves nothing returns an error.
    #[track_caller]
    pub fn try_insert_bulk(&mut self, items: &[T]) -> Result<usize> {
        self.insert_bulk_inner(items, Location::caller().line())
    }

    /// Count-only view of [`try_insert_bulk`](Self::try_insert_bulk).
    #[track_caller]
    pub fn insert_bulk(&mut self, items: &[T]) -> usize {
        self.try_insert_bulk(items).unwrap_or(0)
    }

    /// Remove up to `out.len()` items into `out`, oldest first.
    #[track_caller]
    pub fn try_remove_bulk(&mut self, out: &mut [T]) -> Result<usize> {
        self.remove_bulk_inner(out, Location::caller().line())
    }

    #[track_caller]
    pub fn remove_bulk(&mut self, out: &mut [T]) -> usize {
        self.try_remove_bulk(out).unwrap_or(0)
    }

    /// [`insert`](Self::insert), retried on `clock` until `timeout` elapses.
    #[track_caller]
    pub fn insert_with_timeout_on<C: Clock + ?Sized>(
        &mut self,
        item: T,
        timeout: Duration,
        clock: &C,
    ) -> Result<()> {
        self.insert_timeout_inner(item, timeout, clock, Location::caller().line())
    }

    #[track_caller]
    pub fn remove_with_timeout_on<C: Clock + ?Sized>(
        &mut self,
        timeout: Duration,
        clock: &C,
    ) -> Result<T> {
        self.remove_timeout_inner(timeout, clock, Location::caller().line())
    }

    #[cfg(feature = "std")]
    #[track_caller]
    pub fn insert_with_timeout(&mut self, item: T, timeout: Duration) -> Result<()> {
        let line = Location::caller().line();
        self.insert_timeout_inner(item, timeout, &crate::timeout::StdClock, line)
    }

    #[cfg(feature = "std")]
    #[track_caller]
    pub fn remove_with_timeout(&mut self, timeout: Duration) -> Result<T> {
        let line = Location::caller().line();
        self.remove_timeout_inner(timeout, &crate::timeout::StdClock, line)
    }

    /// Turn drop-oldest eviction on or off. Only future inserts are affected.
    pub fn set_overwrite(&mut self, enable: bool) {
        self.overwrite.set(enable);
    }

    #[inline]
    pub fn overwrite_enabled(&self) -> bool {
        self.overwrite.get()
    }

    #[track_caller]
    pub fn set_poll_policy(&mut self, policy: PollPolicy) -> Result<()> {
        let line = Location::caller().line();
        let result = policy.validate();
        if result.is_ok() {
            self.poll = policy;
        }
        self.track(Operation::SetPollPolicy, line, result)
    }

    #[inline]
    pub fn poll_policy(&self) -> PollPolicy {
        self.poll
    }

    pub fn stats(&self) -> Stats {
        self.stats.snapshot()
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    pub fn last_error(&self) -> ErrorInfo {
        self.last_error.snapshot()
    }

    pub fn clear_error(&mut self) {
        self.last_error.clear();
    }

    /// Hand out the producer and consumer halves.
    ///
    /// Control operations (`set_overwrite`, `init`, resets) need `&mut self`
    /// and so cannot run while the halves are alive.
    pub fn split(&mut self) -> (Producer<'_, 'a, T>, Consumer<'_, 'a, T>) {
        let ring = &*self;
        (Producer::new(ring), Consumer::new(ring))
    }

    // Entry points shared with the split handles. Callers of the `insert*`
    // family must be the only producer, callers of `remove*` the only consumer.

    pub(crate) fn insert_inner(&self, item: T, line: u32) -> Result<()> {
        let result = self.produce(item, self.overwrite.get());
        self.track(Operation::Insert, line, result)
    }

    pub(crate) fn remove_inner(&self, line: u32) -> Result<T> {
        let result = self.consume();
        self.track(Operation::Remove, line, result)
    }

    pub(crate) fn insert_bulk_inner(&self, items: &[T], line: u32) -> Result<usize> {
        let result = self.geometry().and_then(|_| {
            if items.is_empty() {
                return Err(RingError::InvalidCount);
            }
            let overwrite = self.overwrite.get();
            let mut inserted = 0;
            for &item in items {
                match self.produce(item, overwrite) {
                    Ok(()) => inserted += 1,
                    Err(err) if inserted == 0 => return Err(err),
                    Err(_) => break,
                }
            }
            Ok(inserted)
        });
        self.track(Operation::InsertBulk, line, result)
    }

    pub(crate) fn remove_bulk_inner(&self, out: &mut [T], line: u32) -> Result<usize> {
        let result = self.geometry().and_then(|_| {
            if out.is_empty() {
                return Err(RingError::InvalidCount);
            }
            let mut removed = 0;
            for slot in out.iter_mut() {
                match self.consume() {
                    Ok(item) => {
                        *slot = item;
                        removed += 1;
                    }
                    Err(err) if removed == 0 => return Err(err),
                    Err(_) => break,
                }
            }
            Ok(removed)
        });
        self.track(Operation::RemoveBulk, line, result)
    }

    pub(crate) fn insert_timeout_inner<C: Clock + ?Sized>(
        &self,
        item: T,
        timeout: Duration,
        clock: &C,
        line: u32,
    ) -> Result<()> {
        let overwrite = self.overwrite.get();
        let result = poll_until(clock, &self.poll, timeout, RingError::BufferFull, || {
            self.produce(item, overwrite)
        });
        self.track(Operation::InsertWithTimeout, line, result)
    }

    pub(crate) fn remove_timeout_inner<C: Clock + ?Sized>(
        &self,
        timeout: Duration,
        clock: &C,
        line: u32,
    ) -> Result<T> {
        let result = poll_until(clock, &self.poll, timeout, RingError::BufferEmpty, || {
            self.consume()
        });
        self.track(Operation::RemoveWithTimeout, line, result)
    }

    #[inline]
    fn geometry(&self) -> Result<(NonNull<T>, usize)> {
        let slots = self.slots.ok_or(RingError::NullPointer)?;
        if self.capacity == 0 {
            return Err(RingError::InvalidSize);
        }
        Ok((slots, self.capacity))
    }

    #[inline]
    fn track<R>(&self, operation: Operation, line: u32, result: Result<R>) -> Result<R> {
        if let Err(err) = &result {
            self.last_error.record(operation, *err, line);
        }
        result
    }

    /// Index pair read so that the consumer index did not move while the
    /// producer index was loaded. Only the consumer, or the producer while
    /// evicting, moves it.
    #[inline]
    fn index_pair(&self) -> (usize, usize) {
        loop {
            let consumer = self.consumer_index.observe();
            let producer = self.producer_index.observe();
            if self.consumer_index.load() == consumer {
                return (producer, consumer);
            }
        }
    }

    #[inline]
    fn in_range(&self, producer: usize, consumer: usize) -> bool {
        producer < self.lap
            && consumer < self.lap
            && span(producer, consumer, self.lap) < self.capacity
    }

    fn produce(&self, item: T, overwrite: bool) -> Result<()> {
        let (slots, capacity) = self.geometry()?;
        let lap = self.lap;
        let producer = self.producer_index.load();
        let consumer = self.consumer_index.observe();
        if !self.in_range(producer, consumer) {
            crate::log_event!(warn, producer, consumer, capacity, "insert found indices out of range");
            return Err(RingError::BufferCorrupted);
        }

        if span(producer, consumer, lap) == capacity - 1 {
            // A single-slot ring has nothing to evict.
            if !overwrite || capacity == 1 {
                self.stats.overflowed();
                crate::log_event!(trace, capacity, "insert rejected, ring full");
                return Err(RingError::BufferFull);
            }
            if self
                .consumer_index
                .advance_from(consumer, next_index(consumer, lap))
            {
                crate::log_event!(trace, slot = consumer % capacity, "evicted oldest item");
            }
            // A failed swap means the consumer freed the slot itself.
            fence(Ordering::Release);
        }

        let next = next_index(producer, lap);
        // SAFETY: the slot index is below `capacity`, and the slot lies
        // outside the published range, so the consumer is not reading it.
        unsafe { slots.as_ptr().add(producer % capacity).write(item) };
        self.producer_index.publish(next);

        self.stats.inserted(span(next, self.consumer_index.load(), lap));
        Ok(())
    }

    fn consume(&self) -> Result<T> {
        let (slots, capacity) = self.geometry()?;
        let lap = self.lap;
        let contended = self.overwrite.get();
        loop {
            let (producer, consumer) = if contended {
                self.index_pair()
            } else {
                (self.producer_index.observe(), self.consumer_index.load())
            };
            if !self.in_range(producer, consumer) {
                crate::log_event!(warn, producer, consumer, capacity, "remove found indices out of range");
                return Err(RingError::BufferCorrupted);
            }
            if consumer == producer {
                self.stats.underflowed();
                crate::log_event!(trace, "remove rejected, ring empty");
                return Err(RingError::BufferEmpty);
            }

            // SAFETY: the slot index is below `capacity` and the slot was
            // published by the producer. Read as `MaybeUninit` until we know
            // it was not evicted.
            let item = unsafe {
                slots
                    .as_ptr()
                    .add(consumer % capacity)
                    .cast::<MaybeUninit<T>>()
                    .read()
            };
            let next = next_index(consumer, lap);
            if contended {
                if !self.consumer_index.advance_from(consumer, next) {
                    continue;
                }
            } else {
                self.consumer_index.publish(next);
            }

            self.stats.removed();
            // SAFETY: the slot held a published item that nobody evicted.
            return Ok(unsafe { item.assume_init() });
        }
    }

    fn peek_at(&self, offset: usize) -> Result<T> {
        let (slots, capacity) = self.geometry()?;
        loop {
            let (producer, consumer) = self.index_pair();
            if !self.in_range(producer, consumer) {
                return Err(RingError::BufferCorrupted);
            }
            if offset >= span(producer, consumer, self.lap) {
                return Err(RingError::InvalidOffset);
            }

            let pos = (consumer % capacity + offset) % capacity;
            // SAFETY: `pos < capacity`; validated against the consumer index below.
            let item = unsafe { slots.as_ptr().add(pos).cast::<MaybeUninit<T>>().read() };
            fence(Ordering::Acquire);
            if self.consumer_index.load() == consumer {
                // SAFETY: the slot was not released while we read it.
                return Ok(unsafe { item.assume_init() });
            }
        }
    }
}

impl<T: Copy> Default for RingBuffer<'_, T> {
    fn default() -> Self {
        Self::uninit()
    }
}

impl<T> fmt::Debug for RingBuffer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("has_storage", &self.slots.is_some())
            .field("capacity", &self.capacity)
            .field("producer_index", &self.producer_index.load())
            .field("consumer_index", &self.consumer_index.load())
            .field("overwrite", &self.overwrite.get())
            .finish_non_exhaustive()
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use core::cell::Cell;
    use core::time::Duration;

    use super::{RingBuffer, lap_for, next_index, span};
    use crate::error::{Operation, Parameter, RingError};
    use crate::timeout::Clock;

    /// Virtual time that only moves when slept on.
    #[derive(Default)]
    struct TickClock {
        now: Cell<Duration>,
    }

    impl Clock for TickClock {
        type Instant = Duration;

        fn now(&self) -> Duration {
            self.now.get()
        }

        fn elapsed(&self, since: Duration) -> Duration {
            self.now.get() - since
        }

        fn sleep(&self, duration: Duration) {
            self.now.set(self.now.get() + duration);
        }
    }

    #[test]
    fn occupancy_formula_wraps() {
        assert_eq!(span(3, 1, 5), 2);
        assert_eq!(span(1, 3, 5), 3);
        assert_eq!(span(2, 2, 5), 0);
    }

    #[test]
    fn new_ring_is_empty_and_sane() {
        let mut storage = [0u8; 8];
        let ring = RingBuffer::new(&mut storage);
        assert_eq!(ring.capacity(), 8);
        assert_eq!(ring.occupancy(), 0);
        assert_eq!(ring.free_space(), 7);
        assert!(ring.sanity_check());
        assert!(!ring.overwrite_enabled());
        assert!(ring.last_error().is_clear());
    }

    #[test]
    fn zero_capacity_is_inert() {
        let mut storage: [u8; 0] = [];
        let mut ring = RingBuffer::new(&mut storage);
        let info = ring.last_error();
        assert_eq!(info.code, Some(RingError::InvalidSize));
        assert_eq!(info.operation, Some(Operation::Init));
        assert_eq!(info.parameter, Some(Parameter::Storage));

        assert_eq!(ring.insert(1), Err(RingError::InvalidSize));
        assert_eq!(ring.remove(), Err(RingError::InvalidSize));
        assert_eq!(ring.peek(0), Err(RingError::InvalidSize));
        assert_eq!(ring.free_space(), 0);
        assert_eq!(ring.occupancy(), 0);
        assert!(!ring.sanity_check());
    }

    #[test]
    fn missing_storage_is_inert() {
        let clock = TickClock::default();
        let mut ring = RingBuffer::<u16>::uninit();
        assert_eq!(ring.init(None), Err(RingError::NullPointer));
        assert_eq!(ring.insert(1), Err(RingError::NullPointer));
        assert_eq!(ring.remove(), Err(RingError::NullPointer));
        assert_eq!(ring.peek(0), Err(RingError::NullPointer));
        assert_eq!(ring.insert_bulk(&[1, 2]), 0);
        assert_eq!(ring.try_insert_bulk(&[1, 2]), Err(RingError::NullPointer));
        let mut out = [0u16; 2];
        assert_eq!(ring.try_remove_bulk(&mut out), Err(RingError::NullPointer));
        assert_eq!(ring.remove_bulk(&mut out), 0);
        assert_eq!(
            ring.insert_with_timeout_on(1, Duration::from_millis(5), &clock),
            Err(RingError::NullPointer)
        );
        assert_eq!(
            ring.remove_with_timeout_on(Duration::from_millis(5), &clock),
            Err(RingError::NullPointer)
        );
        assert_eq!(clock.now.get(), Duration::ZERO);
        assert_eq!(ring.occupancy(), 0);
        assert_eq!(ring.free_space(), 0);
        assert!(ring.is_empty());
        assert_eq!(ring.check_integrity(), Err(RingError::NullPointer));
        assert!(!ring.sanity_check());

        let info = ring.last_error();
        assert_eq!(info.code, Some(RingError::NullPointer));
        assert_eq!(info.operation, Some(Operation::SanityCheck));
        assert_eq!(info.parameter, Some(Parameter::Storage));
        assert_eq!(out, [0, 0]);
    }

    #[test]
    fn try_new_rejects_empty_storage() {
        let mut storage: [u32; 0] = [];
        assert_eq!(
            RingBuffer::try_new(&mut storage).map(|_| ()),
            Err(RingError::InvalidSize)
        );
    }

    #[test]
    fn reinit_resets_state() {
        let mut a = [0u8; 4];
        let mut b = [0u8; 6];
        let mut ring = RingBuffer::new(&mut a);
        ring.set_overwrite(true);
        ring.insert(1).unwrap();
        let _ = ring.peek(3);
        ring.init(Some(&mut b)).unwrap();
        assert_eq!(ring.capacity(), 6);
        assert_eq!(ring.occupancy(), 0);
        assert!(!ring.overwrite_enabled());
        assert!(ring.last_error().is_clear());
    }

    #[test]
    fn corrupted_indices_fail_integrity_and_operations() {
        let mut storage = [0u8; 4];
        let mut ring = RingBuffer::new(&mut storage);
        ring.insert(7).unwrap();
        assert!(ring.sanity_check());

        ring.producer_index.reset(4);
        assert!(!ring.sanity_check());
        assert_eq!(ring.occupancy(), 0);
        assert_eq!(ring.free_space(), 0);
        assert_eq!(ring.check_integrity(), Err(RingError::BufferCorrupted));
        assert_eq!(ring.insert(1), Err(RingError::BufferCorrupted));
        assert_eq!(ring.remove(), Err(RingError::BufferCorrupted));
        assert_eq!(ring.peek(0), Err(RingError::BufferCorrupted));
        assert_eq!(ring.last_error().operation, Some(Operation::Peek));

        ring.producer_index.reset(1);
        ring.consumer_index.reset(9);
        assert!(!ring.sanity_check());
    }

    #[test]
    fn error_line_points_at_caller() {
        let mut storage = [0u8; 2];
        let mut ring = RingBuffer::new(&mut storage);
        let line = line!() + 1;
        let _ = ring.remove();
        assert_eq!(ring.last_error().line, line);
    }

    #[test]
    fn single_slot_ring_never_holds_items() {
        let mut storage = [0u8; 1];
        let mut ring = RingBuffer::new(&mut storage);
        assert_eq!(ring.insert(1), Err(RingError::BufferFull));
        ring.set_overwrite(true);
        assert_eq!(ring.insert(1), Err(RingError::BufferFull));
        assert_eq!(ring.remove(), Err(RingError::BufferEmpty));
        assert_eq!(ring.free_space(), 0);
        assert!(ring.sanity_check());
    }

    #[test]
    fn lap_is_a_multiple_of_capacity() {
        for capacity in [1usize, 2, 3, 7, 64, 1000] {
            let lap = lap_for(capacity);
            assert_eq!(lap % capacity, 0);
            assert!(usize::MAX - lap < capacity);
        }
        assert_eq!(lap_for(0), 0);
    }

    #[test]
    fn fifo_holds_across_the_lap_boundary() {
        let mut storage = [0u32; 3];
        let mut ring = RingBuffer::new(&mut storage);
        let start = ring.lap - 2;
        ring.producer_index.reset(start);
        ring.consumer_index.reset(start);
        assert!(ring.sanity_check());

        for round in 0..4u32 {
            ring.insert(round * 2).unwrap();
            ring.insert(round * 2 + 1).unwrap();
            assert_eq!(ring.insert(99), Err(RingError::BufferFull));
            assert_eq!(ring.peek(1), Ok(round * 2 + 1));
            assert_eq!(ring.remove(), Ok(round * 2));
            assert_eq!(ring.remove(), Ok(round * 2 + 1));
            assert!(ring.sanity_check());
        }
        assert!(ring.producer_index.load() < start);
    }

    #[test]
    fn evictions_never_bring_the_consumer_index_back() {
        let mut storage = [0u8; 2];
        let mut ring = RingBuffer::new(&mut storage);
        ring.set_overwrite(true);
        ring.insert(1).unwrap();

        // A consumer that read the head and was then preempted for a full
        // round of evictions must fail its publish.
        let seen = ring.consumer_index.load();
        ring.insert(2).unwrap();
        ring.insert(3).unwrap();
        assert_ne!(ring.consumer_index.load(), seen);
        assert!(!ring.consumer_index.advance_from(seen, next_index(seen, ring.lap)));

        assert_eq!(ring.remove(), Ok(3));
        assert_eq!(ring.remove(), Err(RingError::BufferEmpty));
    }
}

//! Atomic index access and memory barriers.
//!
//! The engine needs very little from the platform: a relaxed load and store for
//! an index-sized integer, a compare-and-swap for overwrite mode, and fences
//! strong enough to order a slot access against the index that publishes it.
//! The backing primitives are picked at compile time:
//!
//! - `--cfg loom`: `loom` atomics, for model checking.
//! - `portable-atomic` feature: `portable_atomic`, for cores without native
//!   CAS (single-core or critical-section fallbacks).
//! - otherwise: `core::sync::atomic`.

#[cfg(loom)]
pub(crate) use loom::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering, fence};

#[cfg(all(not(loom), feature = "portable-atomic"))]
pub(crate) use portable_atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering, fence};

#[cfg(all(not(loom), not(feature = "portable-atomic")))]
pub(crate) use core::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering, fence};

/// A ring index with exactly one logical owner.
///
/// The owner reads its own index with [`load`](Self::load) and makes a slot
/// access visible with [`publish`](Self::publish). The other side reads it with
/// [`observe`](Self::observe), which keeps subsequent slot accesses from being
/// hoisted above the index read.
pub(crate) struct IndexCell(AtomicUsize);

impl IndexCell {
    #[inline]
    pub(crate) fn new(value: usize) -> Self {
        Self(AtomicUsize::new(value))
    }

    #[inline(always)]
    pub(crate) fn load(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    #[inline(always)]
    pub(crate) fn observe(&self) -> usize {
        let value = self.0.load(Ordering::Relaxed);
        fence(Ordering::Acquire);
        value
    }

    /// Release fence, then relaxed store.
    #[inline(always)]
    pub(crate) fn publish(&self, value: usize) {
        fence(Ordering::Release);
        self.0.store(value, Ordering::Relaxed);
    }

    /// Plain store with no ordering; only for `&mut` resets.
    #[inline]
    pub(crate) fn reset(&self, value: usize) {
        self.0.store(value, Ordering::Relaxed);
    }

    /// Move the index from `current` to `next` if nobody else moved it first.
    ///
    /// Only used for the consumer index while overwrite mode is on, when the
    /// producer may also advance it to evict the oldest item.
    #[inline]
    pub(crate) fn advance_from(&self, current: usize, next: usize) -> bool {
        self.0
            .compare_exchange(current, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Relaxed boolean used for the overwrite policy.
pub(crate) struct Flag(AtomicBool);

impl Flag {
    #[inline]
    pub(crate) fn new(value: bool) -> Self {
        Self(AtomicBool::new(value))
    }

    #[inline(always)]
    pub(crate) fn get(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Only called with `&mut` access to the ring.
    #[inline]
    pub(crate) fn set(&self, value: bool) {
        self.0.store(value, Ordering::Relaxed);
    }
}

/// A counter with a single writer.
///
/// Updates are a relaxed load followed by a relaxed store, so no
/// read-modify-write instruction is needed on the target.
#[cfg(feature = "stats")]
pub(crate) struct Counter(AtomicUsize);

#[cfg(feature = "stats")]
impl Counter {
    #[inline]
    pub(crate) fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    #[inline(always)]
    pub(crate) fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    #[inline(always)]
    pub(crate) fn bump(&self) {
        let value = self.0.load(Ordering::Relaxed);
        self.0.store(value.wrapping_add(1), Ordering::Relaxed);
    }

    #[inline(always)]
    pub(crate) fn raise_to(&self, candidate: usize) {
        if candidate > self.0.load(Ordering::Relaxed) {
            self.0.store(candidate, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn clear(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}

//! Per-instance usage counters.
//!
//! Counters live inside the ring and are split by writer: the producer owns
//! `total_inserts`, `overflow_count` and `peak_usage`, the consumer owns
//! `total_removes` and `underflow_count`. With the `stats` feature off the
//! recorder is zero-sized and every snapshot reads as zeros.

#[cfg(feature = "stats")]
use crate::atomic::Counter;

/// Snapshot of a ring's counters.
///
/// All fields are monotonically non-decreasing until
/// [`RingBuffer::reset_stats`](crate::RingBuffer::reset_stats).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Highest occupancy seen right after a successful insert.
    pub peak_usage: usize,
    pub total_inserts: usize,
    pub total_removes: usize,
    /// Inserts rejected because the ring was full.
    pub overflow_count: usize,
    /// Removes rejected because the ring was empty.
    pub underflow_count: usize,
}

#[cfg(feature = "stats")]
pub(crate) struct StatsRecorder {
    peak_usage: Counter,
    total_inserts: Counter,
    total_removes: Counter,
    overflow_count: Counter,
    underflow_count: Counter,
}

#[cfg(feature = "stats")]
impl StatsRecorder {
    pub(crate) fn new() -> Self {
        Self {
            peak_usage: Counter::new(),
            total_inserts: Counter::new(),
            total_removes: Counter::new(),
            overflow_count: Counter::new(),
            underflow_count: Counter::new(),
        }
    }

    #[inline]
    pub(crate) fn inserted(&self, occupancy: usize) {
        self.total_inserts.bump();
        self.peak_usage.raise_to(occupancy);
    }

    #[inline]
    pub(crate) fn overflowed(&self) {
        self.overflow_count.bump();
    }

    #[inline]
    pub(crate) fn removed(&self) {
        self.total_removes.bump();
    }

    #[inline]
    pub(crate) fn underflowed(&self) {
        self.underflow_count.bump();
    }

    pub(crate) fn snapshot(&self) -> Stats {
        Stats {
            peak_usage: self.peak_usage.get(),
            total_inserts: self.total_inserts.get(),
            total_removes: self.total_removes.get(),
            overflow_count: self.overflow_count.get(),
            underflow_count: self.underflow_count.get(),
        }
    }

    pub(crate) fn reset(&self) {
        self.peak_usage.clear();
        self.total_inserts.clear();
        self.total_removes.clear();
        self.overflow_count.clear();
        self.underflow_count.clear();
    }
}

#[cfg(not(feature = "stats"))]
pub(crate) struct StatsRecorder;

#[cfg(not(feature = "stats"))]
impl StatsRecorder {
    pub(crate) fn new() -> Self {
        Self
    }

    #[inline(always)]
    pub(crate) fn inserted(&self, _occupancy: usize) {}

    #[inline(always)]
    pub(crate) fn overflowed(&self) {}

    #[inline(always)]
    pub(crate) fn removed(&self) {}

    #[inline(always)]
    pub(crate) fn underflowed(&self) {}

    pub(crate) fn snapshot(&self) -> Stats {
        Stats::default()
    }

    pub(crate) fn reset(&self) {}
}

#[cfg(all(test, feature = "stats", not(loom)))]
mod tests {
    use super::StatsRecorder;

    #[test]
    fn peak_is_running_max() {
        let rec = StatsRecorder::new();
        rec.inserted(1);
        rec.inserted(3);
        rec.removed();
        rec.inserted(2);
        let s = rec.snapshot();
        assert_eq!(s.peak_usage, 3);
        assert_eq!(s.total_inserts, 3);
        assert_eq!(s.total_removes, 1);
    }

    #[test]
    fn reset_zeroes_everything() {
        let rec = StatsRecorder::new();
        rec.overflowed();
        rec.underflowed();
        rec.inserted(5);
        rec.reset();
        assert_eq!(rec.snapshot(), Default::default());
    }
}

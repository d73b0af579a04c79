//! Deadline-bounded polling over the non-blocking ring operations.
//!
//! There is no wake-up mechanism: a waiting side sleeps for a short interval
//! and tries again until the operation succeeds or the deadline passes. The
//! sleep is delegated to a [`Clock`] so the same loop works on a hosted OS
//! ([`StdClock`] with the `std` feature), an RTOS delay, or a tick counter
//! plus wait-for-interrupt on bare metal.

use core::time::Duration;

use crate::error::{Result, RingError};

/// Time source and sleeper used by the timeout wrappers.
///
/// `sleep` must yield the calling context (thread sleep, task delay, WFI, ...)
/// rather than spin, so a peer sharing the core can make progress.
pub trait Clock {
    type Instant: Copy;

    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`; must be monotonic.
    fn elapsed(&self, since: Self::Instant) -> Duration;

    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    type Instant = C::Instant;

    #[inline]
    fn now(&self) -> Self::Instant {
        (**self).now()
    }

    #[inline]
    fn elapsed(&self, since: Self::Instant) -> Duration {
        (**self).elapsed(since)
    }

    #[inline]
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Wall clock backed by `std::time::Instant` and `std::thread::sleep`.
#[cfg(feature = "std")]
#[derive(Copy, Clone, Debug, Default)]
pub struct StdClock;

#[cfg(feature = "std")]
impl Clock for StdClock {
    type Instant = std::time::Instant;

    #[inline]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    #[inline]
    fn elapsed(&self, since: Self::Instant) -> Duration {
        since.elapsed()
    }

    #[inline]
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration)
    }
}

/// How long to sleep between retries.
///
/// The default polls every millisecond. [`PollPolicy::backoff`] doubles the
/// interval after every failed retry, up to a cap.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    interval: Duration,
    max_interval: Duration,
}

impl PollPolicy {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1);

    pub const fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            max_interval: interval,
        }
    }

    pub const fn backoff(initial: Duration, max_interval: Duration) -> Self {
        Self {
            interval: initial,
            max_interval,
        }
    }

    #[inline]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    #[inline]
    pub const fn max_interval(&self) -> Duration {
        self.max_interval
    }

    /// A zero interval would spin without yielding, and a cap below the
    /// initial interval is meaningless; both are `InvalidParameter`.
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() || self.max_interval < self.interval {
            return Err(RingError::InvalidParameter);
        }
        Ok(())
    }

    #[inline]
    fn next_delay(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max_interval)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::fixed(Self::DEFAULT_INTERVAL)
    }
}

/// Run `attempt` until it succeeds, fails with something other than
/// `retry_on`, or `timeout` has elapsed.
///
/// The first attempt happens immediately. With a zero `timeout` its failure is
/// returned as is; otherwise running out of time yields
/// [`RingError::Timeout`]. Sleeps never overshoot the remaining time by more
/// than the clock's own granularity.
pub fn poll_until<C, R>(
    clock: &C,
    policy: &PollPolicy,
    timeout: Duration,
    retry_on: RingError,
    mut attempt: impl FnMut() -> Result<R>,
) -> Result<R>
where
    C: Clock + ?Sized,
{
    let start = clock.now();
    match attempt() {
        Err(err) if err == retry_on && !timeout.is_zero() => {}
        done => return done,
    }
    policy.validate()?;

    let mut delay = policy.interval;
    loop {
        let elapsed = clock.elapsed(start);
        if elapsed >= timeout {
            crate::log_event!(debug, ?timeout, waiting_on = %retry_on, "ring operation timed out");
            return Err(RingError::Timeout);
        }
        clock.sleep(delay.min(timeout - elapsed));
        delay = policy.next_delay(delay);

        match attempt() {
            Err(err) if err == retry_on => {}
            done => return done,
        }
    }
}

#![cfg(not(loom))]

use std::cell::Cell;
use std::thread;
use std::time::{Duration, Instant};

use ph_ring::{Clock, Operation, Parameter, PollPolicy, RingBuffer, RingError};

/// Real time, for the tests that check elapsed wall time.
struct WallClock;

impl Clock for WallClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: Instant) -> Duration {
        since.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration)
    }
}

/// Virtual time that only moves when someone sleeps.
#[derive(Default)]
struct StepClock {
    now: Cell<Duration>,
    naps: Cell<u32>,
}

impl Clock for StepClock {
    type Instant = Duration;

    fn now(&self) -> Duration {
        self.now.get()
    }

    fn elapsed(&self, since: Duration) -> Duration {
        self.now.get() - since
    }

    fn sleep(&self, duration: Duration) {
        self.naps.set(self.naps.get() + 1);
        self.now.set(self.now.get() + duration);
    }
}

#[test]
fn remove_on_empty_ring_times_out_after_the_bound() {
    let mut storage = [0u8; 4];
    let mut ring = RingBuffer::new(&mut storage);

    let started = Instant::now();
    let result = ring.remove_with_timeout_on(Duration::from_millis(50), &WallClock);
    assert_eq!(result, Err(RingError::Timeout));
    assert!(started.elapsed() >= Duration::from_millis(50));

    let info = ring.last_error();
    assert_eq!(info.code, Some(RingError::Timeout));
    assert_eq!(info.operation, Some(Operation::RemoveWithTimeout));
    assert_eq!(info.parameter, Some(Parameter::Timeout));
}

#[test]
fn zero_timeout_reports_the_immediate_condition() {
    let clock = StepClock::default();
    let mut storage = [0u8; 2];
    let mut ring = RingBuffer::new(&mut storage);

    assert_eq!(
        ring.remove_with_timeout_on(Duration::ZERO, &clock),
        Err(RingError::BufferEmpty)
    );
    ring.insert(1).unwrap();
    assert_eq!(
        ring.insert_with_timeout_on(2, Duration::ZERO, &clock),
        Err(RingError::BufferFull)
    );
    assert_eq!(clock.naps.get(), 0);
}

#[test]
fn immediate_success_does_not_sleep() {
    let clock = StepClock::default();
    let mut storage = [0u8; 4];
    let mut ring = RingBuffer::new(&mut storage);

    ring.insert_with_timeout_on(9, Duration::from_secs(1), &clock).unwrap();
    assert_eq!(ring.remove_with_timeout_on(Duration::from_secs(1), &clock), Ok(9));
    assert_eq!(clock.naps.get(), 0);
}

#[test]
fn insert_on_full_ring_times_out() {
    let clock = StepClock::default();
    let mut storage = [0u8; 3];
    let mut ring = RingBuffer::new(&mut storage);
    ring.insert_bulk(&[1, 2]);

    assert_eq!(
        ring.insert_with_timeout_on(3, Duration::from_millis(10), &clock),
        Err(RingError::Timeout)
    );
    assert_eq!(clock.now.get(), Duration::from_millis(10));
    assert_eq!(clock.naps.get(), 10);
    assert_eq!(ring.occupancy(), 2);
}

#[test]
fn configured_policy_is_used() {
    let clock = StepClock::default();
    let mut storage = [0u8; 3];
    let mut ring = RingBuffer::new(&mut storage);
    ring.set_poll_policy(PollPolicy::fixed(Duration::from_millis(5)))
        .unwrap();

    let _ = ring.remove_with_timeout_on(Duration::from_millis(20), &clock);
    assert_eq!(clock.naps.get(), 4);
}

#[test]
fn overwrite_insert_never_waits() {
    let clock = StepClock::default();
    let mut storage = [0u8; 2];
    let mut ring = RingBuffer::new(&mut storage);
    ring.set_overwrite(true);
    ring.insert(1).unwrap();

    ring.insert_with_timeout_on(2, Duration::from_millis(10), &clock)
        .unwrap();
    assert_eq!(clock.naps.get(), 0);
    assert_eq!(ring.remove(), Ok(2));
}

#[test]
fn waiting_consumer_receives_late_item() {
    let mut storage = [0u32; 4];
    let mut ring = RingBuffer::new(&mut storage);
    let (mut tx, mut rx) = ring.split();

    thread::scope(|s| {
        s.spawn(move || {
            thread::sleep(Duration::from_millis(20));
            tx.insert(77).unwrap();
        });
        let got = rx.remove_with_timeout_on(Duration::from_secs(5), &WallClock);
        assert_eq!(got, Ok(77));
    });
}

#[test]
fn waiting_producer_gets_a_slot_once_consumer_drains() {
    let mut storage = [0u32; 2];
    let mut ring = RingBuffer::new(&mut storage);
    let (mut tx, mut rx) = ring.split();
    tx.insert(1).unwrap();

    thread::scope(|s| {
        s.spawn(move || {
            thread::sleep(Duration::from_millis(20));
            assert_eq!(rx.remove(), Ok(1));
        });
        tx.insert_with_timeout_on(2, Duration::from_secs(5), &WallClock)
            .unwrap();
    });

    assert_eq!(ring.remove(), Ok(2));
}

#[cfg(feature = "std")]
#[test]
fn std_clock_shorthand_times_out() {
    let mut storage = [0u8; 2];
    let mut ring = RingBuffer::new(&mut storage);
    let started = Instant::now();
    assert_eq!(
        ring.remove_with_timeout(Duration::from_millis(15)),
        Err(RingError::Timeout)
    );
    assert!(started.elapsed() >= Duration::from_millis(15));
}

//! Debounce state machine
//!
//! `idle -> pending(deadline, latest value) -> idle`. Every `schedule` replaces
//! the pending value and pushes the deadline out by the full delay, so a burst
//! of updates coalesces into one value. Time comes from an injected [`Clock`]
//! so callers can drive the machine deterministically.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Tokio's clock, which follows paused and advanced time in tests
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    elapsed_nanos: Arc<AtomicU64>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            elapsed_nanos: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.elapsed_nanos.fetch_add(nanos, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + Duration::from_nanos(self.elapsed_nanos.load(Ordering::SeqCst))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebounceState<T> {
    Idle,
    Pending { deadline: Instant, value: T },
}

/// Single-slot debouncer
pub struct Debouncer<T> {
    delay: Duration,
    clock: Arc<dyn Clock>,
    state: DebounceState<T>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            delay,
            clock,
            state: DebounceState::Idle,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn state(&self) -> &DebounceState<T> {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, DebounceState::Pending { .. })
    }

    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            DebounceState::Pending { deadline, .. } => Some(*deadline),
            DebounceState::Idle => None,
        }
    }

    /// Replace the pending value and restart the delay
    pub fn schedule(&mut self, value: T) {
        self.state = DebounceState::Pending {
            deadline: self.clock.now() + self.delay,
            value,
        };
    }

    /// Take the pending value if its deadline has passed
    pub fn poll(&mut self) -> Option<T> {
        match &self.state {
            DebounceState::Pending { deadline, .. } if self.clock.now() >= *deadline => self.take(),
            _ => None,
        }
    }

    /// Take the pending value immediately
    pub fn flush(&mut self) -> Option<T> {
        self.take()
    }

    /// Drop the pending value; returns true if something was pending
    pub fn cancel(&mut self) -> bool {
        self.take().is_some()
    }

    fn take(&mut self) -> Option<T> {
        match std::mem::replace(&mut self.state, DebounceState::Idle) {
            DebounceState::Pending { value, .. } => Some(value),
            DebounceState::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debouncer() -> (Debouncer<u32>, ManualClock) {
        let clock = ManualClock::new();
        let debouncer = Debouncer::new(Duration::from_millis(500), Arc::new(clock.clone()));
        (debouncer, clock)
    }

    #[test]
    fn test_burst_coalesces_to_latest_value() {
        let (mut debouncer, clock) = debouncer();

        for value in 1..=5 {
            debouncer.schedule(value);
            clock.advance(Duration::from_millis(100));
        }
        // 100ms after the last schedule: not due
        assert_eq!(debouncer.poll(), None);

        clock.advance(Duration::from_millis(400));
        assert_eq!(debouncer.poll(), Some(5));
        assert_eq!(debouncer.poll(), None);
        assert_eq!(*debouncer.state(), DebounceState::Idle);
    }

    #[test]
    fn test_flush_ignores_deadline() {
        let (mut debouncer, _clock) = debouncer();
        debouncer.schedule(7);
        assert!(debouncer.is_pending());
        assert_eq!(debouncer.flush(), Some(7));
        assert_eq!(debouncer.flush(), None);
    }

    #[test]
    fn test_cancel_drops_pending_value() {
        let (mut debouncer, clock) = debouncer();
        debouncer.schedule(1);
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());
        clock.advance(Duration::from_secs(1));
        assert_eq!(debouncer.poll(), None);
    }

    #[test]
    fn test_schedule_pushes_deadline_out() {
        let (mut debouncer, clock) = debouncer();
        debouncer.schedule(1);
        let first = debouncer.deadline().unwrap();
        clock.advance(Duration::from_millis(300));
        debouncer.schedule(2);
        assert_eq!(
            debouncer.deadline().unwrap() - first,
            Duration::from_millis(300)
        );
    }
}

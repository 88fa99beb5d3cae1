//! Owned, cancellable rate limiters
//!
//! Each component that needs a debounce or throttle owns one of these and drives
//! it with explicit `now` instants from its own `poll`/`tick`. Dropping or
//! cancelling the owner guarantees nothing fires afterwards.

use std::time::{Duration, Instant};

/// Trailing-edge debouncer: only the last scheduled value survives, and it is
/// released once `delay` has passed without a newer schedule.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace any pending value and restart the window
    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// Release the pending value if its window has closed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.pending {
            Some((_, deadline)) if now >= deadline => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|(v, _)| v)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, d)| *d)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// Leading-edge throttle: at most one fire per `interval`
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last_fired: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_ready(&self, now: Instant) -> bool {
        match self.last_fired {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    /// Earliest instant the next fire is allowed, `None` if nothing has fired yet
    pub fn next_ready(&self) -> Option<Instant> {
        self.last_fired.map(|last| last + self.interval)
    }

    /// Fire if the interval has elapsed, recording `now` as the last fire
    pub fn try_fire(&mut self, now: Instant) -> bool {
        if self.is_ready(now) {
            self.last_fired = Some(now);
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.last_fired = None;
    }
}

/// Coalesces many updates into at most one per repaint frame, always keeping
/// the most recent value.
#[derive(Debug)]
pub struct FrameCoalescer<T> {
    latest: Option<T>,
}

impl<T> Default for FrameCoalescer<T> {
    fn default() -> Self {
        Self { latest: None }
    }
}

impl<T> FrameCoalescer<T> {
    /// Record a value; returns true when a frame callback should be requested
    /// (the first update since the last flush)
    pub fn push(&mut self, value: T) -> bool {
        let was_idle = self.latest.is_none();
        self.latest = Some(value);
        was_idle
    }

    /// Called once per repaint frame
    pub fn flush(&mut self) -> Option<T> {
        self.latest.take()
    }

    pub fn has_pending(&self) -> bool {
        self.latest.is_some()
    }

    pub fn cancel(&mut self) {
        self.latest = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn debouncer_keeps_only_last_value() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(50 * MS);

        d.schedule(1, t0);
        d.schedule(2, t0 + 10 * MS);
        d.schedule(3, t0 + 20 * MS);

        assert_eq!(d.poll(t0 + 60 * MS), None);
        assert_eq!(d.poll(t0 + 70 * MS), Some(3));
        assert_eq!(d.poll(t0 + 200 * MS), None);
    }

    #[test]
    fn debouncer_cancel_drops_pending() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(50 * MS);
        d.schedule("x", t0);
        d.cancel();
        assert!(!d.is_pending());
        assert_eq!(d.poll(t0 + 100 * MS), None);
    }

    #[test]
    fn throttle_limits_rate() {
        let t0 = Instant::now();
        let mut t = Throttle::new(300 * MS);

        assert!(t.try_fire(t0));
        assert!(!t.try_fire(t0 + 100 * MS));
        assert!(!t.try_fire(t0 + 299 * MS));
        assert!(t.try_fire(t0 + 300 * MS));
    }

    #[test]
    fn throttle_reports_when_it_reopens() {
        let t0 = Instant::now();
        let mut t = Throttle::new(300 * MS);
        assert_eq!(t.next_ready(), None);

        t.try_fire(t0);
        assert_eq!(t.next_ready(), Some(t0 + 300 * MS));
        t.reset();
        assert_eq!(t.next_ready(), None);
    }

    #[test]
    fn coalescer_requests_one_frame_and_keeps_latest() {
        let mut c = FrameCoalescer::default();
        assert!(c.push(1));
        assert!(!c.push(2));
        assert!(!c.push(3));
        assert_eq!(c.flush(), Some(3));
        assert_eq!(c.flush(), None);
        assert!(c.push(4));
    }
}

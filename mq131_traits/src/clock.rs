use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Monotonic clock abstraction for heater timing and calibration pacing.
///
/// - now(): returns a monotonic Instant
/// - sleep(): blocks for the provided duration (implementations may simulate)
/// - secs_since(): whole seconds elapsed from an epoch Instant
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Whole seconds elapsed since `epoch`, saturating at 0 on underflow.
    fn secs_since(&self, epoch: Instant) -> u64 {
        self.now().saturating_duration_since(epoch).as_secs()
    }
}

/// Default, real-time monotonic clock backed by std::time::Instant.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}

/// Deterministic clock whose time only moves when asked to.
///
/// now() = origin + offset
/// sleep(d) advances internal time by d without actually sleeping, so a
/// multi-minute calibration completes instantly in tests and simulation.
/// Clones share the same timeline.
#[derive(Debug, Clone)]
pub struct VirtualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = off.saturating_add(d);
        }
    }

    /// Total virtual time elapsed since construction.
    pub fn elapsed(&self) -> Duration {
        self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO)
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, d: Duration) {
        (**self).sleep(d);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virtual_clock_advances_only_on_sleep() {
        let clock = VirtualClock::new();
        let t0 = clock.now();
        assert_eq!(clock.secs_since(t0), 0);
        clock.sleep(Duration::from_secs(3));
        assert_eq!(clock.secs_since(t0), 3);
        assert_eq!(clock.elapsed(), Duration::from_secs(3));
    }

    #[test]
    fn clones_share_the_timeline() {
        let a = VirtualClock::new();
        let b = a.clone();
        let t0 = a.now();
        b.advance(Duration::from_millis(2500));
        assert_eq!(a.secs_since(t0), 2);
    }

    #[test]
    fn secs_since_saturates_for_future_epoch() {
        let clock = VirtualClock::new();
        let future = clock.now() + Duration::from_secs(10);
        assert_eq!(clock.secs_since(future), 0);
    }
}

//! [`Clock`] – stopwatch used to derive per-cycle `dt`.
//!
//! A clock answers two questions:
//!
//! - [`Clock::elapsed`]: seconds since the previous `elapsed` call (or since
//!   construction).  Each query moves the sample point, so calling it twice
//!   in one cycle splits the interval instead of reporting it twice.
//! - [`Clock::duration`]: seconds since the last [`Clock::restart`] (or since
//!   construction).  Reading it has no side effect.
//!
//! Time comes from a [`TimeSource`].  [`MonotonicTime`] reads the system's
//! monotonic clock; [`ManualTime`] is advanced by hand, which is what tests
//! and the simulation use.
//!
//! # Example
//!
//! ```rust
//! use posefuse_math::clock::{Clock, ManualTime};
//!
//! let time = ManualTime::new();
//! let mut clock = Clock::with_source(time.clone());
//!
//! time.advance(0.02);
//! assert_eq!(clock.elapsed(), 0.02);
//! assert_eq!(clock.elapsed(), 0.0); // already consumed
//! assert_eq!(clock.duration(), 0.02);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

// ────────────────────────────────────────────────────────────────────────────
// Time sources
// ────────────────────────────────────────────────────────────────────────────

/// A monotonic time base, in seconds.
pub trait TimeSource {
    /// Current time in seconds.  Only differences between readings matter.
    fn now(&self) -> f64;
}

/// The process-wide monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicTime {
    origin: Instant,
}

impl MonotonicTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTime {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// A manually advanced time source.
///
/// Clones share the same underlying time, so a driver can hold one handle
/// and advance every clock built from the others.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    bits: Arc<AtomicU64>,
}

impl ManualTime {
    /// A time source starting at `t = 0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// A time source starting at `t = seconds`.
    pub fn starting_at(seconds: f64) -> Self {
        let time = Self::new();
        time.set(seconds);
        time
    }

    /// Move time forward by `dt` seconds.
    pub fn advance(&self, dt: f64) {
        let _ = self
            .bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some((f64::from_bits(bits) + dt).to_bits())
            });
    }

    /// Jump to an absolute time.
    pub fn set(&self, seconds: f64) {
        self.bits.store(seconds.to_bits(), Ordering::Release);
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Clock
// ────────────────────────────────────────────────────────────────────────────

/// Stopwatch over a [`TimeSource`].
#[derive(Debug, Clone)]
pub struct Clock<S: TimeSource = MonotonicTime> {
    source: S,
    last_sample: f64,
    start: f64,
}

impl Clock<MonotonicTime> {
    /// A clock reading the system monotonic time.
    pub fn new() -> Self {
        Self::with_source(MonotonicTime::new())
    }
}

impl Default for Clock<MonotonicTime> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TimeSource> Clock<S> {
    /// A clock reading `source`.  Both the sample point and the stopwatch
    /// start at the current time.
    pub fn with_source(source: S) -> Self {
        let now = source.now();
        Self {
            source,
            last_sample: now,
            start: now,
        }
    }

    /// Seconds since the previous call (or since construction), moving the
    /// sample point to now.
    pub fn elapsed(&mut self) -> f64 {
        let now = self.source.now();
        let dt = now - self.last_sample;
        self.last_sample = now;
        dt
    }

    /// Restart the stopwatch read by [`Clock::duration`].
    ///
    /// Does not affect [`Clock::elapsed`].
    pub fn restart(&mut self) {
        self.start = self.source.now();
    }

    /// Seconds since the last [`Clock::restart`] (or since construction).
    pub fn duration(&self) -> f64 {
        self.source.now() - self.start
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Clocked
// ────────────────────────────────────────────────────────────────────────────

/// A `dt`-driven primitive paired with its own [`Clock`].
///
/// The wrapper supplies `dt` from its clock on every call, which is the
/// standalone form of the primitive.  Components that are composed inside
/// one control cycle should instead share a single `dt` and call the inner
/// primitive directly.
#[derive(Debug, Clone)]
pub struct Clocked<T, S: TimeSource = MonotonicTime> {
    pub(crate) inner: T,
    pub(crate) clock: Clock<S>,
}

impl<T> Clocked<T> {
    pub fn new(inner: T) -> Self {
        Self::with_source(inner, MonotonicTime::new())
    }
}

impl<T, S: TimeSource> Clocked<T, S> {
    pub fn with_source(inner: T, source: S) -> Self {
        Self {
            inner,
            clock: Clock::with_source(source),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn clock(&self) -> &Clock<S> {
        &self.clock
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_elapsed_measures_from_construction() {
        let time = ManualTime::starting_at(10.0);
        let mut clock = Clock::with_source(time.clone());
        time.advance(0.5);
        assert_eq!(clock.elapsed(), 0.5);
    }

    #[test]
    fn repeated_elapsed_partitions_the_interval() {
        let time = ManualTime::new();
        let mut clock = Clock::with_source(time.clone());

        time.advance(0.25);
        let first = clock.elapsed();
        let second = clock.elapsed();
        assert_eq!(first, 0.25);
        assert_eq!(second, 0.0);
    }

    #[test]
    fn restart_resets_duration_but_not_elapsed() {
        let time = ManualTime::new();
        let mut clock = Clock::with_source(time.clone());

        time.advance(1.0);
        clock.restart();
        time.advance(0.5);

        assert_eq!(clock.duration(), 0.5);
        assert_eq!(clock.elapsed(), 1.5);
    }

    #[test]
    fn duration_has_no_side_effect() {
        let time = ManualTime::new();
        let clock = Clock::with_source(time.clone());
        time.advance(2.0);
        assert_eq!(clock.duration(), 2.0);
        assert_eq!(clock.duration(), 2.0);
    }

    #[test]
    fn manual_time_clones_share_state() {
        let a = ManualTime::new();
        let b = a.clone();
        a.advance(1.0);
        b.advance(0.5);
        assert_eq!(a.now(), 1.5);
        a.set(4.0);
        assert_eq!(b.now(), 4.0);
    }

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let mut clock = Clock::new();
        let dt = clock.elapsed();
        assert!(dt >= 0.0);
        assert!(clock.duration() >= 0.0);
    }
}

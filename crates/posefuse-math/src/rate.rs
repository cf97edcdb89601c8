//! Backward-difference rate of change.
//!
//! ```rust
//! use posefuse_math::rate::RateEstimator;
//!
//! let mut rate = RateEstimator::new(1.0);
//! assert_eq!(rate.rate(1.5, 0.25), 2.0);
//! assert_eq!(rate.last_value(), 1.5);
//! ```

use crate::clock::{Clocked, TimeSource};

/// Estimates `dx/dt` from consecutive samples.
///
/// The first call measures the change from the initial value given at
/// construction, so the first rate includes whatever jump exists between
/// that value and the first real sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RateEstimator {
    last_value: f64,
}

impl RateEstimator {
    /// Create an estimator whose previous sample is `initial`.
    pub fn new(initial: f64) -> Self {
        Self {
            last_value: initial,
        }
    }

    /// Rate of change from the previous sample to `x` over `dt` seconds.
    ///
    /// `x` becomes the previous sample for the next call.  A zero `dt`
    /// yields an infinite or NaN rate.
    pub fn rate(&mut self, x: f64, dt: f64) -> f64 {
        let dx = x - self.last_value;
        self.last_value = x;
        dx / dt
    }

    /// The most recent sample.
    pub fn last_value(&self) -> f64 {
        self.last_value
    }
}

impl<S: TimeSource> Clocked<RateEstimator, S> {
    /// Rate of change to `x` since the previous call, timed by the owned
    /// clock.
    pub fn rate(&mut self, x: f64) -> f64 {
        let dt = self.clock.elapsed();
        self.inner.rate(x, dt)
    }
}

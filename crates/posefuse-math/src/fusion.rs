//! Inverse-variance weighted fusion of scalar measurements.
//!
//! Given measurements `(value_i, σ_i)` of one quantity, the fused estimate is
//!
//! ```text
//! x̂ = Σ(value_i / σ_i²) / Σ(1 / σ_i²)
//! ```
//!
//! This is a static weighted mean.  There is no process model and no
//! covariance carried between calls; each fuse starts from the measurements
//! it is given.
//!
//! Degenerate inputs are passed through IEEE-754 arithmetic untouched: an
//! empty set fuses to NaN, and a zero `σ` produces an infinite weight.
//!
//! # Example
//!
//! ```rust
//! use posefuse_math::fusion::{ParametricFuser, WeightedFuser};
//! use posefuse_types::Measurement;
//!
//! let mut fuser = WeightedFuser::new();
//! let x = fuser.fuse(&[Measurement::new(1.0, 1.0), Measurement::new(3.0, 1.0)]);
//! assert_eq!(x, 2.0);
//!
//! let mut xyz = ParametricFuser::new(3);
//! let err = xyz.fuse_all(&[vec![Measurement::new(1.0, 1.0)]]).unwrap_err();
//! assert_eq!(err.to_string(), "Requires parameters: 3; Provided parameters: 1");
//! ```

use posefuse_types::{Axes, FusionError, Measurement};
use tracing::warn;

/// Inverse-variance weighted mean of `measurements`.
pub fn weighted_mean<'a>(measurements: impl IntoIterator<Item = &'a Measurement>) -> f64 {
    let (numerator, denominator) = measurements
        .into_iter()
        .fold((0.0, 0.0), |(num, den), m| {
            let w = m.weight();
            (num + w * m.value(), den + w)
        });
    numerator / denominator
}

// ────────────────────────────────────────────────────────────────────────────
// WeightedFuser
// ────────────────────────────────────────────────────────────────────────────

/// Fuses measurements of a single quantity and remembers the last result.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WeightedFuser {
    last_estimate: f64,
}

impl WeightedFuser {
    /// A fuser whose last estimate starts at `0.0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fuser whose last estimate starts at `initial`.
    ///
    /// Useful when other measurements are taken relative to the estimate
    /// before the first fuse.
    pub fn with_initial(initial: f64) -> Self {
        Self {
            last_estimate: initial,
        }
    }

    /// Fuse `measurements` into one estimate, remember it, and return it.
    pub fn fuse<'a>(&mut self, measurements: impl IntoIterator<Item = &'a Measurement>) -> f64 {
        self.last_estimate = weighted_mean(measurements);
        self.last_estimate
    }

    /// The most recent estimate, without recomputing.
    pub fn last_estimate(&self) -> f64 {
        self.last_estimate
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ParametricFuser
// ────────────────────────────────────────────────────────────────────────────

/// One [`WeightedFuser`] per independent parameter of a system.
///
/// The parameter count is fixed at construction.  Parameter `i` of every
/// call is always routed to fuser `i`; no information crosses parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ParametricFuser {
    fusers: Vec<WeightedFuser>,
}

impl ParametricFuser {
    /// A fuser for `parameter_count` parameters (e.g. 3 for `[x, y, z]`).
    pub fn new(parameter_count: usize) -> Self {
        Self {
            fusers: vec![WeightedFuser::new(); parameter_count],
        }
    }

    pub fn parameter_count(&self) -> usize {
        self.fusers.len()
    }

    /// Fuse each parameter's measurements with its own fuser.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::InvalidParameterCount`] when
    /// `axis_measurements.len()` differs from the parameter count.  No fuser
    /// is touched in that case.
    pub fn fuse_all<M: AsRef<[Measurement]>>(
        &mut self,
        axis_measurements: &[M],
    ) -> Result<Vec<f64>, FusionError> {
        if axis_measurements.len() != self.fusers.len() {
            warn!(
                expected = self.fusers.len(),
                actual = axis_measurements.len(),
                "parametric fuse rejected"
            );
            return Err(FusionError::InvalidParameterCount {
                expected: self.fusers.len(),
                actual: axis_measurements.len(),
            });
        }

        Ok(self
            .fusers
            .iter_mut()
            .zip(axis_measurements)
            .map(|(fuser, measurements)| fuser.fuse(measurements.as_ref()))
            .collect())
    }

    /// Fuse a labeled X/Y/Z triple.
    ///
    /// # Errors
    ///
    /// Returns [`FusionError::InvalidParameterCount`] unless this fuser was
    /// built for exactly 3 parameters.
    pub fn fuse_axes(&mut self, axes: Axes<&[Measurement]>) -> Result<Axes<f64>, FusionError> {
        let fused = self.fuse_all(&axes.into_array())?;
        match fused.as_slice() {
            &[x, y, z] => Ok(Axes::new(x, y, z)),
            _ => Err(FusionError::InvalidParameterCount {
                expected: 3,
                actual: fused.len(),
            }),
        }
    }

    /// The last estimate of every parameter, in order.
    pub fn last_estimates(&self) -> Vec<f64> {
        self.fusers.iter().map(WeightedFuser::last_estimate).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(value: f64, std_dev: f64) -> Measurement {
        Measurement::new(value, std_dev)
    }

    #[test]
    fn single_measurement_returns_its_value() {
        let mut fuser = WeightedFuser::new();
        for (value, std_dev) in [(3.7, 0.5), (-12.25, 2.0), (0.1, 0.25), (1e6, 1.0)] {
            assert_eq!(fuser.fuse(&[m(value, std_dev)]), value);
        }
        for (value, std_dev) in [(3.7, 0.3), (-0.42, 7.0)] {
            assert!((fuser.fuse(&[m(value, std_dev)]) - value).abs() < 1e-12);
        }
    }

    #[test]
    fn equal_std_devs_give_arithmetic_mean() {
        let mut fuser = WeightedFuser::new();
        assert_eq!(fuser.fuse(&[m(1.0, 0.5), m(4.0, 0.5)]), 2.5);
        let x = fuser.fuse(&[m(-2.0, 0.3), m(5.0, 0.3)]);
        assert!((x - 1.5).abs() < 1e-12);
    }

    #[test]
    fn lower_std_dev_gets_more_weight() {
        // Weights 400 and 100 → (400·1 + 100·0) / 500.
        let x = weighted_mean(&[m(1.0, 0.05), m(0.0, 0.1)]);
        assert!((x - 0.8).abs() < 1e-12);
    }

    #[test]
    fn result_is_invariant_under_reordering() {
        let a = [m(1.0, 0.2), m(2.5, 0.7), m(-0.3, 0.05), m(4.0, 1.5)];
        let mut b = a;
        b.reverse();
        let mut c = a;
        c.rotate_left(2);

        let fa = weighted_mean(&a);
        assert!((fa - weighted_mean(&b)).abs() < 1e-12);
        assert!((fa - weighted_mean(&c)).abs() < 1e-12);
    }

    #[test]
    fn vanishing_std_dev_dominates() {
        let mut previous_error = f64::INFINITY;
        for std_dev in [1e-1, 1e-2, 1e-3, 1e-4, 1e-6] {
            let x = weighted_mean(&[m(5.0, std_dev), m(0.0, 1.0), m(10.0, 0.5)]);
            let error = (x - 5.0).abs();
            assert!(error <= previous_error);
            previous_error = error;
        }
        assert!(previous_error < 1e-9);
    }

    #[test]
    fn empty_input_is_nan() {
        let mut fuser = WeightedFuser::new();
        let none: [Measurement; 0] = [];
        assert!(fuser.fuse(&none).is_nan());
        assert!(fuser.last_estimate().is_nan());
    }

    #[test]
    fn zero_std_dev_is_not_guarded() {
        // Infinite weight over infinite total weight.
        assert!(weighted_mean(&[m(2.0, 0.0), m(1.0, 1.0)]).is_nan());
    }

    #[test]
    fn last_estimate_tracks_most_recent_fuse() {
        let mut fuser = WeightedFuser::with_initial(9.0);
        assert_eq!(fuser.last_estimate(), 9.0);
        fuser.fuse(&[m(2.0, 1.0)]);
        assert_eq!(fuser.last_estimate(), 2.0);
    }

    #[test]
    fn parametric_routes_each_axis_to_its_own_fuser() {
        let mut fuser = ParametricFuser::new(3);
        let out = fuser
            .fuse_all(&[
                vec![m(1.0, 1.0), m(3.0, 1.0)],
                vec![m(-4.0, 0.5)],
                vec![m(0.0, 1.0), m(8.0, 1.0), m(4.0, 1.0)],
            ])
            .unwrap();
        assert_eq!(out, vec![2.0, -4.0, 4.0]);
        assert_eq!(fuser.last_estimates(), out);
    }

    #[test]
    fn parametric_rejects_wrong_count_without_partial_work() {
        let mut fuser = ParametricFuser::new(3);
        fuser.fuse_all(&[[m(1.0, 1.0)], [m(2.0, 1.0)], [m(3.0, 1.0)]]).unwrap();

        for provided in [0usize, 1, 2, 4, 6] {
            let input = vec![vec![m(100.0, 1.0)]; provided];
            let err = fuser.fuse_all(&input).unwrap_err();
            assert_eq!(
                err,
                FusionError::InvalidParameterCount {
                    expected: 3,
                    actual: provided
                }
            );
        }
        assert_eq!(fuser.last_estimates(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn fuse_axes_requires_three_parameters() {
        let mut xyz = ParametricFuser::new(3);
        let ones = [m(1.0, 1.0)];
        let out = xyz.fuse_axes(Axes::new(&ones[..], &ones[..], &ones[..])).unwrap();
        assert_eq!(out, Axes::splat(1.0));

        let mut six = ParametricFuser::new(6);
        let err = six.fuse_axes(Axes::new(&ones[..], &ones[..], &ones[..])).unwrap_err();
        assert_eq!(
            err,
            FusionError::InvalidParameterCount {
                expected: 6,
                actual: 3
            }
        );
    }
}

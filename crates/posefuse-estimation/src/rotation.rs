//! Orientation estimator.
//!
//! Every cycle, for each of roll, pitch and yaw independently:
//!
//! 1. the rate of change of the IMU reading is integrated (Riemann) onto the
//!    previous estimate, giving the IMU prediction;
//! 2. the prediction is appended to that axis's external measurements with
//!    standard deviation `imu_std_dev`;
//! 3. the measurements are fused by inverse-variance weighting.
//!
//! Integrating the IMU *rate* rather than its absolute reading lets external
//! corrections stick: an offset pulled in by a camera is carried forward
//! instead of being overwritten by the next absolute IMU sample.
//!
//! # Example
//!
//! ```rust
//! use posefuse_estimation::rotation::RotationEstimator;
//! use posefuse_math::ManualTime;
//! use posefuse_types::{Axes, Measurement, Rotation3};
//!
//! let time = ManualTime::new();
//! let mut estimator = RotationEstimator::with_source(0.1, Rotation3::default(), time.clone());
//!
//! let camera_yaw = [Measurement::new(1.0, 0.05)];
//! time.advance(0.02);
//! let r = estimator
//!     .estimate(Rotation3::default(), Axes::from_ypr(&camera_yaw[..], &[], &[]))
//!     .unwrap();
//! assert!((r.yaw - 0.8).abs() < 1e-9);
//! ```

use posefuse_math::{Clock, MonotonicTime, ParametricFuser, RateEstimator, TimeSource, riemann_area};
use posefuse_types::{Axes, Axis, FusionError, Measurement, Rotation3};
use tracing::{debug, warn};

/// Fuses IMU heading with external rotation measurements.
#[derive(Debug, Clone)]
pub struct RotationEstimator<S: TimeSource = MonotonicTime> {
    fuser: ParametricFuser,
    rates: Axes<RateEstimator>,
    last_estimate: Rotation3,
    imu_std_dev: f64,
    clock: Clock<S>,
}

impl RotationEstimator {
    /// Start at zero rotation.
    ///
    /// `imu_std_dev` is the standard deviation of the IMU error in radians
    /// per cycle.
    pub fn new(imu_std_dev: f64) -> Self {
        Self::with_initial(imu_std_dev, Rotation3::default())
    }

    /// Start at `initial`.
    pub fn with_initial(imu_std_dev: f64, initial: Rotation3) -> Self {
        Self::with_source(imu_std_dev, initial, MonotonicTime::new())
    }
}

impl<S: TimeSource> RotationEstimator<S> {
    /// Start at `initial`, timing cycles with `source`.
    pub fn with_source(imu_std_dev: f64, initial: Rotation3, source: S) -> Self {
        let initial_axes: Axes<f64> = initial.into();
        Self {
            fuser: ParametricFuser::new(Axis::ALL.len()),
            rates: initial_axes.map(RateEstimator::new),
            last_estimate: initial,
            imu_std_dev,
            clock: Clock::with_source(source),
        }
    }

    /// Run one cycle, taking `dt` from the owned clock.
    ///
    /// `imu_heading` is the raw IMU orientation.  `observations` holds any
    /// number (including zero) of external measurements per axis, in
    /// radians.
    ///
    /// # Errors
    ///
    /// Propagates [`FusionError`] from the parametric fuser.
    pub fn estimate(
        &mut self,
        imu_heading: Rotation3,
        observations: Axes<&[Measurement]>,
    ) -> Result<Rotation3, FusionError> {
        let dt = self.clock.elapsed();
        self.estimate_over(dt, imu_heading, observations)
    }

    /// Run one cycle covering `dt` seconds.
    ///
    /// # Errors
    ///
    /// Propagates [`FusionError`] from the parametric fuser.
    pub fn estimate_over(
        &mut self,
        dt: f64,
        imu_heading: Rotation3,
        observations: Axes<&[Measurement]>,
    ) -> Result<Rotation3, FusionError> {
        if dt <= 0.0 {
            warn!(dt = dt, "non-positive cycle time; IMU prediction is not finite");
        }

        let heading: Axes<f64> = imu_heading.into();
        let last: Axes<f64> = self.last_estimate.into();
        let mut augmented = observations.map(|m| m.to_vec());

        for axis in Axis::ALL {
            let rate = self.rates[axis].rate(heading[axis], dt);
            let predicted = last[axis] + riemann_area(rate, dt);
            augmented[axis].push(Measurement::new(predicted, self.imu_std_dev));
        }

        let fused = self.fuser.fuse_axes(augmented.as_ref().map(|m| m.as_slice()))?;
        self.last_estimate = fused.into();

        debug!(
            dt = dt,
            roll = self.last_estimate.roll,
            pitch = self.last_estimate.pitch,
            yaw = self.last_estimate.yaw,
            "rotation estimate"
        );
        Ok(self.last_estimate)
    }

    /// The most recent estimate.
    pub fn last_estimate(&self) -> Rotation3 {
        self.last_estimate
    }

    pub fn imu_std_dev(&self) -> f64 {
        self.imu_std_dev
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posefuse_math::ManualTime;

    const DT: f64 = 0.02;

    fn estimator(initial: Rotation3) -> (RotationEstimator<ManualTime>, ManualTime) {
        let time = ManualTime::new();
        (RotationEstimator::with_source(0.1, initial, time.clone()), time)
    }

    #[test]
    fn imu_only_follows_heading_changes() {
        let (mut est, time) = estimator(Rotation3::default());
        let mut r = Rotation3::default();
        for k in 1..=10 {
            time.advance(DT);
            let heading = Rotation3::new(0.01 * k as f64, -0.02 * k as f64, 0.05 * k as f64);
            r = est.estimate(heading, Axes::empty()).unwrap();
        }
        assert!((r.roll - 0.1).abs() < 1e-9);
        assert!((r.pitch + 0.2).abs() < 1e-9);
        assert!((r.yaw - 0.5).abs() < 1e-9);
        assert_eq!(est.last_estimate(), r);
    }

    #[test]
    fn external_yaw_pulls_estimate_toward_measurement() {
        let (mut fused, time_a) = estimator(Rotation3::default());
        let (mut imu_only, time_b) = estimator(Rotation3::default());
        let camera = [Measurement::new(1.0, 0.05)];
        let heading = Rotation3::from_yaw(0.2);

        let mut with_camera = Rotation3::default();
        let mut without = Rotation3::default();
        for _ in 0..5 {
            time_a.advance(DT);
            time_b.advance(DT);
            with_camera = fused
                .estimate(heading, Axes::from_ypr(&camera[..], &[], &[]))
                .unwrap();
            without = imu_only.estimate(heading, Axes::empty()).unwrap();
        }

        assert!((without.yaw - 0.2).abs() < 1e-9);
        assert!((with_camera.yaw - 1.0).abs() < (without.yaw - 1.0).abs());
        // Weight 400 against 100: each cycle closes 80 % of the remaining gap.
        assert!((with_camera.yaw - 1.0).abs() < 0.8 * 0.2f64.powi(4));
        // Other axes are untouched by the yaw measurement.
        assert!(with_camera.roll.abs() < 1e-12);
        assert!(with_camera.pitch.abs() < 1e-12);
    }

    #[test]
    fn correction_persists_under_constant_imu_heading() {
        let (mut est, time) = estimator(Rotation3::default());
        let camera = [Measurement::new(0.5, 0.05)];

        time.advance(DT);
        let pulled = est
            .estimate(Rotation3::default(), Axes::from_ypr(&camera[..], &[], &[]))
            .unwrap();
        time.advance(DT);
        let held = est.estimate(Rotation3::default(), Axes::empty()).unwrap();

        assert!((pulled.yaw - 0.4).abs() < 1e-12);
        assert!((held.yaw - pulled.yaw).abs() < 1e-12);
    }

    #[test]
    fn initial_rotation_is_the_starting_estimate() {
        let initial = Rotation3::new(0.1, 0.2, 0.3);
        let (mut est, time) = estimator(initial);
        assert_eq!(est.last_estimate(), initial);

        time.advance(DT);
        let r = est.estimate(initial, Axes::empty()).unwrap();
        assert!((r.yaw - 0.3).abs() < 1e-12);
        assert!((r.roll - 0.1).abs() < 1e-12);
    }

    #[test]
    fn explicit_dt_does_not_touch_the_clock() {
        let (mut est, time) = estimator(Rotation3::default());
        time.advance(1.0);
        est.estimate_over(DT, Rotation3::from_yaw(0.1), Axes::empty())
            .unwrap();
        // The clock still holds the full second.
        let r = est.estimate(Rotation3::from_yaw(0.3), Axes::empty()).unwrap();
        assert!((r.yaw - 0.3).abs() < 1e-9);
    }

    #[test]
    fn zero_dt_propagates_nan() {
        let (mut est, _time) = estimator(Rotation3::default());
        let (r, warnings) = crate::testing::count_warnings(|| {
            est.estimate_over(0.0, Rotation3::default(), Axes::empty())
        });
        assert_eq!(warnings, 1);
        assert!(r.unwrap().yaw.is_nan());
    }
}

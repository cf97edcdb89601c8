//! Position estimator.
//!
//! Works like [`Odometry`][crate::odometry::Odometry] but also fuses external
//! position measurements.  Every cycle:
//!
//! 1. the body-relative drivetrain speeds are rotated into the world frame by
//!    the supplied heading (usually the output of
//!    [`RotationEstimator`][crate::rotation::RotationEstimator]);
//! 2. for each of x, y, z the trapezoid between the previous and current
//!    world velocity is added to the previous position, giving the drivetrain
//!    prediction;
//! 3. the prediction is appended to that axis's external measurements with
//!    standard deviation `drive_std_dev` and the set is fused.
//!
//! # Example
//!
//! ```rust
//! use posefuse_estimation::pose::PoseEstimator;
//! use posefuse_math::ManualTime;
//! use posefuse_types::{Axes, ChassisSpeeds, Pose3, Rotation3};
//!
//! let time = ManualTime::new();
//! let mut estimator = PoseEstimator::with_source(0.1, Pose3::origin(), time.clone());
//!
//! time.advance(0.5);
//! let pose = estimator
//!     .estimate(ChassisSpeeds::new(1.0, 0.0), Rotation3::default(), Axes::empty())
//!     .unwrap();
//! // Ramp from rest to 1 m/s over 0.5 s.
//! assert!((pose.translation.x - 0.25).abs() < 1e-12);
//! ```

use posefuse_math::{Clock, MonotonicTime, ParametricFuser, TimeSource, trapezoid_area};
use posefuse_types::{Axes, Axis, ChassisSpeeds, FusionError, Measurement, Pose3, Rotation3, Vec3};
use tracing::{debug, warn};

/// Fuses drivetrain dead reckoning with external position measurements.
#[derive(Debug, Clone)]
pub struct PoseEstimator<S: TimeSource = MonotonicTime> {
    fuser: ParametricFuser,
    last_speeds: Vec3,
    last_estimate: Pose3,
    drive_std_dev: f64,
    clock: Clock<S>,
}

impl PoseEstimator {
    /// Start at the origin.
    ///
    /// `drive_std_dev` is the standard deviation of the drivetrain error in
    /// metres per cycle.
    pub fn new(drive_std_dev: f64) -> Self {
        Self::with_initial(drive_std_dev, Pose3::origin())
    }

    /// Start at `initial`.
    pub fn with_initial(drive_std_dev: f64, initial: Pose3) -> Self {
        Self::with_source(drive_std_dev, initial, MonotonicTime::new())
    }
}

impl<S: TimeSource> PoseEstimator<S> {
    /// Start at `initial`, timing cycles with `source`.
    pub fn with_source(drive_std_dev: f64, initial: Pose3, source: S) -> Self {
        Self {
            fuser: ParametricFuser::new(Axis::ALL.len()),
            last_speeds: Vec3::zero(),
            last_estimate: initial,
            drive_std_dev,
            clock: Clock::with_source(source),
        }
    }

    /// Run one cycle, taking `dt` from the owned clock.
    ///
    /// `speeds` are robot-relative (m/s).  `heading` orients them in the
    /// world.  `observations` holds any number (including zero) of external
    /// position measurements per axis, in metres.  The returned pose carries
    /// `heading` as its rotation.
    ///
    /// # Errors
    ///
    /// Propagates [`FusionError`] from the parametric fuser.
    pub fn estimate(
        &mut self,
        speeds: ChassisSpeeds,
        heading: Rotation3,
        observations: Axes<&[Measurement]>,
    ) -> Result<Pose3, FusionError> {
        let dt = self.clock.elapsed();
        self.estimate_over(dt, speeds, heading, observations)
    }

    /// Run one cycle covering `dt` seconds.
    ///
    /// # Errors
    ///
    /// Propagates [`FusionError`] from the parametric fuser.
    pub fn estimate_over(
        &mut self,
        dt: f64,
        speeds: ChassisSpeeds,
        heading: Rotation3,
        observations: Axes<&[Measurement]>,
    ) -> Result<Pose3, FusionError> {
        if dt <= 0.0 {
            warn!(dt = dt, "non-positive cycle time; drivetrain prediction does not advance");
        }

        let world = speeds.to_world(heading);
        let velocity: Axes<f64> = world.into();
        let previous: Axes<f64> = self.last_speeds.into();
        let position: Axes<f64> = self.last_estimate.translation.into();
        let mut augmented = observations.map(|m| m.to_vec());

        for axis in Axis::ALL {
            let predicted = position[axis] + trapezoid_area(previous[axis], velocity[axis], dt);
            augmented[axis].push(Measurement::new(predicted, self.drive_std_dev));
        }

        let fused = self.fuser.fuse_axes(augmented.as_ref().map(|m| m.as_slice()))?;
        self.last_speeds = world;
        self.last_estimate = Pose3::new(fused.into(), heading);

        debug!(
            dt = dt,
            x = fused.x,
            y = fused.y,
            z = fused.z,
            "pose estimate"
        );
        Ok(self.last_estimate)
    }

    /// The most recent estimate.
    pub fn last_estimate(&self) -> Pose3 {
        self.last_estimate
    }

    /// World-frame velocity used as the left edge of the next trapezoid.
    pub fn last_speeds(&self) -> Vec3 {
        self.last_speeds
    }

    pub fn drive_std_dev(&self) -> f64 {
        self.drive_std_dev
    }
}

//! Dead reckoning from drivetrain speeds and IMU heading.
//!
//! No external measurements are fused.  The heading *rate* of each rotational
//! axis is Riemann-integrated from the initial rotation, and the drivetrain
//! velocity, rotated into the world frame by that integrated rotation, is
//! trapezoid-integrated from the initial position.

use posefuse_math::{
    Clock, Integrator, MonotonicTime, RateEstimator, RiemannIntegrator, TimeSource,
    TrapezoidalIntegrator,
};
use posefuse_types::{Axes, Axis, ChassisSpeeds, Pose3, Rotation3};
use tracing::{trace, warn};

/// Integrates drivetrain and IMU data into a pose.
#[derive(Debug, Clone)]
pub struct Odometry<S: TimeSource = MonotonicTime> {
    positions: Axes<TrapezoidalIntegrator>,
    angles: Axes<RiemannIntegrator>,
    rates: Axes<RateEstimator>,
    pose: Pose3,
    clock: Clock<S>,
}

impl Odometry {
    /// Start at the origin.
    pub fn new() -> Self {
        Self::with_initial(Pose3::origin())
    }

    /// Start at `initial` (metres, radians).
    pub fn with_initial(initial: Pose3) -> Self {
        Self::with_source(initial, MonotonicTime::new())
    }
}

impl Default for Odometry {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TimeSource> Odometry<S> {
    /// Start at `initial`, timing cycles with `source`.
    pub fn with_source(initial: Pose3, source: S) -> Self {
        let position: Axes<f64> = initial.translation.into();
        let rotation: Axes<f64> = initial.rotation.into();
        Self {
            positions: position.map(TrapezoidalIntegrator::new),
            angles: rotation.map(RiemannIntegrator::new),
            rates: rotation.map(RateEstimator::new),
            pose: initial,
            clock: Clock::with_source(source),
        }
    }

    /// Integrate one cycle, taking `dt` from the owned clock.
    pub fn update(&mut self, speeds: ChassisSpeeds, heading: Rotation3) -> Pose3 {
        let dt = self.clock.elapsed();
        self.update_over(dt, speeds, heading)
    }

    /// Integrate one cycle covering `dt` seconds.
    ///
    /// `speeds` are robot-relative (m/s); `heading` is the IMU orientation.
    pub fn update_over(&mut self, dt: f64, speeds: ChassisSpeeds, heading: Rotation3) -> Pose3 {
        if dt <= 0.0 {
            warn!(dt = dt, "non-positive cycle time; heading rate is not finite");
        }

        let heading: Axes<f64> = heading.into();
        for axis in Axis::ALL {
            let rate = self.rates[axis].rate(heading[axis], dt);
            self.angles[axis].update(rate, dt);
        }
        let rotation: Rotation3 = self.angles.as_ref().map(|i| i.get()).into();

        let velocity: Axes<f64> = speeds.to_world(rotation).into();
        for axis in Axis::ALL {
            self.positions[axis].update(velocity[axis], dt);
        }

        self.pose = Pose3::new(self.positions.as_ref().map(|i| i.get()).into(), rotation);
        trace!(dt = dt, pose = ?self.pose, "odometry update");
        self.pose
    }

    /// The most recent pose.
    pub fn pose(&self) -> Pose3 {
        self.pose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posefuse_math::ManualTime;
    use posefuse_types::Vec3;

    #[test]
    fn straight_line_from_rest() {
        let time = ManualTime::new();
        let mut odom = Odometry::with_source(Pose3::origin(), time.clone());

        let mut pose = Pose3::origin();
        for _ in 0..10 {
            time.advance(0.1);
            pose = odom.update(ChassisSpeeds::new(1.0, 0.0), Rotation3::default());
        }
        // First step ramps from rest (0.05 m), the remaining nine add 0.1 m.
        assert!((pose.translation.x - 0.95).abs() < 1e-12);
        assert!(pose.translation.y.abs() < 1e-12);
        assert_eq!(odom.pose(), pose);
    }

    #[test]
    fn heading_is_integrated_from_its_rate() {
        let time = ManualTime::new();
        let mut odom = Odometry::with_source(Pose3::origin(), time.clone());

        for k in 1..=5 {
            time.advance(0.02);
            odom.update(ChassisSpeeds::default(), Rotation3::new(0.0, 0.0, 0.1 * k as f64));
        }
        assert!((odom.pose().rotation.yaw - 0.5).abs() < 1e-9);
    }

    #[test]
    fn zero_dt_warns_and_propagates_nan() {
        let mut odom = Odometry::default();

        let (pose, warnings) = crate::testing::count_warnings(|| {
            odom.update_over(0.0, ChassisSpeeds::default(), Rotation3::from_yaw(0.1))
        });
        assert_eq!(warnings, 1);
        assert!(pose.rotation.yaw.is_nan());
    }

    #[test]
    fn initial_pose_offsets_everything() {
        let initial = Pose3::new(Vec3::new(2.0, 3.0, 0.0), Rotation3::from_yaw(1.0));
        let mut odom = Odometry::with_initial(initial);

        let pose = odom.update_over(0.1, ChassisSpeeds::default(), initial.rotation);
        assert!((pose.translation.x - 2.0).abs() < 1e-12);
        assert!((pose.translation.y - 3.0).abs() < 1e-12);
        assert!((pose.rotation.yaw - 1.0).abs() < 1e-12);
    }

    #[test]
    fn velocity_follows_integrated_heading() {
        let mut odom = Odometry::default();
        // Turn to face +Y in one cycle, then drive.
        odom.update_over(0.1, ChassisSpeeds::default(), Rotation3::from_yaw(std::f64::consts::FRAC_PI_2));
        let pose = odom.update_over(0.1, ChassisSpeeds::new(2.0, 0.0), Rotation3::from_yaw(std::f64::consts::FRAC_PI_2));

        // Triangle from 0 to 2 m/s over 0.1 s along world +Y.
        assert!((pose.translation.y - 0.1).abs() < 1e-12);
        assert!(pose.translation.x.abs() < 1e-12);
    }
}

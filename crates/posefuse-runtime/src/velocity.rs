//! Velocity estimate from IMU acceleration and drivetrain speeds.
//!
//! Each cycle the IMU acceleration is Riemann-integrated onto the previous
//! velocity estimate and the result is fused, per robot-relative axis, with
//! the drivetrain's reported speed.  The drivetrain is planar, so its Z speed
//! is taken to be exactly 0.

use posefuse_hal::{Drivetrain, Imu};
use posefuse_math::{Clock, MonotonicTime, ParametricFuser, TimeSource, riemann_area};
use posefuse_types::{Axes, Axis, Measurement, Vec3};
use tracing::debug;

use crate::PipelineError;

/// Default IMU acceleration standard deviation.
pub const DEFAULT_ACCEL_STD_DEV: f64 = 0.1;
/// Default drivetrain speed standard deviation.
pub const DEFAULT_DRIVE_STD_DEV: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct VelocityFusion<S: TimeSource = MonotonicTime> {
    fuser: ParametricFuser,
    last_velocity: Vec3,
    accel_std_dev: f64,
    drive_std_dev: f64,
    clock: Clock<S>,
}

impl VelocityFusion {
    pub fn new() -> Self {
        Self::with_source(DEFAULT_ACCEL_STD_DEV, DEFAULT_DRIVE_STD_DEV, MonotonicTime::new())
    }
}

impl Default for VelocityFusion {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TimeSource> VelocityFusion<S> {
    pub fn with_source(accel_std_dev: f64, drive_std_dev: f64, source: S) -> Self {
        Self {
            fuser: ParametricFuser::new(Axis::ALL.len()),
            last_velocity: Vec3::zero(),
            accel_std_dev,
            drive_std_dev,
            clock: Clock::with_source(source),
        }
    }

    /// Read both sensors and fuse, timed by the owned clock.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Sensor`] when either sensor fails.
    pub fn periodic(&mut self, drive: &mut dyn Drivetrain, imu: &mut dyn Imu) -> Result<Vec3, PipelineError> {
        let dt = self.clock.elapsed();
        self.periodic_over(dt, drive, imu)
    }

    /// Read both sensors and fuse one cycle of `dt` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Sensor`] when either sensor fails.
    pub fn periodic_over(
        &mut self,
        dt: f64,
        drive: &mut dyn Drivetrain,
        imu: &mut dyn Imu,
    ) -> Result<Vec3, PipelineError> {
        let accel = imu.acceleration()?;
        let speeds = drive.chassis_speeds()?;
        self.fuse_over(dt, accel, Vec3::new(speeds.vx, speeds.vy, 0.0))
    }

    /// Fuse one cycle of `dt` seconds from already-read values.
    ///
    /// # Errors
    ///
    /// Propagates [`PipelineError::Fusion`] from the parametric fuser.
    pub fn fuse_over(&mut self, dt: f64, accel: Vec3, drive_velocity: Vec3) -> Result<Vec3, PipelineError> {
        let accel: Axes<f64> = accel.into();
        let last: Axes<f64> = self.last_velocity.into();
        let drive: Axes<f64> = drive_velocity.into();

        let measurements = last.zip(accel).zip(drive).map(|((v, a), d)| {
            [
                Measurement::new(v + riemann_area(a, dt), self.accel_std_dev),
                Measurement::new(d, self.drive_std_dev),
            ]
        });
        let fused = self.fuser.fuse_axes(measurements.as_ref().map(|m| &m[..]))?;
        self.last_velocity = fused.into();

        debug!(dt = dt, vx = fused.x, vy = fused.y, vz = fused.z, "velocity estimate");
        Ok(self.last_velocity)
    }

    pub fn last_velocity(&self) -> Vec3 {
        self.last_velocity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posefuse_hal::SensorError;
    use posefuse_math::ManualTime;
    use posefuse_types::{ChassisSpeeds, Pose3, Rotation3};

    #[test]
    fn agreeing_sensors_give_common_velocity() {
        let mut fusion = VelocityFusion::new();
        let v = fusion
            .fuse_over(0.5, Vec3::new(2.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0))
            .unwrap();
        assert!((v.x - 1.0).abs() < 1e-12);
        assert_eq!(v.y, 0.0);
        assert_eq!(v.z, 0.0);
    }

    #[test]
    fn drive_speed_outweighs_integrated_acceleration() {
        // σ 0.1 vs 0.05: weights 100 and 400.
        let mut fusion = VelocityFusion::new();
        let v = fusion
            .fuse_over(1.0, Vec3::new(1.0, 0.0, 0.0), Vec3::zero())
            .unwrap();
        assert!((v.x - 0.2).abs() < 1e-12);
        assert_eq!(fusion.last_velocity(), v);
    }

    #[test]
    fn vertical_velocity_is_pinned_toward_zero() {
        let mut fusion = VelocityFusion::new();
        for _ in 0..10 {
            fusion
                .fuse_over(0.1, Vec3::new(0.0, 0.0, 9.81), Vec3::zero())
                .unwrap();
        }
        // Each step adds ~0.981 then keeps a fifth of the total.
        assert!(fusion.last_velocity().z < 0.25);
    }

    struct Still;

    impl Drivetrain for Still {
        fn id(&self) -> &str {
            "still"
        }
        fn chassis_speeds(&mut self) -> Result<ChassisSpeeds, SensorError> {
            Ok(ChassisSpeeds::default())
        }
        fn pose(&mut self) -> Result<Pose3, SensorError> {
            Ok(Pose3::origin())
        }
        fn rotation(&mut self) -> Result<Rotation3, SensorError> {
            Ok(Rotation3::default())
        }
    }

    impl Imu for Still {
        fn id(&self) -> &str {
            "still"
        }
        fn heading(&mut self) -> Result<Rotation3, SensorError> {
            Ok(Rotation3::default())
        }
        fn acceleration(&mut self) -> Result<Vec3, SensorError> {
            Ok(Vec3::zero())
        }
    }

    #[test]
    fn periodic_reads_sensors_and_clock() {
        let time = ManualTime::new();
        let mut fusion = VelocityFusion::with_source(0.1, 0.05, time.clone());
        time.advance(0.02);
        let v = fusion.periodic(&mut Still, &mut Still).unwrap();
        assert_eq!(v, Vec3::zero());
    }
}

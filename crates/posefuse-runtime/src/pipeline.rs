//! Per-cycle composition of estimators and sensors.
//!
//! Both pipelines read their clock at most once per cycle and hand the same
//! `dt` to every estimator they own.  The `_over` variants take `dt` from the
//! caller instead, for hosts that already pace the loop themselves.
//!
//! # Example
//!
//! ```rust
//! use posefuse_hal::sim::SimWorld;
//! use posefuse_runtime::pipeline::EstimatorPipeline;
//! use posefuse_types::{ChassisSpeeds, Pose3};
//!
//! let world = SimWorld::new(Pose3::origin());
//! let mut drive = world.drivetrain(1, 0.0).unwrap();
//! let mut imu = world.imu(3, 0.0).unwrap();
//! let mut camera = world.vision(2, 5, [0.05; 6]).unwrap();
//! let mut pipeline = EstimatorPipeline::new();
//!
//! world.command(ChassisSpeeds::new(1.0, 0.0), 0.0).unwrap();
//! for _ in 0..50 {
//!     world.step(0.02).unwrap();
//!     pipeline.periodic_over(0.02, &mut drive, &mut imu, &mut camera).unwrap();
//! }
//! let truth = world.truth().unwrap().pose;
//! let estimate = pipeline.last_estimate();
//! assert!(estimate.translation.sub(truth.translation).norm() < 0.5);
//! ```

use posefuse_estimation::{Odometry, PoseEstimator, RotationEstimator};
use posefuse_hal::{Drivetrain, Imu, VisionSensor};
use posefuse_math::{Clock, MonotonicTime, TimeSource};
use posefuse_types::{Axes, Measurement, Pose3};
use tracing::{debug, instrument};

use crate::PipelineError;

/// Default IMU standard deviation, radians per cycle.
pub const DEFAULT_IMU_STD_DEV: f64 = 0.1;
/// Default drivetrain standard deviation, metres per cycle.
pub const DEFAULT_DRIVE_STD_DEV: f64 = 0.1;

// ────────────────────────────────────────────────────────────────────────────
// EstimatorPipeline
// ────────────────────────────────────────────────────────────────────────────

/// Rotation estimate followed by pose estimate, fed by a drivetrain, an IMU
/// and an optional vision sensor.
#[derive(Debug, Clone)]
pub struct EstimatorPipeline<S: TimeSource = MonotonicTime> {
    rotation: RotationEstimator<S>,
    pose: PoseEstimator<S>,
    clock: Clock<S>,
}

impl EstimatorPipeline {
    /// Default standard deviations, starting at the origin.
    pub fn new() -> Self {
        Self::with_std_devs(DEFAULT_IMU_STD_DEV, DEFAULT_DRIVE_STD_DEV, Pose3::origin())
    }

    pub fn with_std_devs(imu_std_dev: f64, drive_std_dev: f64, initial: Pose3) -> Self {
        Self::with_source(imu_std_dev, drive_std_dev, initial, MonotonicTime::new())
    }
}

impl Default for EstimatorPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TimeSource + Clone> EstimatorPipeline<S> {
    /// Build a pipeline timed by `source`.
    pub fn with_source(imu_std_dev: f64, drive_std_dev: f64, initial: Pose3, source: S) -> Self {
        Self {
            rotation: RotationEstimator::with_source(imu_std_dev, initial.rotation, source.clone()),
            pose: PoseEstimator::with_source(drive_std_dev, initial, source.clone()),
            clock: Clock::with_source(source),
        }
    }
}

impl<S: TimeSource> EstimatorPipeline<S> {
    /// Run one cycle, reading the pipeline clock once.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Sensor`] when a sensor read fails and
    /// [`PipelineError::Fusion`] when an estimator rejects its input.  The
    /// estimators are untouched when a sensor fails.
    pub fn periodic(
        &mut self,
        drive: &mut dyn Drivetrain,
        imu: &mut dyn Imu,
        vision: &mut dyn VisionSensor,
    ) -> Result<Pose3, PipelineError> {
        let dt = self.clock.elapsed();
        self.periodic_over(dt, drive, imu, vision)
    }

    /// Run one cycle covering `dt` seconds.
    ///
    /// # Errors
    ///
    /// See [`EstimatorPipeline::periodic`].
    #[instrument(
        level = "trace",
        skip(self, drive, imu, vision),
        fields(drive = drive.id(), imu = imu.id(), vision = vision.id())
    )]
    pub fn periodic_over(
        &mut self,
        dt: f64,
        drive: &mut dyn Drivetrain,
        imu: &mut dyn Imu,
        vision: &mut dyn VisionSensor,
    ) -> Result<Pose3, PipelineError> {
        let imu_heading = imu.heading()?;
        let speeds = drive.chassis_speeds()?;
        let observation = vision.observation()?;

        let (positions, rotations) = match observation {
            Some(obs) => (Some(obs.position_measurements()), Some(obs.rotation_measurements())),
            None => {
                debug!(sensor = vision.id(), "no vision observation this cycle");
                (None, None)
            }
        };

        let rotation = self
            .rotation
            .estimate_over(dt, imu_heading, single_measurements(&rotations))?;
        let pose = self
            .pose
            .estimate_over(dt, speeds, rotation, single_measurements(&positions))?;
        Ok(pose)
    }

    /// The most recent fused pose.
    pub fn last_estimate(&self) -> Pose3 {
        self.pose.last_estimate()
    }

    pub fn rotation_estimator(&self) -> &RotationEstimator<S> {
        &self.rotation
    }

    pub fn pose_estimator(&self) -> &PoseEstimator<S> {
        &self.pose
    }
}

fn single_measurements(axes: &Option<Axes<Measurement>>) -> Axes<&[Measurement]> {
    axes.as_ref()
        .map_or(Axes::empty(), |a| a.as_ref().map(std::slice::from_ref))
}

// ────────────────────────────────────────────────────────────────────────────
// OdometryPipeline
// ────────────────────────────────────────────────────────────────────────────

/// Dead reckoning from a drivetrain's own speeds and gyro.
#[derive(Debug, Clone)]
pub struct OdometryPipeline<S: TimeSource = MonotonicTime> {
    odometry: Odometry<S>,
}

impl OdometryPipeline {
    pub fn new(initial: Pose3) -> Self {
        Self {
            odometry: Odometry::with_initial(initial),
        }
    }
}

impl<S: TimeSource> OdometryPipeline<S> {
    pub fn with_source(initial: Pose3, source: S) -> Self {
        Self {
            odometry: Odometry::with_source(initial, source),
        }
    }

    /// Run one cycle timed by the odometry's own clock.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Sensor`] when the drivetrain cannot be read.
    pub fn periodic(&mut self, drive: &mut dyn Drivetrain) -> Result<Pose3, PipelineError> {
        let speeds = drive.chassis_speeds()?;
        let heading = drive.rotation()?;
        Ok(self.odometry.update(speeds, heading))
    }

    /// Run one cycle covering `dt` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Sensor`] when the drivetrain cannot be read.
    pub fn periodic_over(&mut self, dt: f64, drive: &mut dyn Drivetrain) -> Result<Pose3, PipelineError> {
        let speeds = drive.chassis_speeds()?;
        let heading = drive.rotation()?;
        Ok(self.odometry.update_over(dt, speeds, heading))
    }

    pub fn pose(&self) -> Pose3 {
        self.odometry.pose()
    }
}

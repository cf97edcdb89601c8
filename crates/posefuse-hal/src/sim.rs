//! In-process simulation for tests and headless runs without hardware.
//!
//! [`SimWorld`] owns a shared [`GroundTruth`] that the host advances with
//! [`SimWorld::step`].  Sensors created from the world read that truth and
//! add seeded Gaussian noise, so a run is reproducible for a given seed.
//!
//! # Example
//!
//! ```rust
//! use posefuse_hal::drivetrain::Drivetrain;
//! use posefuse_hal::sim::SimWorld;
//! use posefuse_types::{ChassisSpeeds, Pose3};
//!
//! let world = SimWorld::new(Pose3::origin());
//! world.command(ChassisSpeeds::new(1.0, 0.0), 0.0).unwrap();
//! world.step(0.5).unwrap();
//!
//! let mut drive = world.drivetrain(7, 0.0).unwrap();
//! assert_eq!(drive.chassis_speeds().unwrap(), ChassisSpeeds::new(1.0, 0.0));
//! assert!((world.truth().unwrap().pose.translation.x - 0.5).abs() < 1e-12);
//! ```

use std::sync::{Arc, RwLock};

use posefuse_types::{ChassisSpeeds, Pose3, Rotation3, Vec3, VisionObservation};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use tracing::trace;

use crate::SensorError;
use crate::drivetrain::Drivetrain;
use crate::imu::Imu;
use crate::vision::VisionSensor;

/// The simulated robot's true state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GroundTruth {
    pub pose: Pose3,
    /// Commanded robot-relative velocity (m/s).
    pub speeds: ChassisSpeeds,
    /// Commanded yaw rate (rad/s).
    pub yaw_rate: f64,
    /// Robot-relative acceleration over the last step (m/s²).
    pub acceleration: Vec3,
    /// Simulated seconds since the world was created.
    pub time: f64,
    stepped_speeds: ChassisSpeeds,
}

// ────────────────────────────────────────────────────────────────────────────
// World
// ────────────────────────────────────────────────────────────────────────────

/// Shared ground truth for a set of simulated sensors.
#[derive(Debug, Clone)]
pub struct SimWorld {
    truth: Arc<RwLock<GroundTruth>>,
}

impl SimWorld {
    pub fn new(initial: Pose3) -> Self {
        Self {
            truth: Arc::new(RwLock::new(GroundTruth {
                pose: initial,
                ..GroundTruth::default()
            })),
        }
    }

    /// Set the velocity the robot follows from the next step on.
    pub fn command(&self, speeds: ChassisSpeeds, yaw_rate: f64) -> Result<(), SensorError> {
        let mut truth = self.truth.write().map_err(|_| poisoned("world"))?;
        truth.speeds = speeds;
        truth.yaw_rate = yaw_rate;
        Ok(())
    }

    /// Advance the world by `dt` seconds.
    ///
    /// The translation uses the heading at the middle of the step.
    pub fn step(&self, dt: f64) -> Result<GroundTruth, SensorError> {
        let mut truth = self.truth.write().map_err(|_| poisoned("world"))?;
        let rotation = truth.pose.rotation;
        let mid = Rotation3::new(rotation.roll, rotation.pitch, rotation.yaw + truth.yaw_rate * dt / 2.0);

        let displacement = truth.speeds.to_world(mid).scale(dt);
        truth.pose.translation = truth.pose.translation.add(displacement);
        truth.pose.rotation.yaw += truth.yaw_rate * dt;

        let previous = truth.stepped_speeds;
        truth.acceleration = if dt > 0.0 {
            Vec3::new(
                (truth.speeds.vx - previous.vx) / dt,
                (truth.speeds.vy - previous.vy) / dt,
                0.0,
            )
        } else {
            Vec3::zero()
        };
        truth.stepped_speeds = truth.speeds;
        truth.time += dt;

        trace!(t = truth.time, pose = ?truth.pose, "sim step");
        Ok(*truth)
    }

    /// A snapshot of the current truth.
    pub fn truth(&self) -> Result<GroundTruth, SensorError> {
        self.truth
            .read()
            .map(|truth| *truth)
            .map_err(|_| poisoned("world"))
    }

    /// A drivetrain whose speeds carry noise of `noise_std_dev` m/s.
    pub fn drivetrain(&self, seed: u64, noise_std_dev: f64) -> Result<SimDrivetrain, SensorError> {
        Ok(SimDrivetrain {
            truth: Arc::clone(&self.truth),
            noise: NoiseSource::new("sim_drivetrain", seed, noise_std_dev)?,
        })
    }

    /// An IMU whose heading carries noise of `noise_std_dev` rad.
    pub fn imu(&self, seed: u64, noise_std_dev: f64) -> Result<SimImu, SensorError> {
        Ok(SimImu {
            truth: Arc::clone(&self.truth),
            noise: NoiseSource::new("sim_imu", seed, noise_std_dev)?,
        })
    }

    /// A vision sensor that reports every `every`-th call.
    ///
    /// Observations are perturbed by `std_devs` (x, y, z, roll, pitch, yaw)
    /// and report those same deviations.
    pub fn vision(&self, seed: u64, every: u32, std_devs: [f64; 6]) -> Result<SimVision, SensorError> {
        let noise = std_devs
            .iter()
            .enumerate()
            .map(|(i, &sd)| NoiseSource::new("sim_vision", seed.wrapping_add(i as u64), sd))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SimVision {
            truth: Arc::clone(&self.truth),
            noise,
            std_devs,
            every: every.max(1),
            calls: 0,
        })
    }
}

fn poisoned(sensor: &str) -> SensorError {
    SensorError::Unavailable {
        sensor: sensor.to_string(),
        reason: "ground truth lock poisoned".to_string(),
    }
}

fn read_truth(truth: &RwLock<GroundTruth>, sensor: &str) -> Result<GroundTruth, SensorError> {
    truth.read().map(|t| *t).map_err(|_| poisoned(sensor))
}

// ────────────────────────────────────────────────────────────────────────────
// Noise
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct NoiseSource {
    rng: StdRng,
    normal: Normal<f64>,
}

impl NoiseSource {
    fn new(sensor: &str, seed: u64, std_dev: f64) -> Result<Self, SensorError> {
        let normal = Normal::new(0.0, std_dev).map_err(|_| SensorError::InvalidNoise {
            sensor: sensor.to_string(),
            std_dev,
        })?;
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            normal,
        })
    }

    fn sample(&mut self) -> f64 {
        self.normal.sample(&mut self.rng)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sensors
// ────────────────────────────────────────────────────────────────────────────

/// Simulated drivetrain.  Speeds are noisy; pose and gyro are exact.
#[derive(Debug, Clone)]
pub struct SimDrivetrain {
    truth: Arc<RwLock<GroundTruth>>,
    noise: NoiseSource,
}

impl Drivetrain for SimDrivetrain {
    fn id(&self) -> &str {
        "sim_drivetrain"
    }

    fn chassis_speeds(&mut self) -> Result<ChassisSpeeds, SensorError> {
        let truth = read_truth(&self.truth, self.id())?;
        Ok(ChassisSpeeds::new(
            truth.speeds.vx + self.noise.sample(),
            truth.speeds.vy + self.noise.sample(),
        ))
    }

    fn pose(&mut self) -> Result<Pose3, SensorError> {
        Ok(read_truth(&self.truth, self.id())?.pose)
    }

    fn rotation(&mut self) -> Result<Rotation3, SensorError> {
        Ok(read_truth(&self.truth, self.id())?.pose.rotation)
    }
}

/// Simulated IMU.  The yaw reading is noisy; acceleration is exact.
#[derive(Debug, Clone)]
pub struct SimImu {
    truth: Arc<RwLock<GroundTruth>>,
    noise: NoiseSource,
}

impl Imu for SimImu {
    fn id(&self) -> &str {
        "sim_imu"
    }

    fn heading(&mut self) -> Result<Rotation3, SensorError> {
        let rotation = read_truth(&self.truth, self.id())?.pose.rotation;
        Ok(Rotation3::new(rotation.roll, rotation.pitch, rotation.yaw + self.noise.sample()))
    }

    fn acceleration(&mut self) -> Result<Vec3, SensorError> {
        Ok(read_truth(&self.truth, self.id())?.acceleration)
    }
}

/// Simulated camera that sees a fiducial every few cycles.
#[derive(Debug, Clone)]
pub struct SimVision {
    truth: Arc<RwLock<GroundTruth>>,
    noise: Vec<NoiseSource>,
    std_devs: [f64; 6],
    every: u32,
    calls: u32,
}

impl VisionSensor for SimVision {
    fn id(&self) -> &str {
        "sim_vision"
    }

    fn observation(&mut self) -> Result<Option<VisionObservation>, SensorError> {
        self.calls = self.calls.wrapping_add(1);
        if self.calls % self.every != 0 {
            return Ok(None);
        }

        let pose = read_truth(&self.truth, self.id())?.pose;
        let mut e = self.noise.iter_mut().map(NoiseSource::sample);
        let mut next = || e.next().unwrap_or(0.0);
        let translation = Vec3::new(
            pose.translation.x + next(),
            pose.translation.y + next(),
            pose.translation.z + next(),
        );
        let rotation = Rotation3::new(
            pose.rotation.roll + next(),
            pose.rotation.pitch + next(),
            pose.rotation.yaw + next(),
        );
        Ok(Some(VisionObservation::new(
            Pose3::new(translation, rotation),
            self.std_devs,
        )))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn straight_line_motion() {
        let world = SimWorld::new(Pose3::origin());
        world.command(ChassisSpeeds::new(2.0, 0.0), 0.0).unwrap();
        for _ in 0..4 {
            world.step(0.25).unwrap();
        }
        let truth = world.truth().unwrap();
        assert!((truth.pose.translation.x - 2.0).abs() < 1e-12);
        assert!((truth.time - 1.0).abs() < 1e-12);
    }

    #[test]
    fn turning_in_place_changes_only_yaw() {
        let world = SimWorld::new(Pose3::origin());
        world.command(ChassisSpeeds::default(), FRAC_PI_2).unwrap();
        let truth = world.step(1.0).unwrap();
        assert!((truth.pose.rotation.yaw - FRAC_PI_2).abs() < 1e-12);
        assert_eq!(truth.pose.translation, Vec3::zero());
    }

    #[test]
    fn acceleration_follows_speed_changes() {
        let world = SimWorld::new(Pose3::origin());
        world.command(ChassisSpeeds::new(1.0, 0.0), 0.0).unwrap();
        let first = world.step(0.5).unwrap();
        assert!((first.acceleration.x - 2.0).abs() < 1e-12);
        let second = world.step(0.5).unwrap();
        assert_eq!(second.acceleration, Vec3::zero());
    }

    #[test]
    fn noiseless_sensors_report_truth() {
        let world = SimWorld::new(Pose3::new(Vec3::new(1.0, 2.0, 0.0), Rotation3::from_yaw(0.3)));
        world.command(ChassisSpeeds::new(0.5, -0.25), 0.0).unwrap();

        let mut drive = world.drivetrain(1, 0.0).unwrap();
        let mut imu = world.imu(2, 0.0).unwrap();
        assert_eq!(drive.chassis_speeds().unwrap(), ChassisSpeeds::new(0.5, -0.25));
        assert_eq!(drive.rotation().unwrap(), Rotation3::from_yaw(0.3));
        assert_eq!(imu.heading().unwrap(), Rotation3::from_yaw(0.3));
        assert_eq!(drive.pose().unwrap(), world.truth().unwrap().pose);
    }

    #[test]
    fn same_seed_gives_same_noise() {
        let world = SimWorld::new(Pose3::origin());
        world.command(ChassisSpeeds::new(1.0, 0.0), 0.0).unwrap();
        let mut a = world.drivetrain(42, 0.1).unwrap();
        let mut b = world.drivetrain(42, 0.1).unwrap();
        for _ in 0..5 {
            assert_eq!(a.chassis_speeds().unwrap(), b.chassis_speeds().unwrap());
        }
    }

    #[test]
    fn negative_noise_is_rejected() {
        let world = SimWorld::new(Pose3::origin());
        let err = world.imu(0, -1.0).unwrap_err();
        assert!(matches!(err, SensorError::InvalidNoise { std_dev, .. } if std_dev == -1.0));
    }

    #[test]
    fn vision_reports_every_nth_call() {
        let world = SimWorld::new(Pose3::origin());
        let mut camera = world.vision(3, 3, [0.0; 6]).unwrap();
        let seen: Vec<bool> = (0..6)
            .map(|_| camera.observation().unwrap().is_some())
            .collect();
        assert_eq!(seen, vec![false, false, true, false, false, true]);
    }

    #[test]
    fn vision_observation_carries_configured_std_devs() {
        let world = SimWorld::new(Pose3::origin());
        let std_devs = [0.1, 0.2, 0.3, 0.01, 0.02, 0.03];
        let mut camera = world.vision(3, 1, std_devs).unwrap();
        let obs = camera.observation().unwrap().expect("every call reports");
        assert_eq!(obs.std_devs, std_devs);
        assert_eq!(obs.rotation_measurements().z.std_dev(), 0.03);
    }
}

//! `posefuse-hal` – sensor interfaces consumed by the estimators.
//!
//! The estimators never talk to hardware.  A host loop reads these traits
//! once per cycle and hands plain values to `posefuse-estimation`.
//!
//! # Modules
//!
//! - [`drivetrain`] – [`Drivetrain`][drivetrain::Drivetrain]: body-relative
//!   chassis speeds plus the drivetrain's own pose and gyro reading.
//! - [`imu`] – [`Imu`][imu::Imu]: orientation and linear acceleration.
//! - [`vision`] – [`VisionSensor`][vision::VisionSensor]: optional full-pose
//!   observations with per-axis standard deviations.
//! - [`sim`] – [`SimWorld`][sim::SimWorld]: a seeded ground-truth simulation
//!   that backs all three traits, for tests and headless runs.

pub mod drivetrain;
pub mod imu;
pub mod sim;
pub mod vision;

use thiserror::Error;

pub use drivetrain::Drivetrain;
pub use imu::Imu;
pub use sim::{GroundTruth, SimDrivetrain, SimImu, SimVision, SimWorld};
pub use vision::VisionSensor;

/// Errors reported by sensor drivers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    #[error("Sensor {sensor} unavailable: {reason}")]
    Unavailable { sensor: String, reason: String },

    #[error("Sensor {sensor} configured with invalid noise std dev {std_dev}")]
    InvalidNoise { sensor: String, std_dev: f64 },
}

//! Generic `Drivetrain` trait.

use posefuse_types::{ChassisSpeeds, Pose3, Rotation3};

use crate::SensorError;

/// A drive base that reports its own motion.
pub trait Drivetrain: Send + Sync {
    /// Stable identifier, e.g. `"swerve"`.
    fn id(&self) -> &str;

    /// Current robot-relative velocity (m/s).
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::Unavailable`] when the encoders cannot be read.
    fn chassis_speeds(&mut self) -> Result<ChassisSpeeds, SensorError>;

    /// The drivetrain's own pose estimate.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::Unavailable`] when the estimate cannot be read.
    fn pose(&mut self) -> Result<Pose3, SensorError>;

    /// The drivetrain gyro's orientation.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::Unavailable`] when the gyro cannot be read.
    fn rotation(&mut self) -> Result<Rotation3, SensorError>;
}

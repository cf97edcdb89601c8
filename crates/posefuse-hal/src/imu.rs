//! Generic `Imu` trait.

use posefuse_types::{Rotation3, Vec3};

use crate::SensorError;

/// An inertial measurement unit.
pub trait Imu: Send + Sync {
    /// Stable identifier, e.g. `"pigeon"`.
    fn id(&self) -> &str;

    /// Current orientation.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::Unavailable`] when the device cannot be read.
    fn heading(&mut self) -> Result<Rotation3, SensorError>;

    /// Robot-relative linear acceleration (m/s²).
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::Unavailable`] when the device cannot be read.
    fn acceleration(&mut self) -> Result<Vec3, SensorError>;
}

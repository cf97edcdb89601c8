//! Generic `VisionSensor` trait for external pose observations.

use posefuse_types::VisionObservation;

use crate::SensorError;

/// A sensor that sometimes sees enough of the world to report a full pose.
pub trait VisionSensor: Send + Sync {
    /// Stable identifier, e.g. `"front_camera"`.
    fn id(&self) -> &str;

    /// The latest observation, or `None` when nothing usable is in view.
    ///
    /// The observation's standard deviations are ordered x, y, z, roll,
    /// pitch, yaw.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::Unavailable`] when the device cannot be read.
    fn observation(&mut self) -> Result<Option<VisionObservation>, SensorError>;
}

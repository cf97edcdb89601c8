//! `posefuse-estimation` – per-cycle pose estimators.
//!
//! Turns drivetrain, inertial and external measurements into one best pose
//! estimate per control cycle.
//!
//! # Modules
//!
//! - [`rotation`] – [`RotationEstimator`][rotation::RotationEstimator]:
//!   integrates the IMU heading rate into a predicted orientation and fuses it
//!   per axis with external rotation measurements.
//! - [`pose`] – [`PoseEstimator`][pose::PoseEstimator]: integrates the
//!   world-frame drivetrain velocity into a predicted position and fuses it per
//!   axis with external position measurements.  Takes the rotation
//!   estimator's output as its heading.
//! - [`odometry`] – [`Odometry`][odometry::Odometry]: dead reckoning from
//!   drivetrain speeds and IMU heading alone.
//!
//! # Timing
//!
//! Each estimator owns a [`Clock`][posefuse_math::Clock] and offers two entry
//! points: `estimate`/`update` read that clock once per call, while
//! `estimate_over`/`update_over` take `dt` from the caller.  When several
//! estimators run in the same cycle, read one clock in the host loop and use
//! the `_over` forms so every estimator integrates over the same interval.

pub mod odometry;
pub mod pose;
pub mod rotation;

pub use odometry::Odometry;
pub use pose::PoseEstimator;
pub use rotation::RotationEstimator;

//! `posefuse-types` – shared value types for the posefuse estimation stack.
//!
//! Everything that crosses a crate boundary lives here: noisy scalar
//! [`Measurement`]s, the labeled [`Axis`]/[`Axes`] triple used instead of bare
//! index conventions, the [`geometry`] primitives, the
//! [`VisionObservation`] handed over by external sensors, and the
//! [`FusionError`] type.

pub mod geometry;

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use geometry::{ChassisSpeeds, Pose3, Quaternion, Rotation3, Vec3};

// ────────────────────────────────────────────────────────────────────────────
// Measurement
// ────────────────────────────────────────────────────────────────────────────

/// One noisy observation of a scalar quantity.
///
/// A `std_dev` of zero is accepted; fusing it produces an infinite weight and
/// the usual IEEE-754 propagation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    value: f64,
    std_dev: f64,
}

impl Measurement {
    /// Create a measurement of `value` with standard deviation `std_dev`.
    pub const fn new(value: f64, std_dev: f64) -> Self {
        Self { value, std_dev }
    }

    /// The measured value.
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// The expected standard deviation of the measuring method.
    pub const fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// Inverse-variance weight, `1 / σ²`.
    pub fn weight(&self) -> f64 {
        self.std_dev.powi(-2)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Axes
// ────────────────────────────────────────────────────────────────────────────

/// One independent degree of freedom of a 3-D quantity.
///
/// Rotational quantities use the same three slots: roll about X, pitch about
/// Y, yaw about Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ROLL: Axis = Axis::X;
    pub const PITCH: Axis = Axis::Y;
    pub const YAW: Axis = Axis::Z;

    /// Canonical axis order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Position of this axis in [`Axis::ALL`].
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// A labeled triple, one `T` per [`Axis`].
///
/// ```
/// use posefuse_types::{Axes, Axis};
///
/// let a = Axes::from_rpy(0.1, 0.2, 0.3);
/// assert_eq!(a[Axis::YAW], 0.3);
/// assert_eq!(a.map(|v| v * 10.0).into_array(), [1.0, 2.0, 3.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Axes<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T> Axes<T> {
    pub const fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }

    /// Build a rotational triple from roll, pitch and yaw.
    pub const fn from_rpy(roll: T, pitch: T, yaw: T) -> Self {
        Self::new(roll, pitch, yaw)
    }

    /// Build a rotational triple from yaw, pitch and roll, in that order.
    pub const fn from_ypr(yaw: T, pitch: T, roll: T) -> Self {
        Self::new(roll, pitch, yaw)
    }

    pub fn splat(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(value.clone(), value.clone(), value)
    }

    /// Apply `f` to every component, in X, Y, Z order.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Axes<U> {
        let x = f(self.x);
        let y = f(self.y);
        let z = f(self.z);
        Axes::new(x, y, z)
    }

    pub fn zip<U>(self, other: Axes<U>) -> Axes<(T, U)> {
        Axes::new((self.x, other.x), (self.y, other.y), (self.z, other.z))
    }

    pub fn as_ref(&self) -> Axes<&T> {
        Axes::new(&self.x, &self.y, &self.z)
    }

    pub fn as_mut(&mut self) -> Axes<&mut T> {
        Axes::new(&mut self.x, &mut self.y, &mut self.z)
    }

    pub fn into_array(self) -> [T; 3] {
        [self.x, self.y, self.z]
    }

    /// Iterate `(axis, component)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Axis, &T)> {
        Axis::ALL.into_iter().map(move |axis| (axis, &self[axis]))
    }
}

impl<T> Index<Axis> for Axes<T> {
    type Output = T;

    fn index(&self, axis: Axis) -> &T {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}

impl<T> IndexMut<Axis> for Axes<T> {
    fn index_mut(&mut self, axis: Axis) -> &mut T {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }
}

impl Axes<&[Measurement]> {
    /// No external measurements on any axis.
    pub const fn empty() -> Self {
        Self::new(&[], &[], &[])
    }
}

// ────────────────────────────────────────────────────────────────────────────
// External observations
// ────────────────────────────────────────────────────────────────────────────

/// A full-pose observation from an external sensor such as a camera.
///
/// `std_devs` is ordered x, y, z, roll, pitch, yaw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisionObservation {
    pub pose: Pose3,
    pub std_devs: [f64; 6],
}

impl VisionObservation {
    pub fn new(pose: Pose3, std_devs: [f64; 6]) -> Self {
        Self { pose, std_devs }
    }

    /// Per-axis position measurements, paired with `std_devs[0..3]`.
    pub fn position_measurements(&self) -> Axes<Measurement> {
        let t = self.pose.translation;
        let s = &self.std_devs;
        Axes::new(
            Measurement::new(t.x, s[0]),
            Measurement::new(t.y, s[1]),
            Measurement::new(t.z, s[2]),
        )
    }

    /// Per-axis rotation measurements, paired with `std_devs[3..6]`.
    pub fn rotation_measurements(&self) -> Axes<Measurement> {
        let r = self.pose.rotation;
        let s = &self.std_devs;
        Axes::from_rpy(
            Measurement::new(r.roll, s[3]),
            Measurement::new(r.pitch, s[4]),
            Measurement::new(r.yaw, s[5]),
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Errors raised by the fusion layer.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FusionError {
    /// The number of per-axis measurement sequences did not match the number
    /// of parameters the fuser was built for.
    #[error("Requires parameters: {expected}; Provided parameters: {actual}")]
    InvalidParameterCount { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measurement_weight_is_inverse_variance() {
        let m = Measurement::new(3.0, 0.5);
        assert_eq!(m.value(), 3.0);
        assert_eq!(m.std_dev(), 0.5);
        assert!((m.weight() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn zero_std_dev_weight_is_infinite() {
        assert!(Measurement::new(1.0, 0.0).weight().is_infinite());
    }

    #[test]
    fn rotational_aliases_map_to_xyz() {
        assert_eq!(Axis::ROLL, Axis::X);
        assert_eq!(Axis::PITCH, Axis::Y);
        assert_eq!(Axis::YAW, Axis::Z);
        assert_eq!(Axis::YAW.index(), 2);
    }

    #[test]
    fn from_ypr_reorders_into_rpy_slots() {
        let a = Axes::from_ypr("yaw", "pitch", "roll");
        assert_eq!(a[Axis::ROLL], "roll");
        assert_eq!(a[Axis::PITCH], "pitch");
        assert_eq!(a[Axis::YAW], "yaw");
    }

    #[test]
    fn index_mut_writes_the_labeled_slot() {
        let mut a = Axes::splat(0.0);
        a[Axis::Y] = 2.5;
        assert_eq!(a.into_array(), [0.0, 2.5, 0.0]);
    }

    #[test]
    fn zip_and_iter_preserve_axis_order() {
        let a = Axes::new(1, 2, 3).zip(Axes::new('a', 'b', 'c'));
        let labels: Vec<_> = a.iter().map(|(axis, (n, c))| (axis, *n, *c)).collect();
        assert_eq!(
            labels,
            vec![(Axis::X, 1, 'a'), (Axis::Y, 2, 'b'), (Axis::Z, 3, 'c')]
        );
    }

    #[test]
    fn vision_observation_splits_std_devs_by_axis() {
        let obs = VisionObservation::new(
            Pose3::new(Vec3::new(1.0, 2.0, 3.0), Rotation3::new(0.1, 0.2, 0.3)),
            [0.01, 0.02, 0.03, 0.04, 0.05, 0.06],
        );

        let p = obs.position_measurements();
        assert_eq!(p.x, Measurement::new(1.0, 0.01));
        assert_eq!(p.z, Measurement::new(3.0, 0.03));

        let r = obs.rotation_measurements();
        assert_eq!(r[Axis::ROLL], Measurement::new(0.1, 0.04));
        assert_eq!(r[Axis::YAW], Measurement::new(0.3, 0.06));
    }

    #[test]
    fn invalid_parameter_count_reports_both_counts() {
        let err = FusionError::InvalidParameterCount {
            expected: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "Requires parameters: 3; Provided parameters: 2"
        );
    }

    #[test]
    fn observation_serializes_with_named_fields() {
        let obs = VisionObservation::new(Pose3::default(), [0.1; 6]);
        let json = serde_json::to_string(&obs).unwrap();
        assert!(json.contains("\"std_devs\""));
        let back: VisionObservation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, obs);
    }
}

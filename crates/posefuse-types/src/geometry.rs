//! Rigid-body geometry primitives.
//!
//! [`Rotation3`] stores the extrinsic roll/pitch/yaw triple that the
//! estimators fuse component by component.  Rotating a vector goes through a
//! unit [`Quaternion`] built as `q = q_z(yaw) · q_y(pitch) · q_x(roll)`, i.e.
//! the rotation matrix `R = Rz · Ry · Rx`.
//!
//! # Example
//!
//! ```rust
//! use posefuse_types::{Rotation3, Vec3};
//! use std::f64::consts::FRAC_PI_2;
//!
//! // Driving forward while facing +Y in the world frame.
//! let world = Vec3::new(1.0, 0.0, 0.0).rotate_by(Rotation3::new(0.0, 0.0, FRAC_PI_2));
//! assert!(world.x.abs() < 1e-12);
//! assert!((world.y - 1.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

use crate::Axes;

// ────────────────────────────────────────────────────────────────────────────
// Vec3
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D vector (metres, or metres per second for velocities).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }

    pub fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }

    pub fn scale(self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k, self.z * k)
    }

    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
    }

    /// Euclidean length.
    pub fn norm(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Rotate this vector by `rotation`.
    pub fn rotate_by(self, rotation: Rotation3) -> Self {
        rotation.to_quaternion().rotate(self)
    }
}

impl From<Axes<f64>> for Vec3 {
    fn from(a: Axes<f64>) -> Self {
        Self::new(a.x, a.y, a.z)
    }
}

impl From<Vec3> for Axes<f64> {
    fn from(v: Vec3) -> Self {
        Axes::new(v.x, v.y, v.z)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Quaternion
// ────────────────────────────────────────────────────────────────────────────

/// A unit quaternion representing a 3-D rotation (w, x, y, z convention).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    /// Create a quaternion.  The caller is responsible for providing a unit
    /// quaternion (|q| = 1).
    pub const fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation (no rotation).
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Quaternion for the extrinsic X-Y-Z rotation `(roll, pitch, yaw)`.
    pub fn from_rpy(roll: f64, pitch: f64, yaw: f64) -> Self {
        let (sr, cr) = (roll * 0.5).sin_cos();
        let (sp, cp) = (pitch * 0.5).sin_cos();
        let (sy, cy) = (yaw * 0.5).sin_cos();
        Self::new(
            cr * cp * cy + sr * sp * sy,
            sr * cp * cy - cr * sp * sy,
            cr * sp * cy + sr * cp * sy,
            cr * cp * sy - sr * sp * cy,
        )
    }

    /// Hamilton product `self · rhs`.
    ///
    /// Applied to a vector, `rhs` acts first and `self` second, so
    /// `qz.mul(qy).mul(qx)` rolls, then pitches, then yaws.
    pub fn mul(self, rhs: Self) -> Self {
        let (a, b) = (self, rhs);
        Self::new(
            a.w * b.w - (a.x * b.x + a.y * b.y + a.z * b.z),
            a.w * b.x + b.w * a.x + (a.y * b.z - a.z * b.y),
            a.w * b.y + b.w * a.y + (a.z * b.x - a.x * b.z),
            a.w * b.z + b.w * a.z + (a.x * b.y - a.y * b.x),
        )
    }

    /// Inverse of a unit quaternion.
    pub fn conjugate(self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Rotate `v` without building the pure quaternion `q · v · q⁻¹`.
    ///
    /// With `u` the vector part, `t = 2 (u × v)` and
    /// `v' = v + w t + u × t`.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let t = u.cross(v).scale(2.0);
        v.add(t.scale(self.w)).add(u.cross(t))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rotation3
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D orientation as extrinsic roll (X), pitch (Y) and yaw (Z), radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation3 {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Rotation3 {
    pub const fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }

    /// A pure heading about the vertical axis.
    pub const fn from_yaw(yaw: f64) -> Self {
        Self::new(0.0, 0.0, yaw)
    }

    pub fn to_quaternion(self) -> Quaternion {
        Quaternion::from_rpy(self.roll, self.pitch, self.yaw)
    }
}

impl From<Axes<f64>> for Rotation3 {
    fn from(a: Axes<f64>) -> Self {
        Self::new(a.x, a.y, a.z)
    }
}

impl From<Rotation3> for Axes<f64> {
    fn from(r: Rotation3) -> Self {
        Axes::from_rpy(r.roll, r.pitch, r.yaw)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose3
// ────────────────────────────────────────────────────────────────────────────

/// Position plus orientation in the world frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose3 {
    pub translation: Vec3,
    pub rotation: Rotation3,
}

impl Pose3 {
    pub const fn new(translation: Vec3, rotation: Rotation3) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// The world origin with no rotation.
    pub const fn origin() -> Self {
        Self::new(Vec3::zero(), Rotation3::new(0.0, 0.0, 0.0))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ChassisSpeeds
// ────────────────────────────────────────────────────────────────────────────

/// Body-relative planar velocity reported by a drivetrain (m/s).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChassisSpeeds {
    /// Forward velocity along the robot's X axis.
    pub vx: f64,
    /// Sideways velocity along the robot's Y axis.
    pub vy: f64,
}

impl ChassisSpeeds {
    pub const fn new(vx: f64, vy: f64) -> Self {
        Self { vx, vy }
    }

    /// World-frame velocity when the robot is oriented by `heading`.
    ///
    /// The drivetrain is planar, so the body-frame Z velocity is always 0.
    pub fn to_world(self, heading: Rotation3) -> Vec3 {
        Vec3::new(self.vx, self.vy, 0.0).rotate_by(heading)
    }
}

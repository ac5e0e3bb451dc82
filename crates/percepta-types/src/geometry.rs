//! Rigid-body geometry primitives.
//!
//! [`Vec3`], [`Quaternion`] (w, x, y, z convention), [`Pose`] and
//! [`PoseStamped`].  The quaternion carries the Euler conversions the pose
//! normalizer depends on: [`Quaternion::to_rpy`] decomposes a rotation into
//! roll/pitch/yaw (ZYX convention) and [`Quaternion::from_rpy`] rebuilds one.
//!
//! # Example
//!
//! ```rust
//! use percepta_types::geometry::Quaternion;
//!
//! let q = Quaternion::from_rpy(0.3, -0.1, 1.2);
//! let (roll, pitch, yaw) = q.to_rpy();
//! assert!((roll - 0.3).abs() < 1e-5);
//! assert!((pitch + 0.1).abs() < 1e-5);
//! assert!((yaw - 1.2).abs() < 1e-5);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Vec3
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D point or translation vector (metres).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    /// Create a new vector.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }

    pub fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }

    pub fn scale(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    /// Euclidean distance to another point.
    pub fn distance(self, rhs: Self) -> f32 {
        let d = self.sub(rhs);
        (d.x * d.x + d.y * d.y + d.z * d.z).sqrt()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Quaternion
// ────────────────────────────────────────────────────────────────────────────

/// A unit quaternion representing a 3-D rotation (w, x, y, z convention).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Quaternion {
    /// Create a quaternion.  The caller is responsible for providing a unit
    /// quaternion (|q| = 1).
    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation (no rotation).
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Hamilton product: compose two rotations.
    pub fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }

    /// Conjugate (== inverse for a unit quaternion).
    pub fn conjugate(self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Rotate a vector by this quaternion: p' = q * p * q*.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let p = Self::new(0.0, v.x, v.y, v.z);
        let rotated = self.mul(p).mul(self.conjugate());
        Vec3::new(rotated.x, rotated.y, rotated.z)
    }

    /// Build a rotation from roll/pitch/yaw Euler angles (radians, ZYX).
    pub fn from_rpy(roll: f32, pitch: f32, yaw: f32) -> Self {
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

    /// Decompose into roll/pitch/yaw Euler angles (radians, ZYX).
    ///
    /// Pitch is clamped to ±π/2 at the gimbal-lock singularity.
    pub fn to_rpy(self) -> (f32, f32, f32) {
        let roll = (2.0 * (self.w * self.x + self.y * self.z))
            .atan2(1.0 - 2.0 * (self.x * self.x + self.y * self.y));
        let sinp = 2.0 * (self.w * self.y - self.z * self.x);
        let pitch = sinp.clamp(-1.0, 1.0).asin();
        let yaw = (2.0 * (self.w * self.z + self.x * self.y))
            .atan2(1.0 - 2.0 * (self.y * self.y + self.z * self.z));
        (roll, pitch, yaw)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose
// ────────────────────────────────────────────────────────────────────────────

/// A position plus orientation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quaternion,
}

impl Pose {
    pub fn new(position: Vec3, orientation: Quaternion) -> Self {
        Self {
            position,
            orientation,
        }
    }
}

/// A [`Pose`] tagged with the reference frame it is expressed in and the
/// time it was estimated at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseStamped {
    pub pose: Pose,
    /// Name of the reference frame, e.g. `"base_link"` or `"camera_link"`.
    pub frame_id: String,
    pub stamp: DateTime<Utc>,
}

impl PoseStamped {
    pub fn new(pose: Pose, frame_id: impl Into<String>) -> Self {
        Self {
            pose,
            frame_id: frame_id.into(),
            stamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_1_SQRT_2};

    #[test]
    fn identity_rotate_is_noop() {
        let q = Quaternion::identity();
        let v = Vec3::new(1.0, 2.0, 3.0);
        let r = q.rotate(v);
        assert!((r.x - 1.0).abs() < 1e-5);
        assert!((r.y - 2.0).abs() < 1e-5);
        assert!((r.z - 3.0).abs() < 1e-5);
    }

    #[test]
    fn ninety_degree_yaw_rotates_x_to_y() {
        let q = Quaternion::from_rpy(0.0, 0.0, FRAC_PI_2);
        assert!((q.w - FRAC_1_SQRT_2).abs() < 1e-5);
        assert!((q.z - FRAC_1_SQRT_2).abs() < 1e-5);
        let r = q.rotate(Vec3::new(1.0, 0.0, 0.0));
        assert!(r.x.abs() < 1e-5);
        assert!((r.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn rpy_roundtrip() {
        let q = Quaternion::from_rpy(0.4, -0.2, 1.1);
        let (roll, pitch, yaw) = q.to_rpy();
        assert!((roll - 0.4).abs() < 1e-5);
        assert!((pitch + 0.2).abs() < 1e-5);
        assert!((yaw - 1.1).abs() < 1e-5);
    }

    #[test]
    fn flattened_rpy_is_fixed_point() {
        // Rebuilding from (0, 0, yaw) and decomposing again must yield the
        // same angles: the flattening step in the normalizer relies on this.
        let q = Quaternion::from_rpy(0.0, 0.0, 0.7);
        let (roll, pitch, yaw) = q.to_rpy();
        assert!(roll.abs() < 1e-6);
        assert!(pitch.abs() < 1e-6);
        let q2 = Quaternion::from_rpy(0.0, 0.0, yaw);
        assert!((q2.w - q.w).abs() < 1e-6);
        assert!((q2.z - q.z).abs() < 1e-6);
    }

    #[test]
    fn conjugate_is_inverse() {
        let q = Quaternion::from_rpy(0.3, 0.2, -0.9);
        let prod = q.mul(q.conjugate());
        assert!((prod.w - 1.0).abs() < 1e-5);
        assert!(prod.x.abs() < 1e-5);
        assert!(prod.y.abs() < 1e-5);
        assert!(prod.z.abs() < 1e-5);
    }

    #[test]
    fn vec3_distance() {
        let a = Vec3::new(0.0, 3.0, 0.0);
        let b = Vec3::new(4.0, 0.0, 0.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-5);
    }
}
